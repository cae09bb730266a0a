//! Encoded property store.
//!
//! Mode-specific menu fields live in a compact string of the form
//! `type?k1=v1&k2=v2`. Only fields that differ from their registered default
//! are written, so new fields can be added without migrating stored strings.
//! The [`SchemaRegistry`] holds the defaults and caches parsed records per
//! exact input string.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Str,
    Bool,
    Int,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropValue {
    Str(String),
    Bool(bool),
    Int(i64),
}

impl PropValue {
    pub fn kind(&self) -> PropKind {
        match self {
            PropValue::Str(_) => PropKind::Str,
            PropValue::Bool(_) => PropKind::Bool,
            PropValue::Int(_) => PropKind::Int,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Coerces raw encoded text into a value of `kind`.
    ///
    /// Booleans accept `True` and `1`; integers that fail to parse (including
    /// the empty string) become 0.
    pub fn decode(kind: PropKind, raw: &str) -> Self {
        match kind {
            PropKind::Bool => PropValue::Bool(raw == "True" || raw == "1"),
            PropKind::Int => PropValue::Int(raw.trim().parse().unwrap_or(0)),
            PropKind::Str | PropKind::Enum => PropValue::Str(raw.to_string()),
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => f.write_str(value),
            PropValue::Bool(true) => f.write_str("True"),
            PropValue::Bool(false) => f.write_str("False"),
            PropValue::Int(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

/// One registered field. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub owner_type: String,
    pub name: String,
    pub default: PropValue,
    pub kind: PropKind,
    pub items: Option<Vec<String>>,
}

/// How a field value was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Explicitly present in the encoded string.
    Overridden(PropValue),
    /// Schema default, materialized at parse time or late-bound from the registry.
    Default(PropValue),
    /// The registry does not know the field yet; value comes from the built-in table.
    LegacyFallback(PropValue),
}

impl Lookup {
    pub fn value(&self) -> &PropValue {
        match self {
            Lookup::Overridden(value) | Lookup::Default(value) | Lookup::LegacyFallback(value) => {
                value
            }
        }
    }

    pub fn into_value(self) -> PropValue {
        match self {
            Lookup::Overridden(value) | Lookup::Default(value) | Lookup::LegacyFallback(value) => {
                value
            }
        }
    }
}

enum Fallback {
    Bool(bool),
    Int(i64),
    Str(&'static str),
}

// Known fields, consulted when the registry has not been populated yet
// (cold start, or a reload that dropped the editors).
const FALLBACK_DEFAULTS: &[(&str, Fallback)] = &[
    ("pm_radius", Fallback::Int(-1)),
    ("pm_confirm", Fallback::Int(-1)),
    ("pm_threshold", Fallback::Int(-1)),
    ("pm_flick", Fallback::Bool(true)),
    ("rm_title", Fallback::Bool(true)),
    ("pd_title", Fallback::Bool(true)),
    ("pd_box", Fallback::Bool(true)),
    ("pd_expand", Fallback::Bool(false)),
    ("pd_panel", Fallback::Int(1)),
    ("pd_auto_close", Fallback::Bool(false)),
    ("pd_width", Fallback::Int(300)),
    ("pg_context", Fallback::Str("ANY")),
    ("pg_category", Fallback::Str("My Category")),
    ("pg_space", Fallback::Str("VIEW_3D")),
    ("pg_region", Fallback::Str("TOOLS")),
    ("pg_wicons", Fallback::Bool(false)),
    ("s_undo", Fallback::Bool(false)),
    ("s_state", Fallback::Bool(false)),
    ("md_confirm", Fallback::Bool(false)),
    ("md_block_ui", Fallback::Bool(true)),
    ("lock", Fallback::Bool(true)),
    ("sk_block_ui", Fallback::Bool(false)),
    ("pr_vector", Fallback::Bool(true)),
    ("pr_mulsel", Fallback::Bool(false)),
    ("pr_hor_exp", Fallback::Bool(true)),
    ("pr_exp", Fallback::Bool(true)),
    ("pr_save", Fallback::Bool(true)),
];

fn fallback_default(name: &str) -> Option<PropValue> {
    FALLBACK_DEFAULTS
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(_, value)| match value {
            Fallback::Bool(value) => PropValue::Bool(*value),
            Fallback::Int(value) => PropValue::Int(*value),
            Fallback::Str(value) => PropValue::Str((*value).to_string()),
        })
}

/// Parsed view over one encoded string.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    type_: String,
    explicit: FxHashMap<String, PropValue>,
    defaults: FxHashMap<String, PropValue>,
}

impl EncodedRecord {
    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// Materialized value (explicit or parse-time default). `None` if the field
    /// was unknown when this record was parsed.
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.explicit.get(name).or_else(|| self.defaults.get(name))
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.explicit.contains_key(name)
    }

    /// True when every present field equals its registered default.
    pub fn is_empty(&self) -> bool {
        self.explicit
            .iter()
            .all(|(name, value)| self.defaults.get(name) == Some(value))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.explicit.iter().map(|(name, value)| (name.as_str(), value))
    }
}

// Parsed records kept before the cache starts over.
const CACHE_LIMIT: usize = 512;

/// Registry of encoded-record fields plus the per-string parse cache.
///
/// Fields are keyed by name alone; names are unique across owner types by
/// convention. Registration is an idempotent upsert.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entries: FxHashMap<String, SchemaEntry>,
    generation: Cell<u64>,
    cache: RefCell<FxHashMap<String, Rc<EncodedRecord>>>,
    cache_generation: Cell<u64>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, owner_type: &str, name: &str, default: impl Into<PropValue>) {
        let default = default.into();
        let kind = default.kind();
        self.insert(SchemaEntry {
            owner_type: owner_type.to_string(),
            name: name.to_string(),
            default,
            kind,
            items: None,
        });
    }

    pub fn register_enum(&mut self, owner_type: &str, name: &str, default: &str, items: &[&str]) {
        self.insert(SchemaEntry {
            owner_type: owner_type.to_string(),
            name: name.to_string(),
            default: PropValue::Str(default.to_string()),
            kind: PropKind::Enum,
            items: Some(items.iter().map(|item| item.to_string()).collect()),
        });
    }

    fn insert(&mut self, entry: SchemaEntry) {
        if self.entries.get(&entry.name) != Some(&entry) {
            self.entries.insert(entry.name.clone(), entry);
            self.generation.set(self.generation.get() + 1);
        }
    }

    pub fn entry(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn default_of(&self, name: &str) -> Option<&PropValue> {
        self.entries.get(name).map(|entry| &entry.default)
    }

    /// Parses `text`, returning the cached record for byte-identical input.
    ///
    /// The cache is dropped whenever the schema has grown since it was filled,
    /// so records always carry the current defaults. It also starts over once
    /// it holds `CACHE_LIMIT` records.
    pub fn parse(&self, text: &str) -> Rc<EncodedRecord> {
        if self.cache_generation.get() != self.generation.get() {
            self.cache.borrow_mut().clear();
            self.cache_generation.set(self.generation.get());
        }
        if let Some(record) = self.cache.borrow().get(text) {
            return Rc::clone(record);
        }
        let record = Rc::new(self.decode(text));
        let mut cache = self.cache.borrow_mut();
        if cache.len() >= CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(text.to_string(), Rc::clone(&record));
        record
    }

    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    fn decode(&self, text: &str) -> EncodedRecord {
        let (type_, body) = split_type(text);
        let mut explicit = FxHashMap::default();
        for (key, raw) in pairs(body) {
            // Unknown keys are dropped, newer data read by an older schema.
            if let Some(entry) = self.entries.get(key) {
                explicit.insert(key.to_string(), PropValue::decode(entry.kind, &unescape(raw)));
            }
        }
        let defaults = self
            .entries
            .values()
            .filter(|entry| entry.owner_type == type_)
            .map(|entry| (entry.name.clone(), entry.default.clone()))
            .collect();
        EncodedRecord {
            type_: type_.to_string(),
            explicit,
            defaults,
        }
    }

    /// Resolves a field through the record, the registry, then the built-in table.
    pub fn lookup(&self, record: &EncodedRecord, name: &str) -> Option<Lookup> {
        if let Some(value) = record.explicit.get(name) {
            return Some(Lookup::Overridden(value.clone()));
        }
        if let Some(value) = record.defaults.get(name) {
            return Some(Lookup::Default(value.clone()));
        }
        if let Some(entry) = self.entries.get(name) {
            debug!(field = name, record = record.type_(), "late-bound default");
            return Some(Lookup::Default(entry.default.clone()));
        }
        if let Some(value) = fallback_default(name) {
            debug!(field = name, record = record.type_(), "fallback default");
            return Some(Lookup::LegacyFallback(value));
        }
        None
    }

    pub fn get(&self, text: &str, name: &str) -> Option<PropValue> {
        let record = self.parse(text);
        self.lookup(&record, name).map(Lookup::into_value)
    }

    pub fn get_bool(&self, text: &str, name: &str) -> bool {
        self.get(text, name)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    pub fn get_int(&self, text: &str, name: &str) -> i64 {
        self.get(text, name)
            .and_then(|value| value.as_int())
            .unwrap_or(0)
    }

    pub fn get_str(&self, text: &str, name: &str) -> String {
        match self.get(text, name) {
            Some(PropValue::Str(value)) => value,
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// Ordinal of the current enum value of `name` in `text`; 0 when unknown.
    pub fn value(&self, text: &str, name: &str) -> usize {
        let Some(items) = self.entries.get(name).and_then(|entry| entry.items.as_ref()) else {
            return 0;
        };
        let current = self.get_str(text, name);
        items.iter().position(|item| *item == current).unwrap_or(0)
    }

    /// Writes `name = value` into `text`, dropping defaults and sorting keys.
    ///
    /// Returns `text` unchanged when `name` is not a registered field.
    pub fn encode(&self, text: &str, name: &str, value: impl Into<PropValue>) -> String {
        let Some(entry) = self.entries.get(name) else {
            debug!(field = name, "encode of unregistered field ignored");
            return text.to_string();
        };
        let value = PropValue::decode(entry.kind, &value.into().to_string());
        let (type_, body) = split_type(text);
        let mut fields = self.known_fields(body);
        fields.insert(name.to_string(), value);
        self.assemble(type_, fields)
    }

    /// Removes the named fields entirely and re-encodes the rest.
    pub fn clear(&self, text: &str, names: &[&str]) -> String {
        let (type_, body) = split_type(text);
        let mut fields = self.known_fields(body);
        for name in names {
            fields.remove(*name);
        }
        self.assemble(type_, fields)
    }

    fn known_fields(&self, body: &str) -> FxHashMap<String, PropValue> {
        pairs(body)
            .filter_map(|(key, raw)| {
                self.entries
                    .get(key)
                    .map(|entry| (key.to_string(), PropValue::decode(entry.kind, &unescape(raw))))
            })
            .collect()
    }

    fn assemble(&self, type_: &str, fields: FxHashMap<String, PropValue>) -> String {
        let mut pairs: Vec<(String, PropValue)> = fields
            .into_iter()
            .filter(|(name, value)| self.default_of(name) != Some(value))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let body: Vec<String> = pairs
            .into_iter()
            .map(|(name, value)| format!("{name}={}", escape(&value.to_string())))
            .collect();
        format!("{}?{}", type_, body.join("&"))
    }
}

fn split_type(text: &str) -> (&str, &str) {
    text.split_once('?').unwrap_or((text, ""))
}

// `%`, `&` and `=` in values are written as `%25`, `%26` and `%3D`.
fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['%', '&', '=']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

// Any other `%` sequence is kept as written.
fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('%') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(at) = rest.find('%') {
        out.push_str(&rest[..at]);
        let tail = &rest[at..];
        let decoded = match tail.get(..3) {
            Some("%25") => Some('%'),
            Some("%26") => Some('&'),
            Some("%3D") | Some("%3d") => Some('='),
            _ => None,
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[3..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

// Malformed segments (no `=`, empty key) are skipped.
fn pairs(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| !key.is_empty())
}
