//! Export and import of menu definitions as JSON.
//!
//! Menus and slots are written as positional arrays. The extended format
//! (`"schema": "PME-F"`) appends `enabled` and `drag_dir` to each menu and a
//! flags integer to each actionable slot; the compatible format leaves them
//! out so older readers accept it.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::collection::MenuCollection;
use crate::errors::{Error, Result};
use crate::hotkey::{DragDir, Hotkey, OpenMode};
use crate::id::Uid;
use crate::keymap::KeymapHost;
use crate::menu::{MenuItem, MenuMode, MenuSlot, SlotMode, DEFAULT_POLL};

pub const EXTENDED_SCHEMA: &str = "PME-F";
/// Format version written by this crate.
pub const FORMAT_VERSION: &str = env!("CARGO_PKG_VERSION");

const SLOT_DISABLED: i64 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct SlotRecord {
    pub name: String,
    pub mode: SlotMode,
    pub icon: String,
    pub text: String,
    pub enabled: bool,
}

impl SlotRecord {
    fn from_slot(slot: &MenuSlot) -> Self {
        Self {
            name: slot.name.clone(),
            mode: slot.mode,
            icon: slot.icon.clone(),
            text: slot.text.clone(),
            enabled: slot.enabled,
        }
    }

    fn into_slot(self) -> MenuSlot {
        MenuSlot {
            mode: self.mode,
            name: self.name,
            text: self.text,
            icon: self.icon,
            enabled: self.enabled,
        }
    }

    fn to_value(&self, extended: bool) -> Value {
        if self.mode == SlotMode::Empty {
            return json!([self.name, self.icon, self.text]);
        }
        let mut fields = vec![
            json!(self.name),
            json!(self.mode.as_str()),
            json!(self.icon),
            json!(self.text),
        ];
        if extended {
            let flags = if self.enabled { 0 } else { SLOT_DISABLED };
            fields.push(json!(flags));
        }
        Value::Array(fields)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let fields = value
            .as_array()
            .ok_or_else(|| Error::InvalidDocument("slot is not an array".into()))?;
        let text_at = |i: usize| -> String {
            fields.get(i).and_then(Value::as_str).unwrap_or_default().to_string()
        };
        match fields.len() {
            3 => Ok(Self {
                name: text_at(0),
                mode: SlotMode::Empty,
                icon: text_at(1),
                text: text_at(2),
                enabled: true,
            }),
            4 | 5 => {
                let flags = fields.get(4).and_then(Value::as_i64).unwrap_or(0);
                let mode = text_at(1);
                let Ok(mode) = mode.parse::<SlotMode>() else {
                    warn!(slot = %text_at(0), mode = %mode, "unknown slot mode, slot left empty");
                    return Ok(Self {
                        name: String::new(),
                        mode: SlotMode::Empty,
                        icon: String::new(),
                        text: String::new(),
                        enabled: true,
                    });
                };
                Ok(Self {
                    name: text_at(0),
                    mode,
                    icon: text_at(2),
                    text: text_at(3),
                    enabled: flags & SLOT_DISABLED == 0,
                })
            }
            n => Err(Error::InvalidDocument(format!("slot has {n} fields"))),
        }
    }
}

/// One menu as stored in a document. Enum fields stay raw text so migrations
/// can rewrite values the current enums no longer accept.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuRecord {
    pub name: String,
    pub km_name: String,
    pub hotkey: String,
    pub slots: Vec<SlotRecord>,
    pub mode: String,
    pub data: String,
    pub open_mode: String,
    pub poll_cmd: String,
    pub tag: String,
    pub enabled: Option<bool>,
    pub drag_dir: Option<String>,
}

impl MenuRecord {
    pub fn from_menu(menu: &MenuItem, extended: bool) -> Self {
        Self {
            name: menu.name().to_string(),
            km_name: menu.km_name.clone(),
            hotkey: menu.hotkey().to_string(),
            slots: menu.slots.iter().map(SlotRecord::from_slot).collect(),
            mode: menu.mode().as_str().to_string(),
            data: menu.data.clone(),
            open_mode: menu.open_mode().as_str().to_string(),
            poll_cmd: menu.poll_cmd.clone(),
            tag: menu.tag.clone(),
            enabled: extended.then_some(menu.enabled()),
            drag_dir: extended.then(|| menu.drag_dir.as_str().to_string()),
        }
    }

    fn to_value(&self) -> Value {
        let extended = self.enabled.is_some() || self.drag_dir.is_some();
        let slots: Vec<Value> = self.slots.iter().map(|slot| slot.to_value(extended)).collect();
        let mut fields = vec![
            json!(self.name),
            json!(self.km_name),
            json!(self.hotkey),
            Value::Array(slots),
            json!(self.mode),
            json!(self.data),
            json!(self.open_mode),
            json!(self.poll_cmd),
            json!(self.tag),
        ];
        if extended {
            fields.push(json!(self.enabled.unwrap_or(true)));
            fields.push(json!(self.drag_dir.as_deref().unwrap_or(DragDir::Any.as_str())));
        }
        Value::Array(fields)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let fields = value
            .as_array()
            .filter(|fields| fields.len() >= 9)
            .ok_or_else(|| Error::InvalidDocument("menu must be an array of at least 9 fields".into()))?;
        let text_at = |i: usize| -> String {
            fields.get(i).and_then(Value::as_str).unwrap_or_default().to_string()
        };
        let slots = fields[3]
            .as_array()
            .map(|slots| slots.iter().map(SlotRecord::from_value).collect::<Result<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();
        Ok(Self {
            name: text_at(0),
            km_name: text_at(1),
            hotkey: text_at(2),
            slots,
            mode: text_at(4),
            data: text_at(5),
            open_mode: text_at(6),
            poll_cmd: text_at(7),
            tag: text_at(8),
            enabled: fields.get(9).and_then(Value::as_bool),
            drag_dir: fields.get(10).and_then(Value::as_str).map(str::to_string),
        })
    }
}

impl Serialize for MenuRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MenuRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        MenuRecord::from_value(&value).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: String,
    pub menus: Vec<MenuRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl ExportDocument {
    pub fn is_extended(&self) -> bool {
        self.schema.as_deref() == Some(EXTENDED_SCHEMA)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Exports every menu. `compat` selects the narrower format older readers accept.
pub fn export(collection: &MenuCollection, compat: bool) -> ExportDocument {
    export_menus(collection.iter(), compat)
}

pub fn export_menus<'a>(menus: impl IntoIterator<Item = &'a MenuItem>, compat: bool) -> ExportDocument {
    ExportDocument {
        version: FORMAT_VERSION.to_string(),
        menus: menus
            .into_iter()
            .map(|menu| MenuRecord::from_menu(menu, !compat))
            .collect(),
        schema: (!compat).then(|| EXTENDED_SCHEMA.to_string()),
    }
}

/// What to do with an imported menu whose name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Import under a suffixed name and a new uid.
    #[default]
    Rename,
    /// Remove the existing menu and take over its uid.
    Replace,
    Skip,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportReport {
    pub added: Vec<Uid>,
    pub replaced: Vec<Uid>,
    pub skipped: Vec<String>,
}

type Version = (u32, u32, u32);

fn parse_version(text: &str) -> Option<Version> {
    let mut parts = text.trim().split('.').map(|part| part.parse::<u32>().ok());
    let major = parts.next()??;
    let minor = parts.next().unwrap_or(Some(0))?;
    let patch = parts.next().unwrap_or(Some(0))?;
    Some((major, minor, patch))
}

// Data strings written before 1.13.6 could lose or mangle their type prefix.
fn fix_1_13_6(record: &mut MenuRecord) {
    let Ok(mode) = record.mode.parse::<MenuMode>() else {
        return;
    };
    let prefix = mode.data_type();
    let body = record.data.split_once('?').map_or("", |(_, body)| body);
    let repaired = format!("{prefix}?{body}");
    if record.data != repaired {
        debug!(menu = %record.name, "repaired data prefix");
        record.data = repaired;
    }
}

fn fix_1_14_0(record: &mut MenuRecord) {
    if record.open_mode == "TWEAK" {
        record.open_mode = OpenMode::ClickDrag.as_str().to_string();
    }
}

fn fix_1_15_0(record: &mut MenuRecord) {
    if record.poll_cmd.trim().is_empty() {
        record.poll_cmd = DEFAULT_POLL.to_string();
    }
}

const MIGRATIONS: &[(Version, fn(&mut MenuRecord))] = &[
    ((1, 13, 6), fix_1_13_6),
    ((1, 14, 0), fix_1_14_0),
    ((1, 15, 0), fix_1_15_0),
];

/// Brings a document up to the current layout. Documents from a newer or
/// unparseable version are left alone.
pub fn migrate(document: &mut ExportDocument) {
    let current = parse_version(FORMAT_VERSION).unwrap_or((0, 0, 0));
    let Some(version) = parse_version(&document.version) else {
        warn!(version = %document.version, "unreadable export version, skipping migrations");
        return;
    };
    if version > current {
        debug!(version = %document.version, "document is newer than this reader, skipping migrations");
        return;
    }
    for (target, fix) in MIGRATIONS {
        if version < *target {
            for record in &mut document.menus {
                fix(record);
            }
        }
    }
    document.version = FORMAT_VERSION.to_string();
}

fn build_menu(record: MenuRecord, uid: Uid, name: String, mode: MenuMode) -> MenuItem {
    let mut menu = MenuItem::new(uid, name, mode);
    match record.hotkey.parse::<Hotkey>() {
        Ok(hotkey) => menu.set_hotkey(hotkey),
        Err(e) => warn!(menu = %record.name, "dropping hotkey: {}", e),
    }
    menu.set_open_mode(record.open_mode.parse().unwrap_or_default());
    menu.drag_dir = record
        .drag_dir
        .as_deref()
        .and_then(|dir| dir.parse().ok())
        .unwrap_or_default();
    menu.km_name = record.km_name;
    menu.enabled = record.enabled.unwrap_or(true);
    menu.tag = record.tag;
    menu.poll_cmd = record.poll_cmd;
    if !record.data.is_empty() {
        menu.data = record.data;
    }
    menu.slots = record.slots.into_iter().map(SlotRecord::into_slot).collect();
    menu
}

/// Imports a document into `collection`, registering hotkeys as menus arrive.
///
/// Menus of an unknown mode or without a name are skipped.
pub fn import(
    collection: &mut MenuCollection,
    host: &mut dyn KeymapHost,
    mut document: ExportDocument,
    policy: ConflictPolicy,
) -> Result<ImportReport> {
    migrate(&mut document);
    let mut report = ImportReport::default();
    for record in document.menus {
        let Ok(mode) = record.mode.parse::<MenuMode>() else {
            warn!(menu = %record.name, mode = %record.mode, "unknown menu mode, skipping");
            report.skipped.push(record.name);
            continue;
        };
        if record.name.trim().is_empty() {
            warn!(mode = %record.mode, "unnamed menu, skipping");
            report.skipped.push(record.name);
            continue;
        }
        let existing = collection.uid_of(&record.name).cloned();
        let (uid, name, replaced) = match (existing, policy) {
            (None, _) => (collection.new_uid(mode), record.name.clone(), false),
            (Some(_), ConflictPolicy::Skip) => {
                report.skipped.push(record.name);
                continue;
            }
            (Some(_), ConflictPolicy::Rename) => {
                (collection.new_uid(mode), collection.unique_name(&record.name), false)
            }
            (Some(uid), ConflictPolicy::Replace) => {
                let old = collection.remove(host, &uid)?;
                let uid = if old.mode() == mode { uid } else { collection.new_uid(mode) };
                (uid, record.name.clone(), true)
            }
        };
        let menu = build_menu(record, uid.clone(), name, mode);
        collection.insert_item(host, menu);
        if replaced {
            report.replaced.push(uid);
        } else {
            report.added.push(uid);
        }
    }
    Ok(report)
}

pub fn import_json(
    collection: &mut MenuCollection,
    host: &mut dyn KeymapHost,
    json: &str,
    policy: ConflictPolicy,
) -> Result<ImportReport> {
    import(collection, host, ExportDocument::from_json(json)?, policy)
}
