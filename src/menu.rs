//! In-memory menu model: menus, their slots, and tags.

use std::collections::BTreeSet;

use crate::hotkey::{string_enum, DragDir, Hotkey, Key, OpenMode};
use crate::id::{self, Uid};

string_enum! {
    /// Kind of user-defined menu.
    MenuMode, "menu mode" {
        Pmenu => "PMENU",
        Rmenu => "RMENU",
        Dialog => "DIALOG",
        Panel => "PANEL",
        Hpanel => "HPANEL",
        Script => "SCRIPT",
        Macro => "MACRO",
        Modal => "MODAL",
        Sticky => "STICKY",
        Property => "PROPERTY",
    }
}

impl MenuMode {
    /// Whether menus of this mode are opened through a hotkey.
    pub fn has_hotkey(&self) -> bool {
        !matches!(self, MenuMode::Panel | MenuMode::Hpanel | MenuMode::Property)
    }

    /// Type tag of this mode's encoded data record.
    pub fn data_type(&self) -> &'static str {
        id::prefix(*self)
    }
}

string_enum! {
    /// What a slot does when activated.
    SlotMode, "slot mode" {
        Empty => "EMPTY",
        Command => "COMMAND",
        Prop => "PROP",
        Menu => "MENU",
        Hotkey => "HOTKEY",
        Custom => "CUSTOM",
        Invoke => "INVOKE",
        Finish => "FINISH",
        Cancel => "CANCEL",
        Update => "UPDATE",
    }
}

impl Default for SlotMode {
    fn default() -> Self {
        SlotMode::Empty
    }
}

const ICON_ONLY: char = '#';
const ICON_HIDDEN: char = '!';
const ICON_CHECKBOX: char = '^';

/// Single-character flags embedded at the front of a slot's icon string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IconFlags {
    pub icon_only: bool,
    pub hidden: bool,
    pub checkbox: bool,
}

/// Splits `"#!MESH_CUBE"` into `("MESH_CUBE", flags)`.
pub fn parse_icon(icon: &str) -> (&str, IconFlags) {
    let mut flags = IconFlags::default();
    let name = icon.trim_start_matches(|c| match c {
        ICON_ONLY => {
            flags.icon_only = true;
            true
        }
        ICON_HIDDEN => {
            flags.hidden = true;
            true
        }
        ICON_CHECKBOX => {
            flags.checkbox = true;
            true
        }
        _ => false,
    });
    (name, flags)
}

pub fn format_icon(name: &str, flags: IconFlags) -> String {
    let mut icon = String::new();
    if flags.icon_only {
        icon.push(ICON_ONLY);
    }
    if flags.hidden {
        icon.push(ICON_HIDDEN);
    }
    if flags.checkbox {
        icon.push(ICON_CHECKBOX);
    }
    icon.push_str(name);
    icon
}

/// One entry of a menu.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MenuSlot {
    pub mode: SlotMode,
    /// Display label.
    pub name: String,
    /// Code, property path, submenu name, hotkey or draw code depending on `mode`.
    pub text: String,
    pub icon: String,
    pub enabled: bool,
}

impl MenuSlot {
    pub fn new(mode: SlotMode, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            mode,
            name: name.into(),
            text: text.into(),
            icon: String::new(),
            enabled: true,
        }
    }

    pub fn empty() -> Self {
        Self::new(SlotMode::Empty, "", "")
    }

    pub fn command(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(SlotMode::Command, name, code)
    }

    pub fn submenu(menu_name: impl Into<String>) -> Self {
        let menu_name = menu_name.into();
        Self::new(SlotMode::Menu, menu_name.clone(), menu_name)
    }

    pub fn is_empty(&self) -> bool {
        self.mode == SlotMode::Empty
    }

    pub fn icon_flags(&self) -> IconFlags {
        parse_icon(&self.icon).1
    }

    pub fn icon_name(&self) -> &str {
        parse_icon(&self.icon).0
    }
}

/// Hotkey-relevant fields, compared to decide whether a re-sync is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyFields {
    pub hotkey: Hotkey,
    pub open_mode: OpenMode,
    pub drag_dir: DragDir,
    pub km_name: String,
    pub enabled: bool,
}

/// A user-defined menu.
///
/// Not `Clone`: a copy is always made through [`MenuItem::duplicate`], which
/// requires a fresh uid.
#[derive(Debug, PartialEq)]
pub struct MenuItem {
    uid: Uid,
    name: String,
    mode: MenuMode,
    pub slots: Vec<MenuSlot>,
    hotkey: Hotkey,
    open_mode: OpenMode,
    pub drag_dir: DragDir,
    /// Keymap context names, `;`-separated.
    pub km_name: String,
    pub(crate) enabled: bool,
    /// Tag names, `,`-separated.
    pub tag: String,
    pub poll_cmd: String,
    /// Encoded record with mode-specific fields.
    pub data: String,
}

pub const DEFAULT_POLL: &str = "return True";

impl MenuItem {
    pub(crate) fn new(uid: Uid, name: impl Into<String>, mode: MenuMode) -> Self {
        Self {
            uid,
            name: name.into(),
            mode,
            slots: Vec::new(),
            hotkey: Hotkey::default(),
            open_mode: OpenMode::Press,
            drag_dir: DragDir::Any,
            km_name: String::new(),
            enabled: true,
            tag: String::new(),
            poll_cmd: DEFAULT_POLL.to_string(),
            data: format!("{}?", mode.data_type()),
        }
    }

    /// Structurally independent copy under a new identity.
    pub(crate) fn duplicate(&self, uid: Uid, name: impl Into<String>) -> Self {
        Self {
            uid,
            name: name.into(),
            mode: self.mode,
            slots: self.slots.to_vec(),
            hotkey: self.hotkey,
            open_mode: self.open_mode,
            drag_dir: self.drag_dir,
            km_name: self.km_name.clone(),
            enabled: self.enabled,
            tag: self.tag.clone(),
            poll_cmd: self.poll_cmd.clone(),
            data: self.data.clone(),
        }
    }

    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn mode(&self) -> MenuMode {
        self.mode
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn hotkey(&self) -> &Hotkey {
        &self.hotkey
    }

    pub fn open_mode(&self) -> OpenMode {
        self.open_mode
    }

    /// Sets the hotkey, keeping chord and open mode consistent.
    pub fn set_hotkey(&mut self, hotkey: Hotkey) {
        self.hotkey = hotkey;
        if !hotkey.chord.is_none() {
            self.open_mode = OpenMode::Chords;
        } else if self.open_mode == OpenMode::Chords {
            self.open_mode = OpenMode::Press;
        }
    }

    /// Sets the open mode. Entering chord mode assigns a default chord key,
    /// leaving it clears the chord.
    pub fn set_open_mode(&mut self, open_mode: OpenMode) {
        self.open_mode = open_mode;
        if open_mode == OpenMode::Chords {
            if self.hotkey.chord.is_none() {
                self.hotkey.chord = Key::A;
            }
        } else {
            self.hotkey.chord = Key::None;
        }
    }

    /// True when this menu should own native keymap entries.
    pub fn has_hotkey(&self) -> bool {
        self.mode.has_hotkey() && !self.hotkey.is_none()
    }

    /// Keymap context names, falling back to `default` when none are set.
    pub fn keymaps(&self, default: &str) -> Vec<String> {
        let names: Vec<String> = self
            .km_name
            .split(';')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            vec![default.to_string()]
        } else {
            names
        }
    }

    pub fn hotkey_fields(&self) -> HotkeyFields {
        HotkeyFields {
            hotkey: self.hotkey,
            open_mode: self.open_mode,
            drag_dir: self.drag_dir,
            km_name: self.km_name.clone(),
            enabled: self.enabled,
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tag.split(',').map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().any(|t| t == tag)
    }

    pub fn add_tag(&mut self, tag: &str) {
        if tag.is_empty() || self.has_tag(tag) {
            return;
        }
        let mut tags: Vec<&str> = self.tags().collect();
        tags.push(tag);
        self.tag = tags.join(", ");
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tag = self
            .tags()
            .filter(|t| *t != tag)
            .collect::<Vec<_>>()
            .join(", ");
    }

    pub fn rename_tag(&mut self, old: &str, new: &str) {
        if !self.has_tag(old) {
            return;
        }
        let already = self.has_tag(new);
        self.tag = self
            .tags()
            .filter_map(|t| match t {
                t if t == old => (!already).then_some(new),
                t => Some(t),
            })
            .collect::<Vec<_>>()
            .join(", ");
    }

    /// Names of the menus this menu's slots open.
    pub fn submenu_references(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|slot| slot.mode == SlotMode::Menu && !slot.text.is_empty())
            .map(|slot| slot.text.as_str())
    }
}

/// Process-wide set of tag names. Menus refer to tags by name only.
#[derive(Debug, Default, Clone)]
pub struct TagRegistry {
    tags: BTreeSet<String>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name`, returning false when it already existed.
    pub fn add(&mut self, name: &str) -> bool {
        let name = name.trim();
        !name.is_empty() && self.tags.insert(name.to_string())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.tags.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
