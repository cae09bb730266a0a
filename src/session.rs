//! Draft editing of one menu with non-fatal validation.
//!
//! Problems found in a draft are [`Advisory`] values. They are shown next to
//! the draft and block [`EditSession::commit`], but never touch the committed
//! menu.

use std::fmt;

use crate::collection::MenuCollection;
use crate::errors::{Error, Result};
use crate::hotkey::{DragDir, Hotkey, OpenMode};
use crate::id::Uid;
use crate::keymap::KeymapHost;
use crate::menu::{MenuMode, MenuSlot, SlotMode, DEFAULT_POLL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    EmptyName,
    DuplicateName(String),
    InvalidHotkey(String),
    /// Chord key set without chord mode, or chord mode without a chord key.
    ChordMismatch,
    DanglingSubmenu { slot: usize, target: String },
    UnsupportedSubmenu { slot: usize, target: String, mode: MenuMode },
    UnsupportedSlot { slot: usize, mode: SlotMode },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::EmptyName => write!(f, "Name is empty"),
            Advisory::DuplicateName(name) => write!(f, "Name '{name}' is already used"),
            Advisory::InvalidHotkey(text) => write!(f, "Invalid hotkey '{text}'"),
            Advisory::ChordMismatch => write!(f, "Chord key and open mode disagree"),
            Advisory::DanglingSubmenu { slot, target } => {
                write!(f, "Slot {slot}: menu '{target}' not found")
            }
            Advisory::UnsupportedSubmenu { slot, target, mode } => {
                write!(f, "Slot {slot}: '{target}' is a {mode} and can't be opened here")
            }
            Advisory::UnsupportedSlot { slot, mode } => {
                write!(f, "Slot {slot}: {mode} slots are not supported")
            }
        }
    }
}

/// Editable copy of a menu's user-facing fields.
#[derive(Debug, Clone)]
pub struct EditSession {
    uid: Option<Uid>,
    mode: MenuMode,
    pub name: String,
    /// Hotkey in text form, e.g. `ctrl+shift+A`.
    pub hotkey: String,
    pub open_mode: OpenMode,
    pub drag_dir: DragDir,
    pub km_name: String,
    pub poll_cmd: String,
    pub tag: String,
    pub slots: Vec<MenuSlot>,
    advisories: Vec<Advisory>,
}

impl EditSession {
    /// Starts editing an existing menu.
    pub fn begin(collection: &MenuCollection, uid: &Uid) -> Result<Self> {
        let menu = collection
            .get(uid)
            .ok_or_else(|| Error::MenuNotFound(uid.clone()))?;
        Ok(Self {
            uid: Some(uid.clone()),
            mode: menu.mode(),
            name: menu.name().to_string(),
            hotkey: menu.hotkey().to_string(),
            open_mode: menu.open_mode(),
            drag_dir: menu.drag_dir,
            km_name: menu.km_name.clone(),
            poll_cmd: menu.poll_cmd.clone(),
            tag: menu.tag.clone(),
            slots: menu.slots.clone(),
            advisories: Vec::new(),
        })
    }

    /// Starts a draft for a menu that does not exist yet.
    pub fn create(name: impl Into<String>, mode: MenuMode) -> Self {
        Self {
            uid: None,
            mode,
            name: name.into(),
            hotkey: String::new(),
            open_mode: OpenMode::Press,
            drag_dir: DragDir::Any,
            km_name: String::new(),
            poll_cmd: DEFAULT_POLL.to_string(),
            tag: String::new(),
            slots: Vec::new(),
            advisories: Vec::new(),
        }
    }

    pub fn uid(&self) -> Option<&Uid> {
        self.uid.as_ref()
    }

    pub fn mode(&self) -> MenuMode {
        self.mode
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// Recomputes the advisories against the current collection.
    pub fn validate(&mut self, collection: &MenuCollection) -> &[Advisory] {
        let mut advisories = Vec::new();
        let name = self.name.trim();
        if name.is_empty() {
            advisories.push(Advisory::EmptyName);
        } else if collection
            .uid_of(name)
            .is_some_and(|owner| Some(owner) != self.uid.as_ref())
        {
            advisories.push(Advisory::DuplicateName(name.to_string()));
        }

        match self.hotkey.parse::<Hotkey>() {
            Ok(hotkey) => {
                if hotkey.chord.is_none() == (self.open_mode == OpenMode::Chords) && !hotkey.is_none() {
                    advisories.push(Advisory::ChordMismatch);
                }
            }
            Err(_) => advisories.push(Advisory::InvalidHotkey(self.hotkey.clone())),
        }

        let editors = collection.editors();
        for (index, slot) in self.slots.iter().enumerate() {
            if !editors.supports_slot_mode(self.mode, slot.mode) {
                advisories.push(Advisory::UnsupportedSlot {
                    slot: index,
                    mode: slot.mode,
                });
            }
            if slot.mode != SlotMode::Menu || slot.text.is_empty() || slot.text == name {
                continue;
            }
            match collection.by_name(&slot.text) {
                None => advisories.push(Advisory::DanglingSubmenu {
                    slot: index,
                    target: slot.text.clone(),
                }),
                Some(target) if !editors.supports_sub_menu(self.mode, target.mode()) => {
                    advisories.push(Advisory::UnsupportedSubmenu {
                        slot: index,
                        target: slot.text.clone(),
                        mode: target.mode(),
                    })
                }
                Some(_) => {}
            }
        }
        self.advisories = advisories;
        &self.advisories
    }

    /// Validates and writes the draft into the collection. Returns the menu's uid.
    pub fn commit(mut self, collection: &mut MenuCollection, host: &mut dyn KeymapHost) -> Result<Uid> {
        let count = self.validate(collection).len();
        if count > 0 {
            return Err(Error::Advisories(count));
        }
        let hotkey: Hotkey = self.hotkey.parse()?;
        // A new menu keeps the slots its editor created unless the draft has some.
        let keep_slots = self.uid.is_none() && self.slots.is_empty();
        let uid = match self.uid.take() {
            Some(uid) => {
                collection.rename(&uid, &self.name)?;
                uid
            }
            None => collection.add(host, &self.name, self.mode)?,
        };
        collection.edit(host, &uid, |menu| {
            menu.set_hotkey(hotkey);
            menu.set_open_mode(self.open_mode);
            menu.drag_dir = self.drag_dir;
            menu.km_name = self.km_name;
            menu.poll_cmd = self.poll_cmd;
            menu.tag = self.tag;
            if !keep_slots {
                menu.slots = self.slots;
            }
        })?;
        Ok(uid)
    }
}
