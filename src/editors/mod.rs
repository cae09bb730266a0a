//! Per-mode capability objects.
//!
//! Each [`Editor`] describes one [`MenuMode`]: its encoded-record fields, the
//! slot and sub-menu modes it supports, how its slot list is shaped, and
//! lifecycle hooks the collection calls around every change. All hooks default
//! to no-ops, and a mode without a registered editor behaves as if every hook
//! were a no-op.

mod dialog;
mod macros;
mod modal;
mod panel_group;
mod pie;
mod property;
mod regular;
mod script;
mod sticky;

pub use dialog::DialogEditor;
pub use macros::MacroEditor;
pub use modal::ModalEditor;
pub use panel_group::{HiddenPanelGroupEditor, PanelGroupEditor};
pub use pie::{PieMenuEditor, PIE_SLOTS};
pub use property::PropertyEditor;
pub use regular::RegularMenuEditor;
pub use script::StackKeyEditor;
pub use sticky::{StickyKeyEditor, PRESS_SLOT, RELEASE_SLOT};

use rustc_hash::FxHashMap;

use crate::menu::{MenuItem, MenuMode, MenuSlot, SlotMode};
use crate::props::SchemaRegistry;

/// Shape of a menu's slot list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotLayout {
    /// Slots are appended, reordered and removed freely.
    List,
    /// A fixed number of positions. Removing empties a position, moving swaps.
    Fixed(usize),
}

pub trait Editor {
    fn mode(&self) -> MenuMode;

    /// Registers this mode's encoded-record fields.
    fn register_props(&self, _schema: &mut SchemaRegistry) {}

    /// Slot created by "add slot".
    fn default_pmi_data(&self) -> MenuSlot {
        MenuSlot::command("", "")
    }

    fn supported_slot_modes(&self) -> &'static [SlotMode] {
        &[SlotMode::Command, SlotMode::Prop, SlotMode::Menu, SlotMode::Hotkey, SlotMode::Custom]
    }

    /// Menu modes a `MENU` slot of this mode may open.
    fn supported_sub_menus(&self) -> &'static [MenuMode] {
        &[MenuMode::Pmenu, MenuMode::Rmenu, MenuMode::Dialog, MenuMode::Script, MenuMode::Macro]
    }

    fn slot_layout(&self) -> SlotLayout {
        SlotLayout::List
    }

    /// Backfills defaults on a created or loaded menu. Must be idempotent.
    fn init_pm(&self, _menu: &mut MenuItem) {}

    fn on_pm_add(&self, _menu: &mut MenuItem) {}
    fn on_pm_remove(&self, _menu: &MenuItem) {}
    fn on_pm_rename(&self, _menu: &mut MenuItem, _old_name: &str) {}
    fn on_pm_duplicate(&self, _source: &MenuItem, _copy: &mut MenuItem) {}
    fn on_pm_enabled(&self, _menu: &mut MenuItem, _enabled: bool) {}

    fn on_pmi_add(&self, _menu: &mut MenuItem, _index: usize) {}
    fn on_pmi_move(&self, _menu: &mut MenuItem, _from: usize, _to: usize) {}
    fn on_pmi_remove(&self, _menu: &mut MenuItem, _index: usize) {}
    fn on_pmi_paste(&self, _menu: &mut MenuItem, _index: usize) {}
    fn on_pmi_toggle(&self, _menu: &mut MenuItem, _index: usize) {}
    fn on_pmi_edit(&self, _menu: &mut MenuItem, _index: usize) {}
}

/// Pads a fixed-layout menu to its slot count.
pub(crate) fn fill_slots(menu: &mut MenuItem, count: usize) {
    if menu.slots.len() < count {
        menu.slots.resize_with(count, MenuSlot::empty);
    }
}

#[derive(Default)]
pub struct EditorRegistry {
    editors: FxHashMap<MenuMode, Box<dyn Editor>>,
}

impl EditorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding one editor for every built-in mode.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PieMenuEditor));
        registry.register(Box::new(RegularMenuEditor));
        registry.register(Box::new(DialogEditor));
        registry.register(Box::new(PanelGroupEditor));
        registry.register(Box::new(HiddenPanelGroupEditor));
        registry.register(Box::new(StackKeyEditor));
        registry.register(Box::new(MacroEditor));
        registry.register(Box::new(ModalEditor));
        registry.register(Box::new(StickyKeyEditor));
        registry.register(Box::new(PropertyEditor));
        registry
    }

    /// Adds or replaces the editor for its mode.
    pub fn register(&mut self, editor: Box<dyn Editor>) {
        self.editors.insert(editor.mode(), editor);
    }

    pub fn get(&self, mode: MenuMode) -> Option<&dyn Editor> {
        self.editors.get(&mode).map(|editor| editor.as_ref())
    }

    pub fn register_props(&self, schema: &mut SchemaRegistry) {
        for editor in self.editors.values() {
            editor.register_props(schema);
        }
    }

    pub fn slot_layout(&self, mode: MenuMode) -> SlotLayout {
        self.get(mode)
            .map_or(SlotLayout::List, |editor| editor.slot_layout())
    }

    /// Unknown modes accept any slot mode.
    pub fn supports_slot_mode(&self, mode: MenuMode, slot_mode: SlotMode) -> bool {
        slot_mode == SlotMode::Empty
            || self
                .get(mode)
                .map_or(true, |editor| editor.supported_slot_modes().contains(&slot_mode))
    }

    pub fn supports_sub_menu(&self, mode: MenuMode, sub_mode: MenuMode) -> bool {
        self.get(mode)
            .map_or(true, |editor| editor.supported_sub_menus().contains(&sub_mode))
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn builtin_registry_covers_every_mode() {
        let registry = EditorRegistry::with_builtin();
        for &mode in MenuMode::ALL {
            assert_eq!(registry.get(mode).map(|e| e.mode()), Some(mode));
        }
        assert_eq!(registry.len(), MenuMode::ALL.len());
    }

    #[test]
    fn missing_editor_is_tolerated() {
        let registry = EditorRegistry::new();
        assert!(registry.get(MenuMode::Pmenu).is_none());
        assert_eq!(registry.slot_layout(MenuMode::Pmenu), SlotLayout::List);
        assert!(registry.supports_slot_mode(MenuMode::Pmenu, SlotMode::Invoke));
    }

    #[test]
    fn builtin_fields_are_registered() {
        let registry = EditorRegistry::with_builtin();
        let mut schema = SchemaRegistry::new();
        registry.register_props(&mut schema);
        for field in ["pm_radius", "rm_title", "pd_width", "pg_space", "s_undo", "md_block_ui", "lock", "sk_block_ui", "pr_save"] {
            assert!(schema.contains(field), "{field} missing");
        }
        assert_eq!(schema.get_int("pd?", "pd_width"), 300);
    }

    #[test]
    fn slot_modes_per_editor() {
        let registry = EditorRegistry::with_builtin();
        assert!(registry.supports_slot_mode(MenuMode::Modal, SlotMode::Invoke));
        assert!(!registry.supports_slot_mode(MenuMode::Pmenu, SlotMode::Invoke));
        assert!(registry.supports_slot_mode(MenuMode::Pmenu, SlotMode::Empty));
        assert!(!registry.supports_sub_menu(MenuMode::Pmenu, MenuMode::Panel));
    }

    struct Counting(Rc<Cell<usize>>);

    impl Editor for Counting {
        fn mode(&self) -> MenuMode {
            MenuMode::Rmenu
        }

        fn on_pm_add(&self, _menu: &mut MenuItem) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn register_replaces_existing_mode() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = EditorRegistry::with_builtin();
        registry.register(Box::new(Counting(Rc::clone(&calls))));
        let mut menu = MenuItem::new(id::generate(MenuMode::Rmenu), "R", MenuMode::Rmenu);
        if let Some(editor) = registry.get(MenuMode::Rmenu) {
            editor.on_pm_add(&mut menu);
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(registry.len(), MenuMode::ALL.len());
    }
}
