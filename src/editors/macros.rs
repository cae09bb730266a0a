use crate::menu::{MenuMode, SlotMode};

use super::Editor;

/// Runs its slots one after another as a single operation.
pub struct MacroEditor;

impl Editor for MacroEditor {
    fn mode(&self) -> MenuMode {
        MenuMode::Macro
    }

    fn supported_slot_modes(&self) -> &'static [SlotMode] {
        &[SlotMode::Command, SlotMode::Menu]
    }

    fn supported_sub_menus(&self) -> &'static [MenuMode] {
        &[MenuMode::Modal, MenuMode::Sticky, MenuMode::Macro]
    }
}
