use crate::menu::{MenuItem, MenuMode, SlotMode};
use crate::props::SchemaRegistry;

use super::Editor;

/// Stack key: each press runs the next slot in turn.
pub struct StackKeyEditor;

impl Editor for StackKeyEditor {
    fn mode(&self) -> MenuMode {
        MenuMode::Script
    }

    fn register_props(&self, schema: &mut SchemaRegistry) {
        schema.register("s", "s_undo", false);
        schema.register("s", "s_state", false);
    }

    fn supported_slot_modes(&self) -> &'static [SlotMode] {
        &[SlotMode::Command, SlotMode::Hotkey]
    }

    fn supported_sub_menus(&self) -> &'static [MenuMode] {
        &[]
    }

    // A stack key always has something to run.
    fn on_pm_add(&self, menu: &mut MenuItem) {
        if menu.slots.is_empty() {
            menu.slots.push(self.default_pmi_data());
        }
    }
}
