use crate::menu::{MenuItem, MenuMode, MenuSlot, SlotMode};
use crate::props::SchemaRegistry;

use super::Editor;

/// User-defined modal operator. Slots are its event handlers.
pub struct ModalEditor;

impl Editor for ModalEditor {
    fn mode(&self) -> MenuMode {
        MenuMode::Modal
    }

    fn register_props(&self, schema: &mut SchemaRegistry) {
        schema.register("md", "md_confirm", false);
        schema.register("md", "md_block_ui", true);
        schema.register("md", "lock", true);
    }

    fn default_pmi_data(&self) -> MenuSlot {
        MenuSlot::new(SlotMode::Hotkey, "", "")
    }

    fn supported_slot_modes(&self) -> &'static [SlotMode] {
        &[
            SlotMode::Command,
            SlotMode::Prop,
            SlotMode::Hotkey,
            SlotMode::Invoke,
            SlotMode::Finish,
            SlotMode::Cancel,
            SlotMode::Update,
        ]
    }

    fn supported_sub_menus(&self) -> &'static [MenuMode] {
        &[]
    }

    fn on_pm_add(&self, menu: &mut MenuItem) {
        if !menu.slots.iter().any(|slot| slot.mode == SlotMode::Invoke) {
            menu.slots.insert(0, MenuSlot::new(SlotMode::Invoke, "On Invoke", ""));
        }
    }
}
