use crate::menu::{MenuMode, MenuSlot, SlotMode};
use crate::props::SchemaRegistry;

use super::Editor;

/// A user property; slots hold its getter, setter and update code.
pub struct PropertyEditor;

impl Editor for PropertyEditor {
    fn mode(&self) -> MenuMode {
        MenuMode::Property
    }

    fn register_props(&self, schema: &mut SchemaRegistry) {
        schema.register("pr", "pr_vector", true);
        schema.register("pr", "pr_mulsel", false);
        schema.register("pr", "pr_hor_exp", true);
        schema.register("pr", "pr_exp", true);
        schema.register("pr", "pr_save", true);
    }

    fn default_pmi_data(&self) -> MenuSlot {
        MenuSlot::new(SlotMode::Prop, "", "")
    }

    fn supported_slot_modes(&self) -> &'static [SlotMode] {
        &[SlotMode::Prop, SlotMode::Command]
    }

    fn supported_sub_menus(&self) -> &'static [MenuMode] {
        &[]
    }
}
