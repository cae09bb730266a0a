use crate::menu::{MenuMode, MenuSlot, SlotMode};
use crate::props::SchemaRegistry;

use super::Editor;

pub struct DialogEditor;

impl Editor for DialogEditor {
    fn mode(&self) -> MenuMode {
        MenuMode::Dialog
    }

    fn register_props(&self, schema: &mut SchemaRegistry) {
        schema.register("pd", "pd_title", true);
        schema.register("pd", "pd_box", true);
        schema.register("pd", "pd_expand", false);
        schema.register("pd", "pd_panel", 1);
        schema.register("pd", "pd_auto_close", false);
        schema.register("pd", "pd_width", 300);
    }

    // New dialog rows start as a property widget.
    fn default_pmi_data(&self) -> MenuSlot {
        MenuSlot::new(SlotMode::Prop, "", "")
    }

    fn supported_sub_menus(&self) -> &'static [MenuMode] {
        &[MenuMode::Pmenu, MenuMode::Rmenu, MenuMode::Dialog, MenuMode::Panel, MenuMode::Hpanel, MenuMode::Script, MenuMode::Macro]
    }
}
