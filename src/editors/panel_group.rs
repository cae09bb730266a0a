use crate::menu::{MenuMode, MenuSlot, SlotMode};
use crate::props::SchemaRegistry;

use super::Editor;

const SPACES: &[&str] = &[
    "VIEW_3D",
    "IMAGE_EDITOR",
    "NODE_EDITOR",
    "SEQUENCE_EDITOR",
    "CLIP_EDITOR",
    "PROPERTIES",
    "TEXT_EDITOR",
];
const REGIONS: &[&str] = &["TOOLS", "UI", "WINDOW", "HEADER"];

/// Panels registered into a host editor's side region.
pub struct PanelGroupEditor;

impl Editor for PanelGroupEditor {
    fn mode(&self) -> MenuMode {
        MenuMode::Panel
    }

    fn register_props(&self, schema: &mut SchemaRegistry) {
        schema.register("pg", "pg_context", "ANY");
        schema.register("pg", "pg_category", "My Category");
        schema.register_enum("pg", "pg_space", "VIEW_3D", SPACES);
        schema.register_enum("pg", "pg_region", "TOOLS", REGIONS);
        schema.register("pg", "pg_wicons", false);
    }

    // Each slot names a host panel by its identifier.
    fn default_pmi_data(&self) -> MenuSlot {
        MenuSlot::new(SlotMode::Custom, "", "")
    }

    fn supported_slot_modes(&self) -> &'static [SlotMode] {
        &[SlotMode::Custom, SlotMode::Menu]
    }

    fn supported_sub_menus(&self) -> &'static [MenuMode] {
        &[MenuMode::Dialog]
    }
}

/// Panel group that is never shown as a tab, only opened through other menus.
pub struct HiddenPanelGroupEditor;

impl Editor for HiddenPanelGroupEditor {
    fn mode(&self) -> MenuMode {
        MenuMode::Hpanel
    }

    fn default_pmi_data(&self) -> MenuSlot {
        MenuSlot::new(SlotMode::Custom, "", "")
    }

    fn supported_slot_modes(&self) -> &'static [SlotMode] {
        &[SlotMode::Custom]
    }

    fn supported_sub_menus(&self) -> &'static [MenuMode] {
        &[]
    }
}
