use crate::menu::{MenuItem, MenuMode};
use crate::props::SchemaRegistry;

use super::{fill_slots, Editor, SlotLayout};

/// Pie positions: eight directions plus two extra slots.
pub const PIE_SLOTS: usize = 10;

pub struct PieMenuEditor;

impl Editor for PieMenuEditor {
    fn mode(&self) -> MenuMode {
        MenuMode::Pmenu
    }

    fn register_props(&self, schema: &mut SchemaRegistry) {
        schema.register("pm", "pm_radius", -1);
        schema.register("pm", "pm_confirm", -1);
        schema.register("pm", "pm_threshold", -1);
        schema.register("pm", "pm_flick", true);
    }

    fn supported_sub_menus(&self) -> &'static [MenuMode] {
        &[MenuMode::Pmenu, MenuMode::Rmenu, MenuMode::Dialog, MenuMode::Script, MenuMode::Macro, MenuMode::Sticky]
    }

    fn slot_layout(&self) -> SlotLayout {
        SlotLayout::Fixed(PIE_SLOTS)
    }

    fn init_pm(&self, menu: &mut MenuItem) {
        fill_slots(menu, PIE_SLOTS);
    }

    fn on_pm_add(&self, menu: &mut MenuItem) {
        self.init_pm(menu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id;

    #[test]
    fn pie_has_ten_slots_after_init() {
        let mut menu = MenuItem::new(id::generate(MenuMode::Pmenu), "Pie", MenuMode::Pmenu);
        PieMenuEditor.on_pm_add(&mut menu);
        assert_eq!(menu.slots.len(), PIE_SLOTS);
        assert!(menu.slots.iter().all(|slot| slot.is_empty()));
        PieMenuEditor.init_pm(&mut menu);
        assert_eq!(menu.slots.len(), PIE_SLOTS);
    }
}
