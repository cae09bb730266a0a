use crate::menu::{MenuItem, MenuMode, MenuSlot, SlotMode};
use crate::props::SchemaRegistry;

use super::{Editor, SlotLayout};

pub const PRESS_SLOT: usize = 0;
pub const RELEASE_SLOT: usize = 1;

/// Runs one slot when its key goes down and another when it comes up.
pub struct StickyKeyEditor;

impl Editor for StickyKeyEditor {
    fn mode(&self) -> MenuMode {
        MenuMode::Sticky
    }

    fn register_props(&self, schema: &mut SchemaRegistry) {
        schema.register("sk", "sk_block_ui", false);
    }

    fn supported_slot_modes(&self) -> &'static [SlotMode] {
        &[SlotMode::Command, SlotMode::Hotkey]
    }

    fn supported_sub_menus(&self) -> &'static [MenuMode] {
        &[]
    }

    fn slot_layout(&self) -> SlotLayout {
        SlotLayout::Fixed(2)
    }

    fn init_pm(&self, menu: &mut MenuItem) {
        let names = ["On Press", "On Release"];
        while menu.slots.len() < names.len() {
            let name = names[menu.slots.len()];
            menu.slots.push(MenuSlot::command(name, ""));
        }
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
    fn press_and_release_slots() {
        let mut menu = MenuItem::new(id::generate(MenuMode::Sticky), "Sticky", MenuMode::Sticky);
        StickyKeyEditor.on_pm_add(&mut menu);
        assert_eq!(menu.slots.len(), 2);
        assert_eq!(menu.slots[PRESS_SLOT].name, "On Press");
        assert_eq!(menu.slots[RELEASE_SLOT].name, "On Release");
    }
}
