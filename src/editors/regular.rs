use crate::menu::MenuMode;
use crate::props::SchemaRegistry;

use super::Editor;

pub struct RegularMenuEditor;

impl Editor for RegularMenuEditor {
    fn mode(&self) -> MenuMode {
        MenuMode::Rmenu
    }

    fn register_props(&self, schema: &mut SchemaRegistry) {
        schema.register("rm", "rm_title", true);
    }
}
