//! The set of user menus and every side table that hangs off them.
//!
//! Side tables (hotkey bindings, compiled guards, tree expansion) are keyed by
//! [`Uid`]. Names are display values resolved through a single `name -> uid`
//! index, so a rename only touches the index and submenu links.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::config::Settings;
use crate::context::{GuardCache, GuardCompiler, HostContext, LiteralGuardCompiler};
use crate::editors::{EditorRegistry, SlotLayout};
use crate::errors::{Error, Result};
use crate::hotkey::Hotkey;
use crate::id::{self, Uid};
use crate::keymap::{HotkeyManager, KeymapHost};
use crate::menu::{MenuItem, MenuMode, MenuSlot, SlotMode, TagRegistry};
use crate::props::{PropValue, SchemaRegistry};

pub struct MenuCollection {
    menus: Vec<MenuItem>,
    by_name: FxHashMap<String, Uid>,
    schema: SchemaRegistry,
    editors: EditorRegistry,
    hotkeys: HotkeyManager,
    guards: GuardCache,
    compiler: Box<dyn GuardCompiler>,
    tags: TagRegistry,
    expanded: FxHashSet<Uid>,
    settings: Settings,
    renaming: bool,
}

fn find_mut<'a>(menus: &'a mut [MenuItem], uid: &Uid) -> Result<&'a mut MenuItem> {
    menus
        .iter_mut()
        .find(|menu| menu.uid() == uid)
        .ok_or_else(|| Error::MenuNotFound(uid.clone()))
}

fn check_index(menu: &MenuItem, index: usize) -> Result<()> {
    if index < menu.slots.len() {
        Ok(())
    } else {
        Err(Error::SlotOutOfRange(index))
    }
}

// Splits "Name.004" into ("Name", Some(4)).
fn split_numbered(name: &str) -> (&str, Option<u32>) {
    match name.rsplit_once('.') {
        Some((base, digits)) if digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()) => {
            (base, digits.parse().ok())
        }
        _ => (name, None),
    }
}

impl MenuCollection {
    pub fn new(settings: Settings) -> Self {
        Self::with_editors(settings, EditorRegistry::with_builtin())
    }

    pub fn with_editors(settings: Settings, editors: EditorRegistry) -> Self {
        let mut schema = SchemaRegistry::new();
        editors.register_props(&mut schema);
        Self {
            menus: Vec::new(),
            by_name: FxHashMap::default(),
            schema,
            editors,
            hotkeys: HotkeyManager::new(settings.default_keymap.clone(), settings.keymap_wait_secs)
                .with_safe_mode(settings.safe_mode),
            guards: GuardCache::new(),
            compiler: Box::new(LiteralGuardCompiler),
            tags: TagRegistry::new(),
            expanded: FxHashSet::default(),
            settings,
            renaming: false,
        }
    }

    pub fn set_guard_compiler(&mut self, compiler: Box<dyn GuardCompiler>) {
        self.compiler = compiler;
        self.guards.clear();
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn editors(&self) -> &EditorRegistry {
        &self.editors
    }

    pub fn hotkeys(&self) -> &HotkeyManager {
        &self.hotkeys
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn get(&self, uid: &Uid) -> Option<&MenuItem> {
        self.menus.iter().find(|menu| menu.uid() == uid)
    }

    pub fn by_name(&self, name: &str) -> Option<&MenuItem> {
        self.by_name.get(name).and_then(|uid| self.get(uid))
    }

    pub fn uid_of(&self, name: &str) -> Option<&Uid> {
        self.by_name.get(name)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MenuItem> {
        self.menus.iter()
    }

    pub fn len(&self) -> usize {
        self.menus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }

    /// `base` if free, otherwise the first free `base.001`, `base.002`, ...
    pub fn unique_name(&self, base: &str) -> String {
        self.free_name(base, None)
    }

    // Names held by `owner` count as free.
    fn free_name(&self, base: &str, owner: Option<&Uid>) -> String {
        let is_free = |name: &str| match self.by_name.get(name) {
            None => true,
            Some(uid) => Some(uid) == owner,
        };
        if is_free(base) {
            return base.to_string();
        }
        let (stem, _) = split_numbered(base);
        (1..)
            .map(|n| format!("{stem}.{n:03}"))
            .find(|candidate| is_free(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    pub(crate) fn new_uid(&self, mode: MenuMode) -> Uid {
        loop {
            let uid = id::generate(mode);
            if id::is_unique(&uid, self.menus.iter().map(MenuItem::uid)) {
                return uid;
            }
        }
    }

    /// Creates a menu and returns its uid. Taken names get a numeric suffix.
    pub fn add(&mut self, host: &mut dyn KeymapHost, name: &str, mode: MenuMode) -> Result<Uid> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        let uid = self.new_uid(mode);
        let mut menu = MenuItem::new(uid.clone(), self.unique_name(name), mode);
        if let Some(editor) = self.editors.get(mode) {
            editor.init_pm(&mut menu);
            editor.on_pm_add(&mut menu);
        }
        debug!(menu = %uid, name = menu.name(), "menu added");
        self.insert_item(host, menu);
        Ok(uid)
    }

    /// Adds a fully built menu, e.g. one read from an export document.
    pub(crate) fn insert_item(&mut self, host: &mut dyn KeymapHost, mut menu: MenuItem) {
        if let Some(editor) = self.editors.get(menu.mode()) {
            editor.init_pm(&mut menu);
        }
        for tag in menu.tags() {
            self.tags.add(tag);
        }
        self.by_name.insert(menu.name().to_string(), menu.uid().clone());
        self.hotkeys.sync(host, &menu);
        self.menus.push(menu);
    }

    pub fn remove(&mut self, host: &mut dyn KeymapHost, uid: &Uid) -> Result<MenuItem> {
        let index = self
            .menus
            .iter()
            .position(|menu| menu.uid() == uid)
            .ok_or_else(|| Error::MenuNotFound(uid.clone()))?;
        self.hotkeys.unregister(host, uid);
        self.guards.invalidate(uid);
        self.expanded.remove(uid);
        let menu = self.menus.remove(index);
        self.by_name.remove(menu.name());
        if let Some(editor) = self.editors.get(menu.mode()) {
            editor.on_pm_remove(&menu);
        }
        debug!(menu = %uid, name = menu.name(), "menu removed");
        Ok(menu)
    }

    /// Renames a menu and rewrites every submenu link that pointed at the old name.
    ///
    /// Returns the name actually assigned. A rename requested while another is
    /// in progress is ignored.
    pub fn rename(&mut self, uid: &Uid, new_name: &str) -> Result<String> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(Error::EmptyName);
        }
        let old_name = self
            .get(uid)
            .ok_or_else(|| Error::MenuNotFound(uid.clone()))?
            .name()
            .to_string();
        if self.renaming || old_name == new_name {
            return Ok(old_name);
        }
        let new_name = self.free_name(new_name, Some(uid));
        if new_name == old_name {
            return Ok(old_name);
        }
        self.renaming = true;

        for menu in &mut self.menus {
            for slot in &mut menu.slots {
                if slot.mode == SlotMode::Menu && slot.text == old_name {
                    slot.text = new_name.clone();
                }
            }
        }
        self.by_name.remove(&old_name);
        self.by_name.insert(new_name.clone(), uid.clone());
        let menu = find_mut(&mut self.menus, uid)?;
        menu.set_name(new_name.clone());
        if let Some(editor) = self.editors.get(menu.mode()) {
            editor.on_pm_rename(menu, &old_name);
        }
        self.renaming = false;
        debug!(menu = %uid, old = %old_name, new = %new_name, "menu renamed");
        Ok(new_name)
    }

    /// Copies a menu under a new uid and name. The copy starts without a hotkey.
    pub fn duplicate(&mut self, host: &mut dyn KeymapHost, uid: &Uid) -> Result<Uid> {
        let source = self.get(uid).ok_or_else(|| Error::MenuNotFound(uid.clone()))?;
        let new_uid = self.new_uid(source.mode());
        let mut copy = source.duplicate(new_uid.clone(), self.unique_name(source.name()));
        copy.set_hotkey(Hotkey::default());
        if let Some(editor) = self.editors.get(source.mode()) {
            editor.on_pm_duplicate(source, &mut copy);
        }
        self.insert_item(host, copy);
        Ok(new_uid)
    }

    pub fn set_enabled(&mut self, host: &mut dyn KeymapHost, uid: &Uid, enabled: bool) -> Result<()> {
        let menu = find_mut(&mut self.menus, uid)?;
        if menu.enabled == enabled {
            return Ok(());
        }
        menu.enabled = enabled;
        if let Some(editor) = self.editors.get(menu.mode()) {
            editor.on_pm_enabled(menu, enabled);
        }
        self.hotkeys.sync(host, menu);
        Ok(())
    }

    /// Edits menu fields, then re-syncs the hotkey and guard if they changed.
    pub fn edit<R>(
        &mut self,
        host: &mut dyn KeymapHost,
        uid: &Uid,
        f: impl FnOnce(&mut MenuItem) -> R,
    ) -> Result<R> {
        let menu = find_mut(&mut self.menus, uid)?;
        let fields = menu.hotkey_fields();
        let poll_cmd = menu.poll_cmd.clone();
        let tags = menu.tag.clone();
        let result = f(&mut *menu);
        if menu.hotkey_fields() != fields {
            self.hotkeys.sync(host, menu);
        }
        if menu.poll_cmd != poll_cmd {
            self.guards.invalidate(uid);
        }
        if menu.tag != tags {
            for tag in menu.tags() {
                self.tags.add(tag);
            }
        }
        Ok(result)
    }

    pub fn set_hotkey(&mut self, host: &mut dyn KeymapHost, uid: &Uid, hotkey: Hotkey) -> Result<()> {
        self.edit(host, uid, |menu| menu.set_hotkey(hotkey))
    }

    /// Encodes one mode-specific field into the menu's data record.
    pub fn set_prop(&mut self, uid: &Uid, field: &str, value: impl Into<PropValue>) -> Result<()> {
        let menu = find_mut(&mut self.menus, uid)?;
        menu.data = self.schema.encode(&menu.data, field, value);
        Ok(())
    }

    pub fn prop(&self, uid: &Uid, field: &str) -> Option<PropValue> {
        self.get(uid).and_then(|menu| self.schema.get(&menu.data, field))
    }

    /// Adds a slot, using the editor's default when `slot` is `None`.
    ///
    /// Fixed-layout menus fill their first empty position.
    pub fn add_slot(&mut self, uid: &Uid, slot: Option<MenuSlot>) -> Result<usize> {
        let menu = find_mut(&mut self.menus, uid)?;
        let editor = self.editors.get(menu.mode());
        let slot = slot
            .or_else(|| editor.map(|editor| editor.default_pmi_data()))
            .unwrap_or_else(|| MenuSlot::command("", ""));
        let index = match self.editors.slot_layout(menu.mode()) {
            SlotLayout::List => {
                menu.slots.push(slot);
                menu.slots.len() - 1
            }
            SlotLayout::Fixed(count) => {
                let index = menu
                    .slots
                    .iter()
                    .take(count)
                    .position(MenuSlot::is_empty)
                    .ok_or(Error::SlotOutOfRange(count))?;
                menu.slots[index] = slot;
                index
            }
        };
        if let Some(editor) = editor {
            editor.on_pmi_add(menu, index);
        }
        Ok(index)
    }

    /// Moves a slot. Fixed-layout menus swap the two positions.
    pub fn move_slot(&mut self, uid: &Uid, from: usize, to: usize) -> Result<()> {
        let menu = find_mut(&mut self.menus, uid)?;
        check_index(menu, from)?;
        check_index(menu, to)?;
        match self.editors.slot_layout(menu.mode()) {
            SlotLayout::List => {
                let slot = menu.slots.remove(from);
                menu.slots.insert(to, slot);
            }
            SlotLayout::Fixed(_) => menu.slots.swap(from, to),
        }
        if let Some(editor) = self.editors.get(menu.mode()) {
            editor.on_pmi_move(menu, from, to);
        }
        Ok(())
    }

    /// Removes a slot. Fixed-layout menus keep the position and empty it.
    pub fn remove_slot(&mut self, uid: &Uid, index: usize) -> Result<MenuSlot> {
        let menu = find_mut(&mut self.menus, uid)?;
        check_index(menu, index)?;
        let removed = match self.editors.slot_layout(menu.mode()) {
            SlotLayout::List => menu.slots.remove(index),
            SlotLayout::Fixed(_) => std::mem::replace(&mut menu.slots[index], MenuSlot::empty()),
        };
        if let Some(editor) = self.editors.get(menu.mode()) {
            editor.on_pmi_remove(menu, index);
        }
        Ok(removed)
    }

    /// Overwrites the slot at `index`, or appends when `index` is one past the end
    /// of a list-layout menu.
    pub fn paste_slot(&mut self, uid: &Uid, index: usize, slot: MenuSlot) -> Result<()> {
        let menu = find_mut(&mut self.menus, uid)?;
        let layout = self.editors.slot_layout(menu.mode());
        if index == menu.slots.len() && layout == SlotLayout::List {
            menu.slots.push(slot);
        } else {
            check_index(menu, index)?;
            menu.slots[index] = slot;
        }
        if let Some(editor) = self.editors.get(menu.mode()) {
            editor.on_pmi_paste(menu, index);
        }
        Ok(())
    }

    /// Flips a slot's enabled flag and returns the new state.
    pub fn toggle_slot(&mut self, uid: &Uid, index: usize) -> Result<bool> {
        let menu = find_mut(&mut self.menus, uid)?;
        check_index(menu, index)?;
        let enabled = !menu.slots[index].enabled;
        menu.slots[index].enabled = enabled;
        if let Some(editor) = self.editors.get(menu.mode()) {
            editor.on_pmi_toggle(menu, index);
        }
        Ok(enabled)
    }

    pub fn edit_slot(&mut self, uid: &Uid, index: usize, f: impl FnOnce(&mut MenuSlot)) -> Result<()> {
        let menu = find_mut(&mut self.menus, uid)?;
        check_index(menu, index)?;
        f(&mut menu.slots[index]);
        if let Some(editor) = self.editors.get(menu.mode()) {
            editor.on_pmi_edit(menu, index);
        }
        Ok(())
    }

    pub fn add_tag(&mut self, uid: &Uid, tag: &str) -> Result<()> {
        let tag = tag.trim();
        let menu = find_mut(&mut self.menus, uid)?;
        menu.add_tag(tag);
        self.tags.add(tag);
        Ok(())
    }

    pub fn untag(&mut self, uid: &Uid, tag: &str) -> Result<()> {
        find_mut(&mut self.menus, uid)?.remove_tag(tag);
        Ok(())
    }

    /// Renames a tag in the registry and on every menu carrying it.
    pub fn rename_tag(&mut self, old: &str, new: &str) {
        let new = new.trim();
        if new.is_empty() || old == new {
            return;
        }
        self.tags.remove(old);
        self.tags.add(new);
        for menu in &mut self.menus {
            menu.rename_tag(old, new);
        }
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.remove(tag);
        for menu in &mut self.menus {
            menu.remove_tag(tag);
        }
    }

    pub fn menus_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a MenuItem> + 'a {
        self.menus.iter().filter(move |menu| menu.has_tag(tag))
    }

    pub fn set_expanded(&mut self, uid: &Uid, expanded: bool) {
        if expanded {
            self.expanded.insert(uid.clone());
        } else {
            self.expanded.remove(uid);
        }
    }

    pub fn is_expanded(&self, uid: &Uid) -> bool {
        self.expanded.contains(uid)
    }

    /// Evaluates the menu's guard. Unknown menus fail; broken guards pass.
    pub fn poll(&mut self, uid: &Uid, ctx: &dyn HostContext) -> bool {
        let Some(menu) = self.menus.iter().find(|menu| menu.uid() == uid) else {
            return false;
        };
        self.guards
            .check(uid, &menu.poll_cmd, self.compiler.as_ref(), ctx, self.settings.debug)
    }

    /// Timer step for hotkeys waiting on a keymap. Returns menus reported as
    /// unresolved during this step.
    pub fn poll_deferred(&mut self, host: &mut dyn KeymapHost, now: f64) -> Vec<Uid> {
        let menus = &self.menus;
        self.hotkeys
            .poll_missing(host, |uid| menus.iter().find(|menu| menu.uid() == uid), now)
    }

    /// Registers hotkeys for every menu, e.g. after loading.
    pub fn register_all(&mut self, host: &mut dyn KeymapHost) {
        for menu in &self.menus {
            self.hotkeys.sync(host, menu);
        }
    }

    /// Removes every menu and all native entries.
    pub fn clear(&mut self, host: &mut dyn KeymapHost) {
        self.hotkeys.clear(host);
        self.guards.clear();
        self.expanded.clear();
        self.by_name.clear();
        self.menus.clear();
        self.schema.clear_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticContext;
    use crate::editors::PIE_SLOTS;
    use crate::hotkey::{Key, OpenMode};
    use crate::keymap::MemoryKeymaps;

    fn setup() -> (MenuCollection, MemoryKeymaps) {
        (
            MenuCollection::new(Settings::default()),
            MemoryKeymaps::new(["Window", "3D View"]),
        )
    }

    #[test]
    fn add_assigns_unique_names_and_uids() {
        let (mut menus, mut host) = setup();
        let a = menus.add(&mut host, "Pie", MenuMode::Pmenu).unwrap();
        let b = menus.add(&mut host, "Pie", MenuMode::Pmenu).unwrap();
        let c = menus.add(&mut host, "Pie.001", MenuMode::Pmenu).unwrap();
        assert_ne!(a, b);
        assert_eq!(menus.get(&b).unwrap().name(), "Pie.001");
        assert_eq!(menus.get(&c).unwrap().name(), "Pie.002");
        assert_eq!(menus.get(&a).unwrap().slots.len(), PIE_SLOTS);
        assert!(matches!(menus.add(&mut host, "  ", MenuMode::Rmenu), Err(Error::EmptyName)));
    }

    #[test]
    fn rename_rewrites_submenu_links() {
        let (mut menus, mut host) = setup();
        let sub = menus.add(&mut host, "Old", MenuMode::Rmenu).unwrap();
        let parent = menus.add(&mut host, "Parent", MenuMode::Pmenu).unwrap();
        let other = menus.add(&mut host, "Other", MenuMode::Rmenu).unwrap();
        menus.add_slot(&parent, Some(MenuSlot::submenu("Old"))).unwrap();
        menus.add_slot(&other, Some(MenuSlot::submenu("Old"))).unwrap();
        menus.add_slot(&other, Some(MenuSlot::command("Old", "Old"))).unwrap();

        assert_eq!(menus.rename(&sub, "New").unwrap(), "New");
        assert_eq!(menus.get(&parent).unwrap().slots[0].text, "New");
        assert_eq!(menus.get(&other).unwrap().slots[0].text, "New");
        assert_eq!(menus.get(&other).unwrap().slots[1].text, "Old");
        assert!(menus.by_name("Old").is_none());
        assert_eq!(menus.uid_of("New"), Some(&sub));
    }

    #[test]
    fn rename_keeps_hotkey_entries() {
        let (mut menus, mut host) = setup();
        let uid = menus.add(&mut host, "Pie", MenuMode::Pmenu).unwrap();
        menus.set_hotkey(&mut host, &uid, Hotkey::new(Key::Q).ctrl()).unwrap();
        assert_eq!(host.item_count(), 1);
        menus.rename(&uid, "Renamed").unwrap();
        assert_eq!(host.item_count(), 1);
        assert_eq!(menus.hotkeys().entry_count(&uid), 1);
    }

    #[test]
    fn duplicate_starts_keyless() {
        let (mut menus, mut host) = setup();
        let uid = menus.add(&mut host, "Pie", MenuMode::Pmenu).unwrap();
        menus.set_hotkey(&mut host, &uid, Hotkey::new(Key::W)).unwrap();
        menus.add_slot(&uid, Some(MenuSlot::command("Cube", "cube()"))).unwrap();
        let copy = menus.duplicate(&mut host, &uid).unwrap();
        let copy = menus.get(&copy).unwrap();
        assert_eq!(copy.name(), "Pie.001");
        assert!(copy.hotkey().is_none());
        assert_eq!(copy.slots[0].text, "cube()");
        assert_eq!(host.item_count(), 1);
    }

    #[test]
    fn enable_toggle_registers_and_unregisters() {
        let (mut menus, mut host) = setup();
        let uid = menus.add(&mut host, "Pie", MenuMode::Pmenu).unwrap();
        menus.set_hotkey(&mut host, &uid, Hotkey::new(Key::A)).unwrap();
        menus.set_enabled(&mut host, &uid, false).unwrap();
        assert_eq!(host.item_count(), 0);
        menus.set_enabled(&mut host, &uid, true).unwrap();
        assert_eq!(host.item_count(), 1);
    }

    #[test]
    fn remove_unregisters_first() {
        let (mut menus, mut host) = setup();
        let uid = menus.add(&mut host, "Pie", MenuMode::Pmenu).unwrap();
        menus.set_hotkey(&mut host, &uid, Hotkey::new(Key::A)).unwrap();
        menus.set_expanded(&uid, true);
        let removed = menus.remove(&mut host, &uid).unwrap();
        assert_eq!(removed.name(), "Pie");
        assert_eq!(host.item_count(), 0);
        assert!(!menus.is_expanded(&uid));
        assert!(menus.by_name("Pie").is_none());
        assert!(matches!(menus.remove(&mut host, &uid), Err(Error::MenuNotFound(_))));
    }

    #[test]
    fn edit_resyncs_only_on_hotkey_change() {
        let (mut menus, mut host) = setup();
        let uid = menus.add(&mut host, "Pie", MenuMode::Pmenu).unwrap();
        menus
            .edit(&mut host, &uid, |menu| {
                menu.set_hotkey(Hotkey::new(Key::E));
                menu.km_name = "3D View".into();
            })
            .unwrap();
        assert_eq!(host.items("3D View").len(), 1);
        assert!(host.items("Window").is_empty());
        menus
            .edit(&mut host, &uid, |menu| menu.set_open_mode(OpenMode::Chords))
            .unwrap();
        assert_eq!(menus.get(&uid).unwrap().hotkey().chord, Key::A);
        assert_eq!(host.item_count(), 1);
    }

    #[test]
    fn pie_slots_are_fixed_positions() {
        let (mut menus, mut host) = setup();
        let uid = menus.add(&mut host, "Pie", MenuMode::Pmenu).unwrap();
        assert_eq!(menus.add_slot(&uid, Some(MenuSlot::command("A", "a()"))).unwrap(), 0);
        assert_eq!(menus.add_slot(&uid, Some(MenuSlot::command("B", "b()"))).unwrap(), 1);
        menus.move_slot(&uid, 0, 5).unwrap();
        let pie = menus.get(&uid).unwrap();
        assert!(pie.slots[0].is_empty());
        assert_eq!(pie.slots[5].name, "A");
        menus.remove_slot(&uid, 5).unwrap();
        let pie = menus.get(&uid).unwrap();
        assert_eq!(pie.slots.len(), PIE_SLOTS);
        assert!(pie.slots[5].is_empty());
        for i in 0..PIE_SLOTS - 1 {
            menus.add_slot(&uid, Some(MenuSlot::command(format!("{i}"), ""))).unwrap();
        }
        assert!(matches!(menus.add_slot(&uid, None), Err(Error::SlotOutOfRange(_))));
    }

    #[test]
    fn list_slot_operations() {
        let (mut menus, mut host) = setup();
        let uid = menus.add(&mut host, "Menu", MenuMode::Rmenu).unwrap();
        menus.add_slot(&uid, Some(MenuSlot::command("A", ""))).unwrap();
        menus.add_slot(&uid, Some(MenuSlot::command("B", ""))).unwrap();
        menus.add_slot(&uid, None).unwrap();
        menus.move_slot(&uid, 0, 2).unwrap();
        let names: Vec<&str> = menus.get(&uid).unwrap().slots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["B", "", "A"]);
        assert_eq!(menus.remove_slot(&uid, 1).unwrap().name, "");
        menus.paste_slot(&uid, 2, MenuSlot::command("C", "")).unwrap();
        assert!(!menus.toggle_slot(&uid, 0).unwrap());
        menus.edit_slot(&uid, 1, |slot| slot.icon = "#MESH_CUBE".into()).unwrap();
        let menu = menus.get(&uid).unwrap();
        assert_eq!(menu.slots.len(), 3);
        assert!(!menu.slots[0].enabled);
        assert!(menu.slots[1].icon_flags().icon_only);
        assert!(matches!(menus.move_slot(&uid, 0, 9), Err(Error::SlotOutOfRange(9))));
    }

    #[test]
    fn tag_operations() {
        let (mut menus, mut host) = setup();
        let a = menus.add(&mut host, "A", MenuMode::Pmenu).unwrap();
        let b = menus.add(&mut host, "B", MenuMode::Rmenu).unwrap();
        menus.add_tag(&a, "Modeling").unwrap();
        menus.add_tag(&b, "Modeling").unwrap();
        menus.add_tag(&b, "Sculpt").unwrap();
        assert_eq!(menus.menus_with_tag("Modeling").count(), 2);
        menus.rename_tag("Modeling", "Mesh");
        assert_eq!(menus.menus_with_tag("Mesh").count(), 2);
        assert!(menus.tags().contains("Mesh") && !menus.tags().contains("Modeling"));
        menus.remove_tag("Mesh");
        assert_eq!(menus.get(&b).unwrap().tag, "Sculpt");
        menus.untag(&b, "Sculpt").unwrap();
        assert_eq!(menus.menus_with_tag("Sculpt").count(), 0);
    }

    #[test]
    fn poll_uses_cached_guard() {
        let (mut menus, mut host) = setup();
        let uid = menus.add(&mut host, "Pie", MenuMode::Pmenu).unwrap();
        let ctx = StaticContext {
            space_type: Some("VIEW_3D".into()),
            ..Default::default()
        };
        assert!(menus.poll(&uid, &ctx));
        menus
            .edit(&mut host, &uid, |menu| menu.poll_cmd = "space == 'IMAGE_EDITOR'".into())
            .unwrap();
        assert!(!menus.poll(&uid, &ctx));
        menus.edit(&mut host, &uid, |menu| menu.poll_cmd = "broken(".into()).unwrap();
        assert!(menus.poll(&uid, &ctx));
        assert!(!menus.poll(&Uid::from_raw("pm_zzzzzzzz"), &ctx));
    }

    #[test]
    fn props_go_through_the_schema() {
        let (mut menus, mut host) = setup();
        let uid = menus.add(&mut host, "Dialog", MenuMode::Dialog).unwrap();
        menus.set_prop(&uid, "pd_width", 420).unwrap();
        assert_eq!(menus.get(&uid).unwrap().data, "pd?pd_width=420");
        assert_eq!(menus.prop(&uid, "pd_width"), Some(PropValue::Int(420)));
        menus.set_prop(&uid, "pd_width", 300).unwrap();
        assert_eq!(menus.get(&uid).unwrap().data, "pd?");
    }

    #[test]
    fn clear_removes_everything() {
        let (mut menus, mut host) = setup();
        let uid = menus.add(&mut host, "Pie", MenuMode::Pmenu).unwrap();
        menus.set_hotkey(&mut host, &uid, Hotkey::new(Key::A)).unwrap();
        menus.clear(&mut host);
        assert!(menus.is_empty());
        assert_eq!(host.item_count(), 0);
        assert!(!menus.contains_name("Pie"));
        assert_eq!(menus.schema().cached_len(), 0);
    }

    #[test]
    fn rename_does_not_collide_with_own_name() {
        let (mut menus, mut host) = setup();
        menus.add(&mut host, "Pie", MenuMode::Pmenu).unwrap();
        let copy = menus.add(&mut host, "Pie", MenuMode::Pmenu).unwrap();
        assert_eq!(menus.get(&copy).unwrap().name(), "Pie.001");

        assert_eq!(menus.rename(&copy, "Pie").unwrap(), "Pie.001");
        assert_eq!(menus.get(&copy).unwrap().name(), "Pie.001");
        assert_eq!(menus.uid_of("Pie.001"), Some(&copy));
        assert!(!menus.contains_name("Pie.002"));
    }
}
