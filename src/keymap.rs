//! Hotkey lifecycle: keeps the host's native keymap entries in step with menus.
//!
//! Every menu with a hotkey owns one native entry per physical key in each of
//! its keymap contexts. Mouse buttons used as `key_mod` are not native
//! modifiers, so a shared, reference-counted tracking entry is installed for
//! each `(keymap, button)` pair in use. Contexts that do not exist yet are
//! parked and retried by [`HotkeyManager::poll_missing`].

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use crate::errors::HostError;
use crate::hotkey::{DragDir, Key, KeyValue, OpenMode};
use crate::id::Uid;
use crate::menu::MenuItem;

/// Operator that opens a menu by uid.
pub const INVOKE_OPERATOR: &str = "wm.pme_user_pie_menu_call";
/// Operator that tracks a mouse button held as a modifier.
pub const MOUSE_STATE_OPERATOR: &str = "pme.mouse_state";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KmiHandle(pub u64);

/// Field values of one native keymap entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeymapItemSpec {
    pub operator: &'static str,
    /// Menu the entry opens; `None` for shared tracking entries.
    pub menu: Option<Uid>,
    pub key: Key,
    pub value: KeyValue,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub oskey: bool,
    pub any: bool,
    /// Native keyboard modifier. Mouse-button modifiers never appear here.
    pub key_modifier: Key,
    pub direction: DragDir,
}

impl KeymapItemSpec {
    /// One spec per physical key of the menu's hotkey.
    pub fn for_menu(menu: &MenuItem) -> Vec<KeymapItemSpec> {
        let hotkey = menu.hotkey();
        let open_mode = menu.open_mode();
        let direction = if open_mode == OpenMode::ClickDrag {
            menu.drag_dir
        } else {
            DragDir::Any
        };
        let key_modifier = if hotkey.key_mod.is_mouse_button() {
            Key::None
        } else {
            hotkey.key_mod
        };
        hotkey
            .key
            .physical()
            .into_iter()
            .map(|key| KeymapItemSpec {
                operator: INVOKE_OPERATOR,
                menu: Some(menu.uid().clone()),
                key,
                value: open_mode.key_value(),
                ctrl: hotkey.ctrl,
                shift: hotkey.shift,
                alt: hotkey.alt,
                oskey: hotkey.oskey,
                any: hotkey.any,
                key_modifier,
                direction,
            })
            .collect()
    }

    pub fn mouse_state(button: Key) -> KeymapItemSpec {
        KeymapItemSpec {
            operator: MOUSE_STATE_OPERATOR,
            menu: None,
            key: button,
            value: KeyValue::Press,
            ctrl: false,
            shift: false,
            alt: false,
            oskey: false,
            any: true,
            key_modifier: Key::None,
            direction: DragDir::Any,
        }
    }
}

/// Native keymap capability of the host.
pub trait KeymapHost {
    /// False when running without a window manager.
    fn is_available(&self) -> bool;
    fn has_keymap(&self, keymap: &str) -> bool;
    fn add_item(&mut self, keymap: &str, spec: &KeymapItemSpec) -> Result<KmiHandle, HostError>;
    fn update_item(
        &mut self,
        keymap: &str,
        handle: KmiHandle,
        spec: &KeymapItemSpec,
    ) -> Result<(), HostError>;
    fn remove_item(&mut self, keymap: &str, handle: KmiHandle) -> Result<(), HostError>;
}

/// In-memory keymaps for headless sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeymaps {
    keymaps: BTreeMap<String, Vec<(KmiHandle, KeymapItemSpec)>>,
    unavailable: bool,
    next_handle: u64,
}

impl MemoryKeymaps {
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut keymaps = Self::default();
        for name in names {
            keymaps.add_keymap(name);
        }
        keymaps
    }

    /// A host without a window manager.
    pub fn headless() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn add_keymap(&mut self, name: &str) {
        self.keymaps.entry(name.to_string()).or_default();
    }

    pub fn items(&self, keymap: &str) -> &[(KmiHandle, KeymapItemSpec)] {
        self.keymaps.get(keymap).map_or(&[], Vec::as_slice)
    }

    pub fn item_count(&self) -> usize {
        self.keymaps.values().map(Vec::len).sum()
    }

    /// Entries opening `uid`, across all keymaps.
    pub fn items_for(&self, uid: &Uid) -> Vec<(&str, &KeymapItemSpec)> {
        self.keymaps
            .iter()
            .flat_map(|(name, items)| items.iter().map(move |(_, spec)| (name.as_str(), spec)))
            .filter(|(_, spec)| spec.menu.as_ref() == Some(uid))
            .collect()
    }
}

impl KeymapHost for MemoryKeymaps {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn has_keymap(&self, keymap: &str) -> bool {
        self.keymaps.contains_key(keymap)
    }

    fn add_item(&mut self, keymap: &str, spec: &KeymapItemSpec) -> Result<KmiHandle, HostError> {
        let items = self
            .keymaps
            .get_mut(keymap)
            .ok_or_else(|| HostError::MissingKeymap(keymap.to_string()))?;
        self.next_handle += 1;
        let handle = KmiHandle(self.next_handle);
        items.push((handle, spec.clone()));
        Ok(handle)
    }

    fn update_item(
        &mut self,
        keymap: &str,
        handle: KmiHandle,
        spec: &KeymapItemSpec,
    ) -> Result<(), HostError> {
        let item = self
            .keymaps
            .get_mut(keymap)
            .and_then(|items| items.iter_mut().find(|(h, _)| *h == handle))
            .ok_or(HostError::StaleHandle(handle.0))?;
        item.1 = spec.clone();
        Ok(())
    }

    fn remove_item(&mut self, keymap: &str, handle: KmiHandle) -> Result<(), HostError> {
        let items = self
            .keymaps
            .get_mut(keymap)
            .ok_or_else(|| HostError::MissingKeymap(keymap.to_string()))?;
        let index = items
            .iter()
            .position(|(h, _)| *h == handle)
            .ok_or(HostError::StaleHandle(handle.0))?;
        items.remove(index);
        Ok(())
    }
}

/// Native entries of one menu, by keymap name.
pub type Binding = BTreeMap<String, Vec<KmiHandle>>;

#[derive(Debug, Clone, Copy)]
struct MouseEntry {
    handle: KmiHandle,
    users: usize,
}

#[derive(Debug, Default)]
pub struct HotkeyManager {
    /// `Some(None)` marks a menu that is tracked but currently keyless.
    bindings: FxHashMap<Uid, Option<Binding>>,
    mouse_users: FxHashMap<Uid, BTreeSet<(String, Key)>>,
    mouse_entries: BTreeMap<(String, Key), MouseEntry>,
    missing: BTreeMap<Uid, BTreeSet<String>>,
    /// First poll that saw each parked menu.
    parked_since: FxHashMap<Uid, f64>,
    reported: FxHashSet<Uid>,
    available: Option<bool>,
    default_keymap: String,
    wait_secs: f64,
    safe_mode: bool,
}

impl HotkeyManager {
    pub fn new(default_keymap: impl Into<String>, wait_secs: f64) -> Self {
        Self {
            default_keymap: default_keymap.into(),
            wait_secs,
            ..Default::default()
        }
    }

    /// In safe mode mouse-button modifiers get no state-tracking entries.
    /// The hotkey itself is still registered.
    pub fn with_safe_mode(mut self, safe_mode: bool) -> Self {
        self.safe_mode = safe_mode;
        self
    }

    pub fn default_keymap(&self) -> &str {
        &self.default_keymap
    }

    // Probed once; a host without a window manager stays unavailable for the session.
    fn available(&mut self, host: &dyn KeymapHost) -> bool {
        *self.available.get_or_insert_with(|| {
            let available = host.is_available();
            if !available {
                info!("native keymaps unavailable, hotkey registration disabled");
            }
            available
        })
    }

    /// Creates or refreshes the native entries of `menu`.
    ///
    /// `contexts` restricts the pass to the named keymaps; `None` targets all of
    /// the menu's keymaps and drops entries in keymaps it no longer names.
    pub fn register(&mut self, host: &mut dyn KeymapHost, menu: &MenuItem, contexts: Option<&[String]>) {
        if !self.available(host) || !menu.enabled() || !menu.has_hotkey() {
            return;
        }
        let uid = menu.uid().clone();
        let targets = match contexts {
            Some(contexts) => contexts.to_vec(),
            None => menu.keymaps(&self.default_keymap),
        };
        let specs = KeymapItemSpec::for_menu(menu);
        let mut binding = self
            .bindings
            .remove(&uid)
            .flatten()
            .unwrap_or_default();

        if contexts.is_none() {
            let stale: Vec<String> = binding
                .keys()
                .filter(|name| !targets.contains(name))
                .cloned()
                .collect();
            for name in stale {
                if let Some(handles) = binding.remove(&name) {
                    remove_handles(host, &name, &handles);
                }
            }
            if let Some(parked) = self.missing.get_mut(&uid) {
                parked.retain(|name| targets.contains(name));
            }
        }

        for name in &targets {
            if !host.has_keymap(name) {
                debug!(menu = %uid, keymap = %name, "keymap missing, parking hotkey");
                self.missing.entry(uid.clone()).or_default().insert(name.clone());
                continue;
            }
            let handles = binding.remove(name).unwrap_or_default();
            let handles = sync_handles(host, name, handles, &specs);
            if !handles.is_empty() {
                binding.insert(name.clone(), handles);
            }
            if let Some(parked) = self.missing.get_mut(&uid) {
                parked.remove(name);
            }
        }
        if self.missing.get(&uid).is_some_and(BTreeSet::is_empty) {
            self.missing.remove(&uid);
            self.parked_since.remove(&uid);
            self.reported.remove(&uid);
        }

        let wanted: BTreeSet<(String, Key)> = if menu.hotkey().has_mouse_modifier() && !self.safe_mode {
            binding
                .keys()
                .map(|name| (name.clone(), menu.hotkey().key_mod))
                .collect()
        } else {
            BTreeSet::new()
        };
        self.set_mouse_modifiers(host, &uid, wanted);
        self.bindings.insert(uid, Some(binding));
    }

    /// Removes every native entry of `uid`. Does nothing for untracked menus.
    pub fn unregister(&mut self, host: &mut dyn KeymapHost, uid: &Uid) {
        if let Some(Some(binding)) = self.bindings.remove(uid) {
            for (name, handles) in &binding {
                remove_handles(host, name, handles);
            }
        }
        self.set_mouse_modifiers(host, uid, BTreeSet::new());
        self.missing.remove(uid);
        self.parked_since.remove(uid);
        self.reported.remove(uid);
    }

    /// Brings the entries of `menu` in line with its current fields.
    pub fn sync(&mut self, host: &mut dyn KeymapHost, menu: &MenuItem) {
        if menu.enabled() && menu.has_hotkey() {
            self.register(host, menu, None);
        } else if menu.enabled() && menu.mode().has_hotkey() && self.is_tracked(menu.uid()) {
            self.unregister(host, menu.uid());
            self.bindings.insert(menu.uid().clone(), None);
        } else {
            self.unregister(host, menu.uid());
        }
    }

    fn set_mouse_modifiers(
        &mut self,
        host: &mut dyn KeymapHost,
        uid: &Uid,
        wanted: BTreeSet<(String, Key)>,
    ) {
        let current = self.mouse_users.remove(uid).unwrap_or_default();
        for key in current.difference(&wanted) {
            if let Some(entry) = self.mouse_entries.get_mut(key) {
                entry.users -= 1;
                if entry.users == 0 {
                    let handle = entry.handle;
                    self.mouse_entries.remove(key);
                    if let Err(e) = host.remove_item(&key.0, handle) {
                        debug!(keymap = %key.0, "mouse state entry already gone: {}", e);
                    }
                }
            }
        }
        let mut held = BTreeSet::new();
        for key in wanted {
            if current.contains(&key) {
                held.insert(key);
                continue;
            }
            if let Some(entry) = self.mouse_entries.get_mut(&key) {
                entry.users += 1;
                held.insert(key);
                continue;
            }
            match host.add_item(&key.0, &KeymapItemSpec::mouse_state(key.1)) {
                Ok(handle) => {
                    self.mouse_entries.insert(key.clone(), MouseEntry { handle, users: 1 });
                    held.insert(key);
                }
                Err(e) => warn!(keymap = %key.0, "failed to add mouse state entry: {}", e),
            }
        }
        if !held.is_empty() {
            self.mouse_users.insert(uid.clone(), held);
        }
    }

    /// Retries parked registrations whose keymaps now exist.
    ///
    /// Returns menus that passed the wait ceiling during this call; they stay
    /// parked and are reported once.
    pub fn poll_missing<'m>(
        &mut self,
        host: &mut dyn KeymapHost,
        menus: impl Fn(&Uid) -> Option<&'m MenuItem>,
        now: f64,
    ) -> Vec<Uid> {
        if self.missing.is_empty() {
            self.parked_since.clear();
            return Vec::new();
        }
        for uid in self.missing.keys() {
            self.parked_since.entry(uid.clone()).or_insert(now);
        }
        let parked: Vec<(Uid, Vec<String>)> = self
            .missing
            .iter()
            .map(|(uid, names)| (uid.clone(), names.iter().cloned().collect()))
            .collect();
        for (uid, names) in parked {
            let Some(menu) = menus(&uid) else {
                self.missing.remove(&uid);
                self.parked_since.remove(&uid);
                continue;
            };
            let ready: Vec<String> = names.into_iter().filter(|name| host.has_keymap(name)).collect();
            if !ready.is_empty() {
                self.register(host, menu, Some(&ready));
            }
        }

        let mut expired = Vec::new();
        for (uid, names) in &self.missing {
            let waited = self.parked_since.get(uid).map_or(0.0, |since| now - since);
            if waited >= self.wait_secs && self.reported.insert(uid.clone()) {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                warn!(menu = %uid, "keymaps not found: {}", names.join(", "));
                expired.push(uid.clone());
            }
        }
        expired
    }

    /// Unregisters everything.
    pub fn clear(&mut self, host: &mut dyn KeymapHost) {
        let uids: Vec<Uid> = self
            .bindings
            .keys()
            .chain(self.mouse_users.keys())
            .chain(self.missing.keys())
            .cloned()
            .collect();
        for uid in uids {
            self.unregister(host, &uid);
        }
        self.bindings.clear();
        self.parked_since.clear();
    }

    pub fn is_tracked(&self, uid: &Uid) -> bool {
        self.bindings.contains_key(uid)
    }

    /// Tracked, but currently without a key.
    pub fn is_keyless(&self, uid: &Uid) -> bool {
        matches!(self.bindings.get(uid), Some(None))
    }

    pub fn binding(&self, uid: &Uid) -> Option<&Binding> {
        self.bindings.get(uid).and_then(Option::as_ref)
    }

    pub fn entry_count(&self, uid: &Uid) -> usize {
        self.binding(uid)
            .map_or(0, |binding| binding.values().map(Vec::len).sum())
    }

    pub fn parked(&self, uid: &Uid) -> Option<&BTreeSet<String>> {
        self.missing.get(uid)
    }

    pub fn is_parked(&self, uid: &Uid) -> bool {
        self.missing.contains_key(uid)
    }

    pub fn mouse_modifier_users(&self, keymap: &str, button: Key) -> usize {
        self.mouse_entries
            .get(&(keymap.to_string(), button))
            .map_or(0, |entry| entry.users)
    }
}

fn remove_handles(host: &mut dyn KeymapHost, keymap: &str, handles: &[KmiHandle]) {
    for handle in handles {
        if let Err(e) = host.remove_item(keymap, *handle) {
            debug!(keymap, "keymap entry already gone: {}", e);
        }
    }
}

// Updates in place when the entry count matches, otherwise recreates.
fn sync_handles(
    host: &mut dyn KeymapHost,
    keymap: &str,
    handles: Vec<KmiHandle>,
    specs: &[KeymapItemSpec],
) -> Vec<KmiHandle> {
    if handles.len() == specs.len() {
        let updated = handles
            .iter()
            .zip(specs)
            .all(|(handle, spec)| host.update_item(keymap, *handle, spec).is_ok());
        if updated {
            return handles;
        }
    }
    remove_handles(host, keymap, &handles);
    specs
        .iter()
        .filter_map(|spec| match host.add_item(keymap, spec) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(keymap, "failed to add keymap entry: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::Hotkey;
    use crate::id;
    use crate::menu::MenuMode;

    fn pie(key: Key) -> MenuItem {
        let mut menu = MenuItem::new(id::generate(MenuMode::Pmenu), "Pie", MenuMode::Pmenu);
        menu.set_hotkey(Hotkey::new(key).ctrl());
        menu
    }

    #[test]
    fn register_twice_is_a_refresh() {
        let mut host = MemoryKeymaps::new(["Window"]);
        let mut manager = HotkeyManager::new("Window", 10.0);
        let menu = pie(Key::A);
        manager.register(&mut host, &menu, None);
        manager.register(&mut host, &menu, None);
        assert_eq!(host.item_count(), 1);
        assert_eq!(manager.entry_count(menu.uid()), 1);
        manager.unregister(&mut host, menu.uid());
        assert_eq!(host.item_count(), 0);
        assert!(!manager.is_tracked(menu.uid()));
    }

    #[test]
    fn register_unregister_register_reproduces_entries() {
        let mut host = MemoryKeymaps::new(["Window"]);
        let mut manager = HotkeyManager::new("Window", 10.0);
        let menu = pie(Key::Q);
        manager.register(&mut host, &menu, None);
        let first: Vec<KeymapItemSpec> = host.items("Window").iter().map(|(_, s)| s.clone()).collect();
        manager.unregister(&mut host, menu.uid());
        manager.register(&mut host, &menu, None);
        let second: Vec<KeymapItemSpec> = host.items("Window").iter().map(|(_, s)| s.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn unregister_untracked_is_noop() {
        let mut host = MemoryKeymaps::new(["Window"]);
        let mut manager = HotkeyManager::new("Window", 10.0);
        manager.unregister(&mut host, &Uid::from_raw("pm_aaaaaaaa"));
        assert_eq!(host.item_count(), 0);
    }

    #[test]
    fn keyless_and_disabled_menus_register_nothing() {
        let mut host = MemoryKeymaps::new(["Window"]);
        let mut manager = HotkeyManager::new("Window", 10.0);
        let menu = pie(Key::None);
        manager.register(&mut host, &menu, None);
        let mut disabled = pie(Key::A);
        disabled.enabled = false;
        manager.register(&mut host, &disabled, None);
        assert_eq!(host.item_count(), 0);
    }

    #[test]
    fn multiple_keymaps_and_wheel() {
        let mut host = MemoryKeymaps::new(["Window", "3D View"]);
        let mut manager = HotkeyManager::new("Window", 10.0);
        let mut menu = pie(Key::Wheel);
        menu.km_name = "Window; 3D View".into();
        manager.register(&mut host, &menu, None);
        assert_eq!(host.items("Window").len(), 2);
        assert_eq!(host.items("3D View").len(), 2);
        assert_eq!(host.items("Window")[0].1.key, Key::WheelUpMouse);
        assert_eq!(host.items("Window")[1].1.key, Key::WheelDownMouse);

        menu.km_name = "3D View".into();
        manager.register(&mut host, &menu, None);
        assert!(host.items("Window").is_empty());
        assert_eq!(host.items("3D View").len(), 2);
    }

    #[test]
    fn drag_direction_only_for_click_drag() {
        let mut menu = pie(Key::A);
        menu.drag_dir = DragDir::North;
        menu.set_open_mode(OpenMode::Tweak);
        assert_eq!(KeymapItemSpec::for_menu(&menu)[0].direction, DragDir::Any);
        menu.set_open_mode(OpenMode::ClickDrag);
        let spec = &KeymapItemSpec::for_menu(&menu)[0];
        assert_eq!(spec.direction, DragDir::North);
        assert_eq!(spec.value, KeyValue::ClickDrag);
    }

    #[test]
    fn mouse_modifier_is_shared_and_released() {
        let mut host = MemoryKeymaps::new(["Window"]);
        let mut manager = HotkeyManager::new("Window", 10.0);
        let mut a = pie(Key::A);
        a.set_hotkey(Hotkey::new(Key::A).key_mod(Key::Button4Mouse));
        let mut b = pie(Key::B);
        b.set_hotkey(Hotkey::new(Key::B).key_mod(Key::Button4Mouse));
        manager.register(&mut host, &a, None);
        manager.register(&mut host, &b, None);
        assert_eq!(manager.mouse_modifier_users("Window", Key::Button4Mouse), 2);
        // two menu entries plus one shared tracking entry
        assert_eq!(host.item_count(), 3);
        assert_eq!(KeymapItemSpec::for_menu(&a)[0].key_modifier, Key::None);

        manager.unregister(&mut host, a.uid());
        assert_eq!(manager.mouse_modifier_users("Window", Key::Button4Mouse), 1);
        assert_eq!(host.item_count(), 2);
        manager.unregister(&mut host, b.uid());
        assert_eq!(host.item_count(), 0);
    }

    #[test]
    fn keyboard_key_mod_is_native() {
        let mut menu = pie(Key::A);
        menu.set_hotkey(Hotkey::new(Key::A).key_mod(Key::Space));
        assert_eq!(KeymapItemSpec::for_menu(&menu)[0].key_modifier, Key::Space);
    }

    #[test]
    fn deferred_registration_drains_when_keymap_appears() {
        let mut host = MemoryKeymaps::new(["Window"]);
        let mut manager = HotkeyManager::new("Window", 10.0);
        let mut menu = pie(Key::A);
        menu.km_name = "Sculpt".into();
        manager.register(&mut host, &menu, None);
        assert!(manager.is_parked(menu.uid()));
        assert_eq!(host.item_count(), 0);

        assert!(manager.poll_missing(&mut host, |_| Some(&menu), 0.0).is_empty());
        assert!(manager.is_parked(menu.uid()));

        host.add_keymap("Sculpt");
        manager.poll_missing(&mut host, |_| Some(&menu), 1.0);
        assert!(!manager.is_parked(menu.uid()));
        assert_eq!(host.items("Sculpt").len(), 1);
    }

    #[test]
    fn parked_menus_are_reported_once_after_ceiling() {
        let mut host = MemoryKeymaps::new(["Window"]);
        let mut manager = HotkeyManager::new("Window", 5.0);
        let mut menu = pie(Key::A);
        menu.km_name = "Nowhere".into();
        manager.register(&mut host, &menu, None);
        assert!(manager.poll_missing(&mut host, |_| Some(&menu), 100.0).is_empty());
        assert_eq!(manager.poll_missing(&mut host, |_| Some(&menu), 106.0), vec![menu.uid().clone()]);
        assert!(manager.poll_missing(&mut host, |_| Some(&menu), 107.0).is_empty());
        assert!(manager.is_parked(menu.uid()));
    }

    fn lookup<'m>(menus: &'m [MenuItem]) -> impl Fn(&Uid) -> Option<&'m MenuItem> + 'm {
        move |uid| menus.iter().find(|menu| menu.uid() == uid)
    }

    #[test]
    fn late_parked_menu_waits_its_own_ceiling() {
        let mut host = MemoryKeymaps::new(["Window"]);
        let mut manager = HotkeyManager::new("Window", 5.0);
        let mut menus = [pie(Key::A), pie(Key::B)];
        menus[0].km_name = "Nowhere".into();
        menus[1].km_name = "Elsewhere".into();
        let (first, second) = (menus[0].uid().clone(), menus[1].uid().clone());

        manager.register(&mut host, &menus[0], None);
        assert!(manager.poll_missing(&mut host, lookup(&menus), 0.0).is_empty());
        manager.register(&mut host, &menus[1], None);
        assert!(manager.poll_missing(&mut host, lookup(&menus), 4.0).is_empty());
        assert_eq!(manager.poll_missing(&mut host, lookup(&menus), 6.0), vec![first]);
        assert_eq!(manager.poll_missing(&mut host, lookup(&menus), 9.0), vec![second]);
    }

    #[test]
    fn safe_mode_skips_mouse_state_entries() {
        let mut host = MemoryKeymaps::new(["Window"]);
        let mut manager = HotkeyManager::new("Window", 10.0).with_safe_mode(true);
        let mut menu = pie(Key::A);
        menu.set_hotkey(Hotkey::new(Key::A).key_mod(Key::Button4Mouse));
        manager.register(&mut host, &menu, None);
        assert_eq!(host.item_count(), 1);
        assert_eq!(manager.mouse_modifier_users("Window", Key::Button4Mouse), 0);
    }

    #[test]
    fn headless_host_disables_registration() {
        let mut host = MemoryKeymaps::headless();
        let mut manager = HotkeyManager::new("Window", 10.0);
        let menu = pie(Key::A);
        manager.register(&mut host, &menu, None);
        assert!(!manager.is_tracked(menu.uid()));
        assert!(!manager.is_parked(menu.uid()));
    }

    #[test]
    fn sync_keeps_keyless_sentinel() {
        let mut host = MemoryKeymaps::new(["Window"]);
        let mut manager = HotkeyManager::new("Window", 10.0);
        let mut menu = pie(Key::A);
        manager.sync(&mut host, &menu);
        assert_eq!(host.item_count(), 1);
        menu.set_hotkey(Hotkey::default());
        manager.sync(&mut host, &menu);
        assert_eq!(host.item_count(), 0);
        assert!(manager.is_keyless(menu.uid()));
        menu.enabled = false;
        manager.sync(&mut host, &menu);
        assert!(!manager.is_tracked(menu.uid()));
    }
}
