//! Mode-prefixed short identifiers for menus.
//!
//! A uid looks like `pm_k3x7qa2m`: the prefix names the menu mode, the tail is
//! eight random characters from the lowercase base32 alphabet. Generation does
//! not consult existing uids; [`is_unique`] is the check callers run before
//! committing a new menu.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::menu::MenuMode;

pub const SEPARATOR: char = '_';
pub const RANDOM_LEN: usize = 8;
const ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Stable identity of a menu. Survives rename; never shared between duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps a string without validating it. Use [`validate`] for untrusted input.
    pub fn from_raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn mode(&self) -> Option<MenuMode> {
        mode_of(&self.0)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Uid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn prefix(mode: MenuMode) -> &'static str {
    match mode {
        MenuMode::Pmenu => "pm",
        MenuMode::Rmenu => "rm",
        MenuMode::Dialog => "pd",
        MenuMode::Panel => "pg",
        MenuMode::Hpanel => "hpg",
        MenuMode::Script => "s",
        MenuMode::Macro => "mc",
        MenuMode::Modal => "md",
        MenuMode::Sticky => "sk",
        MenuMode::Property => "pr",
    }
}

fn mode_for_prefix(prefix: &str) -> Option<MenuMode> {
    MenuMode::ALL
        .iter()
        .copied()
        .find(|mode| self::prefix(*mode) == prefix)
}

/// Generates a new uid for `mode`.
pub fn generate(mode: MenuMode) -> Uid {
    let mut rng = rand::thread_rng();
    let tail: String = (0..RANDOM_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    Uid(format!("{}{}{}", prefix(mode), SEPARATOR, tail))
}

/// Splits a uid into `(prefix, random_part)` at the first separator.
pub fn parse(uid: &str) -> Option<(&str, &str)> {
    uid.split_once(SEPARATOR)
}

pub fn mode_of(uid: &str) -> Option<MenuMode> {
    parse(uid).and_then(|(prefix, _)| mode_for_prefix(prefix))
}

pub fn validate(uid: &str) -> bool {
    let Some((prefix, tail)) = parse(uid) else {
        return false;
    };
    mode_for_prefix(prefix).is_some()
        && tail.len() == RANDOM_LEN
        && tail.bytes().all(|b| ALPHABET.contains(&b))
}

/// True when no uid yielded by `existing` equals `uid`.
pub fn is_unique<'a>(uid: &Uid, existing: impl IntoIterator<Item = &'a Uid>) -> bool {
    existing.into_iter().all(|other| other != uid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn generated_uids_validate_for_every_mode() {
        for &mode in MenuMode::ALL {
            let uid = generate(mode);
            assert!(validate(uid.as_str()), "{uid} should validate");
            assert_eq!(mode_of(uid.as_str()), Some(mode));
            assert_eq!(uid.mode(), Some(mode));
        }
    }

    #[test]
    fn hidden_panel_prefix_is_not_confused_with_panel() {
        let uid = generate(MenuMode::Hpanel);
        assert!(uid.as_str().starts_with("hpg_"));
        assert_eq!(uid.mode(), Some(MenuMode::Hpanel));
    }

    #[test]
    fn no_collisions_in_ten_thousand() {
        let mut seen = FxHashSet::default();
        for _ in 0..10_000 {
            assert!(seen.insert(generate(MenuMode::Pmenu)));
        }
    }

    #[test]
    fn validate_rejects_malformed() {
        assert!(!validate("pmk3x7qa2m"));
        assert!(!validate("zz_k3x7qa2m"));
        assert!(!validate("pm_k3x7qa2"));
        assert!(!validate("pm_k3x7qa2mm"));
        assert!(!validate("pm_K3X7QA2M"));
        assert!(!validate("pm_k3x7qa1m"));
        assert!(validate("pm_k3x7qa2m"));
    }

    #[test]
    fn parse_splits_prefix() {
        assert_eq!(parse("sk_abcdefgh"), Some(("sk", "abcdefgh")));
        assert_eq!(parse("nothing"), None);
        assert_eq!(mode_of("md_abcdefgh"), Some(MenuMode::Modal));
        assert_eq!(mode_of("xx_abcdefgh"), None);
    }

    #[test]
    fn uniqueness_scan() {
        let a = Uid::from_raw("pm_aaaaaaaa");
        let b = Uid::from_raw("pm_bbbbbbbb");
        let existing = vec![a.clone()];
        assert!(!is_unique(&a, &existing));
        assert!(is_unique(&b, &existing));
    }
}
