//! Hotkey values: keys, modifier sets, open modes and their textual form.

use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result};

macro_rules! keys {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Host key identifier.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub enum Key {
            #[default]
            None,
            $($variant,)*
        }

        impl Key {
            pub const ALL: &'static [Key] = &[Key::None, $(Key::$variant,)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    Key::None => "NONE",
                    $(Key::$variant => $name,)*
                }
            }
        }

        impl FromStr for Key {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    "NONE" | "" => Ok(Key::None),
                    $($name => Ok(Key::$variant),)*
                    other => Err(Error::unknown("key", other)),
                }
            }
        }
    };
}

keys! {
    A => "A", B => "B", C => "C", D => "D", E => "E", F => "F", G => "G",
    H => "H", I => "I", J => "J", K => "K", L => "L", M => "M", N => "N",
    O => "O", P => "P", Q => "Q", R => "R", S => "S", T => "T", U => "U",
    V => "V", W => "W", X => "X", Y => "Y", Z => "Z",
    Zero => "ZERO", One => "ONE", Two => "TWO", Three => "THREE", Four => "FOUR",
    Five => "FIVE", Six => "SIX", Seven => "SEVEN", Eight => "EIGHT", Nine => "NINE",
    F1 => "F1", F2 => "F2", F3 => "F3", F4 => "F4", F5 => "F5", F6 => "F6",
    F7 => "F7", F8 => "F8", F9 => "F9", F10 => "F10", F11 => "F11", F12 => "F12",
    LeftCtrl => "LEFT_CTRL", LeftAlt => "LEFT_ALT", LeftShift => "LEFT_SHIFT",
    RightCtrl => "RIGHT_CTRL", RightAlt => "RIGHT_ALT", RightShift => "RIGHT_SHIFT",
    OsKey => "OSKEY",
    Esc => "ESC", Tab => "TAB", Ret => "RET", Space => "SPACE", BackSpace => "BACK_SPACE",
    Del => "DEL", Insert => "INSERT", Home => "HOME", End => "END",
    PageUp => "PAGE_UP", PageDown => "PAGE_DOWN",
    LeftArrow => "LEFT_ARROW", DownArrow => "DOWN_ARROW",
    RightArrow => "RIGHT_ARROW", UpArrow => "UP_ARROW",
    AccentGrave => "ACCENT_GRAVE", Minus => "MINUS", Equal => "EQUAL",
    LeftBracket => "LEFT_BRACKET", RightBracket => "RIGHT_BRACKET",
    SemiColon => "SEMI_COLON", Quote => "QUOTE", Comma => "COMMA",
    Period => "PERIOD", Slash => "SLASH", BackSlash => "BACK_SLASH",
    Numpad0 => "NUMPAD_0", Numpad1 => "NUMPAD_1", Numpad2 => "NUMPAD_2",
    Numpad3 => "NUMPAD_3", Numpad4 => "NUMPAD_4", Numpad5 => "NUMPAD_5",
    Numpad6 => "NUMPAD_6", Numpad7 => "NUMPAD_7", Numpad8 => "NUMPAD_8",
    Numpad9 => "NUMPAD_9", NumpadPlus => "NUMPAD_PLUS", NumpadMinus => "NUMPAD_MINUS",
    NumpadAsterix => "NUMPAD_ASTERIX", NumpadSlash => "NUMPAD_SLASH",
    NumpadPeriod => "NUMPAD_PERIOD", NumpadEnter => "NUMPAD_ENTER",
    LeftMouse => "LEFTMOUSE", MiddleMouse => "MIDDLEMOUSE", RightMouse => "RIGHTMOUSE",
    Button4Mouse => "BUTTON4MOUSE", Button5Mouse => "BUTTON5MOUSE",
    Button6Mouse => "BUTTON6MOUSE", Button7Mouse => "BUTTON7MOUSE",
    WheelUpMouse => "WHEELUPMOUSE", WheelDownMouse => "WHEELDOWNMOUSE",
    WheelInMouse => "WHEELINMOUSE", WheelOutMouse => "WHEELOUTMOUSE",
    // Pseudo-key: binds both wheel directions.
    Wheel => "WHEEL",
}

impl Key {
    pub fn is_none(&self) -> bool {
        *self == Key::None
    }

    pub fn is_mouse_button(&self) -> bool {
        matches!(
            self,
            Key::LeftMouse
                | Key::MiddleMouse
                | Key::RightMouse
                | Key::Button4Mouse
                | Key::Button5Mouse
                | Key::Button6Mouse
                | Key::Button7Mouse
        )
    }

    pub fn is_wheel(&self) -> bool {
        matches!(
            self,
            Key::WheelUpMouse | Key::WheelDownMouse | Key::WheelInMouse | Key::WheelOutMouse | Key::Wheel
        )
    }

    /// Physical keys a binding for this key expands into.
    pub fn physical(&self) -> Vec<Key> {
        match self {
            Key::Wheel => vec![Key::WheelUpMouse, Key::WheelDownMouse],
            Key::None => Vec::new(),
            other => vec![*other],
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)*
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::errors::Error;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)*
                    other => Err($crate::errors::Error::unknown($kind, other)),
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use string_enum;

string_enum! {
    /// How a menu's hotkey opens it.
    OpenMode, "open mode" {
        Press => "PRESS",
        Hold => "HOLD",
        DoubleClick => "DOUBLE_CLICK",
        Tweak => "TWEAK",
        Chords => "CHORDS",
        Click => "CLICK",
        ClickDrag => "CLICK_DRAG",
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        OpenMode::Press
    }
}

string_enum! {
    /// Drag direction for click-drag bindings.
    DragDir, "drag direction" {
        Any => "ANY",
        North => "NORTH",
        NorthEast => "NORTH_EAST",
        East => "EAST",
        SouthEast => "SOUTH_EAST",
        South => "SOUTH",
        SouthWest => "SOUTH_WEST",
        West => "WEST",
        NorthWest => "NORTH_WEST",
    }
}

impl Default for DragDir {
    fn default() -> Self {
        DragDir::Any
    }
}

/// Event value stored on a native keymap entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Press,
    Release,
    Click,
    DoubleClick,
    ClickDrag,
}

impl OpenMode {
    /// Native event value a binding in this mode listens for.
    ///
    /// Hold and chord detection happen after the press, in [`crate::key_state`].
    pub fn key_value(&self) -> KeyValue {
        match self {
            OpenMode::Press | OpenMode::Hold | OpenMode::Chords => KeyValue::Press,
            OpenMode::DoubleClick => KeyValue::DoubleClick,
            OpenMode::Click => KeyValue::Click,
            OpenMode::Tweak | OpenMode::ClickDrag => KeyValue::ClickDrag,
        }
    }
}

/// The hotkey fields of a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hotkey {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub oskey: bool,
    /// Matches regardless of modifier state.
    pub any: bool,
    /// Extra key held as a modifier. Mouse buttons need pseudo-modifier tracking.
    pub key_mod: Key,
    /// Second key of a chord; `None` unless the menu opens in chord mode.
    pub chord: Key,
}

impl Hotkey {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ..Default::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn key_mod(mut self, key: Key) -> Self {
        self.key_mod = key;
        self
    }

    pub fn is_none(&self) -> bool {
        self.key.is_none()
    }

    pub fn has_mouse_modifier(&self) -> bool {
        self.key_mod.is_mouse_button()
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_none() {
            return Ok(());
        }
        let flags = [
            (self.any, "any"),
            (self.ctrl, "ctrl"),
            (self.shift, "shift"),
            (self.alt, "alt"),
            (self.oskey, "oskey"),
        ];
        for (set, name) in flags {
            if set {
                write!(f, "{name}+")?;
            }
        }
        if !self.key_mod.is_none() {
            write!(f, "{}+", self.key_mod)?;
        }
        f.write_str(self.key.as_str())?;
        if !self.chord.is_none() {
            write!(f, ", {}", self.chord)?;
        }
        Ok(())
    }
}

impl FromStr for Hotkey {
    type Err = Error;

    /// Parses `"ctrl+shift+A"`, `"alt+MIDDLEMOUSE+W"` or `"ctrl+K, B"`.
    /// The empty string is the unbound hotkey.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut hotkey = Hotkey::default();
        if s.is_empty() {
            return Ok(hotkey);
        }
        let (combo, chord) = match s.split_once(',') {
            Some((combo, chord)) => (combo, Some(chord.trim())),
            None => (s, None),
        };
        let invalid = || Error::InvalidHotkey(s.to_string());
        let mut tokens: Vec<&str> = combo.split('+').map(str::trim).collect();
        let key = tokens.pop().filter(|t| !t.is_empty()).ok_or_else(invalid)?;
        hotkey.key = key.parse().map_err(|_| invalid())?;
        for token in tokens {
            match token.to_ascii_lowercase().as_str() {
                "ctrl" => hotkey.ctrl = true,
                "shift" => hotkey.shift = true,
                "alt" => hotkey.alt = true,
                "oskey" => hotkey.oskey = true,
                "any" => hotkey.any = true,
                _ => {
                    if !hotkey.key_mod.is_none() {
                        return Err(invalid());
                    }
                    hotkey.key_mod = token.parse().map_err(|_| invalid())?;
                }
            }
        }
        if let Some(chord) = chord {
            hotkey.chord = chord.parse().map_err(|_| invalid())?;
        }
        if hotkey.key.is_none() {
            return Err(invalid());
        }
        Ok(hotkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_round_trip() {
        for key in Key::ALL {
            assert_eq!(key.as_str().parse::<Key>().unwrap(), *key);
        }
        assert!("BANANA".parse::<Key>().is_err());
    }

    #[test]
    fn wheel_expands_to_two_physical_keys() {
        assert_eq!(Key::Wheel.physical(), vec![Key::WheelUpMouse, Key::WheelDownMouse]);
        assert_eq!(Key::A.physical(), vec![Key::A]);
        assert!(Key::None.physical().is_empty());
    }

    #[test]
    fn hotkey_text_form() {
        let hotkey: Hotkey = "ctrl+shift+A".parse().unwrap();
        assert_eq!(hotkey, Hotkey::new(Key::A).ctrl().shift());
        assert_eq!(hotkey.to_string(), "ctrl+shift+A");

        let hotkey: Hotkey = "alt+MIDDLEMOUSE+W".parse().unwrap();
        assert_eq!(hotkey.key_mod, Key::MiddleMouse);
        assert!(hotkey.has_mouse_modifier());
        assert_eq!(hotkey.to_string(), "alt+MIDDLEMOUSE+W");

        let hotkey: Hotkey = "ctrl+K, B".parse().unwrap();
        assert_eq!(hotkey.chord, Key::B);
        assert_eq!(hotkey.to_string(), "ctrl+K, B");

        assert_eq!("".parse::<Hotkey>().unwrap(), Hotkey::default());
        assert_eq!(Hotkey::default().to_string(), "");
    }

    #[test]
    fn hotkey_parse_errors() {
        assert!("ctrl+".parse::<Hotkey>().is_err());
        assert!("ctrl+BANANA".parse::<Hotkey>().is_err());
        assert!("A+B+C".parse::<Hotkey>().is_err());
        assert!("NONE".parse::<Hotkey>().is_err());
    }

    #[test]
    fn open_mode_native_values() {
        assert_eq!(OpenMode::Hold.key_value(), KeyValue::Press);
        assert_eq!(OpenMode::Chords.key_value(), KeyValue::Press);
        assert_eq!(OpenMode::Tweak.key_value(), KeyValue::ClickDrag);
        assert_eq!(OpenMode::DoubleClick.key_value(), KeyValue::DoubleClick);
        assert_eq!("CLICK_DRAG".parse::<OpenMode>().unwrap(), OpenMode::ClickDrag);
    }
}
