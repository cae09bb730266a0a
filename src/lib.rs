//! Runtime for user-defined pie menus, popup dialogs, panels and macros.
//!
//! The crate keeps a [`MenuCollection`] of menus, each with a hotkey kept in
//! sync with the host's native keymaps, mode-specific fields stored in a
//! compact encoded record, and an ordered list of slots. Overlay panels are
//! laid out by [`GpuLayout`] and driven through [`OverlayPanel`].
//!
//! The host is reached only through small traits: [`KeymapHost`],
//! [`PanelHost`] and [`HostContext`]. In-memory implementations of each are
//! included and also serve sessions without a window manager.

pub mod collection;
pub mod color;
pub mod config;
pub mod context;
pub mod editors;
pub mod errors;
pub mod export;
pub mod hotkey;
pub mod id;
pub mod key_state;
pub mod keymap;
pub mod layout;
pub mod math;
pub mod menu;
pub mod panel;
pub mod props;
pub mod render_commands;
#[cfg(feature = "renderer")]
pub mod renderer;
pub mod session;
pub mod style;
pub mod text;

pub use collection::MenuCollection;
pub use color::Color;
pub use config::Settings;
pub use context::{HostContext, StaticContext};
pub use errors::{Error, HostError, Result};
pub use export::{export, import, import_json, ConflictPolicy, ExportDocument};
pub use hotkey::{DragDir, Hotkey, Key, OpenMode};
pub use id::Uid;
pub use keymap::{HotkeyManager, KeymapHost, MemoryKeymaps};
pub use layout::{Alignment, GpuLayout};
pub use menu::{MenuItem, MenuMode, MenuSlot, SlotMode};
pub use panel::{ActivePanels, MemoryPanelHost, ModalResult, OverlayPanel, PanelHost};
pub use session::{Advisory, EditSession};
