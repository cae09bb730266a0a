use thiserror::Error as ThisError;

use crate::id::Uid;

/// Failures reported by a host collaborator (keymaps, draw handlers, timers).
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum HostError {
    /// The host has no window manager, so keymaps and draw handlers do not exist.
    #[error("host is running without a window manager")]
    Unavailable,
    #[error("keymap `{0}` does not exist")]
    MissingKeymap(String),
    /// The handle was already removed or never belonged to this host.
    #[error("stale host handle {0}")]
    StaleHandle(u64),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("menu `{0}` not found")]
    MenuNotFound(Uid),
    #[error("menu has no slot at index {0}")]
    SlotOutOfRange(usize),
    /// Menu names are lookup keys and may not be blank.
    #[error("menu name must not be empty")]
    EmptyName,
    #[error("invalid hotkey `{0}`")]
    InvalidHotkey(String),
    #[error("unknown {kind} `{value}`")]
    UnknownValue { kind: &'static str, value: String },
    #[error("invalid export document: {0}")]
    InvalidDocument(String),
    /// Raised when commit is attempted on an edit session that still has advisories.
    #[error("edit session has {0} unresolved advisories")]
    Advisories(usize),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownValue {
            kind,
            value: value.into(),
        }
    }
}
