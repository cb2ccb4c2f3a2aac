//! Per-user reporting mode.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use thiserror::Error;

pub type UserId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConversationMode {
    #[default]
    Now,
    Forecast,
    /// Describes a user who never chose a mode. Never stored.
    Unset,
}

impl ConversationMode {
    /// Decode an inline button payload.
    pub fn from_button(data: &str) -> Option<Self> {
        match data {
            "now" => Some(ConversationMode::Now),
            "week" => Some(ConversationMode::Forecast),
            _ => None,
        }
    }

    pub fn button_data(&self) -> Option<&'static str> {
        match self {
            ConversationMode::Now => Some("now"),
            ConversationMode::Forecast => Some("week"),
            ConversationMode::Unset => None,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StateError {
    #[error("mode {0:?} cannot be selected")]
    NotSelectable(ConversationMode),
}

/// Key-value store mapping users to their reporting mode.
///
/// Implementations live for the whole process; entries never expire.
pub trait ModeStore: Send + Sync {
    /// Stored mode, or [`ConversationMode::Now`] for unknown users.
    fn get(&self, user: UserId) -> ConversationMode;

    /// Overwrite the user's mode. Only `Now` and `Forecast` are accepted.
    fn set(&self, user: UserId, mode: ConversationMode) -> Result<(), StateError>;
}

#[derive(Debug, Default)]
pub struct InMemoryModeStore {
    modes: RwLock<HashMap<UserId, ConversationMode>>,
}

impl InMemoryModeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.modes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModeStore for InMemoryModeStore {
    fn get(&self, user: UserId) -> ConversationMode {
        let modes = self.modes.read().unwrap_or_else(PoisonError::into_inner);
        modes.get(&user).copied().unwrap_or_default()
    }

    fn set(&self, user: UserId, mode: ConversationMode) -> Result<(), StateError> {
        if mode == ConversationMode::Unset {
            return Err(StateError::NotSelectable(mode));
        }

        let mut modes = self.modes.write().unwrap_or_else(PoisonError::into_inner);
        modes.insert(user, mode);
        Ok(())
    }
}
