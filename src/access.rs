//! Access levels gating who may read or post in a channel.
//!
//! Levels are ordered: a session holding `Moderator` satisfies any
//! requirement of `Normal` or `Moderator`. Enforcement happens in the
//! collaborator that routes a session's message to a channel; the channel
//! itself only stores the required levels.

use serde::{Deserialize, Serialize};

/// Minimum capability a session must hold to read or post in a channel.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Baseline level held by every connected session.
    #[default]
    Normal,
    Moderator,
    Admin,
}

impl AccessLevel {
    /// Whether a session at this level satisfies `required`.
    pub fn permits(self, required: AccessLevel) -> bool {
        self >= required
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessLevel::Normal => write!(f, "normal"),
            AccessLevel::Moderator => write!(f, "moderator"),
            AccessLevel::Admin => write!(f, "admin"),
        }
    }
}
