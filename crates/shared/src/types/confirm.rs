//! Operator confirmation for destructive actions.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Whether the operator explicitly confirmed a destructive action.
///
/// Deleting an invoice, restoring a backup, or resetting all data is only
/// issued to the store when this is `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    /// The operator confirmed the action.
    Confirmed,
    /// No confirmation was given.
    #[default]
    Unconfirmed,
}

impl Confirmation {
    /// Builds a confirmation from a boolean flag (e.g. a `?confirm=true` query).
    #[must_use]
    pub const fn from_flag(confirmed: bool) -> Self {
        if confirmed { Self::Confirmed } else { Self::Unconfirmed }
    }

    /// Returns true if the operator confirmed.
    #[must_use]
    pub const fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// Fails with `AppError::ConfirmationRequired` unless confirmed.
    pub fn require(self, action: &str) -> AppResult<()> {
        if self.is_confirmed() {
            Ok(())
        } else {
            Err(AppError::ConfirmationRequired(action.to_string()))
        }
    }
}
