//! Query parameters shared by several routes.

use serde::Deserialize;
use sitebook_core::window::MonthKey;
use sitebook_shared::types::Confirmation;
use sitebook_shared::{AppError, BusinessConfig};

use crate::ApiError;

/// `?confirm=true` on destructive requests.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    /// Operator confirmed the action.
    #[serde(default)]
    pub confirm: bool,
}

impl ConfirmQuery {
    /// The flag as a [`Confirmation`].
    #[must_use]
    pub const fn confirmation(&self) -> Confirmation {
        Confirmation::from_flag(self.confirm)
    }
}

/// `?month=YYYY-MM`; the current month when absent.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    /// Month key.
    pub month: Option<String>,
}

impl MonthQuery {
    /// Parses the month, defaulting to the current month in the business time zone.
    pub fn resolve(&self, business: &BusinessConfig) -> Result<MonthKey, ApiError> {
        resolve_month(self.month.as_deref(), business)
    }
}

/// Parses an optional month key, defaulting to the current month.
pub fn resolve_month(month: Option<&str>, business: &BusinessConfig) -> Result<MonthKey, ApiError> {
    match month {
        Some(key) => MonthKey::parse(key).map_err(|e| AppError::Validation(e.to_string()).into()),
        None => Ok(MonthKey::from_date(business.today()?)),
    }
}
