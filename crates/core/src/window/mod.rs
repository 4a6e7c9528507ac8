//! Month window reducer.
//!
//! Every dashboard, fleet, labour and cashbook figure is the same reduction:
//! keep the records whose ISO date string starts with a `YYYY-MM` key, then
//! sum an amount, optionally grouped by a discriminant. The match is a plain
//! string prefix test, so a malformed date never matches and never errors.

pub mod month_key;
pub mod reducer;


pub use month_key::{MonthKey, MonthKeyError, parse_iso_date};
pub use reducer::{Dated, MonthWindow};
