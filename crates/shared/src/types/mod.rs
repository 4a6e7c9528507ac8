//! Common types used across the application.

pub mod confirm;
pub mod id;
pub mod money;
pub mod pagination;

pub use confirm::Confirmation;
pub use id::*;
pub use money::{format_inr, round_to_rupee};
pub use pagination::{PageRequest, PageResponse};
