//! Cashbook ledger and cross-module mirroring.
//!
//! Every financial event recorded outside the cashbook form (invoice payment,
//! fuel purchase, driver advance) appends exactly one mirrored entry. Deleting
//! the source never deletes the mirror; the delete path reports a
//! [`ConsistencyWarning`] instead.

pub mod error;
pub mod mirror;
pub mod service;
pub mod types;

pub use error::CashbookError;
pub use mirror::CashbookMirror;
pub use service::CashbookService;
pub use types::{
    CashEntry, CashbookSummary, ConsistencyWarning, EntryKind, EntryStatus, MirrorInput,
    MirrorKind, MirrorRef, NewCashEntry, PaymentMode,
};
