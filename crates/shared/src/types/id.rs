//! Typed IDs for type-safe document references.
//!
//! Using typed IDs prevents accidentally passing a `WorkerId` where an `InvoiceId` is expected.
//! Every ID is the document key the store generated for it, so `Display` must round-trip
//! through `FromStr`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The all-zero ID, marking a record stored before it had one.
            #[must_use]
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Whether this is the all-zero placeholder.
            #[must_use]
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Deterministic ID for the `index`-th id-less record under `owner`.
            ///
            /// The same inputs always give the same ID, so a record keeps its
            /// ID across reads until it is written back with it.
            #[must_use]
            pub fn derived(owner: &str, index: usize) -> Self {
                let name = format!("{}/{owner}/{index}", stringify!($name));
                Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(InvoiceId, "Unique identifier for an invoice.");
typed_id!(PaymentId, "Unique identifier for a payment recorded against an invoice.");
typed_id!(CashEntryId, "Unique identifier for a cashbook transaction.");
typed_id!(WorkEntryId, "Unique identifier for a fleet work entry.");
typed_id!(FuelRecordId, "Unique identifier for a fuel purchase on a vehicle.");
typed_id!(AdvanceRecordId, "Unique identifier for a driver advance on a vehicle.");
typed_id!(WorkerId, "Unique identifier for a labour worker.");
typed_id!(InventoryItemId, "Unique identifier for an inventory item.");
typed_id!(StockMovementId, "Unique identifier for a stock movement log entry.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_typed_id_display_round_trips() {
        let id = InvoiceId::new();
        let parsed = InvoiceId::from_str(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_typed_id_from_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(WorkerId::from_uuid(uuid).into_inner(), uuid);
    }

    #[test]
    fn test_typed_id_from_str_error() {
        assert!(PaymentId::from_str("not-a-key").is_err());
    }

    #[test]
    fn test_typed_id_default_is_fresh() {
        assert_ne!(CashEntryId::default(), CashEntryId::default());
    }

    #[test]
    fn test_derived_id_is_stable_per_owner_and_index() {
        let owner = InvoiceId::new().to_string();
        assert_eq!(PaymentId::derived(&owner, 0), PaymentId::derived(&owner, 0));
        assert_ne!(PaymentId::derived(&owner, 0), PaymentId::derived(&owner, 1));
        assert_ne!(PaymentId::derived(&owner, 0), PaymentId::derived("JCB", 0));
        assert_ne!(
            PaymentId::derived("JCB", 0).into_inner(),
            FuelRecordId::derived("JCB", 0).into_inner()
        );
        assert!(!PaymentId::derived(&owner, 0).is_nil());
        assert!(PaymentId::nil().is_nil());
    }

    #[test]
    fn test_typed_id_serializes_transparently() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&WorkEntryId::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }
}
