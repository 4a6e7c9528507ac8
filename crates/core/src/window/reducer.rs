//! Filter-by-month and group-sum over dated records.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::month_key::MonthKey;

/// A record carrying an ISO `YYYY-MM-DD` date string.
pub trait Dated {
    /// The raw date string as stored.
    fn date(&self) -> &str;
}

impl<T: Dated + ?Sized> Dated for &T {
    fn date(&self) -> &str {
        (**self).date()
    }
}

/// The set of records whose date shares a month key prefix.
#[derive(Debug, Clone)]
pub struct MonthWindow {
    key: MonthKey,
}

impl MonthWindow {
    /// Creates a window over `key`.
    #[must_use]
    pub fn new(key: MonthKey) -> Self {
        Self { key }
    }

    /// The month this window covers.
    #[must_use]
    pub fn key(&self) -> &MonthKey {
        &self.key
    }

    /// True if the record's date falls in the window.
    #[must_use]
    pub fn contains<T: Dated>(&self, record: &T) -> bool {
        self.key.contains(record.date())
    }

    /// Records in the window, in their original order.
    pub fn filter<'a, T: Dated>(&'a self, records: &'a [T]) -> impl Iterator<Item = &'a T> + 'a {
        records.iter().filter(move |r| self.contains(*r))
    }

    /// Number of records in the window.
    #[must_use]
    pub fn count<T: Dated>(&self, records: &[T]) -> usize {
        self.filter(records).count()
    }

    /// Sum of `amount` over the records in the window.
    pub fn sum<T, F>(&self, records: &[T], amount: F) -> Decimal
    where
        T: Dated,
        F: Fn(&T) -> Decimal,
    {
        self.filter(records).map(amount).sum()
    }

    /// Sum of `amount` over the records in the window, grouped by `key`.
    ///
    /// Groups with no records in the window are absent from the result.
    pub fn group_sum<T, K, FK, FA>(&self, records: &[T], key: FK, amount: FA) -> BTreeMap<K, Decimal>
    where
        T: Dated,
        K: Ord,
        FK: Fn(&T) -> K,
        FA: Fn(&T) -> Decimal,
    {
        let mut groups = BTreeMap::new();
        for record in self.filter(records) {
            *groups.entry(key(record)).or_insert(Decimal::ZERO) += amount(record);
        }
        groups
    }
}
