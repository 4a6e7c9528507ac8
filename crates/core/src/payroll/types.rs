//! Payroll data types.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sitebook_shared::types::WorkerId;

use crate::window::{Dated, MonthKey};

/// A labourer on the muster roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    /// Worker ID.
    #[serde(default)]
    pub id: WorkerId,
    /// Name.
    pub name: String,
    /// Role, e.g. "Mason".
    #[serde(default)]
    pub role: String,
    /// Pay for a full day.
    pub daily_rate: Decimal,
    /// Contact number.
    #[serde(default)]
    pub phone: String,
}

/// Worker details as submitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorker {
    /// Name.
    pub name: String,
    /// Role.
    #[serde(default)]
    pub role: String,
    /// Pay for a full day.
    pub daily_rate: Decimal,
    /// Contact number.
    #[serde(default)]
    pub phone: String,
}

/// Attendance mark for one worker on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    /// Full day.
    Present,
    /// Half day, paid at half the daily rate.
    HalfDay,
    /// Not present.
    Absent,
}

/// Attendance for one date, by worker.
pub type DayAttendance = BTreeMap<WorkerId, AttendanceStatus>;

/// Attendance keyed by ISO date, then worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceSheet(pub BTreeMap<String, DayAttendance>);

impl AttendanceSheet {
    /// The mark for a worker on a date, if any.
    #[must_use]
    pub fn status(&self, date: &str, worker: WorkerId) -> Option<AttendanceStatus> {
        self.0.get(date).and_then(|day| day.get(&worker)).copied()
    }

    /// Sets a worker's mark on a date.
    pub fn mark(&mut self, date: &str, worker: WorkerId, status: AttendanceStatus) {
        self.0.entry(date.to_string()).or_default().insert(worker, status);
    }
}

/// An advance or bonus paid to a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerEvent {
    /// ISO date.
    pub date: String,
    /// Amount.
    pub amount: Decimal,
    /// Reason.
    #[serde(default)]
    pub reason: String,
}

impl Dated for WorkerEvent {
    fn date(&self) -> &str {
        &self.date
    }
}

/// Which event list a worker event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerEventKind {
    /// Deducted from pay.
    Advance,
    /// Added to pay.
    Bonus,
}

/// A day on the muster grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayMark {
    /// Full day.
    Present,
    /// Half day.
    HalfDay,
    /// Absent.
    Absent,
    /// No mark recorded.
    Unmarked,
}

impl From<Option<AttendanceStatus>> for DayMark {
    fn from(status: Option<AttendanceStatus>) -> Self {
        match status {
            Some(AttendanceStatus::Present) => Self::Present,
            Some(AttendanceStatus::HalfDay) => Self::HalfDay,
            Some(AttendanceStatus::Absent) => Self::Absent,
            None => Self::Unmarked,
        }
    }
}

/// One cell of the muster roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusterDay {
    /// Day of month.
    pub day: u32,
    /// ISO date.
    pub date: String,
    /// Sundays are highlighted on the register; they are still paid.
    pub is_sunday: bool,
    /// Attendance mark.
    pub mark: DayMark,
}

/// A worker's attendance and pay for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerMonth {
    /// Worker.
    pub worker_id: WorkerId,
    /// Worker name.
    pub name: String,
    /// Month covered.
    pub month: MonthKey,
    /// Full days.
    pub present: u32,
    /// Half days.
    pub half_days: u32,
    /// Absent days.
    pub absent: u32,
    /// Days with no mark.
    pub unmarked: u32,
    /// Attendance pay.
    pub earned: Decimal,
    /// Bonuses in the month.
    pub bonuses: Decimal,
    /// Advances in the month.
    pub advances: Decimal,
    /// Earned plus bonuses minus advances.
    pub payable: Decimal,
    /// Day-by-day muster grid.
    pub days: Vec<MusterDay>,
}

/// Payroll totals across all workers for a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollSummary {
    /// Month covered.
    pub month: MonthKey,
    /// Per-worker rows.
    pub workers: Vec<WorkerMonth>,
    /// Sum of earned.
    pub total_earned: Decimal,
    /// Sum of payable.
    pub total_payable: Decimal,
}
