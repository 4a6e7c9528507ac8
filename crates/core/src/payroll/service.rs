//! Payroll service.

use chrono::{Datelike, Weekday};
use rust_decimal::Decimal;
use sitebook_shared::types::WorkerId;

use super::error::PayrollError;
use super::types::{
    AttendanceSheet, DayMark, MusterDay, NewWorker, PayrollSummary, Worker, WorkerEvent,
    WorkerMonth,
};
use crate::window::{MonthKey, MonthWindow, parse_iso_date};

/// Payroll aggregation service.
pub struct PayrollService;

impl PayrollService {
    /// The month's muster grid and pay for one worker.
    ///
    /// `earned = present * rate + half_days * rate / 2`, and
    /// `payable = earned + bonuses - advances`. Sundays are flagged on the
    /// grid but paid like any other day.
    #[must_use]
    pub fn worker_month(
        worker: &Worker,
        sheet: &AttendanceSheet,
        bonuses: &[WorkerEvent],
        advances: &[WorkerEvent],
        month: &MonthKey,
    ) -> WorkerMonth {
        let days = Self::muster(worker.id, sheet, month);
        let count = |mark: DayMark| {
            u32::try_from(days.iter().filter(|d| d.mark == mark).count()).unwrap_or(u32::MAX)
        };
        let present = count(DayMark::Present);
        let half_days = count(DayMark::HalfDay);

        let earned = Decimal::from(present) * worker.daily_rate
            + Decimal::from(half_days) * worker.daily_rate / Decimal::TWO;
        let window = MonthWindow::new(month.clone());
        let bonus_total = window.sum(bonuses, |e| e.amount);
        let advance_total = window.sum(advances, |e| e.amount);

        WorkerMonth {
            worker_id: worker.id,
            name: worker.name.clone(),
            month: month.clone(),
            present,
            half_days,
            absent: count(DayMark::Absent),
            unmarked: count(DayMark::Unmarked),
            earned,
            bonuses: bonus_total,
            advances: advance_total,
            payable: earned + bonus_total - advance_total,
            days,
        }
    }

    /// Day 1 to the last day of the month, each with the worker's mark.
    #[must_use]
    pub fn muster(worker: WorkerId, sheet: &AttendanceSheet, month: &MonthKey) -> Vec<MusterDay> {
        (1..=month.days_in_month())
            .filter_map(|day| month.date_of(day).map(|date| (day, date)))
            .map(|(day, date)| {
                let iso = date.format("%Y-%m-%d").to_string();
                MusterDay {
                    day,
                    is_sunday: date.weekday() == Weekday::Sun,
                    mark: sheet.status(&iso, worker).into(),
                    date: iso,
                }
            })
            .collect()
    }

    /// Pay rows for every worker plus totals.
    ///
    /// `events` returns a worker's (bonuses, advances).
    pub fn payroll<'a, F>(
        workers: &[Worker],
        sheet: &AttendanceSheet,
        month: &MonthKey,
        events: F,
    ) -> PayrollSummary
    where
        F: Fn(WorkerId) -> (&'a [WorkerEvent], &'a [WorkerEvent]),
    {
        let rows: Vec<WorkerMonth> = workers
            .iter()
            .map(|w| {
                let (bonuses, advances) = events(w.id);
                Self::worker_month(w, sheet, bonuses, advances, month)
            })
            .collect();

        PayrollSummary {
            month: month.clone(),
            total_earned: rows.iter().map(|r| r.earned).sum(),
            total_payable: rows.iter().map(|r| r.payable).sum(),
            workers: rows,
        }
    }

    /// Validates a new worker.
    ///
    /// # Errors
    ///
    /// Returns `PayrollError` for an empty name or a negative rate.
    pub fn prepare_worker(input: NewWorker) -> Result<Worker, PayrollError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(PayrollError::MissingName);
        }
        if input.daily_rate < Decimal::ZERO {
            return Err(PayrollError::NegativeRate);
        }

        Ok(Worker {
            id: WorkerId::new(),
            name,
            role: input.role.trim().to_string(),
            daily_rate: input.daily_rate,
            phone: input.phone.trim().to_string(),
        })
    }

    /// Validates an advance or bonus.
    ///
    /// # Errors
    ///
    /// Returns `PayrollError` for a bad date or a non-positive amount.
    pub fn prepare_event(event: WorkerEvent) -> Result<WorkerEvent, PayrollError> {
        if parse_iso_date(&event.date).is_none() {
            return Err(PayrollError::InvalidDate(event.date));
        }
        if event.amount <= Decimal::ZERO {
            return Err(PayrollError::NonPositiveAmount(event.amount));
        }
        Ok(WorkerEvent {
            reason: event.reason.trim().to_string(),
            ..event
        })
    }

    /// Checks an attendance date.
    ///
    /// # Errors
    ///
    /// Returns `PayrollError::InvalidDate` if the date is not `YYYY-MM-DD`.
    pub fn check_attendance_date(date: &str) -> Result<(), PayrollError> {
        parse_iso_date(date)
            .map(|_| ())
            .ok_or_else(|| PayrollError::InvalidDate(date.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payroll::AttendanceStatus;
    use rust_decimal_macros::dec;

    fn worker(rate: Decimal) -> Worker {
        Worker {
            id: WorkerId::new(),
            name: "Suresh".to_string(),
            role: "Helper".to_string(),
            daily_rate: rate,
            phone: String::new(),
        }
    }

    fn event(date: &str, amount: Decimal) -> WorkerEvent {
        WorkerEvent {
            date: date.to_string(),
            amount,
            reason: String::new(),
        }
    }

    #[test]
    fn test_payroll_scenario() {
        let w = worker(dec!(500));
        let month = MonthKey::parse("2025-05").unwrap();
        let mut sheet = AttendanceSheet::default();
        for day in 1..=20 {
            sheet.mark(&format!("2025-05-{day:02}"), w.id, AttendanceStatus::Present);
        }
        sheet.mark("2025-05-21", w.id, AttendanceStatus::HalfDay);
        sheet.mark("2025-05-22", w.id, AttendanceStatus::HalfDay);
        sheet.mark("2025-05-23", w.id, AttendanceStatus::Absent);
        // Outside the month
        sheet.mark("2025-06-01", w.id, AttendanceStatus::Present);

        let bonuses = vec![event("2025-05-15", dec!(1000))];
        let advances = vec![event("2025-05-10", dec!(3000)), event("2025-04-28", dec!(700))];

        let result = PayrollService::worker_month(&w, &sheet, &bonuses, &advances, &month);
        assert_eq!(result.present, 20);
        assert_eq!(result.half_days, 2);
        assert_eq!(result.absent, 1);
        assert_eq!(result.unmarked, 8);
        assert_eq!(result.earned, dec!(10500));
        assert_eq!(result.bonuses, dec!(1000));
        assert_eq!(result.advances, dec!(3000));
        assert_eq!(result.payable, dec!(8500));
    }

    #[test]
    fn test_muster_grid_flags_sundays() {
        let w = worker(dec!(500));
        let month = MonthKey::parse("2025-02").unwrap();
        let grid = PayrollService::muster(w.id, &AttendanceSheet::default(), &month);

        assert_eq!(grid.len(), 28);
        assert!(grid.iter().all(|d| d.mark == DayMark::Unmarked));
        let sundays: Vec<u32> = grid.iter().filter(|d| d.is_sunday).map(|d| d.day).collect();
        assert_eq!(sundays, vec![2, 9, 16, 23]);
        assert_eq!(grid[0].date, "2025-02-01");
    }

    #[test]
    fn test_sunday_attendance_is_paid() {
        let w = worker(dec!(600));
        let month = MonthKey::parse("2025-02").unwrap();
        let mut sheet = AttendanceSheet::default();
        sheet.mark("2025-02-02", w.id, AttendanceStatus::Present);

        let result = PayrollService::worker_month(&w, &sheet, &[], &[], &month);
        assert_eq!(result.earned, dec!(600));
    }

    #[test]
    fn test_other_workers_do_not_count() {
        let a = worker(dec!(500));
        let b = worker(dec!(500));
        let month = MonthKey::parse("2025-05").unwrap();
        let mut sheet = AttendanceSheet::default();
        sheet.mark("2025-05-01", b.id, AttendanceStatus::Present);

        let result = PayrollService::worker_month(&a, &sheet, &[], &[], &month);
        assert_eq!(result.present, 0);
        assert_eq!(result.unmarked, 31);
    }

    #[test]
    fn test_payroll_totals() {
        let a = worker(dec!(500));
        let b = worker(dec!(400));
        let month = MonthKey::parse("2025-05").unwrap();
        let mut sheet = AttendanceSheet::default();
        sheet.mark("2025-05-01", a.id, AttendanceStatus::Present);
        sheet.mark("2025-05-01", b.id, AttendanceStatus::HalfDay);
        let advances = vec![event("2025-05-02", dec!(100))];

        let summary = PayrollService::payroll(&[a.clone(), b], &sheet, &month, |id| {
            if id == a.id {
                (&[][..], &advances[..])
            } else {
                (&[][..], &[][..])
            }
        });
        assert_eq!(summary.total_earned, dec!(700));
        assert_eq!(summary.total_payable, dec!(600));
    }

    #[test]
    fn test_prepare_event_rejects_zero() {
        assert_eq!(
            PayrollService::prepare_event(event("2025-05-01", dec!(0))),
            Err(PayrollError::NonPositiveAmount(dec!(0)))
        );
        assert!(matches!(
            PayrollService::prepare_event(event("05/01/2025", dec!(10))),
            Err(PayrollError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_prepare_worker() {
        let input = NewWorker {
            name: "  ".to_string(),
            role: String::new(),
            daily_rate: dec!(500),
            phone: String::new(),
        };
        assert_eq!(PayrollService::prepare_worker(input), Err(PayrollError::MissingName));
    }

    #[test]
    fn test_attendance_sheet_json_shape() {
        let w = worker(dec!(500));
        let mut sheet = AttendanceSheet::default();
        sheet.mark("2025-05-01", w.id, AttendanceStatus::HalfDay);
        let json = serde_json::to_value(&sheet).unwrap();
        assert_eq!(json["2025-05-01"][w.id.to_string()], "HalfDay");

        let back: AttendanceSheet = serde_json::from_value(json).unwrap();
        assert_eq!(back, sheet);
    }
}
