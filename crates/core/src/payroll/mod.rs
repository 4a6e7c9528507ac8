//! Attendance muster and monthly payroll.

pub mod error;
pub mod service;
pub mod types;

pub use error::PayrollError;
pub use service::PayrollService;
pub use types::{
    AttendanceSheet, AttendanceStatus, DayAttendance, DayMark, MusterDay, NewWorker,
    PayrollSummary, Worker, WorkerEvent, WorkerEventKind, WorkerMonth,
};
