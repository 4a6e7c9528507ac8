//! Labour repository: workers, attendance and pay events.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sitebook_core::collections::{ATTENDANCE, LABOR_ADVANCES, LABOR_BONUSES, WORKERS, doc_path};
use sitebook_core::payroll::{
    AttendanceSheet, AttendanceStatus, DayAttendance, NewWorker, PayrollService, PayrollSummary,
    Worker, WorkerEvent, WorkerEventKind, WorkerMonth,
};
use sitebook_core::window::MonthKey;
use sitebook_shared::types::{Confirmation, WorkerId};
use tracing::{debug, info, warn};

use super::document::{decode_all, from_document, to_document};
use super::error::{RepositoryError, require_confirmation};
use super::{MAX_ATTEMPTS, is_contention};
use crate::store::{DocumentStore, WriteBatch};

/// Per-worker event list document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct EventList {
    #[serde(default)]
    entries: Vec<WorkerEvent>,
}

const fn event_collection(kind: WorkerEventKind) -> &'static str {
    match kind {
        WorkerEventKind::Advance => LABOR_ADVANCES,
        WorkerEventKind::Bonus => LABOR_BONUSES,
    }
}

/// Labour repository.
#[derive(Clone)]
pub struct LaborRepository {
    store: Arc<dyn DocumentStore>,
}

impl LaborRepository {
    /// Creates a new labour repository.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Every worker, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list_workers(&self) -> Result<Vec<Worker>, RepositoryError> {
        let docs = self.store.read_collection(WORKERS).await?;
        let mut workers: Vec<Worker> = decode_all(WORKERS, docs, "id");
        workers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(workers)
    }

    /// A single worker.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the worker does not exist.
    pub async fn worker(&self, id: WorkerId) -> Result<Worker, RepositoryError> {
        let body = self
            .store
            .read_once(&doc_path(WORKERS, id))
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Worker {id}")))?;
        from_document(WORKERS, &id.to_string(), body, "id")
    }

    /// Adds a worker to the muster roll.
    ///
    /// # Errors
    ///
    /// Returns an error if the details are invalid or the write fails.
    pub async fn create_worker(&self, input: NewWorker) -> Result<Worker, RepositoryError> {
        let worker = PayrollService::prepare_worker(input)?;
        self.store
            .write(&doc_path(WORKERS, worker.id), to_document(&worker, "id")?)
            .await?;
        info!(worker_id = %worker.id, name = %worker.name, "Worker added");
        Ok(worker)
    }

    /// Removes a worker with their advance and bonus lists.
    ///
    /// Attendance marks stay on their dates.
    ///
    /// # Errors
    ///
    /// Returns an error without confirmation, if the worker does not exist, or
    /// if the store fails.
    pub async fn delete_worker(&self, id: WorkerId, confirm: Confirmation) -> Result<(), RepositoryError> {
        require_confirmation(confirm, "delete a worker")?;
        self.worker(id).await?;

        let mut batch = WriteBatch::new();
        batch
            .delete(doc_path(WORKERS, id))
            .delete(doc_path(LABOR_ADVANCES, id))
            .delete(doc_path(LABOR_BONUSES, id));
        self.store.commit(batch).await?;

        info!(worker_id = %id, "Worker deleted");
        Ok(())
    }

    /// Marks attendance for one date. Marks for other workers on that date
    /// are kept.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad date, an unknown worker, or a failed write.
    pub async fn mark_attendance(
        &self,
        date: &str,
        marks: &DayAttendance,
    ) -> Result<DayAttendance, RepositoryError> {
        PayrollService::check_attendance_date(date)?;

        let known: Vec<WorkerId> = self.list_workers().await?.into_iter().map(|w| w.id).collect();
        if let Some(unknown) = marks.keys().find(|id| !known.contains(id)) {
            return Err(RepositoryError::NotFound(format!("Worker {unknown}")));
        }

        let partial: Map<String, Value> = marks
            .iter()
            .map(|(id, status)| Ok((id.to_string(), serde_json::to_value(status)?)))
            .collect::<Result<_, serde_json::Error>>()?;
        self.store
            .write(&doc_path(ATTENDANCE, date), Value::Object(partial))
            .await?;

        debug!(date, marked = marks.len(), "Attendance marked");
        self.attendance(date).await
    }

    /// Attendance recorded for one date.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn attendance(&self, date: &str) -> Result<DayAttendance, RepositoryError> {
        let body = self.store.read_once(&doc_path(ATTENDANCE, date)).await?;
        Ok(body.map(|b| decode_day(date, b)).unwrap_or_default())
    }

    /// Appends an advance or bonus to a worker's list.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive amount, an unknown worker, a
    /// stored list that does not decode, or a failed write.
    pub async fn record_event(
        &self,
        worker_id: WorkerId,
        kind: WorkerEventKind,
        event: WorkerEvent,
    ) -> Result<WorkerEvent, RepositoryError> {
        let event = PayrollService::prepare_event(event)?;
        self.worker(worker_id).await?;

        let path = doc_path(event_collection(kind), worker_id);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self.store.read_once(&path).await?;
            let mut list = read_events(&path, current.clone())?;
            list.entries.push(event.clone());

            let mut batch = WriteBatch::new();
            batch
                .expect(path.clone(), current)
                .set(path.clone(), serde_json::to_value(&list)?);

            match self.store.commit(batch).await.map_err(RepositoryError::from) {
                Ok(()) => break,
                Err(e) if is_contention(&e) && attempt < MAX_ATTEMPTS => {
                    debug!(%worker_id, attempt, "Event list changed concurrently, retrying");
                }
                Err(e) if is_contention(&e) => {
                    return Err(RepositoryError::Conflict(format!(
                        "Pay records for worker {worker_id} are being changed, try again"
                    )));
                }
                Err(e) => return Err(e),
            }
        }

        info!(%worker_id, ?kind, amount = %event.amount, "Worker event recorded");
        Ok(event)
    }

    /// A worker's advances or bonuses, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn events(&self, worker_id: WorkerId, kind: WorkerEventKind) -> Result<Vec<WorkerEvent>, RepositoryError> {
        let path = doc_path(event_collection(kind), worker_id);
        let current = self.store.read_once(&path).await?;
        Ok(decode_events(&path, current).entries)
    }

    /// One worker's muster and pay for `month`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown worker or an error if the store fails.
    pub async fn worker_month(&self, worker_id: WorkerId, month: &MonthKey) -> Result<WorkerMonth, RepositoryError> {
        let worker = self.worker(worker_id).await?;
        let sheet = self.sheet().await?;
        let bonuses = self.events(worker_id, WorkerEventKind::Bonus).await?;
        let advances = self.events(worker_id, WorkerEventKind::Advance).await?;
        Ok(PayrollService::worker_month(&worker, &sheet, &bonuses, &advances, month))
    }

    /// Pay for every worker in `month`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn payroll(&self, month: &MonthKey) -> Result<PayrollSummary, RepositoryError> {
        let workers = self.list_workers().await?;
        let sheet = self.sheet().await?;
        let bonuses = self.all_events(WorkerEventKind::Bonus).await?;
        let advances = self.all_events(WorkerEventKind::Advance).await?;

        Ok(PayrollService::payroll(&workers, &sheet, month, |id| {
            (
                bonuses.get(&id).map_or(&[][..], Vec::as_slice),
                advances.get(&id).map_or(&[][..], Vec::as_slice),
            )
        }))
    }

    async fn sheet(&self) -> Result<AttendanceSheet, RepositoryError> {
        let docs = self.store.read_collection(ATTENDANCE).await?;
        Ok(AttendanceSheet(
            docs.into_iter()
                .map(|(date, body)| {
                    let day = decode_day(&date, body);
                    (date, day)
                })
                .collect::<BTreeMap<_, _>>(),
        ))
    }

    async fn all_events(&self, kind: WorkerEventKind) -> Result<HashMap<WorkerId, Vec<WorkerEvent>>, RepositoryError> {
        let collection = event_collection(kind);
        let docs = self.store.read_collection(collection).await?;
        Ok(docs
            .into_iter()
            .filter_map(|(key, body)| {
                let path = doc_path(collection, &key);
                match key.parse::<WorkerId>() {
                    Ok(id) => Some((id, decode_events(&path, Some(body)).entries)),
                    Err(_) => {
                        warn!(path = %path, "Skipping event list with a malformed worker id");
                        None
                    }
                }
            })
            .collect())
    }
}

/// Decodes one day's marks, dropping any that do not parse.
fn decode_day(date: &str, body: Value) -> DayAttendance {
    let Value::Object(marks) = body else {
        warn!(date, "Attendance document is not an object");
        return DayAttendance::new();
    };

    marks
        .into_iter()
        .filter_map(|(worker, status)| {
            let parsed = worker
                .parse::<WorkerId>()
                .ok()
                .zip(serde_json::from_value::<AttendanceStatus>(status).ok());
            if parsed.is_none() {
                warn!(date, worker = %worker, "Skipping unreadable attendance mark");
            }
            parsed
        })
        .collect()
}

/// Decodes an event list before it is rewritten. An unreadable list is an
/// error so the append cannot replace it.
fn read_events(path: &str, body: Option<Value>) -> Result<EventList, RepositoryError> {
    match body {
        Some(b) => serde_json::from_value(b).map_err(|source| RepositoryError::Corrupt {
            path: path.to_string(),
            source,
        }),
        None => Ok(EventList::default()),
    }
}

fn decode_events(path: &str, body: Option<Value>) -> EventList {
    read_events(path, body).unwrap_or_else(|e| {
        warn!(error = %e, "Unreadable event list, treating as empty");
        EventList::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn repo() -> (Arc<MemoryStore>, LaborRepository) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), LaborRepository::new(store))
    }

    fn new_worker(name: &str, rate: Decimal) -> NewWorker {
        NewWorker {
            name: name.to_string(),
            role: "Mason".to_string(),
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

    #[tokio::test]
    async fn test_month_pay_from_stored_records() {
        let (_, repo) = repo();
        let worker = repo.create_worker(new_worker("Suresh", dec!(500))).await.unwrap();
        let marks = |status| DayAttendance::from([(worker.id, status)]);

        for day in 1..=20 {
            repo.mark_attendance(&format!("2025-05-{day:02}"), &marks(AttendanceStatus::Present))
                .await
                .unwrap();
        }
        repo.mark_attendance("2025-05-21", &marks(AttendanceStatus::HalfDay)).await.unwrap();
        repo.mark_attendance("2025-05-22", &marks(AttendanceStatus::HalfDay)).await.unwrap();
        repo.mark_attendance("2025-05-23", &marks(AttendanceStatus::Absent)).await.unwrap();

        repo.record_event(worker.id, WorkerEventKind::Bonus, event("2025-05-15", dec!(1000)))
            .await
            .unwrap();
        repo.record_event(worker.id, WorkerEventKind::Advance, event("2025-05-10", dec!(3000)))
            .await
            .unwrap();
        repo.record_event(worker.id, WorkerEventKind::Advance, event("2025-04-28", dec!(700)))
            .await
            .unwrap();

        let month = MonthKey::parse("2025-05").unwrap();
        let row = repo.worker_month(worker.id, &month).await.unwrap();
        assert_eq!(row.earned, dec!(10500));
        assert_eq!(row.payable, dec!(8500));

        let payroll = repo.payroll(&month).await.unwrap();
        assert_eq!(payroll.total_payable, dec!(8500));
    }

    #[tokio::test]
    async fn test_marks_for_other_workers_are_kept() {
        let (_, repo) = repo();
        let a = repo.create_worker(new_worker("A", dec!(400))).await.unwrap();
        let b = repo.create_worker(new_worker("B", dec!(400))).await.unwrap();

        repo.mark_attendance("2025-05-02", &DayAttendance::from([(a.id, AttendanceStatus::Present)]))
            .await
            .unwrap();
        let day = repo
            .mark_attendance("2025-05-02", &DayAttendance::from([(b.id, AttendanceStatus::Absent)]))
            .await
            .unwrap();

        assert_eq!(day.get(&a.id), Some(&AttendanceStatus::Present));
        assert_eq!(day.get(&b.id), Some(&AttendanceStatus::Absent));
    }

    #[tokio::test]
    async fn test_unknown_worker_and_bad_date_rejected() {
        let (_, repo) = repo();
        let marks = DayAttendance::from([(WorkerId::new(), AttendanceStatus::Present)]);

        assert!(matches!(
            repo.mark_attendance("2025-05-02", &marks).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(
            repo.mark_attendance("02/05/2025", &marks).await,
            Err(RepositoryError::Payroll(_))
        ));
    }

    #[tokio::test]
    async fn test_event_amount_must_be_positive() {
        let (_, repo) = repo();
        let worker = repo.create_worker(new_worker("A", dec!(400))).await.unwrap();
        assert!(matches!(
            repo.record_event(worker.id, WorkerEventKind::Advance, event("2025-05-01", dec!(0)))
                .await,
            Err(RepositoryError::Payroll(_))
        ));
        assert!(repo.events(worker.id, WorkerEventKind::Advance).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_marks_are_skipped() {
        let (store, repo) = repo();
        let worker = repo.create_worker(new_worker("A", dec!(400))).await.unwrap();
        store
            .write(
                "attendance/2025-05-02",
                json!({ worker.id.to_string(): "Present", "bogus": "Present", "x": 1 }),
            )
            .await
            .unwrap();

        let day = repo.attendance("2025-05-02").await.unwrap();
        assert_eq!(day.len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_event_list_is_not_replaced() {
        let (store, repo) = repo();
        let worker = repo.create_worker(new_worker("A", dec!(400))).await.unwrap();
        let path = doc_path(LABOR_ADVANCES, worker.id);
        let stored = json!({ "entries": [{ "date": "2025-05-01", "amount": "not money" }] });
        store.write(&path, stored.clone()).await.unwrap();

        assert!(matches!(
            repo.record_event(worker.id, WorkerEventKind::Advance, event("2025-05-03", dec!(200)))
                .await,
            Err(RepositoryError::Corrupt { .. })
        ));
        assert_eq!(store.read_once(&path).await.unwrap(), Some(stored));

        assert!(repo.events(worker.id, WorkerEventKind::Advance).await.unwrap().is_empty());
        let month = repo
            .worker_month(worker.id, &MonthKey::parse("2025-05").unwrap())
            .await
            .unwrap();
        assert_eq!(month.advances, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_delete_worker() {
        let (_, repo) = repo();
        let worker = repo.create_worker(new_worker("A", dec!(400))).await.unwrap();
        repo.record_event(worker.id, WorkerEventKind::Bonus, event("2025-05-01", dec!(100)))
            .await
            .unwrap();

        assert!(matches!(
            repo.delete_worker(worker.id, Confirmation::Unconfirmed).await,
            Err(RepositoryError::ConfirmationRequired(_))
        ));
        repo.delete_worker(worker.id, Confirmation::Confirmed).await.unwrap();

        assert!(repo.list_workers().await.unwrap().is_empty());
        assert!(repo.events(worker.id, WorkerEventKind::Bonus).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_worker(worker.id, Confirmation::Confirmed).await,
            Err(RepositoryError::NotFound(_))
        ));
    }
}
