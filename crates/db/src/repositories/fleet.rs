//! Fleet repository: vehicles, work entries, fuel and driver advances.
//!
//! The vehicle aggregate is rewritten whole on every change, guarded by a
//! precondition on the version it was computed from. Work entries, fuel
//! purchases and advances commit in the same batch as the aggregate (and,
//! for money paid out, the mirrored cashbook entry).

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sitebook_core::cashbook::{CashEntry, CashbookMirror, ConsistencyWarning, MirrorKind, MirrorRef};
use sitebook_core::collections::{CASHBOOK, FLEET_ENTRIES, FLEET_VEHICLES, doc_path};
use sitebook_core::fleet::{
    AdvanceRecord, FleetError, FleetService, FuelRecord, NewAdvance, NewFuelRecord, NewWorkEntry,
    ServiceStatus, VehicleAggregate, VehicleMonth, VehicleUpdate, WorkEntry, WorkSummary,
};
use sitebook_core::window::{MonthKey, MonthWindow};
use sitebook_shared::types::{AdvanceRecordId, FuelRecordId, WorkEntryId};
use tracing::{debug, info, warn};

use super::cashbook::orphan_warning;
use super::document::{decode_all, from_document, to_document};
use super::error::RepositoryError;
use super::{MAX_ATTEMPTS, is_contention};
use crate::store::{DocumentStore, WriteBatch};

/// Vehicle documents are keyed by vehicle id.
const VEHICLE_ID_FIELD: &str = "vehicleId";

/// Fleet repository.
#[derive(Clone)]
pub struct FleetRepository {
    store: Arc<dyn DocumentStore>,
}

impl FleetRepository {
    /// Creates a new fleet repository.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Every vehicle aggregate, by vehicle id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list_vehicles(&self) -> Result<Vec<VehicleAggregate>, RepositoryError> {
        let docs = self.store.read_collection(FLEET_VEHICLES).await?;
        Ok(decode_vehicles(docs))
    }

    /// The vehicle aggregate; a vehicle never written is all zeros.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty vehicle id or a failed read.
    pub async fn vehicle(&self, vehicle_id: &str) -> Result<VehicleAggregate, RepositoryError> {
        let vehicle_id = check_vehicle_id(vehicle_id)?;
        let current = self
            .store
            .read_once(&doc_path(FLEET_VEHICLES, vehicle_id))
            .await?;
        decode_vehicle(vehicle_id, current)
    }

    /// Creates or edits a vehicle's driver, salary and service cost.
    ///
    /// # Errors
    ///
    /// Returns an error for negative figures or a failed write.
    pub async fn update_vehicle(
        &self,
        vehicle_id: &str,
        update: VehicleUpdate,
    ) -> Result<VehicleAggregate, RepositoryError> {
        let (vehicle, ()) = self
            .modify_vehicle(vehicle_id, |vehicle, _| {
                FleetService::apply_update(vehicle, update.clone())?;
                Ok(())
            })
            .await?;
        info!(vehicle_id = %vehicle.vehicle_id, "Vehicle updated");
        Ok(vehicle)
    }

    /// Records a service at the current running hours.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn mark_serviced(&self, vehicle_id: &str) -> Result<VehicleAggregate, RepositoryError> {
        let (vehicle, ()) = self
            .modify_vehicle(vehicle_id, |vehicle, _| {
                FleetService::mark_serviced(vehicle);
                Ok(())
            })
            .await?;
        info!(vehicle_id = %vehicle.vehicle_id, hours = %vehicle.last_service_hours, "Vehicle serviced");
        Ok(vehicle)
    }

    /// Costs for a vehicle in `month`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn vehicle_month(
        &self,
        vehicle_id: &str,
        month: &MonthKey,
    ) -> Result<VehicleMonth, RepositoryError> {
        let vehicle = self.vehicle(vehicle_id).await?;
        Ok(FleetService::vehicle_month(&vehicle, month))
    }

    /// Service progress for a vehicle.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn service_status(
        &self,
        vehicle_id: &str,
        interval_hours: Decimal,
    ) -> Result<ServiceStatus, RepositoryError> {
        let vehicle = self.vehicle(vehicle_id).await?;
        Ok(FleetService::service_status(&vehicle, interval_hours))
    }

    /// Ids of vehicles due for service.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn due_for_service(&self, interval_hours: Decimal) -> Result<Vec<String>, RepositoryError> {
        let vehicles = self.list_vehicles().await?;
        Ok(FleetService::due_for_service(&vehicles, interval_hours))
    }

    /// Work entries, newest first, optionally narrowed to a month and vehicle.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list_work(
        &self,
        month: Option<&MonthKey>,
        vehicle: Option<&str>,
    ) -> Result<Vec<WorkEntry>, RepositoryError> {
        let mut entries = load_work(self.store.as_ref()).await?;
        if let Some(month) = month {
            let window = MonthWindow::new(month.clone());
            entries.retain(|e| window.contains(e));
        }
        if let Some(vehicle) = vehicle {
            entries.retain(|e| e.vehicle_ref == vehicle);
        }
        entries.sort_by_key(|e| Reverse(e.date.clone()));
        Ok(entries)
    }

    /// Hours, billed and unpaid totals for `month`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn work_summary(
        &self,
        month: &MonthKey,
        vehicle: Option<&str>,
    ) -> Result<WorkSummary, RepositoryError> {
        let entries = load_work(self.store.as_ref()).await?;
        Ok(FleetService::work_summary(&entries, month, vehicle))
    }

    /// Logs work and adds its hours to the vehicle's counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is invalid or the write fails.
    pub async fn add_work(&self, input: NewWorkEntry) -> Result<WorkEntry, RepositoryError> {
        let entry = FleetService::prepare_work(input)?;
        let body = to_document(&entry, "id")?;
        let path = doc_path(FLEET_ENTRIES, entry.id);

        let (vehicle, ()) = self
            .modify_vehicle(&entry.vehicle_ref, |vehicle, batch| {
                FleetService::apply_work(vehicle, entry.hours);
                batch.expect(path.clone(), None).set(path.clone(), body.clone());
                Ok(())
            })
            .await?;

        info!(
            work_entry_id = %entry.id,
            vehicle_id = %vehicle.vehicle_id,
            hours = %entry.hours,
            total_hours = %vehicle.total_running_hours,
            "Work entry logged"
        );
        Ok(entry)
    }

    /// Deletes a work entry and takes its hours off the counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist or the write fails.
    pub async fn delete_work(&self, id: WorkEntryId) -> Result<WorkEntry, RepositoryError> {
        let path = doc_path(FLEET_ENTRIES, id);
        let Some(body) = self.store.read_once(&path).await? else {
            return Err(FleetError::WorkEntryNotFound(id).into());
        };
        let entry: WorkEntry = from_document(FLEET_ENTRIES, &id.to_string(), body.clone(), "id")?;

        let (vehicle, ()) = self
            .modify_vehicle(&entry.vehicle_ref, |vehicle, batch| {
                FleetService::reverse_work(vehicle, entry.hours);
                batch.expect(path.clone(), Some(body.clone())).delete(path.clone());
                Ok(())
            })
            .await?;

        info!(
            work_entry_id = %id,
            vehicle_id = %vehicle.vehicle_id,
            total_hours = %vehicle.total_running_hours,
            "Work entry deleted"
        );
        Ok(entry)
    }

    /// Marks a work entry paid or unpaid.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist or the write fails.
    pub async fn set_work_paid(&self, id: WorkEntryId, paid: bool) -> Result<WorkEntry, RepositoryError> {
        let path = doc_path(FLEET_ENTRIES, id);
        let Some(body) = self.store.read_once(&path).await? else {
            return Err(FleetError::WorkEntryNotFound(id).into());
        };
        let mut entry: WorkEntry = from_document(FLEET_ENTRIES, &id.to_string(), body, "id")?;

        self.store.write(&path, json!({ "isPaid": paid })).await?;
        entry.is_paid = paid;
        debug!(work_entry_id = %id, paid, "Work entry payment flag set");
        Ok(entry)
    }

    /// Rebuilds a vehicle's running hours from its work entries.
    ///
    /// Returns the vehicle and the correction applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn resync(&self, vehicle_id: &str) -> Result<(VehicleAggregate, Decimal), RepositoryError> {
        let entries = load_work(self.store.as_ref()).await?;
        let (vehicle, drift) = self
            .modify_vehicle(vehicle_id, |vehicle, _| Ok(FleetService::resync(vehicle, &entries)))
            .await?;

        if drift.is_zero() {
            debug!(vehicle_id = %vehicle.vehicle_id, "Running hours already in sync");
        } else {
            warn!(vehicle_id = %vehicle.vehicle_id, drift = %drift, "Running hours corrected");
        }
        Ok((vehicle, drift))
    }

    /// Records a fuel purchase and mirrors it as a cashbook expense.
    ///
    /// # Errors
    ///
    /// Returns an error if the purchase is invalid or the write fails.
    pub async fn add_fuel(
        &self,
        vehicle_id: &str,
        input: NewFuelRecord,
    ) -> Result<(VehicleAggregate, FuelRecord, CashEntry), RepositoryError> {
        let fuel = FleetService::prepare_fuel(&input)?;

        let (vehicle, entry) = self
            .modify_vehicle(vehicle_id, |vehicle, batch| {
                vehicle.fuel_history.push(fuel.clone());
                let entry = CashbookMirror::fuel_purchase(vehicle, &fuel, input.mode.clone(), Utc::now());
                batch.set(doc_path(CASHBOOK, entry.id), to_document(&entry, "id")?);
                Ok(entry)
            })
            .await?;

        info!(vehicle_id = %vehicle.vehicle_id, fuel_id = %fuel.id, cost = %fuel.cost, cash_entry_id = %entry.id, "Fuel purchase recorded");
        Ok((vehicle, fuel, entry))
    }

    /// Records an advance to the vehicle's driver and mirrors it as a cashbook expense.
    ///
    /// # Errors
    ///
    /// Returns an error if the advance is invalid or the write fails.
    pub async fn add_advance(
        &self,
        vehicle_id: &str,
        input: NewAdvance,
    ) -> Result<(VehicleAggregate, AdvanceRecord, CashEntry), RepositoryError> {
        let advance = FleetService::prepare_advance(&input)?;

        let (vehicle, entry) = self
            .modify_vehicle(vehicle_id, |vehicle, batch| {
                vehicle.advance_history.push(advance.clone());
                let entry = CashbookMirror::driver_advance(vehicle, &advance, input.mode.clone(), Utc::now());
                batch.set(doc_path(CASHBOOK, entry.id), to_document(&entry, "id")?);
                Ok(entry)
            })
            .await?;

        info!(vehicle_id = %vehicle.vehicle_id, advance_id = %advance.id, amount = %advance.amount, cash_entry_id = %entry.id, "Driver advance recorded");
        Ok((vehicle, advance, entry))
    }

    /// Removes a fuel purchase; its cashbook mirror stays and is reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not exist or the write fails.
    pub async fn delete_fuel(
        &self,
        vehicle_id: &str,
        id: FuelRecordId,
    ) -> Result<(VehicleAggregate, ConsistencyWarning), RepositoryError> {
        let (vehicle, _) = self
            .modify_vehicle(vehicle_id, |vehicle, _| Ok(FleetService::remove_fuel(vehicle, id)?))
            .await?;

        let warning = orphan_warning(
            self.store.as_ref(),
            MirrorRef {
                kind: MirrorKind::FuelPurchase,
                record: vehicle.vehicle_id.clone(),
                detail: id.to_string(),
            },
        )
        .await?;
        Ok((vehicle, warning))
    }

    /// Removes a driver advance; its cashbook mirror stays and is reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not exist or the write fails.
    pub async fn delete_advance(
        &self,
        vehicle_id: &str,
        id: AdvanceRecordId,
    ) -> Result<(VehicleAggregate, ConsistencyWarning), RepositoryError> {
        let (vehicle, _) = self
            .modify_vehicle(vehicle_id, |vehicle, _| Ok(FleetService::remove_advance(vehicle, id)?))
            .await?;

        let warning = orphan_warning(
            self.store.as_ref(),
            MirrorRef {
                kind: MirrorKind::DriverAdvance,
                record: vehicle.vehicle_id.clone(),
                detail: id.to_string(),
            },
        )
        .await?;
        Ok((vehicle, warning))
    }

    /// Read-modify-write of one vehicle, retried when another writer got there first.
    ///
    /// `apply` may add further writes to the batch; they commit together with
    /// the aggregate.
    async fn modify_vehicle<T, F>(
        &self,
        vehicle_id: &str,
        apply: F,
    ) -> Result<(VehicleAggregate, T), RepositoryError>
    where
        F: Fn(&mut VehicleAggregate, &mut WriteBatch) -> Result<T, RepositoryError>,
    {
        let vehicle_id = check_vehicle_id(vehicle_id)?;
        let path = doc_path(FLEET_VEHICLES, vehicle_id);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self.store.read_once(&path).await?;
            let mut vehicle = decode_vehicle(vehicle_id, current.clone())?;

            let mut batch = WriteBatch::new();
            let out = apply(&mut vehicle, &mut batch)?;
            batch
                .expect(path.clone(), current)
                .set(path.clone(), to_document(&vehicle, VEHICLE_ID_FIELD)?);

            match self.store.commit(batch).await.map_err(RepositoryError::from) {
                Ok(()) => return Ok((vehicle, out)),
                Err(e) if is_contention(&e) && attempt < MAX_ATTEMPTS => {
                    debug!(vehicle_id, attempt, "Vehicle changed concurrently, retrying");
                }
                Err(e) if is_contention(&e) => {
                    return Err(RepositoryError::Conflict(format!(
                        "Vehicle {vehicle_id} is being changed by someone else, try again"
                    )));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

async fn load_work(store: &dyn DocumentStore) -> Result<Vec<WorkEntry>, RepositoryError> {
    let docs = store.read_collection(FLEET_ENTRIES).await?;
    Ok(decode_all(FLEET_ENTRIES, docs, "id"))
}

/// Reads every work entry; used by the dashboard.
pub(crate) async fn all_work(store: &dyn DocumentStore) -> Result<Vec<WorkEntry>, RepositoryError> {
    load_work(store).await
}

fn check_vehicle_id(vehicle_id: &str) -> Result<&str, RepositoryError> {
    let trimmed = vehicle_id.trim();
    if trimmed.is_empty() {
        return Err(FleetError::MissingVehicle.into());
    }
    Ok(trimmed)
}

fn decode_vehicle(vehicle_id: &str, body: Option<Value>) -> Result<VehicleAggregate, RepositoryError> {
    match body {
        Some(body) => {
            let mut vehicle = from_document(FLEET_VEHICLES, vehicle_id, body, VEHICLE_ID_FIELD)?;
            FleetService::assign_missing_ids(&mut vehicle);
            Ok(vehicle)
        }
        None => Ok(VehicleAggregate {
            vehicle_id: vehicle_id.to_string(),
            ..VehicleAggregate::default()
        }),
    }
}

/// Decodes stored vehicles, giving legacy fuel and advance records their derived ids.
pub(crate) fn decode_vehicles(docs: Vec<(String, Value)>) -> Vec<VehicleAggregate> {
    let mut vehicles: Vec<VehicleAggregate> = decode_all(FLEET_VEHICLES, docs, VEHICLE_ID_FIELD);
    for vehicle in &mut vehicles {
        FleetService::assign_missing_ids(vehicle);
    }
    vehicles
}
