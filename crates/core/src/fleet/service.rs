//! Fleet service: vehicle costs, the running-hour counter and service status.

use rust_decimal::Decimal;
use sitebook_shared::types::{AdvanceRecordId, FuelRecordId, WorkEntryId};

use super::error::FleetError;
use super::types::{
    AdvanceRecord, FuelRecord, NewAdvance, NewFuelRecord, NewWorkEntry, ServiceStatus,
    VehicleAggregate, VehicleMonth, VehicleUpdate, WorkEntry, WorkSummary,
};
use crate::window::{MonthKey, MonthWindow, parse_iso_date};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Fleet aggregation service.
pub struct FleetService;

impl FleetService {
    /// Fuel, advance, salary and maintenance figures for one month.
    #[must_use]
    pub fn vehicle_month(vehicle: &VehicleAggregate, month: &MonthKey) -> VehicleMonth {
        let window = MonthWindow::new(month.clone());
        let fuel_cost = window.sum(&vehicle.fuel_history, |f| f.cost);
        let fuel_litres = window.sum(&vehicle.fuel_history, |f| f.litres);
        let advance_total = window.sum(&vehicle.advance_history, |a| a.amount);

        VehicleMonth {
            vehicle_id: vehicle.vehicle_id.clone(),
            month: month.clone(),
            fuel_cost,
            fuel_litres,
            advance_total,
            salary: vehicle.salary,
            maintenance_cost: vehicle.service_cost,
            total_cost: fuel_cost + vehicle.salary + vehicle.service_cost,
        }
    }

    /// Hours since the last service against the service interval.
    ///
    /// A non-positive interval reports the vehicle as due.
    #[must_use]
    pub fn service_status(vehicle: &VehicleAggregate, interval_hours: Decimal) -> ServiceStatus {
        let hours_since_service =
            (vehicle.total_running_hours - vehicle.last_service_hours).max(Decimal::ZERO);

        if interval_hours <= Decimal::ZERO {
            return ServiceStatus {
                hours_since_service,
                percent_used: Decimal::ONE_HUNDRED,
                due: true,
            };
        }

        ServiceStatus {
            hours_since_service,
            percent_used: (hours_since_service * Decimal::ONE_HUNDRED / interval_hours).round_dp(1),
            due: hours_since_service >= interval_hours,
        }
    }

    /// Adds a logged entry's hours to the counter.
    pub fn apply_work(vehicle: &mut VehicleAggregate, hours: Decimal) {
        vehicle.total_running_hours += hours;
    }

    /// Takes a deleted entry's hours back off the counter, stopping at zero.
    pub fn reverse_work(vehicle: &mut VehicleAggregate, hours: Decimal) {
        vehicle.total_running_hours = (vehicle.total_running_hours - hours).max(Decimal::ZERO);
    }

    /// Rebuilds the counter from the vehicle's work entries.
    ///
    /// Returns the correction applied (new minus old).
    pub fn resync(vehicle: &mut VehicleAggregate, entries: &[WorkEntry]) -> Decimal {
        let recomputed: Decimal = entries
            .iter()
            .filter(|e| e.vehicle_ref == vehicle.vehicle_id)
            .map(|e| e.hours)
            .sum();
        let drift = recomputed - vehicle.total_running_hours;
        vehicle.total_running_hours = recomputed;
        drift
    }

    /// Records a service at the current counter value.
    pub fn mark_serviced(vehicle: &mut VehicleAggregate) {
        vehicle.last_service_hours = vehicle.total_running_hours;
    }

    /// Applies editable details.
    ///
    /// # Errors
    ///
    /// Returns `FleetError::Negative` for a negative salary or service cost.
    pub fn apply_update(
        vehicle: &mut VehicleAggregate,
        update: VehicleUpdate,
    ) -> Result<(), FleetError> {
        if update.salary.is_some_and(|s| s < Decimal::ZERO) {
            return Err(FleetError::Negative("Salary"));
        }
        if update.service_cost.is_some_and(|c| c < Decimal::ZERO) {
            return Err(FleetError::Negative("Service cost"));
        }

        if let Some(driver) = update.driver {
            vehicle.driver = driver.trim().to_string();
        }
        if let Some(salary) = update.salary {
            vehicle.salary = salary;
        }
        if let Some(cost) = update.service_cost {
            vehicle.service_cost = cost;
        }
        Ok(())
    }

    /// Hours covered by an `HH:MM-HH:MM` range, to two decimal places.
    ///
    /// A range ending before it starts runs past midnight.
    ///
    /// # Errors
    ///
    /// Returns `FleetError::InvalidTimeRange` if the range cannot be parsed.
    pub fn hours_from_range(range: &str) -> Result<Decimal, FleetError> {
        let invalid = || FleetError::InvalidTimeRange(range.to_string());
        let (start, end) = range.split_once('-').ok_or_else(invalid)?;
        let start = minutes_of_day(start.trim()).ok_or_else(invalid)?;
        let end = minutes_of_day(end.trim()).ok_or_else(invalid)?;

        let minutes = (end - start).rem_euclid(MINUTES_PER_DAY);
        Ok((Decimal::from(minutes) / Decimal::from(60)).round_dp(2))
    }

    /// Validates a submitted work entry and resolves its hours.
    ///
    /// Explicit hours win; otherwise they come from the time range; with
    /// neither, the entry carries zero hours.
    ///
    /// # Errors
    ///
    /// Returns `FleetError` for a missing vehicle, bad date or time range, or
    /// negative hours or amount.
    pub fn prepare_work(input: NewWorkEntry) -> Result<WorkEntry, FleetError> {
        let vehicle_ref = input.vehicle_ref.trim().to_string();
        if vehicle_ref.is_empty() {
            return Err(FleetError::MissingVehicle);
        }
        check_date(&input.date)?;
        if input.amount < Decimal::ZERO {
            return Err(FleetError::Negative("Amount"));
        }

        let time_range = input.time_range.trim().to_string();
        let hours = match input.hours {
            Some(hours) => hours,
            None if !time_range.is_empty() => Self::hours_from_range(&time_range)?,
            None => Decimal::ZERO,
        };
        if hours < Decimal::ZERO {
            return Err(FleetError::Negative("Hours"));
        }

        Ok(WorkEntry {
            id: WorkEntryId::new(),
            date: input.date,
            vehicle_ref,
            client: input.client.trim().to_string(),
            time_range,
            hours,
            amount: input.amount,
            is_paid: input.is_paid,
        })
    }

    /// Validates a fuel purchase.
    ///
    /// # Errors
    ///
    /// Returns `FleetError` for a bad date, non-positive cost or negative litres.
    pub fn prepare_fuel(input: &NewFuelRecord) -> Result<FuelRecord, FleetError> {
        check_date(&input.date)?;
        if input.cost <= Decimal::ZERO {
            return Err(FleetError::NonPositiveAmount(input.cost));
        }
        if input.litres < Decimal::ZERO {
            return Err(FleetError::Negative("Litres"));
        }

        Ok(FuelRecord {
            id: FuelRecordId::new(),
            date: input.date.clone(),
            litres: input.litres,
            cost: input.cost,
        })
    }

    /// Validates a driver advance.
    ///
    /// # Errors
    ///
    /// Returns `FleetError` for a bad date or non-positive amount.
    pub fn prepare_advance(input: &NewAdvance) -> Result<AdvanceRecord, FleetError> {
        check_date(&input.date)?;
        if input.amount <= Decimal::ZERO {
            return Err(FleetError::NonPositiveAmount(input.amount));
        }

        Ok(AdvanceRecord {
            id: AdvanceRecordId::new(),
            date: input.date.clone(),
            amount: input.amount,
            reason: input.reason.trim().to_string(),
        })
    }

    /// Gives every id-less fuel and advance record a deterministic id derived
    /// from the vehicle and the record's position.
    pub fn assign_missing_ids(vehicle: &mut VehicleAggregate) {
        for (index, fuel) in vehicle.fuel_history.iter_mut().enumerate() {
            if fuel.id.is_nil() {
                fuel.id = FuelRecordId::derived(&vehicle.vehicle_id, index);
            }
        }
        for (index, advance) in vehicle.advance_history.iter_mut().enumerate() {
            if advance.id.is_nil() {
                advance.id = AdvanceRecordId::derived(&vehicle.vehicle_id, index);
            }
        }
    }

    /// Removes a fuel record from the vehicle and returns it.
    ///
    /// # Errors
    ///
    /// Returns `FleetError::FuelRecordNotFound` if the id is not on the vehicle.
    pub fn remove_fuel(
        vehicle: &mut VehicleAggregate,
        id: FuelRecordId,
    ) -> Result<FuelRecord, FleetError> {
        let index = vehicle
            .fuel_history
            .iter()
            .position(|f| f.id == id)
            .ok_or(FleetError::FuelRecordNotFound(id))?;
        Ok(vehicle.fuel_history.remove(index))
    }

    /// Removes an advance from the vehicle and returns it.
    ///
    /// # Errors
    ///
    /// Returns `FleetError::AdvanceNotFound` if the id is not on the vehicle.
    pub fn remove_advance(
        vehicle: &mut VehicleAggregate,
        id: AdvanceRecordId,
    ) -> Result<AdvanceRecord, FleetError> {
        let index = vehicle
            .advance_history
            .iter()
            .position(|a| a.id == id)
            .ok_or(FleetError::AdvanceNotFound(id))?;
        Ok(vehicle.advance_history.remove(index))
    }

    /// Hours, billed and unpaid totals for a month.
    #[must_use]
    pub fn work_summary(
        entries: &[WorkEntry],
        month: &MonthKey,
        vehicle: Option<&str>,
    ) -> WorkSummary {
        let window = MonthWindow::new(month.clone());
        let selected: Vec<&WorkEntry> = window
            .filter(entries)
            .filter(|e| vehicle.is_none_or(|v| e.vehicle_ref == v))
            .collect();

        WorkSummary {
            month: month.clone(),
            vehicle: vehicle.map(str::to_string),
            entries: selected.len(),
            hours: selected.iter().map(|e| e.hours).sum(),
            billed: selected.iter().map(|e| e.amount).sum(),
            unpaid: selected
                .iter()
                .filter(|e| !e.is_paid)
                .map(|e| e.amount)
                .sum(),
        }
    }

    /// Vehicles whose service is due, by id.
    #[must_use]
    pub fn due_for_service(vehicles: &[VehicleAggregate], interval_hours: Decimal) -> Vec<String> {
        vehicles
            .iter()
            .filter(|v| Self::service_status(v, interval_hours).due)
            .map(|v| v.vehicle_id.clone())
            .collect()
    }
}

fn minutes_of_day(time: &str) -> Option<i64> {
    let (hours, minutes) = time.split_once(':')?;
    let hours: i64 = hours.parse().ok()?;
    let minutes: i64 = minutes.parse().ok()?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    Some(hours * 60 + minutes)
}

fn check_date(date: &str) -> Result<(), FleetError> {
    parse_iso_date(date)
        .map(|_| ())
        .ok_or_else(|| FleetError::InvalidDate(date.to_string()))
}
