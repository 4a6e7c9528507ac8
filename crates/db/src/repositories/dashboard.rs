//! Month overview across every module, and the assistant built on it.

use std::sync::Arc;

use rust_decimal::Decimal;
use sitebook_core::assistant::{AssistantReply, AssistantService};
use sitebook_core::collections::{FLEET_VEHICLES, INVOICES};
use sitebook_core::dashboard::{DashboardInputs, DashboardService, MonthOverview};
use sitebook_core::fleet::VehicleAggregate;
use sitebook_core::invoice::Invoice;
use sitebook_core::window::MonthKey;
use tracing::debug;

use super::cashbook::load_entries;
use super::error::RepositoryError;
use super::fleet::{all_work, decode_vehicles};
use super::inventory::stored_items;
use super::invoice::decode_invoices;
use crate::store::{DocumentStore, LocalStore};

/// Dashboard repository.
#[derive(Clone)]
pub struct DashboardRepository {
    store: Arc<dyn DocumentStore>,
    local: LocalStore,
}

impl DashboardRepository {
    /// Creates a new dashboard repository.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, local: LocalStore) -> Self {
        Self { store, local }
    }

    /// Key figures for `month`.
    ///
    /// # Errors
    ///
    /// Returns an error if a store read fails.
    pub async fn overview(
        &self,
        month: &MonthKey,
        service_interval: Decimal,
    ) -> Result<MonthOverview, RepositoryError> {
        let store = self.store.as_ref();
        let (cashbook, invoices, work, vehicles) = tokio::try_join!(
            load_entries(store),
            async {
                let docs = store.read_collection(INVOICES).await?;
                Ok::<Vec<Invoice>, RepositoryError>(decode_invoices(docs))
            },
            all_work(store),
            async {
                let docs = store.read_collection(FLEET_VEHICLES).await?;
                Ok::<Vec<VehicleAggregate>, RepositoryError>(decode_vehicles(docs))
            },
        )?;
        let items = stored_items(&self.local)?;

        let overview = DashboardService::month_overview(
            DashboardInputs {
                cashbook: &cashbook,
                invoices: &invoices,
                work: &work,
                vehicles: &vehicles,
                items: &items,
                service_interval,
            },
            month,
        );
        debug!(month = %month.as_str(), net = %overview.net, "Dashboard computed");
        Ok(overview)
    }

    /// Answers a chat message from the figures for `month`.
    ///
    /// # Errors
    ///
    /// Returns an error if a store read fails.
    pub async fn ask(
        &self,
        message: &str,
        month: &MonthKey,
        service_interval: Decimal,
        business: &str,
    ) -> Result<AssistantReply, RepositoryError> {
        let overview = self.overview(month, service_interval).await?;
        Ok(AssistantService::respond(message, &overview, business))
    }
}
