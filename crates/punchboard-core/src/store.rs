//! Dashboard store with parking_lot::RwLock
//!
//! Owns the two disjoint pieces of view state (dashboard snapshot and
//! drill-down) and the explicit fetch → aggregate → publish pipeline that
//! feeds them. Each load takes a ticket; a result whose ticket is no longer
//! the latest is dropped so a slow response can never overwrite newer state.

use chrono::FixedOffset;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analytics::{employee_ids, DashboardSnapshot};
use crate::config::PunchboardConfig;
use crate::drilldown::{CategoryFilter, DateWindow, DetailPage, DrillDownState};
use crate::error::CoreError;
use crate::event::{DashboardEvent, EventBus};
use crate::models::EmployeeId;
use crate::range::{self, Anchors, DateRange, Granularity};
use crate::source::{DepartmentDirectory, RecordFilter, RecordSource};

/// Which screen is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    #[default]
    Dashboard,
    EmployeeDetail { employee_id: EmployeeId },
}

/// Resolved filter inputs for one dashboard load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardParams {
    pub granularity: Granularity,
    pub anchors: Anchors,
    /// Caller-picked window; clamped to the granularity's maximum span
    pub custom_range: Option<DateRange>,
}

impl DashboardParams {
    pub fn new(granularity: Granularity, anchors: Anchors) -> Self {
        Self {
            granularity,
            anchors,
            custom_range: None,
        }
    }

    pub fn custom(granularity: Granularity, range: DateRange) -> Self {
        Self {
            granularity,
            anchors: Anchors::default(),
            custom_range: Some(range),
        }
    }

    pub fn resolve(&self) -> Result<DateRange, CoreError> {
        match self.custom_range {
            Some(custom) => Ok(range::clamp(custom, self.granularity)),
            None => range::resolve(self.granularity, &self.anchors),
        }
    }
}

/// Result of a ticketed load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    /// Result became the current state
    Applied(T),
    /// A newer load started meanwhile; result was discarded
    Superseded,
}

impl<T> LoadOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            LoadOutcome::Applied(value) => Some(value),
            LoadOutcome::Superseded => None,
        }
    }
}

/// Central state for the attendance dashboard
///
/// `S` answers record queries, `D` resolves departments. The same value may
/// serve both (see `Dataset`).
pub struct DashboardStore<S, D> {
    source: S,
    directory: D,
    config: PunchboardConfig,
    tz: FixedOffset,

    /// Last applied dashboard snapshot
    dashboard: RwLock<Option<Arc<DashboardSnapshot>>>,

    /// Present only while the detail view is open
    drill_down: RwLock<Option<DrillDownState>>,

    view: RwLock<View>,

    load_ticket: AtomicU64,
    drill_ticket: AtomicU64,

    event_bus: EventBus,
}

impl<S, D> DashboardStore<S, D>
where
    S: RecordSource,
    D: DepartmentDirectory,
{
    pub fn new(source: S, directory: D, config: PunchboardConfig) -> Self {
        let tz = config.timezone();
        Self {
            source,
            directory,
            config,
            tz,
            dashboard: RwLock::new(None),
            drill_down: RwLock::new(None),
            view: RwLock::new(View::Dashboard),
            load_ticket: AtomicU64::new(0),
            drill_ticket: AtomicU64::new(0),
            event_bus: EventBus::default_capacity(),
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn config(&self) -> &PunchboardConfig {
        &self.config
    }

    pub fn timezone(&self) -> &FixedOffset {
        &self.tz
    }

    pub fn view(&self) -> View {
        *self.view.read()
    }

    /// Last applied snapshot (None before the first successful load)
    pub fn snapshot(&self) -> Option<Arc<DashboardSnapshot>> {
        self.dashboard.read().clone()
    }

    /// Resolve the window, fetch, aggregate and publish a new snapshot
    ///
    /// On fetch failure the previous snapshot stays in place and the error
    /// is returned.
    pub async fn load(
        &self,
        params: &DashboardParams,
    ) -> Result<LoadOutcome<Arc<DashboardSnapshot>>, CoreError> {
        let range = params.resolve()?;
        let ticket = self.load_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        info!(ticket, %range, granularity = %params.granularity, "Dashboard load started");

        let snapshot = match self.fetch_snapshot(range).await {
            Ok(snapshot) => snapshot,
            Err(_) if !self.is_latest_load(ticket) => {
                return Ok(self.superseded_load(ticket));
            }
            Err(e) => {
                warn!(ticket, error = %e, "Dashboard load failed, keeping previous state");
                self.event_bus
                    .publish(DashboardEvent::LoadFailed(e.to_string()));
                return Err(e);
            }
        };

        let snapshot = Arc::new(snapshot);
        {
            let mut current = self.dashboard.write();
            if !self.is_latest_load(ticket) {
                drop(current);
                return Ok(self.superseded_load(ticket));
            }
            *current = Some(Arc::clone(&snapshot));
        }

        info!(
            ticket,
            records = snapshot.record_count,
            employees = snapshot.employee_count,
            "Dashboard load applied"
        );
        self.event_bus
            .publish(DashboardEvent::DashboardLoaded { version: ticket });

        Ok(LoadOutcome::Applied(snapshot))
    }

    async fn fetch_snapshot(&self, range: DateRange) -> Result<DashboardSnapshot, CoreError> {
        let records = self
            .source
            .fetch_records(&RecordFilter::in_range(range))
            .await?;
        let departments = self
            .directory
            .fetch_departments(&employee_ids(&records))
            .await?;

        Ok(DashboardSnapshot::compute(
            &records,
            &departments,
            range,
            self.config.top_n,
        ))
    }

    fn is_latest_load(&self, ticket: u64) -> bool {
        self.load_ticket.load(Ordering::SeqCst) == ticket
    }

    fn superseded_load<T>(&self, ticket: u64) -> LoadOutcome<T> {
        debug!(ticket, "Dashboard load superseded, result discarded");
        self.event_bus
            .publish(DashboardEvent::LoadSuperseded { version: ticket });
        LoadOutcome::Superseded
    }

    /// Fetch one employee's full history and open the detail view
    pub async fn select_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<LoadOutcome<DetailPage>, CoreError> {
        let ticket = self.drill_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(ticket, employee_id, "Drill-down load started");

        let records = match self
            .source
            .fetch_records(&RecordFilter::employee(employee_id))
            .await
        {
            Ok(records) => records,
            Err(_) if !self.is_latest_drill(ticket) => return Ok(LoadOutcome::Superseded),
            Err(e) => {
                warn!(employee_id, error = %e, "Drill-down load failed");
                self.event_bus
                    .publish(DashboardEvent::LoadFailed(e.to_string()));
                return Err(e);
            }
        };

        let state = DrillDownState::new(employee_id, records, self.config.page_size, self.tz);
        let page = state.detail_page();
        {
            let mut drill_down = self.drill_down.write();
            if !self.is_latest_drill(ticket) {
                debug!(ticket, employee_id, "Drill-down load superseded");
                return Ok(LoadOutcome::Superseded);
            }
            *drill_down = Some(state);
            *self.view.write() = View::EmployeeDetail { employee_id };
        }

        info!(employee_id, records = page.total_items, "Drill-down opened");
        self.event_bus
            .publish(DashboardEvent::EmployeeSelected(employee_id));

        Ok(LoadOutcome::Applied(page))
    }

    fn is_latest_drill(&self, ticket: u64) -> bool {
        self.drill_ticket.load(Ordering::SeqCst) == ticket
    }

    /// Drop the drill-down state; any in-flight selection is discarded too
    pub fn back_to_dashboard(&self) {
        self.drill_ticket.fetch_add(1, Ordering::SeqCst);
        *self.drill_down.write() = None;
        *self.view.write() = View::Dashboard;
        self.event_bus.publish(DashboardEvent::ReturnedToDashboard);
    }

    /// Read access to the open drill-down
    pub fn with_drill_down<R>(&self, f: impl FnOnce(&DrillDownState) -> R) -> Option<R> {
        self.drill_down.read().as_ref().map(f)
    }

    pub fn detail_page(&self) -> Option<DetailPage> {
        self.with_drill_down(DrillDownState::detail_page)
    }

    fn update_detail<R>(&self, f: impl FnOnce(&mut DrillDownState) -> R) -> Result<R, CoreError> {
        let result = {
            let mut guard = self.drill_down.write();
            let state = guard.as_mut().ok_or(CoreError::NoEmployeeSelected)?;
            f(state)
        };
        self.event_bus.publish(DashboardEvent::DetailUpdated);
        Ok(result)
    }

    pub fn set_detail_window(&self, window: DateWindow) -> Result<(), CoreError> {
        self.update_detail(|state| state.set_window(window))
    }

    pub fn set_detail_category(&self, category: CategoryFilter) -> Result<(), CoreError> {
        self.update_detail(|state| state.set_category(category))
    }

    pub fn set_page_size(&self, page_size: usize) -> Result<(), CoreError> {
        self.update_detail(|state| state.set_page_size(page_size))
    }

    pub fn next_page(&self) -> Result<bool, CoreError> {
        self.update_detail(DrillDownState::next_page)
    }

    pub fn prev_page(&self) -> Result<bool, CoreError> {
        self.update_detail(DrillDownState::prev_page)
    }

    pub fn goto_page(&self, page_index: usize) -> Result<(), CoreError> {
        self.update_detail(|state| state.goto_page(page_index))
    }
}
