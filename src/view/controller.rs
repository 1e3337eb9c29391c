use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::page::{render, PageView};
use super::state::{Snapshot, ViewState, NETWORK_ERROR_MESSAGE};
use crate::api::{ApiError, TriggerApi};
use crate::models::Maintenance;
use crate::sorting::SortKey;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Failed to {operation}: {source}")]
    Write {
        operation: &'static str,
        #[source]
        source: ApiError,
    },
}

/// User actions a page can hand back to its controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    DisableThrottling,
    SortBy(SortKey),
    SetMaintenance {
        metric: String,
        maintenance: Maintenance,
    },
    RemoveMetric {
        metric: String,
    },
    ShowEventsPage(u64),
}

/// Owns the view state of one trigger page and keeps it in sync with the
/// alerting service.
///
/// Methods take `&self`; overlapping calls are not queued or cancelled, and
/// their results land in completion order. Mutations raise `loading` before
/// any I/O so callers can gate further input on it.
pub struct TriggerViewController<A> {
    api: Arc<A>,
    trigger_id: Option<String>,
    state: watch::Sender<ViewState>,
}

impl<A: TriggerApi> TriggerViewController<A> {
    /// Mounts a view for `trigger_id`. A missing or empty ID yields an idle
    /// view on which every operation is a no-op.
    pub fn new(api: Arc<A>, trigger_id: Option<&str>) -> Self {
        let trigger_id = trigger_id
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let initial = if trigger_id.is_some() {
            ViewState::mounted()
        } else {
            ViewState::idle()
        };
        let (state, _) = watch::channel(initial);

        Self {
            api,
            trigger_id,
            state,
        }
    }

    pub fn trigger_id(&self) -> Option<&str> {
        self.trigger_id.as_deref()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn page(&self) -> PageView {
        render(&self.state.borrow())
    }

    /// Runs one fetch cycle and commits its snapshot, or records the failure.
    pub async fn refresh(&self) {
        let Some(trigger_id) = self.trigger_id.as_deref() else {
            debug!("No trigger ID, skipping refresh.");
            return;
        };

        let page = self.state.borrow().events_page();
        match self.fetch_snapshot(trigger_id, page).await {
            Ok(snapshot) => {
                info!(
                    trigger_id,
                    metrics = snapshot.trigger_state.metrics.len(),
                    events = snapshot.trigger_events.list.len(),
                    "Trigger view refreshed."
                );
                self.state.send_modify(|state| state.commit(snapshot));
            }
            Err(e) => {
                error!(trigger_id, error = %e, "Failed to refresh trigger view.");
                self.state.send_modify(|state| state.fail(NETWORK_ERROR_MESSAGE));
            }
        }
    }

    async fn fetch_snapshot(&self, trigger_id: &str, page: u64) -> Result<Snapshot, ApiError> {
        let trigger = self.api.get_trigger(trigger_id).await?;
        let trigger_state = self.api.get_trigger_state(trigger_id).await?;
        let trigger_events = self.api.get_trigger_events(trigger_id, page).await?;

        Ok(Snapshot {
            trigger,
            trigger_state,
            trigger_events,
        })
    }

    pub fn select_sort(&self, key: SortKey) {
        self.state.send_modify(|state| {
            let sorting = state.sorting().select(key);
            debug!(key = %sorting.key, descending_first = sorting.descending_first, "Sorting changed.");
            state.set_sorting(sorting);
        });
    }

    pub async fn show_events_page(&self, page: u64) {
        if self.trigger_id.is_none() {
            return;
        }
        self.state.send_modify(|state| {
            state.set_events_page(page);
            state.begin_loading();
        });
        self.refresh().await;
    }

    pub async fn disable_throttling(&self) -> Result<(), ViewError> {
        let Some(trigger_id) = self.begin_mutation() else {
            return Ok(());
        };
        let result = self.api.del_throttling(&trigger_id).await;
        self.finish_mutation("disable throttling", &trigger_id, result)
            .await
    }

    pub async fn set_maintenance(
        &self,
        metric: &str,
        maintenance: Maintenance,
    ) -> Result<(), ViewError> {
        let Some(trigger_id) = self.begin_mutation() else {
            return Ok(());
        };
        let until = maintenance.effective_timestamp(Utc::now());
        debug!(trigger_id = %trigger_id, metric, until, "Setting metric maintenance.");
        let payload = HashMap::from([(metric.to_string(), until)]);
        let result = self.api.set_maintenance(&trigger_id, &payload).await;
        self.finish_mutation("set maintenance", &trigger_id, result)
            .await
    }

    pub async fn remove_metric(&self, metric: &str) -> Result<(), ViewError> {
        let Some(trigger_id) = self.begin_mutation() else {
            return Ok(());
        };
        let result = self.api.del_metric(&trigger_id, metric).await;
        self.finish_mutation("remove metric", &trigger_id, result)
            .await
    }

    pub async fn dispatch(&self, action: ViewAction) -> Result<(), ViewError> {
        match action {
            ViewAction::DisableThrottling => self.disable_throttling().await,
            ViewAction::SortBy(key) => {
                self.select_sort(key);
                Ok(())
            }
            ViewAction::SetMaintenance {
                metric,
                maintenance,
            } => self.set_maintenance(&metric, maintenance).await,
            ViewAction::RemoveMetric { metric } => self.remove_metric(&metric).await,
            ViewAction::ShowEventsPage(page) => {
                self.show_events_page(page).await;
                Ok(())
            }
        }
    }

    // Loading is raised synchronously, before the write is issued.
    fn begin_mutation(&self) -> Option<String> {
        let trigger_id = self.trigger_id.clone()?;
        self.state.send_modify(ViewState::begin_loading);
        Some(trigger_id)
    }

    async fn finish_mutation(
        &self,
        operation: &'static str,
        trigger_id: &str,
        result: Result<(), ApiError>,
    ) -> Result<(), ViewError> {
        // The refetch runs whatever the write returned; a failed write then
        // marks the fresh view as failed.
        match result {
            Ok(()) => {
                info!(trigger_id, operation, "Trigger write completed.");
                self.refresh().await;
                Ok(())
            }
            Err(source) => {
                warn!(trigger_id, operation, error = %source, "Trigger write failed.");
                self.refresh().await;
                self.state.send_modify(|state| state.fail(NETWORK_ERROR_MESSAGE));
                Err(ViewError::Write { operation, source })
            }
        }
    }
}
