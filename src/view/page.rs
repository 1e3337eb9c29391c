//! Read-only page model handed to presentational code.

use chrono::{DateTime, Utc};

use super::state::{Phase, ViewState};
use crate::models::{EventList, Trigger};
use crate::sorting::{sort_metrics, SortedMetrics, Sorting};

#[derive(Debug, Clone, PartialEq)]
pub enum PageView {
    /// Full-page error banner.
    Failed { message: String },
    Loading,
    Ready(TriggerPage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerPage {
    pub trigger: Trigger,
    pub throttled_until: Option<DateTime<Utc>>,
    pub sorting: Sorting,
    pub tabs: Vec<Tab>,
}

impl TriggerPage {
    pub fn metrics(&self) -> Option<&SortedMetrics> {
        self.tabs.iter().find_map(|tab| match tab {
            Tab::Metrics(metrics) => Some(metrics),
            Tab::Events(_) => None,
        })
    }

    pub fn events(&self) -> Option<&EventList> {
        self.tabs.iter().find_map(|tab| match tab {
            Tab::Events(events) => Some(events),
            Tab::Metrics(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tab {
    Metrics(SortedMetrics),
    Events(EventList),
}

/// Error wins over loading, loading wins over data. Metrics are re-sorted on
/// every render from the current state.
pub fn render(state: &ViewState) -> PageView {
    let snapshot = match state.phase() {
        Phase::Failed { message, .. } => {
            return PageView::Failed {
                message: message.clone(),
            }
        }
        Phase::Idle | Phase::Loading { .. } => return PageView::Loading,
        Phase::Loaded(snapshot) => snapshot,
    };

    let sorting = state.sorting();
    let mut tabs = Vec::with_capacity(2);

    let metrics = &snapshot.trigger_state.metrics;
    if !metrics.is_empty() {
        tabs.push(Tab::Metrics(sort_metrics(
            metrics,
            sorting.key,
            sorting.descending_first,
        )));
    }
    if !snapshot.trigger_events.list.is_empty() {
        tabs.push(Tab::Events(snapshot.trigger_events.clone()));
    }

    PageView::Ready(TriggerPage {
        trigger: snapshot.trigger.clone(),
        throttled_until: snapshot.trigger.throttled_until(),
        sorting,
        tabs,
    })
}
