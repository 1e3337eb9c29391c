use std::sync::Arc;

use crate::models::{EventList, Trigger, TriggerState};
use crate::sorting::Sorting;

/// User-facing message for any failure in a fetch or write.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please, reload page";

/// Result of one complete fetch cycle. Built only after all three reads
/// succeed, so the view never holds a partial mix of cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub trigger: Trigger,
    pub trigger_state: TriggerState,
    pub trigger_events: EventList,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// No valid trigger to load.
    Idle,
    Loading {
        previous: Option<Arc<Snapshot>>,
    },
    Loaded(Arc<Snapshot>),
    Failed {
        message: String,
        previous: Option<Arc<Snapshot>>,
    },
}

/// View state owned by one controller for one trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    phase: Phase,
    sorting: Sorting,
    events_page: u64,
}

impl ViewState {
    /// State of a freshly mounted view: loading, nothing fetched yet.
    pub fn mounted() -> Self {
        Self::with_phase(Phase::Loading { previous: None })
    }

    pub fn idle() -> Self {
        Self::with_phase(Phase::Idle)
    }

    fn with_phase(phase: Phase) -> Self {
        Self {
            phase,
            sorting: Sorting::default(),
            events_page: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Most recent complete snapshot, including a stale one kept across a
    /// reload or a failure.
    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Loaded(snapshot) => Some(snapshot),
            Phase::Loading { previous } | Phase::Failed { previous, .. } => previous.as_ref(),
        }
    }

    pub fn trigger(&self) -> Option<&Trigger> {
        self.snapshot().map(|snapshot| &snapshot.trigger)
    }

    pub fn trigger_state(&self) -> Option<&TriggerState> {
        self.snapshot().map(|snapshot| &snapshot.trigger_state)
    }

    pub fn trigger_events(&self) -> Option<&EventList> {
        self.snapshot().map(|snapshot| &snapshot.trigger_events)
    }

    pub fn sorting(&self) -> Sorting {
        self.sorting
    }

    pub fn events_page(&self) -> u64 {
        self.events_page
    }

    pub(crate) fn begin_loading(&mut self) {
        let previous = self.snapshot().cloned();
        self.phase = Phase::Loading { previous };
    }

    pub(crate) fn commit(&mut self, snapshot: Snapshot) {
        self.phase = Phase::Loaded(Arc::new(snapshot));
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        let previous = self.snapshot().cloned();
        self.phase = Phase::Failed {
            message: message.into(),
            previous,
        };
    }

    pub(crate) fn set_sorting(&mut self, sorting: Sorting) {
        self.sorting = sorting;
    }

    pub(crate) fn set_events_page(&mut self, page: u64) {
        self.events_page = page;
    }
}
