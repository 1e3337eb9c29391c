use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use crate::models::{EventList, Trigger, TriggerState};

pub mod client;

pub use client::HttpTriggerApi;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request to {url} failed with status {status}: {body}")]
    Status { status: u16, url: String, body: String },
    #[error("Invalid API configuration: {0}")]
    InvalidConfiguration(String),
}

/// The alerting service as seen by the trigger view: three reads and three
/// writes, all scoped to one trigger.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TriggerApi: Send + Sync {
    async fn get_trigger(&self, trigger_id: &str) -> Result<Trigger, ApiError>;

    async fn get_trigger_state(&self, trigger_id: &str) -> Result<TriggerState, ApiError>;

    /// Fetches one page of the trigger's event log.
    async fn get_trigger_events(&self, trigger_id: &str, page: u64) -> Result<EventList, ApiError>;

    /// Clears notification throttling for the trigger.
    async fn del_throttling(&self, trigger_id: &str) -> Result<(), ApiError>;

    /// Writes maintenance deadlines, keyed by metric name, in epoch seconds.
    async fn set_maintenance(
        &self,
        trigger_id: &str,
        maintenance: &HashMap<String, i64>,
    ) -> Result<(), ApiError>;

    /// Drops one metric series from the trigger.
    async fn del_metric(&self, trigger_id: &str, metric: &str) -> Result<(), ApiError>;
}
