use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Evaluation status of a trigger or of one of its metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    Ok,
    Warn,
    Error,
    #[serde(rename = "NODATA")]
    NoData,
    Exception,
    Del,
}

impl Status {
    /// Severity rank used when ordering metrics by state. Higher is more severe.
    pub fn weight(self) -> u32 {
        match self {
            Status::Ok | Status::Del => 0,
            Status::Warn => 1,
            Status::Error => 100,
            Status::NoData => 1_000,
            Status::Exception => 100_000,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "OK",
            Status::Warn => "WARN",
            Status::Error => "ERROR",
            Status::NoData => "NODATA",
            Status::Exception => "EXCEPTION",
            Status::Del => "DEL",
        };
        f.pad(name)
    }
}

/// Static definition of an alert rule. Read-only from the view's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Trigger {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub warn_value: Option<f64>,
    #[serde(default)]
    pub error_value: Option<f64>,
    #[serde(default)]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub ttl_state: Option<Status>,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub is_simple_trigger: bool,
    /// Epoch seconds until which notifications are suppressed; 0 means none.
    #[serde(default)]
    pub throttling: i64,
}

impl Trigger {
    pub fn throttled_until(&self) -> Option<DateTime<Utc>> {
        positive_timestamp(self.throttling)
    }
}

/// One time series under evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Metric {
    pub state: Status,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub event_timestamp: Option<i64>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub maintenance: Option<i64>,
    #[serde(default)]
    pub suppressed: bool,
}

impl Metric {
    pub fn maintenance_until(&self) -> Option<DateTime<Utc>> {
        self.maintenance.and_then(positive_timestamp)
    }
}

/// Live evaluation snapshot of a trigger. Replaced wholesale on every fetch.
///
/// Metrics are keyed by name in a `BTreeMap` so iteration order, and with it
/// the order of sort ties, does not depend on hashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TriggerState {
    #[serde(default)]
    pub trigger_id: String,
    #[serde(default)]
    pub state: Status,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub metrics: BTreeMap<String, Metric>,
}

/// A historical state change of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: i64,
    #[serde(default)]
    pub metric: String,
    pub state: Status,
    pub old_state: Status,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub trigger_id: String,
}

/// One page of the trigger's event log, in server order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventList {
    pub total: u64,
    #[serde(default)]
    pub list: Vec<Event>,
    pub page: u64,
    pub size: u64,
}

/// Maintenance directive chosen for a single metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Maintenance {
    Off,
    QuarterHour,
    OneHour,
    ThreeHours,
    SixHours,
    OneDay,
    OneWeek,
    OneMonth,
    /// Any duration in minutes. Zero or negative values are sent verbatim.
    Minutes(i64),
}

impl Maintenance {
    pub fn minutes(self) -> i64 {
        match self {
            Maintenance::Off => 0,
            Maintenance::QuarterHour => 15,
            Maintenance::OneHour => 60,
            Maintenance::ThreeHours => 180,
            Maintenance::SixHours => 360,
            Maintenance::OneDay => 1_440,
            Maintenance::OneWeek => 10_080,
            Maintenance::OneMonth => 43_200,
            Maintenance::Minutes(minutes) => minutes,
        }
    }

    /// Timestamp written to the service: `now + minutes` for a positive
    /// duration, otherwise the raw minute value unchanged.
    pub fn effective_timestamp(self, now: DateTime<Utc>) -> i64 {
        let minutes = self.minutes();
        if minutes > 0 {
            Duration::try_minutes(minutes)
                .and_then(|duration| now.checked_add_signed(duration))
                .map_or(i64::MAX, |until| until.timestamp())
        } else {
            minutes
        }
    }
}

fn positive_timestamp(seconds: i64) -> Option<DateTime<Utc>> {
    if seconds > 0 {
        Utc.timestamp_opt(seconds, 0).single()
    } else {
        None
    }
}
