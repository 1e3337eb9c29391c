//! Ordering of a trigger's metric map for display.
//!
//! The engine is a pure transform: it reads an unordered name -> metric map
//! and builds a new ordered sequence, leaving the input untouched.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::models::Metric;

/// Column a metric list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    State,
    Name,
    Event,
    Value,
}

impl SortKey {
    fn comparator(self) -> fn((&str, &Metric), (&str, &Metric)) -> Ordering {
        match self {
            SortKey::State => compare_state,
            SortKey::Name => compare_name,
            SortKey::Event => compare_event,
            SortKey::Value => compare_value,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::State => "state",
            SortKey::Name => "name",
            SortKey::Event => "event",
            SortKey::Value => "value",
        };
        f.pad(name)
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "state" => Ok(SortKey::State),
            "name" => Ok(SortKey::Name),
            "event" => Ok(SortKey::Event),
            "value" => Ok(SortKey::Value),
            other => Err(format!("Unknown sort key: {other}")),
        }
    }
}

/// Active sort column and direction.
///
/// `descending_first` is the initial direction for every column; with it set,
/// an element whose key compares lower is placed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sorting {
    pub key: SortKey,
    pub descending_first: bool,
}

impl Default for Sorting {
    fn default() -> Self {
        Self {
            key: SortKey::default(),
            descending_first: true,
        }
    }
}

impl Sorting {
    /// Selecting the active column flips direction; a new column resets it.
    pub fn select(self, key: SortKey) -> Self {
        if key == self.key {
            Self {
                key,
                descending_first: !self.descending_first,
            }
        } else {
            Self {
                key,
                descending_first: true,
            }
        }
    }
}

/// Metrics in display order. Keys keep their original spelling.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortedMetrics(Vec<(String, Metric)>);

impl SortedMetrics {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Metric)> {
        self.0.iter().map(|(name, metric)| (name.as_str(), metric))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.0
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, metric)| metric)
    }
}

impl IntoIterator for SortedMetrics {
    type Item = (String, Metric);
    type IntoIter = std::vec::IntoIter<(String, Metric)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

pub fn sort_metrics(
    metrics: &BTreeMap<String, Metric>,
    key: SortKey,
    descending_first: bool,
) -> SortedMetrics {
    let compare = key.comparator();
    let mut entries: Vec<(String, Metric)> = metrics
        .iter()
        .map(|(name, metric)| (name.clone(), metric.clone()))
        .collect();

    entries.sort_by(|(name_a, a), (name_b, b)| {
        let ordering = compare((name_a.as_str(), a), (name_b.as_str(), b));
        if descending_first {
            ordering
        } else {
            ordering.reverse()
        }
    });

    SortedMetrics(entries)
}

/// Comparison form of a metric name: trimmed, restricted to `[A-Za-z0-9-.]`,
/// lower-cased.
pub fn normalize_metric_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '.')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn compare_state((_, a): (&str, &Metric), (_, b): (&str, &Metric)) -> Ordering {
    a.state.weight().cmp(&b.state.weight())
}

fn compare_name((a, _): (&str, &Metric), (b, _): (&str, &Metric)) -> Ordering {
    normalize_metric_name(a).cmp(&normalize_metric_name(b))
}

fn compare_event((_, a): (&str, &Metric), (_, b): (&str, &Metric)) -> Ordering {
    a.event_timestamp
        .unwrap_or(0)
        .cmp(&b.event_timestamp.unwrap_or(0))
}

fn compare_value((_, a): (&str, &Metric), (_, b): (&str, &Metric)) -> Ordering {
    ordering_value(a).total_cmp(&ordering_value(b))
}

// Missing, zero and NaN all rank as 0 so the comparator stays a total order.
fn ordering_value(metric: &Metric) -> f64 {
    match metric.value {
        Some(value) if value != 0.0 && !value.is_nan() => value,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn metric(state: Status, event_timestamp: Option<i64>, value: Option<f64>) -> Metric {
        Metric {
            state,
            event_timestamp,
            value,
            ..Metric::default()
        }
    }

    fn sample_metrics() -> BTreeMap<String, Metric> {
        BTreeMap::from([
            ("Beta.cpu".to_string(), metric(Status::Error, Some(300), Some(5.0))),
            ("alpha.cpu".to_string(), metric(Status::Ok, Some(100), None)),
            ("gamma.cpu".to_string(), metric(Status::NoData, None, Some(-2.0))),
            ("delta.cpu".to_string(), metric(Status::Warn, Some(200), Some(10.0))),
        ])
    }

    fn names(sorted: &SortedMetrics) -> Vec<&str> {
        sorted.names().collect()
    }

    #[test]
    fn test_sort_by_state() {
        let metrics = sample_metrics();

        let first = sort_metrics(&metrics, SortKey::State, true);
        assert_eq!(names(&first), ["alpha.cpu", "delta.cpu", "Beta.cpu", "gamma.cpu"]);

        let flipped = sort_metrics(&metrics, SortKey::State, false);
        assert_eq!(names(&flipped), ["gamma.cpu", "Beta.cpu", "delta.cpu", "alpha.cpu"]);
    }

    #[test]
    fn test_sort_by_name_ignores_case_and_keeps_original_keys() {
        let metrics = sample_metrics();

        let sorted = sort_metrics(&metrics, SortKey::Name, true);

        assert_eq!(names(&sorted), ["alpha.cpu", "Beta.cpu", "delta.cpu", "gamma.cpu"]);
        assert!(sorted.get("Beta.cpu").is_some());
    }

    #[test]
    fn test_sort_by_event_treats_missing_as_zero() {
        let metrics = sample_metrics();

        let sorted = sort_metrics(&metrics, SortKey::Event, true);

        assert_eq!(names(&sorted), ["gamma.cpu", "alpha.cpu", "delta.cpu", "Beta.cpu"]);
    }

    #[test]
    fn test_sort_by_value() {
        let metrics = sample_metrics();

        let sorted = sort_metrics(&metrics, SortKey::Value, false);

        assert_eq!(names(&sorted), ["delta.cpu", "Beta.cpu", "alpha.cpu", "gamma.cpu"]);
    }

    #[test]
    fn test_missing_value_sorts_like_zero() {
        let missing = metric(Status::Ok, None, None);
        let zero = metric(Status::Ok, None, Some(0.0));
        let nan = metric(Status::Ok, None, Some(f64::NAN));

        assert_eq!(compare_value(("a", &missing), ("b", &zero)), Ordering::Equal);
        assert_eq!(compare_value(("a", &nan), ("b", &zero)), Ordering::Equal);
        assert_eq!(
            compare_value(("a", &missing), ("b", &metric(Status::Ok, None, Some(1.0)))),
            Ordering::Less
        );
    }

    #[test]
    fn test_sort_is_pure() {
        let metrics = sample_metrics();
        let before = metrics.clone();

        let first = sort_metrics(&metrics, SortKey::Value, true);
        let second = sort_metrics(&metrics, SortKey::Value, true);

        assert_eq!(first, second);
        assert_eq!(metrics, before);
        assert_eq!(first.len(), metrics.len());
        for (name, metric) in first.iter() {
            assert_eq!(metrics.get(name), Some(metric));
        }
    }

    #[test]
    fn test_normalize_metric_name() {
        assert_eq!(normalize_metric_name("Metric-A!"), "metric-a");
        assert_eq!(normalize_metric_name("metric-a"), "metric-a");
        assert_eq!(normalize_metric_name("  Srv_01.CPU load "), "srv01.cpuload");
        assert_eq!(
            compare_name(("Metric-A!", &Metric::default()), ("metric-a", &Metric::default())),
            Ordering::Equal
        );
    }

    #[test]
    fn test_select_same_key_twice_restores_direction() {
        let initial = Sorting::default();

        let once = initial.select(SortKey::State);
        assert!(!once.descending_first);

        let twice = once.select(SortKey::State);
        assert_eq!(twice, initial);
    }

    #[test]
    fn test_select_new_key_resets_direction() {
        let flipped = Sorting::default().select(SortKey::State);
        assert!(!flipped.descending_first);

        let renamed = flipped.select(SortKey::Name);
        assert_eq!(
            renamed,
            Sorting {
                key: SortKey::Name,
                descending_first: true
            }
        );
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("Value".parse::<SortKey>().unwrap(), SortKey::Value);
        assert!("severity".parse::<SortKey>().is_err());
    }
}
