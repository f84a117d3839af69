//! Run telemetry: timings and counters keyed by label

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Accumulated statistics of one label
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraceEntry {
    pub calls: usize,
    pub seconds: f64,
    /// Last value recorded per metric, e.g. the slope after a tour
    pub values: BTreeMap<String, f64>,
}

/// Serializable snapshot of a statistics tracer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceReport {
    pub root: String,
    pub total_seconds: f64,
    pub entries: BTreeMap<String, TraceEntry>,
}

/// Statistics collector; the dummy variant drops everything
#[derive(Debug, Clone)]
pub enum Tracer {
    Dummy,
    Stats {
        root: String,
        start: Instant,
        entries: BTreeMap<String, TraceEntry>,
    },
}

impl Tracer {
    pub fn new(dummy: bool, root: &str) -> Self {
        if dummy {
            Tracer::Dummy
        } else {
            Tracer::Stats {
                root: root.to_string(),
                start: Instant::now(),
                entries: BTreeMap::new(),
            }
        }
    }

    pub fn is_dummy(&self) -> bool {
        matches!(self, Tracer::Dummy)
    }

    /// Start timing `label`; the time is recorded when the span is dropped
    pub fn span(&mut self, label: impl Into<String>) -> TraceSpan<'_> {
        TraceSpan {
            label: label.into(),
            start: Instant::now(),
            tracer: self,
        }
    }

    /// Record one call of `label` that took `duration`
    pub fn record(&mut self, label: &str, duration: Duration) {
        if let Tracer::Stats { entries, .. } = self {
            let entry = entries.entry(label.to_string()).or_default();
            entry.calls += 1;
            entry.seconds += duration.as_secs_f64();
        }
    }

    /// Count an event without timing it
    pub fn count(&mut self, label: &str) {
        self.record(label, Duration::ZERO);
    }

    pub fn note(&mut self, label: &str, metric: &str, value: f64) {
        if let Tracer::Stats { entries, .. } = self {
            entries
                .entry(label.to_string())
                .or_default()
                .values
                .insert(metric.to_string(), value);
        }
    }

    pub fn report(&self) -> Option<TraceReport> {
        match self {
            Tracer::Dummy => None,
            Tracer::Stats { root, start, entries } => Some(TraceReport {
                root: root.clone(),
                total_seconds: start.elapsed().as_secs_f64(),
                entries: entries.clone(),
            }),
        }
    }
}

/// RAII timer for one traced operation
pub struct TraceSpan<'a> {
    label: String,
    start: Instant,
    tracer: &'a mut Tracer,
}

impl Drop for TraceSpan<'_> {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.tracer.record(&self.label, duration);
    }
}
