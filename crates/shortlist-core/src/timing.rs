//! Wall-clock timing of pipeline stages.
//!
//! Collection is off by default and enabled with `--timing` or
//! `SHORTLIST_TIMING=1`. Samples are kept per thread; stages are timed on the
//! thread that drives the run, so the report covers the whole pipeline even
//! when a stage fans work out to a pool internally.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;

/// Aggregated timings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingReport {
    /// Stages in first-recorded order.
    pub stages: Vec<StageTiming>,
}

/// Timing statistics for a single named stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    pub name: String,
    pub count: usize,
    pub total: Duration,
    pub max: Duration,
}

thread_local! {
    static SAMPLES: RefCell<Vec<(String, Duration)>> = const { RefCell::new(Vec::new()) };
}

static TIMING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Returns true when `SHORTLIST_TIMING` enables timing collection.
///
/// Supported truthy values: `1`, `true`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("SHORTLIST_TIMING")
        .ok()
        .is_some_and(|value| is_truthy(value.as_str()))
}

/// Enable or disable timing collection.
pub fn set_timing_enabled(enabled: bool) {
    TIMING_ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        clear_timings();
    }
}

#[must_use]
pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::Relaxed)
}

/// Clears all recorded timings for the current thread.
pub fn clear_timings() {
    SAMPLES.with(|samples| samples.borrow_mut().clear());
}

/// Run `f` as the named stage, recording its duration when enabled.
pub fn timed<R>(stage: &str, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }

    let started = Instant::now();
    let result = f();
    record_sample(stage, started.elapsed());
    result
}

/// Drain the current thread's samples into a report.
#[must_use]
pub fn collect_report() -> TimingReport {
    let samples = SAMPLES.with(|samples| std::mem::take(&mut *samples.borrow_mut()));

    let mut order: Vec<String> = Vec::new();
    let mut grouped: BTreeMap<String, StageTiming> = BTreeMap::new();
    for (name, elapsed) in samples {
        let entry = grouped.entry(name.clone()).or_insert_with(|| {
            order.push(name.clone());
            StageTiming {
                name,
                count: 0,
                total: Duration::ZERO,
                max: Duration::ZERO,
            }
        });
        entry.count += 1;
        entry.total += elapsed;
        entry.max = entry.max.max(elapsed);
    }

    let stages = order
        .into_iter()
        .filter_map(|name| grouped.remove(&name))
        .collect();

    TimingReport { stages }
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Sum of every stage's total.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.stages.iter().map(|stage| stage.total).sum()
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let stages = self
            .stages
            .iter()
            .map(|stage| {
                json!({
                    "name": stage.name,
                    "count": stage.count,
                    "total_us": stage.total.as_micros(),
                    "max_us": stage.max.as_micros(),
                })
            })
            .collect::<Vec<_>>();

        json!({ "stages": stages, "total_us": self.total().as_micros() })
    }

    /// Render as a simple table for stderr.
    #[must_use]
    pub fn display_table(&self) -> String {
        use std::fmt::Write as _;

        if self.stages.is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let mut out = String::new();
        out.push_str("stage                        count     total       max\n");
        out.push_str("------------------------------------------------------\n");

        for stage in &self.stages {
            let _ = writeln!(
                out,
                "{:<28} {:>5} {:>9} {:>9}",
                stage.name,
                stage.count,
                format_duration(stage.total),
                format_duration(stage.max)
            );
        }
        let _ = writeln!(out, "{:<28} {:>5} {:>9}", "total", "", format_duration(self.total()));

        out
    }
}

fn record_sample(name: &str, elapsed: Duration) {
    SAMPLES.with(|samples| samples.borrow_mut().push((name.to_string(), elapsed)));
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();

    if micros >= 1_000_000 {
        let secs = micros / 1_000_000;
        let millis = (micros % 1_000_000) / 1_000;
        format!("{secs}.{millis:03}s")
    } else if micros >= 1_000 {
        let millis = micros / 1_000;
        let rem = micros % 1_000;
        format!("{millis}.{rem:03}ms")
    } else {
        format!("{micros}µs")
    }
}

fn is_truthy(value: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|truthy| value.eq_ignore_ascii_case(truthy))
}
