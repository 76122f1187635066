use std::collections::HashMap;
use std::time::Instant;

/// Observer for frame-loop events.
///
/// Keeps timing and counting out of the loop itself so the CLI can report a
/// summary while tests stay silent.
pub trait LoopLogger: Send {
    /// Called once per tick, whatever its outcome.
    fn tick(&mut self, tick: usize);

    /// Record how long a named stage took for one tick.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. items drawn).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit a summary when the loop shuts down. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullLoopLogger;

impl LoopLogger for NullLoopLogger {
    fn tick(&mut self, _tick: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Tracks per-stage timings and metrics and logs a summary at shutdown.
///
/// A heartbeat line is logged every `throttle_ticks` ticks.
pub struct StdoutLoopLogger {
    throttle_ticks: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    ticks: usize,
    messages: Vec<String>,
}

impl StdoutLoopLogger {
    pub fn new(throttle_ticks: usize) -> Self {
        Self {
            throttle_ticks: throttle_ticks.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            ticks: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.ticks == 0 && self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Loop summary ({} ticks, {:.1}s):",
            self.ticks,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            let max_ms = durations.iter().copied().fold(0.0, f64::max);
            lines.push(format!(
                "  {stage:8}: avg {avg_ms:6.1}ms  max {max_ms:6.1}ms  ({} calls)",
                durations.len()
            ));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            let values = &self.metrics[name];
            let avg = values.iter().sum::<f64>() / values.len().max(1) as f64;
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        if self.ticks > 0 && elapsed_ms > 0.0 {
            let rate = self.ticks as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Tick rate: {rate:.1}/s"));
        }

        Some(lines.join("\n"))
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutLoopLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl LoopLogger for StdoutLoopLogger {
    fn tick(&mut self, tick: usize) {
        self.ticks = tick;
        if tick % self.throttle_ticks == 0 {
            log::info!("Tick {tick}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
