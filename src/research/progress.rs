// file: src/research/progress.rs
// description: stage progress display and timing statistics for a research run
// reference: uses indicatif for the spinner and tracks per-stage durations

use crate::utils::logging::format_step;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Plan,
    Search,
    Synthesize,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Plan, Stage::Search, Stage::Synthesize];

    pub fn number(&self) -> usize {
        match self {
            Stage::Plan => 1,
            Stage::Search => 2,
            Stage::Synthesize => 3,
        }
    }

    fn activity(&self) -> &'static str {
        match self {
            Stage::Plan => "Planning search queries",
            Stage::Search => "Searching the web",
            Stage::Synthesize => "Synthesizing report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Plan => f.write_str("plan"),
            Stage::Search => f.write_str("search"),
            Stage::Synthesize => f.write_str("synthesize"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub plan_ms: u64,
    pub search_ms: u64,
    pub synthesize_ms: u64,
    pub queries_planned: usize,
    pub queries_failed: usize,
    pub results_collected: usize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        let ms = elapsed.as_millis() as u64;
        match stage {
            Stage::Plan => self.plan_ms = ms,
            Stage::Search => self.search_ms = ms,
            Stage::Synthesize => self.synthesize_ms = ms,
        }
    }

    pub fn total_ms(&self) -> u64 {
        self.plan_ms + self.search_ms + self.synthesize_ms
    }

    pub fn search_success_rate(&self) -> f64 {
        if self.queries_planned == 0 {
            return 0.0;
        }
        let ok = self.queries_planned.saturating_sub(self.queries_failed);
        (ok as f64 / self.queries_planned as f64) * 100.0
    }
}

/// Shows which stage is running; hidden when progress output is disabled.
pub struct StageTracker {
    bar: ProgressBar,
    current: Option<(Stage, Instant)>,
}

impl StageTracker {
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        } else {
            ProgressBar::hidden()
        };

        Self { bar, current: None }
    }

    pub fn begin(&mut self, stage: Stage) {
        self.bar.set_message(format_step(
            stage.number(),
            Stage::ALL.len(),
            stage.activity(),
        ));
        self.current = Some((stage, Instant::now()));
    }

    pub fn set_detail(&self, detail: &str) {
        if let Some((stage, _)) = self.current {
            self.bar.set_message(format!(
                "{} ({})",
                format_step(stage.number(), Stage::ALL.len(), stage.activity()),
                detail
            ));
        }
    }

    /// Ends the running stage and returns how long it took.
    pub fn end(&mut self) -> Option<(Stage, Duration)> {
        self.current
            .take()
            .map(|(stage, started)| (stage, started.elapsed()))
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for StageTracker {
    fn drop(&mut self) {
        self.finish();
    }
}
