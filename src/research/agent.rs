// file: src/research/agent.rs
// description: coordinates the plan, search and synthesize stages for one question
// reference: sequential three-stage pipeline, aborting on the first stage error

use crate::config::{Config, ResearchConfig};
use crate::error::Result;
use crate::gateway::ChatModel;
use crate::models::{QueryPlan, Report};
use crate::research::planner::QueryPlanner;
use crate::research::progress::{RunStats, Stage, StageTracker};
use crate::research::searcher::{QuerySearcher, SearchOutcome};
use crate::research::synthesizer::ReportSynthesizer;
use crate::search::SearchProvider;
use crate::utils::telemetry::OperationTimer;
use crate::utils::validation::Validator;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Everything one invocation produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRun {
    pub plan: QueryPlan,
    pub search: SearchOutcome,
    pub report: Report,
    pub stats: RunStats,
}

pub struct ResearchAgent<'a> {
    chat: &'a dyn ChatModel,
    search: &'a dyn SearchProvider,
    config: ResearchConfig,
    temperature: Option<f32>,
    show_progress: bool,
}

impl<'a> ResearchAgent<'a> {
    pub fn new(
        chat: &'a dyn ChatModel,
        search: &'a dyn SearchProvider,
        config: ResearchConfig,
    ) -> Self {
        Self {
            chat,
            search,
            config,
            temperature: None,
            show_progress: false,
        }
    }

    pub fn from_config(
        chat: &'a dyn ChatModel,
        search: &'a dyn SearchProvider,
        config: &Config,
    ) -> Self {
        let mut agent = Self::new(chat, search, config.research.clone());
        agent.temperature = Some(config.gateway.temperature);
        agent
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn run(&self, question: &str) -> Result<ResearchRun> {
        Validator::validate_question(question)?;
        let question = question.trim();

        info!("Starting research run with {}", self.chat.model());
        let timer = OperationTimer::new("research run");
        let mut tracker = StageTracker::new(self.show_progress);
        let mut stats = RunStats::new();

        tracker.begin(Stage::Plan);
        let plan = self.stage(Stage::Plan, self.plan(question)).await?;
        Self::close(&mut tracker, &mut stats);
        stats.queries_planned = plan.len();
        info!("Plan: {}", plan.queries().join(" | "));

        tracker.begin(Stage::Search);
        tracker.set_detail(&format!("{} queries", plan.len()));
        let searcher = QuerySearcher::new(self.search, self.config.on_search_failure);
        let outcome = self.stage(Stage::Search, searcher.search(&plan)).await?;
        Self::close(&mut tracker, &mut stats);
        stats.queries_failed = outcome.failures.len();
        stats.results_collected = outcome.results.len();

        tracker.begin(Stage::Synthesize);
        let synthesizer = self.synthesizer();
        let report = self
            .stage(Stage::Synthesize, synthesizer.synthesize(&plan, &outcome))
            .await?;
        Self::close(&mut tracker, &mut stats);
        tracker.finish();

        timer.finish_with_count(stats.results_collected);

        Ok(ResearchRun {
            plan,
            search: outcome,
            report,
            stats,
        })
    }

    async fn plan(&self, question: &str) -> Result<QueryPlan> {
        let planner = QueryPlanner::new(self.chat, self.config.max_queries);
        match self.temperature {
            Some(t) => planner.with_temperature(t).plan(question).await,
            None => planner.plan(question).await,
        }
    }

    fn synthesizer(&self) -> ReportSynthesizer<'a> {
        let synthesizer = ReportSynthesizer::new(self.chat, self.config.snippet_chars);
        match self.temperature {
            Some(t) => synthesizer.with_temperature(t),
            None => synthesizer,
        }
    }

    async fn stage<T>(&self, stage: Stage, fut: impl Future<Output = Result<T>>) -> Result<T> {
        fut.await.inspect_err(|e| error!("Stage {} failed: {}", stage, e))
    }

    fn close(tracker: &mut StageTracker, stats: &mut RunStats) {
        if let Some((stage, elapsed)) = tracker.end() {
            info!("Stage {} finished in {:.2}s", stage, elapsed.as_secs_f64());
            stats.record(stage, elapsed);
        }
    }
}
