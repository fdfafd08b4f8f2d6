// file: src/research/searcher.rs
// description: search stage, running each planned query in order

use crate::config::SearchFailurePolicy;
use crate::error::{AgentError, Result};
use crate::models::{QueryPlan, SearchResult};
use crate::search::{SearchBatch, SearchProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryFailure {
    pub query: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Results across all queries, unique by URL, in query order.
    pub results: Vec<SearchResult>,
    /// Provider-written answers, one per query that returned one.
    pub answers: Vec<(String, String)>,
    pub failures: Vec<QueryFailure>,
    pub queries_run: usize,
}

impl SearchOutcome {
    fn absorb(&mut self, batch: SearchBatch, seen: &mut HashSet<String>) {
        if let Some(answer) = batch.answer {
            self.answers.push((batch.query.clone(), answer));
        }
        for result in batch.results {
            if seen.insert(result.url.clone()) {
                self.results.push(result);
            }
        }
    }
}

pub struct QuerySearcher<'a> {
    provider: &'a dyn SearchProvider,
    policy: SearchFailurePolicy,
}

impl<'a> QuerySearcher<'a> {
    pub fn new(provider: &'a dyn SearchProvider, policy: SearchFailurePolicy) -> Self {
        Self { provider, policy }
    }

    /// Issues one request per planned query, sequentially.
    ///
    /// Under `Abort` the first failure ends the stage. Under `Skip` failures
    /// are recorded and the stage fails only if no query succeeded.
    /// Authentication failures always end the stage.
    pub async fn search(&self, plan: &QueryPlan) -> Result<SearchOutcome> {
        let mut outcome = SearchOutcome::default();
        let mut seen = HashSet::new();
        let mut last_error = None;

        for query in plan.queries() {
            outcome.queries_run += 1;
            match self.provider.search(query).await {
                Ok(batch) => {
                    info!("{} results for \"{}\"", batch.results.len(), query);
                    outcome.absorb(batch, &mut seen);
                }
                Err(e) => {
                    let failed = AgentError::SearchFailed {
                        query: query.clone(),
                        source: Box::new(e),
                    };

                    if self.policy == SearchFailurePolicy::Abort || failed.is_auth() {
                        return Err(failed);
                    }

                    warn!("Skipping failed search: {}", failed);
                    outcome.failures.push(QueryFailure {
                        query: query.clone(),
                        error: failed.to_string(),
                    });
                    last_error = Some(failed);
                }
            }
        }

        if outcome.failures.len() == plan.len()
            && let Some(err) = last_error
        {
            return Err(err);
        }

        Ok(outcome)
    }
}
