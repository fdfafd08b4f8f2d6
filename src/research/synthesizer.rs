// file: src/research/synthesizer.rs
// description: synthesize stage, writing the report from accumulated results

use crate::error::{AgentError, Result};
use crate::gateway::{ChatModel, ChatRequest};
use crate::models::{QueryPlan, Report, Source};
use crate::prompts;
use crate::research::searcher::SearchOutcome;
use crate::utils::validation::Validator;
use tracing::debug;

pub struct ReportSynthesizer<'a> {
    chat: &'a dyn ChatModel,
    snippet_chars: usize,
    temperature: Option<f32>,
}

impl<'a> ReportSynthesizer<'a> {
    pub fn new(chat: &'a dyn ChatModel, snippet_chars: usize) -> Self {
        Self {
            chat,
            snippet_chars,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub async fn synthesize(&self, plan: &QueryPlan, outcome: &SearchOutcome) -> Result<Report> {
        let sources = number_sources(outcome);
        let context = self.render_sources(outcome);
        let answers = outcome
            .answers
            .iter()
            .map(|(query, answer)| format!("- {}: {}", query, answer))
            .collect::<Vec<_>>()
            .join("\n");

        debug!(
            "Synthesizing from {} sources ({} chars of context)",
            sources.len(),
            context.len()
        );

        let mut request = ChatRequest::with_system(
            prompts::SYNTHESIZER_SYSTEM,
            prompts::synthesizer_user(&plan.question, &context, &answers),
        );
        request.temperature = self.temperature;

        let body = self.chat.complete(&request).await?;
        if body.trim().is_empty() {
            return Err(AgentError::malformed(
                self.chat.model(),
                "synthesis returned an empty report",
            ));
        }

        Ok(Report::new(
            &plan.question,
            plan.queries().to_vec(),
            body,
            sources,
            self.chat.model(),
        ))
    }

    fn render_sources(&self, outcome: &SearchOutcome) -> String {
        if outcome.results.is_empty() {
            return "(no search results were found)".to_string();
        }

        outcome
            .results
            .iter()
            .enumerate()
            .map(|(i, result)| {
                format!(
                    "[{}] {}\nURL: {}\n{}\n",
                    i + 1,
                    result.display_title(),
                    result.url,
                    Validator::truncate_text(&result.snippet, self.snippet_chars)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Numbers results from 1, matching the `[n]` citations in the prompt.
pub fn number_sources(outcome: &SearchOutcome) -> Vec<Source> {
    outcome
        .results
        .iter()
        .enumerate()
        .map(|(i, result)| Source {
            index: i + 1,
            title: result.display_title().to_string(),
            url: result.url.clone(),
        })
        .collect()
}
