// file: src/coding/agent.rs
// description: plan, execute, decide and fix loop for small Python tasks
// reference: bounded retry loop, at most `max_attempts` model calls

use crate::coding::extract;
use crate::coding::runner::{PythonRunResult, PythonRunner};
use crate::config::Config;
use crate::error::{AgentError, Result};
use crate::gateway::{ChatModel, ChatRequest};
use crate::prompts;
use crate::utils::telemetry::OperationTimer;
use crate::utils::validation::Validator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Something that can run a snippet of Python and report the result.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, code: &str) -> Result<PythonRunResult>;
}

#[async_trait]
impl CodeExecutor for PythonRunner {
    async fn execute(&self, code: &str) -> Result<PythonRunResult> {
        self.run(code).await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodingOutcome {
    pub task: String,
    /// Full text of the planning reply.
    pub plan: String,
    /// The code that ran last.
    pub code: String,
    pub last_run: Option<PythonRunResult>,
    pub attempts: u32,
    pub done: bool,
}

impl CodingOutcome {
    pub fn succeeded(&self) -> bool {
        self.last_run.as_ref().is_some_and(|r| r.ok)
    }
}

pub struct CodingAgent<'a> {
    chat: &'a dyn ChatModel,
    executor: &'a dyn CodeExecutor,
    max_attempts: u32,
    temperature: Option<f32>,
}

impl<'a> CodingAgent<'a> {
    pub fn new(chat: &'a dyn ChatModel, executor: &'a dyn CodeExecutor, max_attempts: u32) -> Self {
        Self {
            chat,
            executor,
            max_attempts: max_attempts.max(1),
            temperature: None,
        }
    }

    pub fn from_config(
        chat: &'a dyn ChatModel,
        executor: &'a dyn CodeExecutor,
        config: &Config,
    ) -> Self {
        let mut agent = Self::new(chat, executor, config.coding.max_attempts);
        agent.temperature = Some(config.gateway.temperature);
        agent
    }

    pub async fn run(&self, task: &str) -> Result<CodingOutcome> {
        Validator::validate_content_not_empty(task)
            .map_err(|_| AgentError::Validation("Task must not be empty".to_string()))?;
        let task = task.trim();
        let timer = OperationTimer::new("coding task");

        let plan = self.ask(prompts::coding_plan(task)).await?;
        let mut outcome = CodingOutcome {
            task: task.to_string(),
            code: extract::plan_code(&plan),
            plan,
            last_run: None,
            attempts: 1,
            done: false,
        };

        loop {
            outcome.code = extract::ensure_prints(&outcome.code);
            debug!("Attempt {} code:\n{}", outcome.attempts, outcome.code);

            let run = self.executor.execute(&outcome.code).await?;
            let ok = run.ok;
            if !ok {
                warn!(
                    "Attempt {} failed with exit code {}",
                    outcome.attempts, run.exit_code
                );
            }
            outcome.last_run = Some(run);

            if ok || outcome.attempts >= self.max_attempts {
                break;
            }

            let fix = self.fix_prompt(&outcome);
            let reply = self.ask(fix).await?;
            outcome.code = extract::fix_code(&reply);
            outcome.attempts += 1;
        }

        outcome.done = true;
        info!(
            "Coding task finished after {} attempt(s), success: {}",
            outcome.attempts,
            outcome.succeeded()
        );
        timer.finish();
        Ok(outcome)
    }

    fn fix_prompt(&self, outcome: &CodingOutcome) -> String {
        let (stdout, stderr) = outcome
            .last_run
            .as_ref()
            .map(|r| (r.stdout.as_str(), r.stderr.as_str()))
            .unwrap_or_default();
        prompts::coding_fix(&outcome.task, &outcome.code, stdout, stderr)
    }

    async fn ask(&self, user: String) -> Result<String> {
        let mut request = ChatRequest::with_system(prompts::CODING_SYSTEM, user);
        request.temperature = self.temperature;
        self.chat.complete(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::runner::SAFE_NOTE;
    use std::sync::Mutex;

    /// Replies with the planning text first, then the fix text on every later call.
    struct ScriptedChat {
        plan: &'static str,
        fix: &'static str,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatModel for ScriptedChat {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(request.messages[1].content.clone());
            let reply = if prompts.len() == 1 { self.plan } else { self.fix };
            Ok(reply.to_string())
        }
    }

    /// Succeeds only for code equal to `accept`.
    struct FakeExecutor {
        accept: &'static str,
        ran: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CodeExecutor for FakeExecutor {
        async fn execute(&self, code: &str) -> Result<PythonRunResult> {
            self.ran.lock().unwrap().push(code.to_string());
            let ok = code == self.accept;
            Ok(PythonRunResult {
                ok,
                stdout: if ok { "9227465\n".to_string() } else { String::new() },
                stderr: if ok { String::new() } else { "NameError: name 'fib' is not defined".to_string() },
                exit_code: if ok { 0 } else { 1 },
                note: SAFE_NOTE.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_finishes_after_first_success() {
        let chat = ScriptedChat {
            plan: "Plan:\niterate\n\n```python\nprint(9227465)\n```",
            fix: "unused",
            prompts: Mutex::new(vec![]),
        };
        let executor = FakeExecutor {
            accept: "print(9227465)",
            ran: Mutex::new(vec![]),
        };

        let outcome = CodingAgent::new(&chat, &executor, 3)
            .run("Print Fibonacci(35).")
            .await
            .unwrap();

        assert!(outcome.done);
        assert!(outcome.succeeded());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(chat.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fix_round_uses_run_output() {
        let chat = ScriptedChat {
            plan: "```python\nprint(fib(35))\n```",
            fix: "```python\nprint(9227465)\n```",
            prompts: Mutex::new(vec![]),
        };
        let executor = FakeExecutor {
            accept: "print(9227465)",
            ran: Mutex::new(vec![]),
        };

        let outcome = CodingAgent::new(&chat, &executor, 3)
            .run("Print Fibonacci(35).")
            .await
            .unwrap();

        assert!(outcome.succeeded());
        assert_eq!(outcome.attempts, 2);
        let prompts = chat.prompts.lock().unwrap();
        assert!(prompts[1].contains("NameError"));
        assert!(prompts[1].contains("print(fib(35))"));
    }

    #[tokio::test]
    async fn test_stops_at_max_attempts() {
        let chat = ScriptedChat {
            plan: "```python\nprint(fib(35))\n```",
            fix: "```python\nprint(fib(35))\n```",
            prompts: Mutex::new(vec![]),
        };
        let executor = FakeExecutor {
            accept: "never",
            ran: Mutex::new(vec![]),
        };

        let outcome = CodingAgent::new(&chat, &executor, 3)
            .run("Print Fibonacci(35).")
            .await
            .unwrap();

        assert!(outcome.done);
        assert!(!outcome.succeeded());
        assert_eq!(outcome.attempts, 3);
        assert_eq!(chat.prompts.lock().unwrap().len(), 3);
        assert_eq!(executor.ran.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_single_expression_is_printed() {
        let chat = ScriptedChat {
            plan: "```python\n2 ** 10\n```",
            fix: "unused",
            prompts: Mutex::new(vec![]),
        };
        let executor = FakeExecutor {
            accept: "print(2 ** 10)",
            ran: Mutex::new(vec![]),
        };

        let outcome = CodingAgent::new(&chat, &executor, 3)
            .run("Compute 2 to the 10th.")
            .await
            .unwrap();

        assert!(outcome.succeeded());
        assert_eq!(outcome.code, "print(2 ** 10)");
    }

    #[tokio::test]
    async fn test_policy_block_counts_as_failed_attempt() {
        let chat = ScriptedChat {
            plan: "```python\nimport os\nprint(os.getcwd())\n```",
            fix: "```python\nimport os\nprint(os.getcwd())\n```",
            prompts: Mutex::new(vec![]),
        };
        let runner = PythonRunner::new("/nonexistent/python", std::time::Duration::from_secs(1));

        let outcome = CodingAgent::new(&chat, &runner, 2)
            .run("Show the working directory.")
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 2);
        let run = outcome.last_run.unwrap();
        assert_eq!(run.exit_code, -1);
    }

    #[tokio::test]
    async fn test_blank_task_rejected() {
        let chat = ScriptedChat {
            plan: "",
            fix: "",
            prompts: Mutex::new(vec![]),
        };
        let executor = FakeExecutor {
            accept: "",
            ran: Mutex::new(vec![]),
        };
        let err = CodingAgent::new(&chat, &executor, 3).run("  ").await.unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
        assert!(chat.prompts.lock().unwrap().is_empty());
    }
}
