// file: src/prompts.rs
// description: prompt text for the preflight check, research stages and coding agent

pub const PREFLIGHT: &str = "Reply with exactly: MODEL WORKING";

pub const PLANNER_SYSTEM: &str = "You are the planning step of a web research agent. \
You turn a user question into focused web search queries. \
Each query must be short, specific and answerable by a search engine. \
Order the queries from most to least important.";

pub fn planner_user(question: &str, max_queries: usize) -> String {
    format!(
        "Question:\n{question}\n\n\
         Write at most {max_queries} web search queries that together cover the question.\n\
         Return ONLY a JSON array of strings, for example:\n\
         [\"first query\", \"second query\"]"
    )
}

pub const SYNTHESIZER_SYSTEM: &str = "You are the synthesis step of a web research agent. \
You write a concise, well-structured markdown report answering the user's question \
using ONLY the numbered sources provided. Cite sources inline as [n]. \
If the sources do not answer part of the question, say so instead of guessing.";

pub fn synthesizer_user(question: &str, sources: &str, answers: &str) -> String {
    let mut prompt = format!("Question:\n{question}\n\nSources:\n{sources}\n");
    if !answers.is_empty() {
        prompt.push_str(&format!("\nSearch engine summaries:\n{answers}\n"));
    }
    prompt.push_str(
        "\nWrite the report with these sections:\n\
         ## Summary\n\
         ## Key Findings\n\
         ## Open Questions\n\
         Do not add a sources list; it is appended automatically.",
    );
    prompt
}

pub const CODING_SYSTEM: &str = "You are a coding agent for a live workshop.

You MUST follow this loop:
1) Plan briefly
2) Write Python code
3) Execute it via the tool `run_python`
4) If errors, fix and re-run until it works or you hit 3 attempts.

Rules:
- Keep code self-contained.
- Do not use network.
- Do not read/write files except what the tool environment provides.
- Print final answers to stdout.
";

pub fn coding_plan(task: &str) -> String {
    format!(
        "Task:\n{task}\n\n\
         You must generate Python code that EXECUTES and PRINTS the final answer.\n\n\
         STRICT REQUIREMENTS:\n\
         - The code MUST call print() on the final result.\n\
         - The code MUST be executable immediately.\n\
         - Do NOT define a function without calling it.\n\
         - Do NOT leave expressions unused.\n\n\
         Return EXACTLY in this format:\n\n\
         Plan:\n<brief plan>\n\n\
         ```python\n# executable Python code\n# must include print(...)\n```\n"
    )
}

pub fn coding_fix(task: &str, code: &str, stdout: &str, stderr: &str) -> String {
    format!(
        "Task:\n{task}\n\n\
         Your previous code:\n```python\n{code}\n```\n\n\
         Execution stdout:\n{stdout}\n\n\
         Execution stderr:\n{stderr}\n\n\
         Fix the code. Return ONLY a Python code block in triple backticks.\n"
    )
}

/// Sample tasks for the coding agent.
pub const TASKS: [&str; 3] = [
    "Write a Python function to compute Fibonacci(n) efficiently and print Fibonacci(35).",
    "Parse a CSV string into rows and compute average of a numeric column.",
    "Implement a simple anomaly score for a time series using rolling z-score.",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planner_prompt_mentions_limit() {
        let prompt = planner_user("Why is the sky blue?", 3);
        assert!(prompt.contains("Why is the sky blue?"));
        assert!(prompt.contains("at most 3"));
    }

    #[test]
    fn test_synthesizer_prompt_omits_empty_answers() {
        let prompt = synthesizer_user("q", "[1] a", "");
        assert!(!prompt.contains("Search engine summaries"));
        assert!(synthesizer_user("q", "[1] a", "- yes").contains("Search engine summaries"));
    }

    #[test]
    fn test_fix_prompt_embeds_run_output() {
        let prompt = coding_fix("t", "print(1/0)", "", "ZeroDivisionError");
        assert!(prompt.contains("```python\nprint(1/0)\n```"));
        assert!(prompt.contains("ZeroDivisionError"));
    }
}
