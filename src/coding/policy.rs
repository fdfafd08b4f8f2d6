// file: src/coding/policy.rs
// description: static checks applied to generated code before it runs
// reference: https://docs.rs/regex

use lazy_static::lazy_static;
use regex::Regex;

const BANNED_PATTERNS: [&str; 11] = [
    r"\bimport\s+os\b",
    r"\bimport\s+subprocess\b",
    r"\bimport\s+socket\b",
    r"\bimport\s+requests\b",
    r"\bimport\s+http\b",
    r"\bimport\s+urllib\b",
    r"\bimport\s+pathlib\b",
    r"\bopen\s*\(",
    r"\beval\s*\(",
    r"\bexec\s*\(",
    r"\b__import__\s*\(",
];

lazy_static! {
    static ref BANNED: Vec<(&'static str, Regex)> = BANNED_PATTERNS
        .iter()
        .map(|p| (*p, Regex::new(p).expect("banned pattern regex is valid")))
        .collect();
}

/// Returns the deny reason for the first banned pattern the code matches.
pub fn deny_reason(code: &str) -> Option<String> {
    BANNED
        .iter()
        .find(|(_, re)| re.is_match(code))
        .map(|(pattern, _)| format!("Blocked by policy (matched pattern: {}).", pattern))
}
