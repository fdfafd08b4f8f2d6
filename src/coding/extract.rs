// file: src/coding/extract.rs
// description: pulls Python code out of model replies and prepares it for execution

/// A fenced block: info tag (possibly empty) and body.
#[derive(Debug, Clone, PartialEq)]
struct FencedBlock {
    tag: String,
    body: String,
}

fn fenced_blocks(text: &str) -> Vec<FencedBlock> {
    let parts: Vec<&str> = text.split("```").collect();
    // Odd parts sit between an opening and a closing fence; an unclosed
    // trailing fence still counts as a block.
    parts
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, part)| match part.split_once('\n') {
            Some((first, rest)) if !first.trim().contains(' ') => FencedBlock {
                tag: first.trim().to_lowercase(),
                body: rest.to_string(),
            },
            _ => FencedBlock {
                tag: String::new(),
                body: part.to_string(),
            },
        })
        .collect()
}

fn is_python_tag(tag: &str) -> bool {
    matches!(tag, "python" | "py" | "python3")
}

fn clean(code: &str) -> String {
    let code = code.trim();
    let mut lines = code.lines();
    match lines.next() {
        Some(first) if matches!(first.trim().to_lowercase().as_str(), "python" | "py") => {
            lines.collect::<Vec<_>>().join("\n").trim_start().to_string()
        }
        _ => code.to_string(),
    }
}

/// Code from a planning reply: the first python-tagged block, else the
/// first fenced block. Empty when the reply has no fences.
pub fn plan_code(reply: &str) -> String {
    let blocks = fenced_blocks(reply);
    blocks
        .iter()
        .find(|b| is_python_tag(&b.tag))
        .or_else(|| blocks.first())
        .map(|b| clean(&b.body))
        .unwrap_or_default()
}

/// Code from a fix reply: the first fenced block.
pub fn fix_code(reply: &str) -> String {
    fenced_blocks(reply)
        .first()
        .map(|b| clean(&b.body))
        .unwrap_or_default()
}

/// Wraps a lone expression in `print(...)` so the run produces output.
pub fn ensure_prints(code: &str) -> String {
    let code = code.trim();
    if code.is_empty() || code.contains("print(") {
        return code.to_string();
    }

    let lines: Vec<&str> = code.lines().filter(|l| !l.trim().is_empty()).collect();
    if let [line] = lines.as_slice()
        && !["def ", "class ", "import ", "from "]
            .iter()
            .any(|kw| line.starts_with(kw))
    {
        return format!("print({})", line);
    }

    code.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plan_code_prefers_python_block() {
        let reply = "Plan:\nuse a loop\n\n```text\nnot code\n```\n\n```python\nprint(sum(range(10)))\n```";
        assert_eq!(plan_code(reply), "print(sum(range(10)))");
    }

    #[test]
    fn test_plan_code_falls_back_to_first_block() {
        let reply = "Plan: add\n```\nprint(1 + 1)\n```";
        assert_eq!(plan_code(reply), "print(1 + 1)");
    }

    #[test]
    fn test_plan_code_without_fences_is_empty() {
        assert_eq!(plan_code("I would use Python for this."), "");
    }

    #[test]
    fn test_unclosed_fence_still_extracts() {
        let reply = "Plan:\nsquare it\n\n```python\nx = 12\nprint(x * x)\n";
        assert_eq!(plan_code(reply), "x = 12\nprint(x * x)");
    }

    #[test]
    fn test_leading_language_line_dropped() {
        let reply = "```\npy\nprint('hi')\n```";
        assert_eq!(fix_code(reply), "print('hi')");
    }

    #[test]
    fn test_fix_code_takes_first_block() {
        let reply = "```python\nprint(2)\n```\nor\n```python\nprint(3)\n```";
        assert_eq!(fix_code(reply), "print(2)");
    }

    #[test]
    fn test_ensure_prints_wraps_single_expression() {
        assert_eq!(ensure_prints("2 ** 10"), "print(2 ** 10)");
        assert_eq!(ensure_prints("\n  sum([1, 2])\n"), "print(sum([1, 2]))");
    }

    #[test]
    fn test_ensure_prints_leaves_other_code() {
        assert_eq!(ensure_prints("print(1)"), "print(1)");
        assert_eq!(ensure_prints("import math"), "import math");
        assert_eq!(ensure_prints("def f():"), "def f():");
        assert_eq!(ensure_prints("x = 1\ny = 2"), "x = 1\ny = 2");
        assert_eq!(ensure_prints(""), "");
    }
}
