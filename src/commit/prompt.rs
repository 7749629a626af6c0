//! Prompt construction for generated commit messages.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::commit::templates::{CUSTOM_TEMPLATE, select_template};

/// Always the last section of a prompt, including after provider truncation.
pub const RESPONSE_INSTRUCTION: &str = "## Output\nRespond with ONLY the commit message text. \
No explanations, no markdown code fences, no surrounding quotes.";

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-_]")
        .expect("ANSI escape regex is valid")
});

/// Everything the prompt is built from. Provider-independent.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub diff_text: String,
    pub authorship_text: String,
    pub format: String,
    pub language: String,
    /// When set, replaces the format rules entirely.
    pub custom_instructions: Option<String>,
}

/// Assemble the full prompt for `request`.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let rules = match request
        .custom_instructions
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(custom) => CUSTOM_TEMPLATE.replace("{custom_instructions}", custom),
        None => select_template(&request.format, &request.language).to_string(),
    };

    let authorship = if request.authorship_text.trim().is_empty() {
        "No authorship information available."
    } else {
        request.authorship_text.trim_end()
    };

    format!(
        "{rules}\n\n## Diff\n```diff\n{diff}\n```\n\n## Authorship\n{authorship}\n\n{RESPONSE_INSTRUCTION}",
        diff = sanitize_diff(&request.diff_text),
    )
}

/// Strip terminal escapes and control characters other than `\n` and `\t`.
pub fn sanitize_diff(text: &str) -> String {
    let without_ansi = ANSI_ESCAPE.replace_all(text, "");
    without_ansi
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect::<String>()
        .trim_end()
        .to_string()
}
