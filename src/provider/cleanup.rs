//! Normalization of raw backend output into commit message text.

use std::sync::LazyLock;

use regex_lite::Regex;

static PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^here(?:'s| is) (?:a |the |your )?(?:suggested |generated )?commit message\s*:\s*")
        .expect("preamble regex is valid")
});

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline regex is valid"));

const QUOTE_PAIRS: [(char, char); 5] = [
    ('"', '"'),
    ('\'', '\''),
    ('`', '`'),
    ('\u{201c}', '\u{201d}'),
    ('\u{2018}', '\u{2019}'),
];

/// Strip wrappers and chatter around a generated message.
///
/// Already-clean text comes back unchanged.
pub fn clean_message(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n");
    let text = strip_code_fence(text.trim());
    let text = strip_wrapping_quotes(text);
    let text = PREAMBLE.replace(text, "");
    // The message after a preamble may carry its own quotes.
    let text = strip_wrapping_quotes(text.trim());
    let text = EXCESS_NEWLINES.replace_all(text, "\n\n");
    text.trim().to_string()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop an info string such as ```text
    match inner.split_once('\n') {
        Some((info, body)) if !info.trim().contains(' ') => body.trim(),
        _ => inner.trim(),
    }
}

fn strip_wrapping_quotes(text: &str) -> &str {
    for (open, close) in QUOTE_PAIRS {
        if let Some(inner) = text
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
            && !inner.contains(open)
            && !inner.contains(close)
        {
            return inner.trim();
        }
    }
    text
}
