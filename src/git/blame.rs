//! Parser for `git blame --line-porcelain` output.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};

/// Blame information for a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameLine {
    /// Line number in the blamed revision (1-indexed)
    pub line_number: u32,
    /// Name of the author who last modified this line
    pub author: String,
    /// Email of the author, without angle brackets
    pub email: String,
    /// Commit that last modified this line
    pub commit_id: String,
    /// When this line was last modified
    pub timestamp: DateTime<Utc>,
    /// Line content without the leading tab
    pub line_content: String,
}

#[derive(Default)]
struct Pending {
    commit_id: String,
    line_number: u32,
    author: String,
    email: String,
    author_time: i64,
}

/// Parse `--line-porcelain` output into one [`BlameLine`] per source line.
///
/// Every line group starts with `<sha> <orig-line> <final-line> [<count>]`,
/// followed by `key value` headers, and ends with the tab-prefixed content.
/// Malformed groups are skipped rather than aborting the parse.
pub fn parse_line_porcelain(output: &str) -> Vec<BlameLine> {
    let mut lines = Vec::new();
    let mut pending: Option<Pending> = None;

    for raw in output.lines() {
        if let Some(content) = raw.strip_prefix('\t') {
            if let Some(p) = pending.take() {
                lines.push(BlameLine {
                    line_number: p.line_number,
                    author: p.author,
                    email: p.email,
                    commit_id: p.commit_id,
                    timestamp: Utc
                        .timestamp_opt(p.author_time, 0)
                        .single()
                        .unwrap_or_default(),
                    line_content: content.to_string(),
                });
            }
            continue;
        }

        let (key, value) = raw.split_once(' ').unwrap_or((raw, ""));

        if is_commit_id(key) {
            let mut fields = value.split_whitespace();
            let _orig = fields.next();
            pending = fields
                .next()
                .and_then(|n| n.parse::<u32>().ok())
                .map(|line_number| Pending {
                    commit_id: key.to_string(),
                    line_number,
                    ..Default::default()
                });
            continue;
        }

        let Some(p) = pending.as_mut() else {
            continue;
        };

        match key {
            "author" => p.author = value.to_string(),
            "author-mail" => {
                p.email = value
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string()
            }
            "author-time" => p.author_time = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    lines
}

/// Index blame lines by their line number.
pub fn by_line_number(lines: &[BlameLine]) -> HashMap<u32, &BlameLine> {
    lines.iter().map(|l| (l.line_number, l)).collect()
}

fn is_commit_id(token: &str) -> bool {
    matches!(token.len(), 40 | 64) && token.chars().all(|c| c.is_ascii_hexdigit())
}
