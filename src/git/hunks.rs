//! Added-line extraction from unified diff text.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex_lite::Regex;

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -\d+(?:,\d+)? \+(\d+)(?:,\d+)? @@").expect("hunk header regex is valid")
});

/// Line numbers in the new version of the file that are additions.
///
/// A hunk header `@@ -a,b +c,d @@` resets the counter to `c`. Added lines are
/// recorded and then advance the counter, context lines only advance it, and
/// removed lines leave it untouched. File headers (`---`/`+++`) are only
/// recognized outside hunks, so an added line whose content starts with `++`
/// is still counted.
pub fn added_line_numbers(diff: &str) -> BTreeSet<u32> {
    let mut added = BTreeSet::new();
    let mut current: Option<u32> = None;

    for line in diff.lines() {
        if let Some(caps) = HUNK_HEADER.captures(line) {
            current = caps.get(1).and_then(|m| m.as_str().parse().ok());
            continue;
        }

        if line.starts_with("diff --git ") {
            current = None;
            continue;
        }

        let Some(counter) = current.as_mut() else {
            continue;
        };

        match line.as_bytes().first() {
            Some(b'+') => {
                added.insert(*counter);
                *counter += 1;
            }
            Some(b'-') | Some(b'\\') => {}
            _ => *counter += 1,
        }
    }

    added
}
