//! Change set resolution: decides which pending changes are in scope and
//! assembles them into one unified diff text.

use std::fmt;
use std::path::Path;

use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::error::CommitError;
use crate::git::{ChangedFile, FileStatus, Git, parse_name_status};

/// Maximum characters for the combined diff text before truncation.
pub const MAX_DIFF_LENGTH: usize = 30_000;

/// Appended whenever text is cut to fit a limit.
pub const TRUNCATION_MARKER: &str = "...(truncated)";

/// How much of an untracked file is inspected for NUL bytes.
const BINARY_SNIFF_LEN: usize = 8 * 1024;

/// Which change categories are eligible for the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopePolicy {
    /// Only staged changes; nothing staged means nothing to describe.
    StagedOnly,
    /// Staged changes if any, otherwise unstaged + untracked + deleted files.
    #[default]
    Auto,
}

/// Where the change set's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    Staged,
    WorkingTree,
}

impl fmt::Display for ChangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeSource::Staged => write!(f, "staged changes"),
            ChangeSource::WorkingTree => write!(f, "working tree changes"),
        }
    }
}

/// Everything that will be described by the generated message.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    pub diff_text: String,
    pub files: Vec<ChangedFile>,
    pub source: ChangeSource,
    pub truncated: bool,
}

/// Resolve the change set for `repo` under `policy`.
///
/// Under [`ScopePolicy::Auto`], staged changes win outright: when anything is
/// staged, unstaged work is left out of this run. Fails with
/// [`CommitError::NoChanges`] rather than returning an empty diff.
pub async fn resolve_change_set(
    git: &Git,
    repo: &Path,
    policy: ScopePolicy,
) -> Result<ChangeSet, CommitError> {
    let staged = git.staged_diff(repo).await?;
    if !staged.trim().is_empty() {
        let files = parse_name_status(&git.staged_name_status(repo).await?);
        debug!("Using {} staged file(s)", files.len());
        return assemble(vec![staged], files, ChangeSource::Staged);
    }

    if policy == ScopePolicy::StagedOnly {
        debug!("Nothing staged and staged-only policy is active");
        return Err(CommitError::NoChanges);
    }

    let has_head = git.has_head(repo).await?;
    let mut parts = Vec::new();
    let mut files = Vec::new();

    let unstaged = git.unstaged_diff(repo).await?;
    if !unstaged.trim().is_empty() {
        files.extend(parse_name_status(&git.unstaged_name_status(repo).await?));
        parts.push(unstaged);
    }

    // Two bytes per part for the blank-line separator added by `assemble`.
    let mut used: usize = parts.iter().map(|p| p.len() + 2).sum();
    for path in git.untracked_files(repo).await? {
        let part = untracked_file_diff(repo, &path, MAX_DIFF_LENGTH.saturating_sub(used)).await;
        used += part.len() + 2;
        parts.push(part);
        files.push(ChangedFile::new(path, FileStatus::Untracked));
    }

    for path in git.deleted_files(repo).await? {
        let content = if has_head {
            git.file_at_head(repo, &path).await?
        } else {
            None
        };
        let content = match content {
            Some(c) => Some(c),
            None => git.file_in_index(repo, &path).await?,
        };
        parts.push(deleted_file_diff(&path, content.as_deref()));
        files.push(ChangedFile::new(path, FileStatus::Deleted));
    }

    debug!(
        "Using working tree changes: {} file(s), has_head={}",
        files.len(),
        has_head
    );
    assemble(parts, files, ChangeSource::WorkingTree)
}

/// Join diff parts with blank-line separators and enforce [`MAX_DIFF_LENGTH`].
fn assemble(
    parts: Vec<String>,
    mut files: Vec<ChangedFile>,
    source: ChangeSource,
) -> Result<ChangeSet, CommitError> {
    let combined = parts
        .iter()
        .map(|p| p.trim_end())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if combined.trim().is_empty() {
        return Err(CommitError::NoChanges);
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);

    let (diff_text, truncated) = truncate_with_marker(&combined, MAX_DIFF_LENGTH);
    if truncated {
        warn!(
            "Diff truncated from {} to {} characters",
            combined.len(),
            MAX_DIFF_LENGTH
        );
    }

    Ok(ChangeSet {
        diff_text,
        files,
        source,
        truncated,
    })
}

/// Cut `text` to at most `max_len` bytes on a char boundary, appending
/// [`TRUNCATION_MARKER`] on its own line when anything was removed.
pub fn truncate_with_marker(text: &str, max_len: usize) -> (String, bool) {
    if text.len() <= max_len {
        return (text.to_string(), false);
    }

    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }

    let mut out = text[..end].to_string();
    out.push('\n');
    out.push_str(TRUNCATION_MARKER);
    (out, true)
}

/// Render an untracked file as a unified diff where every line is added.
///
/// At most `budget` bytes are read, since anything past it would be cut by
/// truncation anyway. A spent budget leaves only the header.
async fn untracked_file_diff(repo: &Path, path: &str, budget: usize) -> String {
    if budget == 0 {
        debug!("Diff budget spent, not reading untracked file {}", path);
        return format!("diff --git a/{path} b/{path}\nnew file mode 100644");
    }

    let limit = budget.max(BINARY_SNIFF_LEN) as u64;
    let bytes = match read_prefix(&repo.join(path), limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read untracked file {}: {}", path, e);
            return format!("diff --git a/{path} b/{path}\nnew file (unreadable: {e})");
        }
    };

    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    if sniff.contains(&0) {
        return format!("diff --git a/{path} b/{path}\nnew file mode 100644\nBinary file {path} added");
    }

    synthesize_added_diff(path, &String::from_utf8_lossy(&bytes))
}

async fn read_prefix(path: &Path, limit: u64) -> std::io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut bytes = Vec::new();
    file.take(limit).read_to_end(&mut bytes).await?;
    Ok(bytes)
}

/// Unified diff presenting `content` as a brand new file.
pub fn synthesize_added_diff(path: &str, content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut out = format!("diff --git a/{path} b/{path}\nnew file mode 100644\n");
    if lines.is_empty() {
        return out;
    }

    out.push_str(&format!("--- /dev/null\n+++ b/{path}\n@@ -0,0 +1,{} @@\n", lines.len()));
    for line in lines {
        out.push('+');
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Unified diff presenting the last known `content` of a deleted file as removed.
pub fn deleted_file_diff(path: &str, content: Option<&str>) -> String {
    let mut out = format!("diff --git a/{path} b/{path}\ndeleted file mode 100644\n");
    let Some(content) = content else {
        return out;
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        return out;
    }

    out.push_str(&format!("--- a/{path}\n+++ /dev/null\n@@ -1,{} +0,0 @@\n", lines.len()));
    for line in lines {
        out.push('-');
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_source_display() {
        assert_eq!(ChangeSource::Staged.to_string(), "staged changes");
        assert_eq!(ChangeSource::WorkingTree.to_string(), "working tree changes");
    }

    #[test]
    fn test_synthesize_added_diff() {
        let diff = synthesize_added_diff("greet.txt", "hello\nworld\n");
        assert!(diff.contains("--- /dev/null"));
        assert!(diff.contains("+++ b/greet.txt"));
        assert!(diff.contains("@@ -0,0 +1,2 @@"));
        assert!(diff.contains("\n+hello\n+world\n"));
    }

    #[test]
    fn test_synthesize_added_diff_empty_file() {
        let diff = synthesize_added_diff("empty.txt", "");
        assert!(diff.contains("new file mode"));
        assert!(!diff.contains("@@"));
    }

    #[test]
    fn test_added_lines_of_synthesized_diff() {
        let diff = synthesize_added_diff("a.rs", "one\ntwo\nthree");
        let added = crate::git::added_line_numbers(&diff);
        assert_eq!(added.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_deleted_file_diff() {
        let diff = deleted_file_diff("gone.txt", Some("bye\n"));
        assert!(diff.contains("deleted file mode"));
        assert!(diff.contains("+++ /dev/null"));
        assert!(diff.contains("@@ -1,1 +0,0 @@"));
        assert!(diff.contains("\n-bye\n"));
    }

    #[test]
    fn test_deleted_file_diff_without_content() {
        let diff = deleted_file_diff("gone.txt", None);
        assert!(diff.starts_with("diff --git a/gone.txt b/gone.txt"));
        assert!(!diff.contains("@@"));
    }

    #[test]
    fn test_truncate_with_marker_short_text_untouched() {
        let (text, truncated) = truncate_with_marker("short", 100);
        assert_eq!(text, "short");
        assert!(!truncated);
    }

    #[test]
    fn test_truncate_with_marker_appends_marker() {
        let input = "a".repeat(50);
        let (text, truncated) = truncate_with_marker(&input, 10);
        assert!(truncated);
        assert_eq!(text, format!("{}\n{}", "a".repeat(10), TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncate_with_marker_respects_char_boundary() {
        let input = "ééééé";
        let (text, truncated) = truncate_with_marker(input, 3);
        assert!(truncated);
        assert!(text.starts_with('é'));
        assert!(text.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_assemble_joins_with_blank_lines() {
        let cs = assemble(
            vec!["first\n".to_string(), "second\n".to_string()],
            vec![
                ChangedFile::new("b", FileStatus::Modified),
                ChangedFile::new("a", FileStatus::Untracked),
            ],
            ChangeSource::WorkingTree,
        )
        .unwrap();
        assert_eq!(cs.diff_text, "first\n\nsecond");
        assert_eq!(cs.files[0].path, "a");
        assert!(!cs.truncated);
    }

    #[test]
    fn test_assemble_empty_is_no_changes() {
        let result = assemble(vec!["  \n".to_string()], Vec::new(), ChangeSource::Staged);
        assert!(matches!(result, Err(CommitError::NoChanges)));
    }

    #[tokio::test]
    async fn test_untracked_read_stops_at_budget() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.txt"), "line\n".repeat(50_000)).unwrap();

        let diff = untracked_file_diff(dir.path(), "big.txt", 100).await;
        let added = diff.lines().filter(|l| l.starts_with('+') && !l.starts_with("+++")).count();
        // The binary sniff window is the floor for a partial read.
        assert_eq!(added, BINARY_SNIFF_LEN / "line\n".len() + 1);
        assert!(diff.len() < 50_000);
    }

    #[tokio::test]
    async fn test_untracked_spent_budget_keeps_header_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("late.txt"), "content\n").unwrap();

        let diff = untracked_file_diff(dir.path(), "late.txt", 0).await;
        assert_eq!(diff, "diff --git a/late.txt b/late.txt\nnew file mode 100644");
    }

    #[tokio::test]
    async fn test_untracked_within_budget_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("small.txt"), "one\ntwo\n").unwrap();

        let diff = untracked_file_diff(dir.path(), "small.txt", MAX_DIFF_LENGTH).await;
        assert!(diff.ends_with("@@ -0,0 +1,2 @@\n+one\n+two\n"));
    }

    #[test]
    fn test_assemble_truncates_large_diff() {
        let big = "+x\n".repeat(MAX_DIFF_LENGTH);
        let cs = assemble(vec![big], Vec::new(), ChangeSource::Staged).unwrap();
        assert!(cs.truncated);
        assert!(cs.diff_text.ends_with(TRUNCATION_MARKER));
        assert!(cs.diff_text.len() <= MAX_DIFF_LENGTH + TRUNCATION_MARKER.len() + 1);
    }
}
