//! Authorship analysis: attributes changed lines to the authors who last
//! touched them, using blame of the committed version of each file.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::commit::changeset::ChangeSet;
use crate::git::blame::by_line_number;
use crate::git::{BlameLine, ChangedFile, FileStatus, Git, added_line_numbers, parse_line_porcelain};

/// Files analyzed concurrently.
const ANALYSIS_CONCURRENCY: usize = 4;

/// Files beyond this count are listed but not blamed.
pub const MAX_ANALYZED_FILES: usize = 50;

/// Changed lines attributed to one author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorContribution {
    pub author: String,
    /// Ascending line numbers in the new version of the file.
    pub line_numbers: Vec<u32>,
}

impl AuthorContribution {
    pub fn changed_line_count(&self) -> usize {
        self.line_numbers.len()
    }
}

impl fmt::Display for AuthorContribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self
            .line_numbers
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "{} modified {} line(s) ({})",
            self.author,
            self.changed_line_count(),
            lines
        )
    }
}

/// Authorship analysis of a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAuthorship {
    New(String),
    Deleted(String),
    Attributed {
        path: String,
        contributions: Vec<AuthorContribution>,
    },
    Failed {
        path: String,
        reason: String,
    },
}

impl FileAuthorship {
    /// Total lines attributed to any author.
    pub fn attributed_line_count(&self) -> usize {
        match self {
            FileAuthorship::Attributed { contributions, .. } => contributions
                .iter()
                .map(AuthorContribution::changed_line_count)
                .sum(),
            _ => 0,
        }
    }
}

impl fmt::Display for FileAuthorship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileAuthorship::New(path) => write!(f, "New file: {path}"),
            FileAuthorship::Deleted(path) => write!(f, "Deleted file: {path}"),
            FileAuthorship::Attributed {
                path,
                contributions,
            } if contributions.is_empty() => {
                write!(f, "{path}: no previously committed lines changed")
            }
            FileAuthorship::Attributed {
                path,
                contributions,
            } => {
                write!(f, "{path}:")?;
                for c in contributions {
                    write!(f, "\n  {c}")?;
                }
                Ok(())
            }
            FileAuthorship::Failed { path, reason } => {
                write!(f, "Could not analyze {path}: {reason}")
            }
        }
    }
}

/// Intersect added line numbers with blame and aggregate per author.
///
/// Only lines present in both sets are counted. Authors are ordered by
/// changed line count, most first, ties broken by name.
pub fn attribute_lines(added: &BTreeSet<u32>, blame: &[BlameLine]) -> Vec<AuthorContribution> {
    let by_line = by_line_number(blame);
    let mut per_author: HashMap<&str, Vec<u32>> = HashMap::new();

    for line in added {
        if let Some(entry) = by_line.get(line) {
            per_author.entry(entry.author.as_str()).or_default().push(*line);
        }
    }

    let mut contributions: Vec<AuthorContribution> = per_author
        .into_iter()
        .map(|(author, line_numbers)| AuthorContribution {
            author: author.to_string(),
            line_numbers,
        })
        .collect();

    contributions.sort_by(|a, b| {
        b.changed_line_count()
            .cmp(&a.changed_line_count())
            .then_with(|| a.author.cmp(&b.author))
    });
    contributions
}

/// Analyze one changed file. Never fails: problems become inline notes.
pub async fn analyze_file(git: &Git, repo: &Path, file: &ChangedFile, has_head: bool) -> FileAuthorship {
    if file.status.is_new() || !has_head {
        return FileAuthorship::New(file.path.clone());
    }
    if file.status == FileStatus::Deleted {
        return FileAuthorship::Deleted(file.path.clone());
    }

    // Renames are diffed as a pair so only edited lines count as added.
    let diff = match &file.old_path {
        Some(old_path) => git.diff_rename_against_head(repo, old_path, &file.path).await,
        None => git.diff_against_head(repo, &file.path).await,
    };
    let diff = match diff {
        Ok(diff) => diff,
        Err(e) => {
            debug!("No diff for {}: {}", file.path, e);
            return FileAuthorship::Attributed {
                path: file.path.clone(),
                contributions: Vec::new(),
            };
        }
    };

    let blame_path = file.old_path.as_deref().unwrap_or(&file.path);
    let blame = match git.blame_head(repo, blame_path).await {
        Ok(out) => parse_line_porcelain(&out),
        Err(e) => {
            warn!("Blame failed for {}: {}", blame_path, e);
            return FileAuthorship::Failed {
                path: file.path.clone(),
                reason: e.stderr().map(str::to_string).unwrap_or_else(|| e.to_string()),
            };
        }
    };

    let added = added_line_numbers(&diff);
    FileAuthorship::Attributed {
        path: file.path.clone(),
        contributions: attribute_lines(&added, &blame),
    }
}

/// Analyze every file of a change set, preserving file order.
pub async fn analyze_change_set(git: &Git, repo: &Path, change_set: &ChangeSet) -> Vec<FileAuthorship> {
    let has_head = match git.has_head(repo).await {
        Ok(has_head) => has_head,
        Err(e) => {
            warn!("Could not determine HEAD, treating files as new: {}", e);
            false
        }
    };

    let (analyzed, skipped) = change_set
        .files
        .split_at(change_set.files.len().min(MAX_ANALYZED_FILES));

    let mut results: Vec<FileAuthorship> = stream::iter(analyzed)
        .map(|file| analyze_file(git, repo, file, has_head))
        .buffered(ANALYSIS_CONCURRENCY)
        .collect()
        .await;

    for file in skipped {
        results.push(FileAuthorship::Failed {
            path: file.path.clone(),
            reason: format!("skipped, more than {MAX_ANALYZED_FILES} files changed"),
        });
    }

    results
}

/// Render analyses as prompt text, one block per file.
pub fn render_authorship(analyses: &[FileAuthorship]) -> String {
    analyses
        .iter()
        .map(FileAuthorship::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
