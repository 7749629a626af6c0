//! Parsers for `git diff --name-status` and `git status --porcelain` output.

use std::fmt;

/// Status of a changed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Untracked,
}

impl FileStatus {
    /// Whether the file has no committed history to blame.
    pub fn is_new(&self) -> bool {
        matches!(self, FileStatus::Added | FileStatus::Untracked)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "Added"),
            FileStatus::Modified => write!(f, "Modified"),
            FileStatus::Deleted => write!(f, "Deleted"),
            FileStatus::Renamed => write!(f, "Renamed"),
            FileStatus::Untracked => write!(f, "Untracked"),
        }
    }
}

/// A file that is part of the pending change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: String,
    pub status: FileStatus,
    /// Old path for renamed files (None for non-rename changes).
    pub old_path: Option<String>,
}

impl ChangedFile {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
            old_path: None,
        }
    }
}

/// Parse `git diff --name-status` output.
///
/// Lines look like `M\tsrc/lib.rs`, or `R087\told.rs\tnew.rs` for renames.
/// Copies are reported as additions of the destination path; unknown
/// status letters are treated as modifications.
pub fn parse_name_status(output: &str) -> Vec<ChangedFile> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let code = fields.next()?.trim();
            let first = fields.next()?.to_string();
            let second = fields.next().map(str::to_string);

            let file = match code.chars().next()? {
                'A' => ChangedFile::new(first, FileStatus::Added),
                'D' => ChangedFile::new(first, FileStatus::Deleted),
                'R' => ChangedFile {
                    path: second.unwrap_or_else(|| first.clone()),
                    status: FileStatus::Renamed,
                    old_path: Some(first),
                },
                'C' => ChangedFile::new(second.unwrap_or(first), FileStatus::Added),
                _ => ChangedFile::new(first, FileStatus::Modified),
            };
            Some(file)
        })
        .collect()
}

/// One entry of `git status --porcelain` (v1) output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Index (staging area) column.
    pub index: char,
    /// Working tree column.
    pub worktree: char,
    pub path: String,
}

impl StatusEntry {
    pub fn is_staged(&self) -> bool {
        !matches!(self.index, ' ' | '?' | '!')
    }
}

/// Parse `git status --porcelain` output into entries.
pub fn parse_porcelain_status(output: &str) -> Vec<StatusEntry> {
    output
        .lines()
        .filter_map(|line| {
            let mut chars = line.chars();
            let index = chars.next()?;
            let worktree = chars.next()?;
            let rest = line.get(3..)?;
            // Renames are reported as "old -> new"; the destination is what matters.
            let path = rest.rsplit(" -> ").next().unwrap_or(rest).to_string();
            Some(StatusEntry {
                index,
                worktree,
                path,
            })
        })
        .collect()
}

/// Whether any entry has changes recorded in the index.
pub fn has_staged_changes(entries: &[StatusEntry]) -> bool {
    entries.iter().any(StatusEntry::is_staged)
}
