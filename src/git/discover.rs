//! Repository discovery using git2.

use std::fs;
use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::{debug, warn};

/// Find candidate repositories for `start`.
///
/// If `start` is inside a repository, returns that repository's working
/// directory. Otherwise returns every immediate child directory that is the
/// root of a non-bare repository, sorted by path.
pub fn discover_repositories(start: &Path) -> Vec<PathBuf> {
    if let Ok(repo) = Repository::discover(start)
        && let Some(workdir) = repo.workdir()
    {
        return vec![normalize(workdir)];
    }

    let entries = match fs::read_dir(start) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to scan {} for repositories: {}", start.display(), e);
            return Vec::new();
        }
    };

    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(|path| match Repository::open(&path) {
            Ok(repo) => repo.workdir().map(normalize),
            Err(e) => {
                debug!("{} is not a repository: {}", path.display(), e.message());
                None
            }
        })
        .collect();

    found.sort();
    found.dedup();
    found
}

/// Working directory of the repository containing `path`, if any.
pub fn repository_root(path: &Path) -> Option<PathBuf> {
    Repository::discover(path)
        .ok()
        .and_then(|repo| repo.workdir().map(normalize))
}

fn normalize(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
