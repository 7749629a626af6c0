//! Integration tests for blame-based authorship analysis.

mod common;

use common::TestRepo;
use scrivener::commit::authorship::{FileAuthorship, analyze_change_set, render_authorship};
use scrivener::commit::changeset::resolve_change_set;
use scrivener::{Git, ScopePolicy};

fn git() -> Git {
    Git::system().expect("git must be installed for integration tests")
}

fn contributions(analysis: &FileAuthorship) -> Vec<(String, Vec<u32>)> {
    match analysis {
        FileAuthorship::Attributed { contributions, .. } => contributions
            .iter()
            .map(|c| (c.author.clone(), c.line_numbers.clone()))
            .collect(),
        other => panic!("expected attributed analysis, got {other:?}"),
    }
}

#[tokio::test]
async fn test_changed_lines_attributed_to_previous_authors() {
    let repo = TestRepo::new();
    repo.commit_file_as("Alice", "poem.txt", "one\ntwo\nthree\n");
    repo.commit_file_as("Bob", "poem.txt", "one\ntwo\nTHREE\n");

    repo.write("poem.txt", "ONE\ntwo\n3\n");

    let git = git();
    let cs = resolve_change_set(&git, repo.path(), ScopePolicy::Auto)
        .await
        .unwrap();
    let analyses = analyze_change_set(&git, repo.path(), &cs).await;

    assert_eq!(analyses.len(), 1);
    assert_eq!(
        contributions(&analyses[0]),
        vec![
            ("Alice".to_string(), vec![1]),
            ("Bob".to_string(), vec![3]),
        ]
    );
    assert_eq!(
        render_authorship(&analyses),
        "poem.txt:\n  Alice modified 1 line(s) (1)\n  Bob modified 1 line(s) (3)"
    );
}

#[tokio::test]
async fn test_author_with_most_lines_listed_first() {
    let repo = TestRepo::new();
    repo.commit_file_as("Alice", "a.txt", "1\n2\n3\n4\n");
    repo.commit_file_as("Zoe", "a.txt", "1\nb\nc\n4\n");

    repo.write("a.txt", "x\ny\nz\n4\n");
    repo.stage("a.txt");

    let git = git();
    let cs = resolve_change_set(&git, repo.path(), ScopePolicy::StagedOnly)
        .await
        .unwrap();
    let analyses = analyze_change_set(&git, repo.path(), &cs).await;

    assert_eq!(
        contributions(&analyses[0]),
        vec![
            ("Zoe".to_string(), vec![2, 3]),
            ("Alice".to_string(), vec![1]),
        ]
    );
}

#[tokio::test]
async fn test_attributed_lines_never_exceed_added_lines() {
    let repo = TestRepo::new();
    repo.commit_file_as("Alice", "list.txt", "a\nb\n");
    repo.write("list.txt", "a\nB\nc\nd\n");

    let git = git();
    let cs = resolve_change_set(&git, repo.path(), ScopePolicy::Auto)
        .await
        .unwrap();
    let analyses = analyze_change_set(&git, repo.path(), &cs).await;

    let plus_lines = cs
        .diff_text
        .lines()
        .filter(|l| l.starts_with('+') && !l.starts_with("+++"))
        .count();
    let attributed = analyses[0].attributed_line_count();

    assert_eq!(plus_lines, 3);
    assert_eq!(attributed, 1);
    assert!(attributed <= plus_lines);
}

#[tokio::test]
async fn test_new_and_deleted_files_short_circuit() {
    let repo = TestRepo::new();
    repo.commit_file_as("Alice", "old.txt", "legacy\n");
    repo.remove("old.txt");
    repo.write("fresh.txt", "brand new\n");

    let git = git();
    let cs = resolve_change_set(&git, repo.path(), ScopePolicy::Auto)
        .await
        .unwrap();
    let analyses = analyze_change_set(&git, repo.path(), &cs).await;

    assert_eq!(
        analyses,
        vec![
            FileAuthorship::New("fresh.txt".to_string()),
            FileAuthorship::Deleted("old.txt".to_string()),
        ]
    );
    assert_eq!(
        render_authorship(&analyses),
        "New file: fresh.txt\nDeleted file: old.txt"
    );
}

#[tokio::test]
async fn test_repository_without_commits_reports_new_files() {
    let repo = TestRepo::new();
    repo.write("a.rs", "fn a() {}\n");
    repo.write("b.rs", "fn b() {}\n");
    repo.stage("a.rs");
    repo.stage("b.rs");

    let git = git();
    let cs = resolve_change_set(&git, repo.path(), ScopePolicy::Auto)
        .await
        .unwrap();
    let analyses = analyze_change_set(&git, repo.path(), &cs).await;

    assert!(analyses.iter().all(|a| matches!(a, FileAuthorship::New(_))));
    assert_eq!(analyses.len(), 2);
}

#[tokio::test]
async fn test_pure_removal_has_no_attribution() {
    let repo = TestRepo::new();
    repo.commit_file_as("Alice", "trim.txt", "keep\ndrop\n");
    repo.write("trim.txt", "keep\n");

    let git = git();
    let cs = resolve_change_set(&git, repo.path(), ScopePolicy::Auto)
        .await
        .unwrap();
    let analyses = analyze_change_set(&git, repo.path(), &cs).await;

    assert_eq!(analyses[0].attributed_line_count(), 0);
    assert_eq!(
        analyses[0].to_string(),
        "trim.txt: no previously committed lines changed"
    );
}

#[tokio::test]
async fn test_pure_rename_attributes_nothing() {
    let repo = TestRepo::new();
    repo.commit_file_as("Alice", "a.txt", "one\ntwo\nthree\n");
    repo.git(&["mv", "a.txt", "b.txt"]);

    let git = git();
    let cs = resolve_change_set(&git, repo.path(), ScopePolicy::Auto)
        .await
        .unwrap();
    let analyses = analyze_change_set(&git, repo.path(), &cs).await;

    assert_eq!(analyses.len(), 1);
    assert_eq!(analyses[0].attributed_line_count(), 0);
    assert_eq!(
        analyses[0].to_string(),
        "b.txt: no previously committed lines changed"
    );
}

#[tokio::test]
async fn test_renamed_file_counts_only_edited_lines() {
    let repo = TestRepo::new();
    repo.commit_file_as("Alice", "a.txt", "one\ntwo\nthree\nfour\nfive\n");
    repo.git(&["mv", "a.txt", "b.txt"]);
    repo.write("b.txt", "one\nTWO\nthree\nfour\nfive\n");
    repo.stage("b.txt");

    let git = git();
    let cs = resolve_change_set(&git, repo.path(), ScopePolicy::Auto)
        .await
        .unwrap();
    let analyses = analyze_change_set(&git, repo.path(), &cs).await;

    assert_eq!(contributions(&analyses[0]), vec![("Alice".to_string(), vec![2])]);
}
