//! Commit message generation: change sets, authorship, prompts, and the
//! orchestrator that runs them end to end.

pub mod authorship;
pub mod changeset;
pub mod orchestrator;
pub mod prompt;
pub mod templates;

pub use authorship::{AuthorContribution, FileAuthorship, analyze_change_set, analyze_file, render_authorship};
pub use changeset::{ChangeSet, ChangeSource, MAX_DIFF_LENGTH, ScopePolicy, resolve_change_set};
pub use orchestrator::{GenerateRequest, Orchestrator, Outcome, Prepared, Stage};
pub use prompt::{GenerationRequest, RESPONSE_INSTRUCTION, build_prompt};
pub use templates::{CommitFormat, DEFAULT_TEMPLATE, Language, select_template};
