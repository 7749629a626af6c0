//! Git operations: subprocess gateway, output parsers, and repository discovery.

pub mod blame;
pub mod discover;
pub mod gateway;
pub mod hunks;
pub mod status;

pub use blame::{BlameLine, parse_line_porcelain};
pub use discover::{discover_repositories, repository_root};
pub use gateway::{Git, GitCli, GitExecutor, GitOutput};
pub use hunks::added_line_numbers;
pub use status::{
    ChangedFile, FileStatus, StatusEntry, has_staged_changes, parse_name_status, parse_porcelain_status,
};
