//! The user-facing surface the orchestrator talks to.

use std::io::{self, IsTerminal};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use dialoguer::{Password, Select};
use tracing::{debug, warn};

/// Interaction points with whoever started the generation.
pub trait Host: Send + Sync {
    /// Replace the contents of the commit message input.
    fn set_input(&self, text: &str);

    /// Current contents of the commit message input.
    fn input(&self) -> String;

    /// `increment` is a percentage of overall progress.
    fn report_progress(&self, message: &str, increment: u32);

    /// Let the user choose one of `items`. `None` if cancelled.
    fn pick(&self, title: &str, items: &[String]) -> Option<usize>;

    /// Show a warning with choices. `None` if dismissed.
    fn warn(&self, message: &str, choices: &[&str]) -> Option<usize>;

    /// Ask for a secret value without echoing it.
    fn prompt_secret(&self, prompt: &str) -> Option<String>;
}

/// Terminal host for the CLI: progress on stderr, dialoguer prompts.
///
/// Without an interactive stdin every prompt counts as cancelled.
#[derive(Debug)]
pub struct TerminalHost {
    input: Mutex<String>,
    progress: AtomicU32,
    interactive: bool,
    quiet: bool,
}

impl TerminalHost {
    pub fn new(quiet: bool) -> Self {
        Self {
            input: Mutex::new(String::new()),
            progress: AtomicU32::new(0),
            interactive: io::stdin().is_terminal() && io::stderr().is_terminal(),
            quiet,
        }
    }
}

impl Host for TerminalHost {
    fn set_input(&self, text: &str) {
        let mut input = self.input.lock().unwrap_or_else(|p| p.into_inner());
        *input = text.to_string();
    }

    fn input(&self) -> String {
        self.input.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn report_progress(&self, message: &str, increment: u32) {
        let total = (self.progress.fetch_add(increment, Ordering::Relaxed) + increment).min(100);
        debug!("[{:>3}%] {}", total, message);
        if !self.quiet {
            eprintln!("[{:>3}%] {}", total, message);
        }
    }

    fn pick(&self, title: &str, items: &[String]) -> Option<usize> {
        if !self.interactive {
            warn!("Cannot prompt for '{}' without a terminal", title);
            return None;
        }
        Select::new()
            .with_prompt(title)
            .items(items)
            .default(0)
            .interact_opt()
            .ok()
            .flatten()
    }

    fn warn(&self, message: &str, choices: &[&str]) -> Option<usize> {
        eprintln!("Warning: {message}");
        if !self.interactive || choices.is_empty() {
            return None;
        }
        Select::new()
            .items(choices)
            .default(0)
            .interact_opt()
            .ok()
            .flatten()
    }

    fn prompt_secret(&self, prompt: &str) -> Option<String> {
        if !self.interactive {
            return None;
        }
        Password::new()
            .with_prompt(prompt)
            .interact()
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}
