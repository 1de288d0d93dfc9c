//! Output formatting module

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use std::path::Path;

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;

pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

use crate::application::services::package::PackageState;
use crate::application::services::reinstall::ReinstallSummary;
use crate::domain::config::ValidatorConfig;
use crate::domain::extension::ExtensionDir;
use crate::domain::poll::PollResult;
use crate::domain::report::ValidationReport;
use crate::domain::status::StatusObservation;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Check if progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Renderer for the active output mode.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        match self {
            Self::Human(r) => r.render_version(version),
            Self::Json(_) => JsonRenderer::render_version(version)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_report(&self, report: &ValidationReport) -> Result<()> {
        match self {
            Self::Human(r) => r.render_report(report),
            Self::Json(_) => JsonRenderer::render_report(report)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_locate(
        &self,
        result: &PollResult<Option<ExtensionDir>>,
        waagent_dir: &Path,
    ) -> Result<()> {
        match self {
            Self::Human(r) => r.render_locate(result, waagent_dir),
            Self::Json(_) => JsonRenderer::render_locate(result, waagent_dir)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_status(&self, result: &PollResult<StatusObservation>) -> Result<()> {
        match self {
            Self::Human(r) => r.render_status(result),
            Self::Json(_) => JsonRenderer::render_status(result)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_package(&self, package: &str, result: &PollResult<PackageState>) -> Result<()> {
        match self {
            Self::Human(r) => r.render_package(result),
            Self::Json(_) => JsonRenderer::render_package(package, result)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_process(&self, name: &str, result: &PollResult<Vec<u32>>) -> Result<()> {
        match self {
            Self::Human(r) => r.render_process(name, result),
            Self::Json(_) => JsonRenderer::render_process(name, result)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_reinstall(
        &self,
        summary: &ReinstallSummary,
        status: Option<&PollResult<StatusObservation>>,
    ) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_reinstall(summary);
                if let Some(status) = status {
                    r.render_status(status);
                }
            }
            Self::Json(_) => JsonRenderer::render_reinstall(summary, status)?,
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &ValidatorConfig, path: &Path) -> Result<()> {
        match self {
            Self::Human(r) => r.render_config(config, path),
            Self::Json(_) => JsonRenderer::render_config(config, path)?,
        }
        Ok(())
    }
}
