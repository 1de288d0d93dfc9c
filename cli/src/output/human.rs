//! Human-readable terminal renderer.

use std::path::Path;
use std::time::Duration;

use owo_colors::OwoColorize as _;

use crate::application::services::package::PackageState;
use crate::application::services::reinstall::ReinstallSummary;
use crate::domain::config::ValidatorConfig;
use crate::domain::extension::ExtensionDir;
use crate::domain::poll::PollResult;
use crate::domain::report::{Step, ValidationReport};
use crate::domain::status::StatusObservation;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("extcheck {version}");
    }

    /// Render the summary of a full validation run.
    pub fn render_report(&self, report: &ValidationReport) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header("Validation summary:");
        self.ctx.kv("OS:            ", opt(report.os.as_deref()));
        self.ctx.kv("Extension:     ", opt(report.extension_dir.as_deref()));
        self.ctx.kv("Version:       ", opt(report.extension_version.as_deref()));
        self.ctx.kv("Proxy agent:   ", opt(report.proxy_agent_version.as_deref()));
        self.ctx.kv("Process ids:   ", &format_pids(&report.process_ids));
        if let Some(sha) = &report.package_sha256 {
            self.ctx.kv("Package sha256:", sha);
        }
        println!();
        for step in &report.steps {
            let elapsed = format_elapsed(Duration::from_millis(step.elapsed_ms));
            let line = format!(
                "{:<28} {} {}",
                step.step.label(),
                step.detail,
                format!("({} attempt(s), {elapsed})", step.attempts).style(self.ctx.styles.dim)
            );
            self.print_check(step.succeeded, &line);
        }
        if report.step(Step::Reinstall).is_none() && !report.cancelled {
            self.ctx.info("Reinstall not requested");
        }
        println!();
        if report.cancelled {
            self.ctx.warn("Validation cancelled");
        } else if report.succeeded() {
            self.ctx.success("Extension install validated");
        } else {
            self.ctx.error("Extension install validation failed");
        }
    }

    /// Render the result of an extension directory lookup.
    pub fn render_locate(&self, result: &PollResult<Option<ExtensionDir>>, waagent_dir: &Path) {
        match &result.last_observed {
            Some(dir) => {
                self.ctx.success(&format!("{}", waagent_dir.join(&dir.name).display()));
                self.ctx.kv("Version:", opt(dir.version.as_deref()));
            }
            None => self.ctx.error(&format!(
                "no extension directory under {} ({})",
                waagent_dir.display(),
                outcome_line(result)
            )),
        }
    }

    /// Render the last observed extension status.
    pub fn render_status(&self, result: &PollResult<StatusObservation>) {
        let obs = &result.last_observed;
        match obs {
            StatusObservation::Succeeded(_) => self.ctx.success(&obs.describe()),
            StatusObservation::Failed(_) => self.ctx.error(&obs.describe()),
            _ => self
                .ctx
                .warn(&format!("{} ({})", obs.describe(), outcome_line(result))),
        }
        let Some(summary) = obs.summary() else {
            return;
        };
        self.ctx.kv("Operation:  ", &summary.operation);
        self.ctx.kv("Proxy agent:", opt(summary.proxy_agent_version.as_deref()));
        if let Some(state) = summary.proxy_agent_state {
            self.ctx.kv("Agent state:", &format!("{state:?}").to_uppercase());
        }
        if !summary.stopped_modules.is_empty() {
            self.ctx.warn(&format!(
                "modules not running: {}",
                summary.stopped_modules.join(", ")
            ));
        }
    }

    /// Render a helper package check.
    pub fn render_package(&self, result: &PollResult<PackageState>) {
        if result.succeeded() {
            self.ctx.success(&result.last_observed.detail);
        } else {
            self.ctx.error(&format!(
                "{} ({})",
                result.last_observed.detail,
                outcome_line(result)
            ));
        }
    }

    /// Render a companion process check.
    pub fn render_process(&self, name: &str, result: &PollResult<Vec<u32>>) {
        if result.succeeded() {
            self.ctx
                .success(&format!("{name} running (pid {})", format_pids(&result.last_observed)));
        } else {
            self.ctx
                .error(&format!("{name} not running ({})", outcome_line(result)));
        }
    }

    /// Render what a reinstall did.
    pub fn render_reinstall(&self, summary: &ReinstallSummary) {
        self.ctx.kv("Stopped:", &format_pids(&summary.killed));
        self.ctx.kv("Removed:", &summary.removed_dir.display().to_string());
        self.ctx.kv("Package:", &summary.package_path.display().to_string());
        self.ctx.kv("Size:   ", &format!("{} bytes", summary.bytes));
        self.ctx.kv("SHA-256:", &summary.sha256);
    }

    /// Render the current configuration.
    pub fn render_config(&self, config: &ValidatorConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        println!("  {:<34} {}", "waagent_dir:", config.waagent_dir);
        println!("  {:<34} {}", "extension_prefix:", config.extension_prefix);
        println!("  {:<34} {}", "process_name:", config.process_name);
        println!("  {:<34} {}", "helper_package:", config.helper_package);
        println!("  {:<34} {}", "use_sudo:", config.use_sudo);
        println!("  {:<34} {}", "download_limit_mb:", config.download_limit_mb);
        println!();
        println!("  {}", "Polling:".style(self.ctx.styles.bold));
        for (phase, settings) in config.poll.phases() {
            let attempts = settings
                .max_attempts
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string());
            println!(
                "    {:<12} every {}s, up to {}s, attempts {attempts}",
                format!("{phase}:"),
                settings.interval_secs,
                settings.timeout_secs
            );
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["EXTCHECK_CONFIG", "RUST_LOG", "NO_COLOR"] {
            println!(
                "    {:<18} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }

    fn print_check(&self, ok: bool, msg: &str) {
        if ok {
            println!("    {} {msg}", "\u{2713}".style(self.ctx.styles.success));
        } else {
            println!("    {} {msg}", "\u{2717}".style(self.ctx.styles.error));
        }
    }
}

// ── Display helpers (used by tests and output layer) ─────────────────────────

fn opt(value: Option<&str>) -> &str {
    value.unwrap_or("(unknown)")
}

/// `"1.5s"`, `"2m 05s"`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}

/// Comma-separated pids, or `"none"`.
#[must_use]
pub fn format_pids(pids: &[u32]) -> String {
    if pids.is_empty() {
        return "none".to_string();
    }
    pids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `"timed out after 3 attempt(s) in 15.0s"`.
#[must_use]
pub fn outcome_line<T>(result: &PollResult<T>) -> String {
    format!(
        "{} after {} attempt(s) in {}",
        result.outcome.as_str(),
        result.attempts,
        format_elapsed(result.elapsed)
    )
}
