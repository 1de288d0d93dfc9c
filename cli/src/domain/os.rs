//! Operating system identification and package manager selection.
//!
//! Pure functions only — the caller reads `/etc/os-release` or runs
//! `hostnamectl` and hands the text in.

use crate::domain::error::HostError;

/// Path of the os-release file on the guest.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Distribution identity, as far as the guest reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    /// Lowercase distribution id, e.g. `ubuntu`, `rhel`, `mariner`.
    pub id: String,
    /// Lowercase ids of parent distributions (`ID_LIKE`).
    pub id_like: Vec<String>,
    /// Human-readable name, e.g. `Ubuntu 22.04.4 LTS`.
    pub pretty_name: String,
    pub version_id: Option<String>,
}

impl OsRelease {
    /// Major component of `VERSION_ID`, if numeric.
    #[must_use]
    pub fn major_version(&self) -> Option<u32> {
        self.version_id
            .as_deref()?
            .split('.')
            .next()?
            .parse()
            .ok()
    }

    fn is_or_like(&self, ids: &[&str]) -> bool {
        ids.contains(&self.id.as_str()) || self.id_like.iter().any(|l| ids.contains(&l.as_str()))
    }
}

/// Parse the `KEY=value` lines of an os-release file.
///
/// # Errors
///
/// Returns an error if the content has no `ID` entry.
pub fn parse_os_release(content: &str) -> Result<OsRelease, HostError> {
    let mut release = OsRelease::default();
    let mut name = None;
    for line in content.lines() {
        let Some((key, raw)) = line.trim().split_once('=') else {
            continue;
        };
        let value = raw.trim().trim_matches('"').trim_matches('\'');
        match key {
            "ID" => release.id = value.to_ascii_lowercase(),
            "ID_LIKE" => {
                release.id_like = value
                    .split_whitespace()
                    .map(str::to_ascii_lowercase)
                    .collect();
            }
            "VERSION_ID" => release.version_id = Some(value.to_string()),
            "PRETTY_NAME" => release.pretty_name = value.to_string(),
            "NAME" => name = Some(value.to_string()),
            _ => {}
        }
    }
    if release.id.is_empty() {
        return Err(HostError::UnknownOs("os-release has no ID".to_string()));
    }
    if release.pretty_name.is_empty() {
        release.pretty_name = name.unwrap_or_else(|| release.id.clone());
    }
    Ok(release)
}

/// Known distribution names as printed by `hostnamectl`, mapped to ids.
const HOSTNAMECTL_NAMES: &[(&str, &str)] = &[
    ("ubuntu", "ubuntu"),
    ("debian", "debian"),
    ("red hat", "rhel"),
    ("centos", "centos"),
    ("rocky", "rocky"),
    ("almalinux", "almalinux"),
    ("oracle", "ol"),
    ("fedora", "fedora"),
    ("cbl-mariner", "mariner"),
    ("azure linux", "azurelinux"),
    ("suse linux enterprise", "sles"),
    ("opensuse", "opensuse-leap"),
];

/// Parse the `Operating System:` line of `hostnamectl` output.
///
/// # Errors
///
/// Returns an error if the line is missing or names an unknown distribution.
pub fn parse_hostnamectl(output: &str) -> Result<OsRelease, HostError> {
    let pretty = output
        .lines()
        .find_map(|l| l.trim().strip_prefix("Operating System:"))
        .map(str::trim)
        .ok_or_else(|| HostError::UnknownOs("no Operating System line".to_string()))?;

    let lower = pretty.to_ascii_lowercase();
    let id = HOSTNAMECTL_NAMES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, id)| (*id).to_string())
        .ok_or_else(|| HostError::UnsupportedOs(pretty.to_string()))?;

    let version_id = pretty
        .split(|c: char| c.is_whitespace() || c == '/')
        .find(|t| t.starts_with(|c: char| c.is_ascii_digit()))
        .map(|t| t.trim_end_matches(|c: char| !c.is_ascii_digit()).to_string());

    Ok(OsRelease {
        id,
        id_like: Vec::new(),
        pretty_name: pretty.to_string(),
        version_id,
    })
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// A program and its arguments, ready for a `CommandRunner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    #[must_use]
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
        }
    }

    /// Prefix the command with `sudo -n` when `use_sudo` is set.
    #[must_use]
    pub fn with_sudo(self, use_sudo: bool) -> Self {
        if !use_sudo {
            return self;
        }
        let mut args = vec!["-n".to_string(), self.program];
        args.extend(self.args);
        Self {
            program: "sudo".to_string(),
            args,
        }
    }

    #[must_use]
    pub fn arg_refs(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ── Package managers ──────────────────────────────────────────────────────────

/// Package managers the validator knows how to drive non-interactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
    Tdnf,
    Zypper,
}

/// Reject names a package manager would parse as an option.
///
/// # Errors
///
/// Returns `HostError::InvalidPackageName` for an empty name, a leading `-`,
/// or embedded whitespace.
pub fn validate_package_name(name: &str) -> Result<(), HostError> {
    if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(HostError::InvalidPackageName(name.to_string()));
    }
    Ok(())
}

impl PackageManager {
    /// Pick the package manager for a distribution.
    ///
    /// # Errors
    ///
    /// Returns `HostError::UnsupportedOs` for unknown distributions.
    pub fn detect(os: &OsRelease) -> Result<Self, HostError> {
        if os.is_or_like(&["ubuntu", "debian"]) {
            return Ok(Self::Apt);
        }
        if os.is_or_like(&["mariner", "azurelinux"]) {
            return Ok(Self::Tdnf);
        }
        if os.is_or_like(&["sles", "opensuse", "opensuse-leap", "suse"]) {
            return Ok(Self::Zypper);
        }
        if os.id == "fedora" {
            return Ok(Self::Dnf);
        }
        if os.is_or_like(&["rhel", "centos", "rocky", "almalinux", "ol", "fedora"]) {
            return Ok(match os.major_version() {
                Some(major) if major < 8 => Self::Yum,
                _ => Self::Dnf,
            });
        }
        Err(HostError::UnsupportedOs(os.pretty_name.clone()))
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Tdnf => "tdnf",
            Self::Zypper => "zypper",
        }
    }

    /// Command that reports whether `package` is installed.
    #[must_use]
    pub fn query_command(self, package: &str) -> CommandLine {
        match self {
            Self::Apt => CommandLine::new("dpkg-query", &["-W", "-f=${Status}", package]),
            _ => CommandLine::new("rpm", &["-q", package]),
        }
    }

    /// Interpret the output of [`Self::query_command`].
    #[must_use]
    pub fn is_installed(self, exit_success: bool, stdout: &str) -> bool {
        match self {
            Self::Apt => exit_success && stdout.contains("install ok installed"),
            _ => exit_success,
        }
    }

    /// Command that refreshes package metadata before an install, if needed.
    #[must_use]
    pub fn refresh_command(self) -> Option<CommandLine> {
        match self {
            Self::Apt => Some(CommandLine::new("apt-get", &["-q", "update"])),
            _ => None,
        }
    }

    /// Non-interactive install command for `package`.
    #[must_use]
    pub fn install_command(self, package: &str) -> CommandLine {
        match self {
            Self::Apt => CommandLine::new("apt-get", &["-q", "-y", "install", package]),
            Self::Zypper => {
                CommandLine::new("zypper", &["--non-interactive", "install", package])
            }
            other => CommandLine::new(other.name(), &["-y", "install", package]),
        }
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────
