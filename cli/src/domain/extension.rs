//! On-disk conventions of the guest agent's extension directories.
//!
//! Extensions are extracted to `<waagent dir>/<publisher.type>-<version>`,
//! next to the package zip the agent downloaded. The handler writes its
//! status to `<extension dir>/status/<sequence>.status`.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

/// Guest agent library directory.
pub const DEFAULT_WAAGENT_DIR: &str = "/var/lib/waagent";

/// Directory name prefix of the proxy agent extension.
pub const DEFAULT_EXTENSION_PREFIX: &str = "Microsoft.CPlat.ProxyAgent.ProxyAgentLinux";

/// Companion process started by the extension.
pub const DEFAULT_PROCESS_NAME: &str = "azure-proxy-agent";

/// Subdirectory holding handler status files.
pub const STATUS_DIR: &str = "status";

/// Matches `<sequence>.status`.
pub static STATUS_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    // Compile-time constant — cannot fail
    Regex::new(r"^(\d+)\.status$").expect("valid regex")
});

/// An extension directory matched by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDir {
    /// Directory name, e.g. `Microsoft.CPlat.ProxyAgent.ProxyAgentLinux-1.0.20`.
    pub name: String,
    /// Version suffix, if the name carries one.
    pub version: Option<String>,
}

impl ExtensionDir {
    /// File name of the package zip the agent extracts into this directory.
    #[must_use]
    pub fn package_file_name(&self) -> String {
        format!("{}.zip", self.name)
    }

    fn sort_key(&self) -> (Option<semver::Version>, &str) {
        (
            self.version.as_deref().and_then(parse_extension_version),
            &self.name,
        )
    }
}

impl Ord for ExtensionDir {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for ExtensionDir {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parse an extension version leniently.
///
/// Extension versions are dotted numbers with one to three components;
/// missing components are treated as zero.
#[must_use]
pub fn parse_extension_version(version: &str) -> Option<semver::Version> {
    if let Ok(v) = semver::Version::parse(version) {
        return Some(v);
    }
    let parts = version
        .split('.')
        .map(str::parse::<u64>)
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    match parts.as_slice() {
        [major] => Some(semver::Version::new(*major, 0, 0)),
        [major, minor] => Some(semver::Version::new(*major, *minor, 0)),
        _ => None,
    }
}

/// Match a directory name against the extension prefix.
#[must_use]
pub fn match_extension_dir(name: &str, prefix: &str) -> Option<ExtensionDir> {
    if name == prefix {
        return Some(ExtensionDir {
            name: name.to_string(),
            version: None,
        });
    }
    let version = name.strip_prefix(prefix)?.strip_prefix('-')?;
    if version.is_empty() {
        return None;
    }
    Some(ExtensionDir {
        name: name.to_string(),
        version: Some(version.to_string()),
    })
}

/// Every extension directory among `names`, lowest version first.
///
/// Names without a parseable version sort before versioned ones.
#[must_use]
pub fn find_extension_dirs<'a>(
    names: impl IntoIterator<Item = &'a str>,
    prefix: &str,
) -> Vec<ExtensionDir> {
    let mut dirs: Vec<ExtensionDir> = names
        .into_iter()
        .filter_map(|n| match_extension_dir(n, prefix))
        .collect();
    dirs.sort();
    dirs
}

/// Pick the highest-versioned extension directory among `names`.
#[must_use]
pub fn select_extension_dir<'a>(
    names: impl IntoIterator<Item = &'a str>,
    prefix: &str,
) -> Option<ExtensionDir> {
    find_extension_dirs(names, prefix).pop()
}

/// Pick the status file with the highest sequence number among `names`.
#[must_use]
pub fn select_status_file<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<String> {
    names
        .into_iter()
        .filter_map(|n| {
            let seq: u64 = STATUS_FILE_RE.captures(n)?.get(1)?.as_str().parse().ok()?;
            Some((seq, n))
        })
        .max_by_key(|(seq, _)| *seq)
        .map(|(_, n)| n.to_string())
}

// ── Unit tests ────────────────────────────────────────────────────────────────
