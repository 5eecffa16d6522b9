// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::types::SessionMode;

/// Top-level configuration as read from a TOML file, before validation.
///
/// This is a direct mapping of:
///
/// ```toml
/// [remote]
/// base_url = "http://127.0.0.1:8000"
/// timeout_secs = 10
/// poll_interval_secs = 2
///
/// [session]
/// mode = "replay"
/// participant = "P7"
/// saved_block_order = ["Wheel", "Bridge"]
///
/// [sequence]
/// terminal_category = "inspection"
///
/// [sequence.extra_categories]
/// cabin = "Cabin"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Collaborator endpoint config from `[remote]`.
    #[serde(default)]
    pub remote: RemoteSection,

    /// Session round config from `[session]`.
    #[serde(default)]
    pub session: SessionSection,

    /// Sequence assembly config from `[sequence]`.
    #[serde(default)]
    pub sequence: SequenceSection,
}

/// `[remote]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSection {
    /// Base URL of the collaborator service, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Interval between dependency/execution polls in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    2
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

/// `[session]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionSection {
    /// `"record"` or `"replay"`; the CLI `--mode` flag overrides this.
    #[serde(default)]
    pub mode: SessionMode,

    /// Fixed participant id. When absent (and no `--participant` flag is
    /// given), an id is derived from the collaborator's participant count at
    /// startup.
    #[serde(default)]
    pub participant: Option<String>,

    /// Block display names driving the initial block order in replay mode.
    ///
    /// Names are matched trimmed and case-insensitive; unlisted blocks keep
    /// their natural position after the listed ones.
    #[serde(default)]
    pub saved_block_order: Option<Vec<String>>,
}

/// `[sequence]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SequenceSection {
    /// Keyword of the terminal category; the block matching it is pinned to
    /// the last slot.
    #[serde(default = "default_terminal_category")]
    pub terminal_category: String,

    /// Extra keyword -> display-name pairs checked before the built-in
    /// categories.
    #[serde(default)]
    pub extra_categories: BTreeMap<String, String>,
}

fn default_terminal_category() -> String {
    "inspection".to_string()
}

impl Default for SequenceSection {
    fn default() -> Self {
        Self {
            terminal_category: default_terminal_category(),
            extra_categories: BTreeMap::new(),
        }
    }
}

/// Validated configuration used by the rest of the application.
///
/// Constructed via `TryFrom<RawConfigFile>` (see `validate.rs`), which is
/// where the invariants are enforced.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    remote: RemoteSection,
    session: SessionSection,
    sequence: SequenceSection,
}

impl ConfigFile {
    /// Construct without validating; only `TryFrom<RawConfigFile>` and tests
    /// should call this.
    pub(crate) fn new_unchecked(
        remote: RemoteSection,
        session: SessionSection,
        sequence: SequenceSection,
    ) -> Self {
        Self {
            remote,
            session,
            sequence,
        }
    }

    pub fn remote(&self) -> &RemoteSection {
        &self.remote
    }

    pub fn session(&self) -> &SessionSection {
        &self.session
    }

    pub fn sequence(&self) -> &SequenceSection {
        &self.sequence
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.remote.poll_interval_secs)
    }
}
