#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

/// Default email suffix stripped from school addresses to form student ids.
const DEFAULT_SCHOOL_DOMAIN: &str = "calvin.edu";

/// Student ids must be strictly shorter than this.
const DEFAULT_MAX_ID_LEN: usize = 10;

/// Assignment archives per run must be strictly fewer than this.
const DEFAULT_MAX_ARCHIVES: usize = 10;

/// Settings for the grading harness.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Prefixes removed from rendered traces so they read relative to the
    /// submission.
    strip_prefixes: Vec<String>,
    /// Whether student traces include backtrace frames.
    backtrace:      bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let strip_prefixes = std::env::current_dir()
            .map(|dir| vec![format!("{}/", dir.display())])
            .unwrap_or_default();

        Self {
            strip_prefixes,
            backtrace: true,
        }
    }
}

impl HarnessConfig {
    /// Builds harness settings from `LABGRADE_TRACE_STRIP` and
    /// `LABGRADE_BACKTRACE`, falling back to defaults.
    fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(prefixes) = std::env::var("LABGRADE_TRACE_STRIP") {
            cfg.strip_prefixes = prefixes
                .split(':')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
                .collect();
        }
        cfg.backtrace = read_bool("LABGRADE_BACKTRACE", cfg.backtrace);
        cfg
    }

    /// Returns the prefixes stripped from traces.
    pub fn strip_prefixes(&self) -> &[String] {
        &self.strip_prefixes
    }

    /// Returns whether student traces include backtrace frames.
    pub fn backtrace(&self) -> bool {
        self.backtrace
    }

    /// Returns a new config with the given strip prefixes.
    pub fn with_strip_prefixes(
        mut self,
        prefixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.strip_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Returns a new config with backtraces switched on or off.
    pub fn with_backtrace(mut self, enabled: bool) -> Self {
        self.backtrace = enabled;
        self
    }
}

/// Settings for the submission extractor.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Email suffix removed to form student ids.
    school_domain: String,
    /// Exclusive upper bound on student id length.
    max_id_len:    usize,
    /// Exclusive upper bound on the number of archives handled per run.
    max_archives:  usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            school_domain: DEFAULT_SCHOOL_DOMAIN.to_string(),
            max_id_len:    DEFAULT_MAX_ID_LEN,
            max_archives:  DEFAULT_MAX_ARCHIVES,
        }
    }
}

impl ExtractConfig {
    /// Builds extractor settings from `LABGRADE_SCHOOL_DOMAIN`,
    /// `LABGRADE_MAX_ID_LEN` and `LABGRADE_MAX_ARCHIVES`.
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            school_domain: std::env::var("LABGRADE_SCHOOL_DOMAIN")
                .map(|value| value.trim().to_ascii_lowercase())
                .unwrap_or(defaults.school_domain),
            max_id_len:    read_usize("LABGRADE_MAX_ID_LEN", defaults.max_id_len),
            max_archives:  read_usize("LABGRADE_MAX_ARCHIVES", defaults.max_archives),
        }
    }

    /// Returns the email suffix removed to form student ids.
    pub fn school_domain(&self) -> &str {
        &self.school_domain
    }

    /// Returns the exclusive upper bound on student id length.
    pub fn max_id_len(&self) -> usize {
        self.max_id_len
    }

    /// Returns the exclusive upper bound on archives per run.
    pub fn max_archives(&self) -> usize {
        self.max_archives
    }

    /// Returns a new config with a different school domain.
    pub fn with_school_domain(mut self, domain: impl Into<String>) -> Self {
        self.school_domain = domain.into().to_ascii_lowercase();
        self
    }

    /// Returns a new config with a different id length bound.
    pub fn with_max_id_len(mut self, len: usize) -> Self {
        self.max_id_len = len;
        self
    }

    /// Returns a new config with a different archive count bound.
    pub fn with_max_archives(mut self, count: usize) -> Self {
        self.max_archives = count;
        self
    }
}

/// Runtime configuration shared across the crate.
#[derive(Debug)]
pub struct ConfigState {
    /// Grading harness settings.
    harness:  HarnessConfig,
    /// Submission extractor settings.
    extract:  ExtractConfig,
    /// Directory the process was started from, if it could be determined.
    work_dir: Option<PathBuf>,
}

impl ConfigState {
    /// Construct a new configuration instance from the environment.
    fn new() -> Self {
        Self {
            harness:  HarnessConfig::from_env(),
            extract:  ExtractConfig::from_env(),
            work_dir: std::env::current_dir().ok(),
        }
    }

    /// Returns the harness settings.
    pub fn harness(&self) -> &HarnessConfig {
        &self.harness
    }

    /// Returns the extractor settings.
    pub fn extract(&self) -> &ExtractConfig {
        &self.extract
    }

    /// Returns the directory the process was started from.
    pub fn work_dir(&self) -> Option<&PathBuf> {
        self.work_dir.as_ref()
    }
}

/// Shared configuration handle used throughout the crate.
#[derive(Clone, Debug)]
pub struct ConfigHandle(Arc<ConfigState>);

impl std::ops::Deref for ConfigHandle {
    type Target = ConfigState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Global storage for the lazily constructed configuration state.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<ConfigState>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<ConfigState>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Returns the active configuration, initializing it on demand.
pub fn get() -> ConfigHandle {
    let mut guard = slot().lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(cfg) = guard.as_ref() {
        return ConfigHandle(Arc::clone(cfg));
    }

    let cfg = Arc::new(ConfigState::new());
    *guard = Some(Arc::clone(&cfg));
    ConfigHandle(cfg)
}

/// Returns a copy of the configured harness settings.
pub fn harness() -> HarnessConfig {
    get().harness().clone()
}

/// Returns a copy of the configured extractor settings.
pub fn extract() -> ExtractConfig {
    get().extract().clone()
}

/// Parses a boolean environment variable, falling back to `default` when it
/// is missing or unrecognised.
fn read_bool(env: &str, default: bool) -> bool {
    match std::env::var(env)
        .map(|value| value.trim().to_ascii_lowercase())
        .as_deref()
    {
        Ok("1" | "true" | "yes" | "on") => true,
        Ok("0" | "false" | "no" | "off") => false,
        Ok(other) => {
            tracing::warn!("Ignoring unrecognised value `{other}` for {env}");
            default
        }
        Err(_) => default,
    }
}

/// Parses a numeric environment variable, falling back to `default` when
/// parsing fails or the variable is missing.
fn read_usize(env: &str, default: usize) -> usize {
    std::env::var(env)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}
