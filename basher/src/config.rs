use std::env;
use std::path::PathBuf;

/// Variable whose non-empty value switches on debug mode.
pub const DEBUG_VAR: &str = "DEBUG";
/// Overrides [`Config::interpreter`].
pub const SHELL_VAR: &str = "BASHER_SHELL";
/// Overrides [`Config::temp_dir`].
pub const TMPDIR_VAR: &str = "BASHER_TMPDIR";

/// How a [`Context`](crate::Context) launches its shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Shell program; a bare name is looked up on `PATH`.
    pub interpreter: String,
    /// Print the constructed command line and keep env files for inspection.
    pub debug: bool,
    /// Where env files are created. `None` means the system temp directory.
    pub temp_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpreter: "bash".to_string(),
            debug: false,
            temp_dir: None,
        }
    }
}

impl Config {
    /// Defaults overridden by `DEBUG`, `BASHER_SHELL` and `BASHER_TMPDIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let mut config = Self::default();
        config.debug = non_empty(DEBUG_VAR).is_some();
        if let Some(shell) = non_empty(SHELL_VAR) {
            config.interpreter = shell;
        }
        config.temp_dir = non_empty(TMPDIR_VAR).map(PathBuf::from);
        config
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub(crate) fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(env::temp_dir)
    }
}
