use std::io;
use std::path::PathBuf;

/// Failures surfaced by [`Context::run`](crate::Context::run) and its parts.
///
/// None of these are retried; a dispatch to an unknown callback is not an error
/// but a process exit with [`UNKNOWN_CALLBACK`](crate::UNKNOWN_CALLBACK).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot resolve path of the running executable: {0}")]
    Executable(#[source] io::Error),

    #[error("shell interpreter `{name}` not found: {source}")]
    Interpreter {
        name: String,
        #[source]
        source: which::Error,
    },

    #[error("cannot create env file: {0}")]
    TempFile(#[source] io::Error),

    #[error("cannot read source file {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write env file: {0}")]
    Write(#[source] io::Error),

    #[error("`{0}` is not a valid shell function name")]
    InvalidCallbackName(String),

    #[error("failed to start shell: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed waiting for shell: {0}")]
    Wait(#[source] io::Error),

    #[error("shell terminated by signal {0}")]
    Signaled(i32),

    #[error("shell terminated abnormally")]
    AbnormalExit,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
