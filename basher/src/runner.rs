//! Process runner: launches the shell child and reports how it ended.

use crate::command::ExitCode;
use crate::config::Config;
use crate::env::Exports;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Variable carrying the absolute path of the host executable into the shell.
pub const PROGRAM_VAR: &str = "PROGRAM";
/// Variable bash reads to find the file it sources on start-up.
pub const BASH_ENV_VAR: &str = "BASH_ENV";

/// Quote `arg` so that bash reads it back as exactly one literal word.
///
/// The argument is wrapped in single quotes; an embedded single quote closes the
/// quoted run, is emitted escaped, and reopens it (`'\''`).
pub fn quote(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('\'');
    for c in arg.chars() {
        if c == '\'' {
            quoted.push_str(r"'\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// The `-c` script: `command` verbatim, then every argument quoted.
pub fn command_line<S: AsRef<str>>(command: &str, args: &[S]) -> String {
    let mut line = command.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&quote(arg.as_ref()));
    }
    line
}

/// Resolve the interpreter the way a shell resolves a command name.
///
/// Anything containing a path separator is used as given; a bare name is looked
/// up on the host's `PATH`.
pub fn resolve_interpreter(name: &str) -> Result<PathBuf> {
    if Path::new(name).components().count() > 1 {
        return Ok(PathBuf::from(name));
    }
    which::which(name).map_err(|source| Error::Interpreter {
        name: name.to_string(),
        source,
    })
}

/// Run `command args...` in a fresh shell that sources `env_file` first.
///
/// The child sees exactly `env` plus `PROGRAM` and `BASH_ENV`, and shares this
/// process's stdin, stdout and stderr. Blocks until the child exits.
pub fn run_bash<S: AsRef<str>>(
    config: &Config,
    env_file: &Path,
    command: &str,
    args: &[S],
    env: &Exports,
) -> Result<ExitCode> {
    let executable = std::env::current_exe().map_err(Error::Executable)?;
    let interpreter = resolve_interpreter(&config.interpreter)?;
    let line = command_line(command, args);

    if config.debug {
        eprintln!(
            "[basher] CMD env -i {} {}={} {}={} {} -c \"{}\"",
            env,
            PROGRAM_VAR,
            executable.display(),
            BASH_ENV_VAR,
            env_file.display(),
            interpreter.display(),
            line
        );
    }

    let mut child = Command::new(&interpreter)
        .arg("-c")
        .arg(&line)
        .env_clear()
        .envs(env.iter())
        .env(PROGRAM_VAR, &executable)
        .env(BASH_ENV_VAR, env_file)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(Error::Spawn)?;
    debug!(pid = child.id(), interpreter = %interpreter.display(), "shell started");

    let status = child.wait().map_err(Error::Wait)?;
    debug!(%status, "shell finished");
    exit_code(status)
}

fn exit_code(status: ExitStatus) -> Result<ExitCode> {
    match status.code() {
        Some(code) => Ok(code),
        None => Err(terminated_abnormally(status)),
    }
}

#[cfg(unix)]
fn terminated_abnormally(status: ExitStatus) -> Error {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => Error::Signaled(signal),
        None => Error::AbnormalExit,
    }
}

#[cfg(not(unix))]
fn terminated_abnormally(_status: ExitStatus) -> Error {
    Error::AbnormalExit
}
