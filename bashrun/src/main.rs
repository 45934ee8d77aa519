use anyhow::{Context as _, Result, bail};
use argh::FromArgs;
use basher::{Context, ExitCode, Exports};
use std::env;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Run a command in bash with scripts sourced and host functions available.
///
/// Inside the shell, `help` lists the host functions and `log LEVEL MESSAGE...`
/// writes to this program's log.
struct Args {
    /// script to source before the command runs; may be repeated
    #[argh(option, short = 's')]
    source: Vec<PathBuf>,

    /// variable to export into the shell, as NAME=VALUE; may be repeated
    #[argh(option, short = 'e')]
    export: Vec<String>,

    /// start the shell with only the exported variables instead of this environment
    #[argh(switch)]
    clean_env: bool,

    /// command to run, usually a function defined by a sourced script
    #[argh(positional)]
    command: String,

    /// arguments passed to the command; put `--` before any that start with a dash
    #[argh(positional)]
    args: Vec<String>,
}

fn init_tracing() {
    let filter = if env::var("DEBUG").is_ok_and(|v| !v.is_empty()) {
        EnvFilter::new("basher=debug,bashrun=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `log LEVEL MESSAGE...` from the shell.
fn log(args: &[String]) -> ExitCode {
    let Some((level, words)) = args.split_first() else {
        eprintln!("usage: log LEVEL MESSAGE...");
        return 2;
    };
    let Ok(level) = level.parse::<Level>() else {
        eprintln!("log: unknown level `{level}`");
        return 2;
    };
    let message = words.join(" ");
    match level {
        Level::ERROR => tracing::error!(target: "bashrun::script", "{message}"),
        Level::WARN => tracing::warn!(target: "bashrun::script", "{message}"),
        Level::INFO => tracing::info!(target: "bashrun::script", "{message}"),
        Level::DEBUG => tracing::debug!(target: "bashrun::script", "{message}"),
        _ => tracing::trace!(target: "bashrun::script", "{message}"),
    }
    0
}

fn parse_export(binding: &str) -> Result<(&str, &str)> {
    match binding.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => bail!("invalid export `{binding}`, expected NAME=VALUE"),
    }
}

/// Context with this program's callbacks, exporting `env` to the shell.
fn host(env: Exports) -> Context {
    let bash = Context::with_env(env);
    bash.export_func("log", log);
    bash
}

fn main() -> Result<()> {
    init_tracing();

    host(Exports::new()).handle_funcs(env::args_os());

    let args: Args = argh::from_env();
    let bash = host(if args.clean_env {
        Exports::new()
    } else {
        Exports::inherit()
    });
    for binding in &args.export {
        let (name, value) = parse_export(binding)?;
        bash.export(name, value);
    }
    for path in args.source {
        bash.source(path);
    }

    let code = bash
        .run(&args.command, &args.args)
        .with_context(|| format!("failed to run `{}`", args.command))?;
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_binding_splits_on_first_equals() {
        assert_eq!(parse_export("A=b=c").unwrap(), ("A", "b=c"));
        assert_eq!(parse_export("EMPTY=").unwrap(), ("EMPTY", ""));
        assert!(parse_export("novalue").is_err());
        assert!(parse_export("=value").is_err());
    }

    #[test]
    fn log_rejects_bad_usage() {
        assert_eq!(log(&[]), 2);
        assert_eq!(log(&["loud".to_string(), "x".to_string()]), 2);
        assert_eq!(log(&["info".to_string(), "hello".to_string()]), 0);
    }
}
