use crate::command::{Callback, ExitCode, UNKNOWN_CALLBACK};
use crate::config::Config;
use crate::env::Exports;
use crate::envfile::EnvFile;
use crate::error::Result;
use crate::protocol::{DispatchRequest, Invocation, MARKER};
use crate::runner;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Name of the callback every context answers after [`Context::handle_funcs`].
pub const HELP: &str = "help";

#[derive(Clone)]
enum Entry {
    Host(Callback),
    Help { program: String },
}

#[derive(Default)]
struct Registry {
    sources: Vec<PathBuf>,
    exports: Exports,
    callbacks: HashMap<String, Entry>,
}

/// Shared namespace between the host program and the bash child it runs.
///
/// A context collects scripts to source, variables to export and host functions
/// callable from bash, then runs commands with all of them in scope. Every
/// operation takes one lock for its whole duration, so a context can be shared
/// between threads; [`Context::run`] holds it until the shell exits.
///
/// The host must call [`Context::handle_funcs`] at start-up, before parsing its
/// own arguments, so that callback re-invocations are answered.
///
/// ```no_run
/// use basher::Context;
///
/// let bash = Context::new();
/// bash.export_func("greet", |args: &[String]| {
///     println!("hello {}", args.join(" "));
///     0
/// });
/// bash.handle_funcs(std::env::args_os());
///
/// bash.source("./lib.bash");
/// let status = bash.run("greet", &["world"]).unwrap();
/// std::process::exit(status);
/// ```
pub struct Context {
    config: Config,
    registry: Mutex<Registry>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// An empty context configured from the process environment.
    ///
    /// The shell child inherits nothing but what is exported into it.
    pub fn new() -> Self {
        Self::with_config(Config::from_env())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            registry: Mutex::new(Registry::default()),
        }
    }

    /// A context whose exports start out as `env`, e.g. [`Exports::inherit`].
    pub fn with_env(env: impl Into<Exports>) -> Self {
        let context = Self::new();
        context.lock().exports = env.into();
        context
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a script to be sourced by every later [`run`](Self::run).
    ///
    /// The file is only read when a run builds its env file.
    pub fn source(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!(path = %path.display(), "registering source");
        self.lock().sources.push(path);
    }

    /// Export `name=value` into the shell's environment.
    pub fn export(&self, name: impl Into<String>, value: impl Into<String>) {
        self.lock().exports.push(name, value);
    }

    /// Make `handler` callable from bash as the function `name`.
    ///
    /// Registering a name again replaces the previous handler.
    pub fn export_func(&self, name: impl Into<String>, handler: impl Into<Callback>) {
        let name = name.into();
        debug!(%name, "registering callback");
        self.lock().callbacks.insert(name, Entry::Host(handler.into()));
    }

    pub fn sources(&self) -> Vec<PathBuf> {
        self.lock().sources.clone()
    }

    pub fn exports(&self) -> Exports {
        self.lock().exports.clone()
    }

    /// Registered callback names, sorted.
    pub fn callbacks(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().callbacks.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Write the env file for the current registry.
    pub fn build_env_file(&self) -> Result<EnvFile> {
        let registry = self.lock();
        self.build_locked(&registry)
    }

    fn build_locked(&self, registry: &Registry) -> Result<EnvFile> {
        let names: Vec<&str> = registry.callbacks.keys().map(String::as_str).collect();
        EnvFile::build(&self.config.temp_dir(), &registry.sources, &names)
    }

    /// Run `command args...` in bash with everything registered so far in scope.
    ///
    /// Returns the shell's exit status. The env file is removed before this
    /// returns, whatever the outcome, unless debug mode keeps it.
    pub fn run<S: AsRef<str>>(&self, command: &str, args: &[S]) -> Result<ExitCode> {
        let registry = self.lock();
        let env_file = self.build_locked(&registry)?;

        if self.config.debug {
            let path = env_file.keep()?;
            debug!(path = %path.display(), "keeping env file");
            runner::run_bash(&self.config, &path, command, args, &registry.exports)
        } else {
            runner::run_bash(&self.config, env_file.path(), command, args, &registry.exports)
        }
    }

    /// Run the callback named by `request` and return its status.
    ///
    /// Unknown names yield [`UNKNOWN_CALLBACK`]. The registry lock is released
    /// before the handler runs.
    pub fn dispatch(&self, request: &DispatchRequest) -> ExitCode {
        let entry = self.lock().callbacks.get(&request.name).cloned();
        match entry {
            Some(Entry::Host(callback)) => {
                debug!(name = %request.name, args = request.args.len(), "dispatching callback");
                callback.call(&request.args)
            }
            Some(Entry::Help { program }) => self.print_help(&program),
            None => {
                debug!(name = %request.name, "no such callback");
                UNKNOWN_CALLBACK
            }
        }
    }

    fn print_help(&self, program: &str) -> ExitCode {
        let mut out = io::stdout().lock();
        let mut write = || -> io::Result<()> {
            writeln!(out, "Built in functions:")?;
            for name in self.callbacks() {
                writeln!(out, "{program} {MARKER} {name}")?;
            }
            out.flush()
        };
        match write() {
            Ok(()) => 0,
            Err(_) => 1,
        }
    }

    /// Answer a callback re-invocation, if `args` is one.
    ///
    /// `args` is the host's full argument vector, `argv[0]` included, normally
    /// [`std::env::args_os`] so that arguments which are not UTF-8 still reach
    /// the callback (see [`Invocation::parse`]). The built-in [`HELP`] callback is registered first. When `args` carries a
    /// dispatch request the callback runs and the process exits with its status;
    /// this function then never returns. Otherwise it returns and the host
    /// carries on with its normal start-up.
    pub fn handle_funcs<I, S>(&self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let program = args
            .first()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.lock()
            .callbacks
            .insert(HELP.to_string(), Entry::Help { program });

        if let Invocation::Dispatch(request) = Invocation::parse(args) {
            let code = self.dispatch(&request);
            let _ = io::stdout().flush();
            std::process::exit(code);
        }
    }
}
