//! Wire format of a callback re-invocation.
//!
//! A shim function inside bash calls back into the host as
//! `"$PROGRAM" :: <name> <args...>`. Both directions of that encoding live here:
//! [`shim`] writes it and [`Invocation::parse`] reads it back.

use std::ffi::OsString;

/// Reserved token separating the host's own argv from a dispatch request.
pub const MARKER: &str = "::";

/// Shell function forwarding a call to `name` back to the host executable.
pub fn shim(name: &str) -> String {
    format!("{name}() {{ \"$PROGRAM\" {MARKER} {name} \"$@\"; }}\n")
}

/// A request to run the host callback `name` with `args`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl DispatchRequest {
    pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// What a host process was started to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Re-invoked by a shim: run one callback and exit.
    Dispatch(DispatchRequest),
    /// Ordinary start-up.
    Launch,
}

impl Invocation {
    /// Classify a full argument vector (including `argv[0]`).
    ///
    /// The first marker that is followed by at least one token wins; the token
    /// after it names the callback and everything after that is passed through.
    /// A trailing marker with nothing after it is not a dispatch request.
    /// Arguments that are not valid UTF-8 reach the callback with invalid
    /// sequences replaced by U+FFFD.
    pub fn parse<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        let lossy = |arg: &OsString| arg.to_string_lossy().into_owned();
        for (i, arg) in argv.iter().enumerate() {
            if arg == MARKER && i + 1 < argv.len() {
                return Invocation::Dispatch(DispatchRequest {
                    name: lossy(&argv[i + 1]),
                    args: argv[i + 2..].iter().map(lossy).collect(),
                });
            }
        }
        Invocation::Launch
    }
}
