use std::fmt;
use std::sync::Arc;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Callback handlers return one of these, and it becomes the exit status of the
/// re-invoked host process, so only the low 8 bits survive the trip back to bash.
pub type ExitCode = i32;

/// Exit status of a dispatch re-invocation naming a callback that is not registered.
pub const UNKNOWN_CALLBACK: ExitCode = 6;

/// Host-side implementation of a shell-callable function.
///
/// Cloning a `Callback` is cheap: the handler is shared behind an [`Arc`], so the
/// registry can hand it out and release its lock before the handler runs.
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn(&[String]) -> ExitCode + Send + Sync>);

impl Callback {
    /// Wrap a closure taking the callback's arguments and returning its status.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&[String]) -> ExitCode + Send + Sync + 'static,
    {
        Self(Arc::new(handler))
    }

    /// Run the handler.
    pub fn call(&self, args: &[String]) -> ExitCode {
        (self.0)(args)
    }
}

impl<F> From<F> for Callback
where
    F: Fn(&[String]) -> ExitCode + Send + Sync + 'static,
{
    fn from(handler: F) -> Self {
        Self::new(handler)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}
