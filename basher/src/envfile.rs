//! Env-file builder.
//!
//! bash sources the file named by `BASH_ENV` before running its command, so the
//! file is where registered scripts and callback shims become visible to it.

use crate::error::{Error, Result};
use crate::protocol::shim;
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::TempPath;
use tracing::trace;

const PREFIX: &str = "bashenv.";

static FUNCTION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_:.-]*$").expect("function name pattern is valid")
});

/// Words bash parses as syntax at the start of a command.
const RESERVED_WORDS: &[&str] = &[
    "case", "coproc", "do", "done", "elif", "else", "esac", "fi", "for", "function", "if", "in",
    "select", "then", "time", "until", "while",
];

/// Whether `name` can be used as the name of a generated shell function.
pub fn is_valid_function_name(name: &str) -> bool {
    FUNCTION_NAME.is_match(name) && !RESERVED_WORDS.contains(&name)
}

/// A generated env file on disk.
///
/// The file is removed when this value is dropped, on every path out of the
/// caller, unless [`EnvFile::keep`] is called first.
#[derive(Debug)]
pub struct EnvFile {
    path: TempPath,
}

impl EnvFile {
    /// Write a fresh, uniquely named env file in `dir`.
    ///
    /// The file holds the bytes of every file in `sources`, in order, followed by
    /// one [`shim`] per callback name. Names are emitted sorted so the output is
    /// a pure function of its inputs.
    pub fn build<S: AsRef<str>>(dir: &Path, sources: &[PathBuf], callbacks: &[S]) -> Result<Self> {
        let mut names: Vec<&str> = callbacks.iter().map(AsRef::as_ref).collect();
        names.sort_unstable();
        if let Some(bad) = names.iter().find(|n| !is_valid_function_name(n)) {
            return Err(Error::InvalidCallbackName(bad.to_string()));
        }

        let mut file = tempfile::Builder::new()
            .prefix(PREFIX)
            .tempfile_in(dir)
            .map_err(Error::TempFile)?;

        let mut ends_with_newline = true;
        for path in sources {
            let content = fs::read(path).map_err(|source| Error::Source {
                path: path.clone(),
                source,
            })?;
            file.write_all(&content).map_err(Error::Write)?;
            if let Some(last) = content.last() {
                ends_with_newline = *last == b'\n';
            }
        }
        // Keep the first shim off the last line of an unterminated script.
        if !ends_with_newline && !names.is_empty() {
            file.write_all(b"\n").map_err(Error::Write)?;
        }

        for name in names {
            let line = shim(name);
            trace!(shim = %line.trim_end(), "adding callback shim");
            file.write_all(line.as_bytes()).map_err(Error::Write)?;
        }
        file.flush().map_err(Error::Write)?;

        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leave the file on disk and return its path.
    pub fn keep(self) -> Result<PathBuf> {
        self.path.keep().map_err(|e| Error::TempFile(e.error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_script(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn concatenates_sources_then_shims() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_script(&dir, "a.bash", "VALUE=a\n");
        let b = write_script(&dir, "b.bash", "VALUE=b\n");

        let env = EnvFile::build(dir.path(), &[a, b], &["world", "hello"]).unwrap();
        let content = fs::read_to_string(env.path()).unwrap();

        assert_eq!(
            content,
            "VALUE=a\nVALUE=b\n\
             hello() { \"$PROGRAM\" :: hello \"$@\"; }\n\
             world() { \"$PROGRAM\" :: world \"$@\"; }\n"
        );
    }

    #[test]
    fn file_name_is_unique_and_prefixed() {
        let dir = tempfile::tempdir().unwrap();
        let first = EnvFile::build::<&str>(dir.path(), &[], &[]).unwrap();
        let second = EnvFile::build::<&str>(dir.path(), &[], &[]).unwrap();

        assert_ne!(first.path(), second.path());
        let name = first.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("bashenv."), "unexpected name {name}");
        assert!(first.path().is_absolute());
    }

    #[test]
    fn unterminated_source_gets_newline_before_shims() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_script(&dir, "a.bash", "echo no newline");

        let env = EnvFile::build(dir.path(), &[a], &["cb"]).unwrap();
        let content = fs::read_to_string(env.path()).unwrap();
        assert!(content.starts_with("echo no newline\ncb() {"));
    }

    #[test]
    fn missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bash");

        let err = EnvFile::build::<&str>(dir.path(), &[missing.clone()], &[]).unwrap_err();
        match err {
            Error::Source { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_names_that_break_the_shim() {
        let dir = tempfile::tempdir().unwrap();
        let err = EnvFile::build(dir.path(), &[], &["ok", "rm -rf"]).unwrap_err();
        assert!(matches!(err, Error::InvalidCallbackName(ref n) if n == "rm -rf"));

        assert!(is_valid_function_name("git-status"));
        assert!(is_valid_function_name("ns::call"));
        assert!(!is_valid_function_name("1abc"));
        assert!(!is_valid_function_name(""));

        for word in ["done", "if", "then", "fi", "case", "esac", "function", "while"] {
            assert!(!is_valid_function_name(word), "{word} accepted");
        }
        assert!(is_valid_function_name("done_all"));
        let err = EnvFile::build(dir.path(), &[], &["foo", "done"]).unwrap_err();
        assert!(matches!(err, Error::InvalidCallbackName(ref n) if n == "done"));
    }

    #[test]
    fn removed_on_drop_unless_kept() {
        let dir = tempfile::tempdir().unwrap();

        let dropped = EnvFile::build::<&str>(dir.path(), &[], &[]).unwrap();
        let dropped_path = dropped.path().to_path_buf();
        assert!(dropped_path.exists());
        drop(dropped);
        assert!(!dropped_path.exists());

        let kept = EnvFile::build::<&str>(dir.path(), &[], &[]).unwrap();
        let kept_path = kept.keep().unwrap();
        assert!(kept_path.exists());
    }
}
