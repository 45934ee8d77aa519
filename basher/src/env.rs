use std::ffi::OsString;
use std::fmt;
use tracing::debug;

/// Ordered environment bindings handed to the shell child.
///
/// Bindings keep registration order and duplicates are kept as well: a later
/// binding for the same name shadows an earlier one once applied to a process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exports {
    vars: Vec<(String, String)>,
}

impl Exports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment, in the order the OS reports it.
    ///
    /// Variables whose name or value is not valid UTF-8 are left out.
    pub fn inherit() -> Self {
        Self::from_os(std::env::vars_os())
    }

    /// Bindings from raw OS strings, skipping any that are not valid UTF-8.
    pub fn from_os(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        let mut exports = Self::new();
        for (name, value) in vars {
            match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => exports.push(name, value),
                (name, _) => debug!(
                    name = %name.map_or_else(|n| n.to_string_lossy().into_owned(), |n| n),
                    "skipping variable that is not UTF-8"
                ),
            }
        }
        exports
    }

    /// Append a binding.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.push((name.into(), value.into()));
    }

    /// Value the child will observe for `name`, i.e. the last binding for it.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Bindings rendered as `name=value` strings.
    pub fn to_strings(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Exports {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Exports {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.vars
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl fmt::Display for Exports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_strings().join(" "))
    }
}
