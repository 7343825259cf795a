//! Streaming output unit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One incremental piece of generated text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment(String);

impl Fragment {
    /// Wrap a piece of text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Terminal fragment reporting a failure: `"\n[Error: <message>]"`.
    pub fn error(message: impl fmt::Display) -> Self {
        Self(format!("\n[Error: {message}]"))
    }

    /// Borrow the text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the text.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether this fragment carries an error report.
    pub fn is_error(&self) -> bool {
        self.0.starts_with("\n[Error: ")
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fragment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl From<Fragment> for String {
    fn from(fragment: Fragment) -> Self {
        fragment.0
    }
}
