//! Recognized package options.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

/// The option surface of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Link dependencies dynamically and build shared libraries.
    pub shared: bool,

    /// Build the wrapped project's test executables.
    pub testing: bool,

    /// Run the package merge step.
    pub merge_package: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            shared: true,
            testing: false,
            merge_package: false,
        }
    }
}

impl Options {
    /// Apply a `key=value` override such as `shared=False`.
    pub fn apply_override(&mut self, spec: &str) -> Result<()> {
        let (key, value) = spec
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid option `{}`; expected `key=value`", spec))?;
        let value = parse_bool(value.trim())
            .ok_or_else(|| anyhow!("invalid value for option `{}`: `{}`", key.trim(), value))?;

        match key.trim() {
            "shared" => self.shared = value,
            "testing" => self.testing = value,
            "merge_package" => self.merge_package = value,
            other => bail!(
                "unknown option `{}`; expected one of: shared, testing, merge_package",
                other
            ),
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// CMake spelling of a boolean.
pub fn on_off(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}
