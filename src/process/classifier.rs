//! Process role classification for multi-process browsers.
//!
//! Browsers launch every helper process with a `--type=<role>` switch; the
//! main process carries none. [`classify`] maps launch arguments onto a
//! closed set of roles and is the only classification routine in the crate.

use serde::{Serialize, Serializer};
use std::fmt;

const TYPE_FLAG: &str = "--type=";
const EXTENSION_FLAG: &str = "--extension-process";

/// Function of a process within its browser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Browser,
    Renderer,
    Extension,
    Gpu,
    Utility,
    Crashpad,
    /// Any other `--type=` value, capitalized.
    Other(String),
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Browser => f.write_str("Browser"),
            Role::Renderer => f.write_str("Renderer"),
            Role::Extension => f.write_str("Extension"),
            Role::Gpu => f.write_str("GPU"),
            Role::Utility => f.write_str("Utility"),
            Role::Crashpad => f.write_str("Crashpad"),
            Role::Other(tag) => f.write_str(tag),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Values of every `--type=` switch, in argument order.
pub fn role_flags<S: AsRef<str>>(args: &[S]) -> impl Iterator<Item = &str> {
    args.iter().filter_map(|a| a.as_ref().strip_prefix(TYPE_FLAG))
}

/// Classifies a process from its command-line arguments.
///
/// Known roles win in a fixed order (renderer, gpu, utility, crashpad) no
/// matter where their switch appears. Otherwise the first `--type=` value,
/// cut at any further `=`, names the role.
pub fn classify<S: AsRef<str>>(args: &[S]) -> Role {
    let has = |role: &str| role_flags(args).any(|v| v == role);

    if has("renderer") {
        if args.iter().any(|a| a.as_ref() == EXTENSION_FLAG) {
            Role::Extension
        } else {
            Role::Renderer
        }
    } else if has("gpu-process") {
        Role::Gpu
    } else if has("utility") {
        Role::Utility
    } else if has("crashpad-handler") {
        Role::Crashpad
    } else {
        match role_flags(args).next().and_then(|v| v.split('=').next()) {
            Some(tag) if !tag.is_empty() => Role::Other(capitalize(tag)),
            _ => Role::Browser,
        }
    }
}

/// Upper-cases the first character and lower-cases the rest.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
