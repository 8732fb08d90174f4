pub mod command;

pub use command::{CommandRunner, ShellRunner, Toolbox, Utilities};

use std::path::Path;

/// Single-quotes a path for interpolation into a `sh -c` command line.
pub fn shell_quote(path: &Path) -> String {
    quote_str(&path.to_string_lossy())
}

pub fn quote_str(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
