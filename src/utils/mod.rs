//! Common utilities and helpers

use std::path::{Path, PathBuf};

use crate::domain::errors::DomainError;

pub mod path;
pub mod time;

/// Locate an external tool: an explicit path wins, otherwise search PATH
pub fn locate_tool(explicit: Option<&Path>, name: &str) -> Result<PathBuf, DomainError> {
    match explicit {
        Some(path) => {
            if path.is_file() {
                Ok(path.to_path_buf())
            } else {
                which::which(path).map_err(|_| {
                    DomainError::Config(format!("{} not found at {}", name, path.display()))
                })
            }
        }
        None => which::which(name)
            .map_err(|_| DomainError::Config(format!("{} not found on PATH", name))),
    }
}

/// Whether a tool can be found on PATH
pub fn tool_available(name: &str) -> bool {
    which::which(name).is_ok()
}
