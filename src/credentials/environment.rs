// file: src/credentials/environment.rs
// description: one-time snapshot of the process environment layered with a .env file
// reference: https://docs.rs/dotenvy

use crate::error::{AgentError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which side wins when a variable is set both in the shell and in `.env`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DotenvPrecedence {
    /// Values already exported in the shell are kept.
    #[default]
    Shell,
    /// Values from `.env` replace shell values.
    File,
}

/// Immutable view of the environment taken at start-up.
///
/// Every component reads variables through this snapshot, never through
/// `std::env`, so all call sites agree on a single resolution.
#[derive(Debug, Clone, Default)]
pub struct ProcessEnv {
    vars: HashMap<String, String>,
    dotenv_path: Option<PathBuf>,
}

impl ProcessEnv {
    pub fn capture(dotenv_path: Option<&Path>, precedence: DotenvPrecedence) -> Result<Self> {
        let env = Self::from_vars(std::env::vars());
        match dotenv_path {
            Some(path) => env.layer_dotenv(path, precedence),
            None => Ok(env),
        }
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            dotenv_path: None,
        }
    }

    /// Layers the entries of `path` onto the snapshot. A missing file is skipped.
    pub fn layer_dotenv(mut self, path: &Path, precedence: DotenvPrecedence) -> Result<Self> {
        let entries = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(e) if e.not_found() => {
                debug!("No .env file at {}", path.display());
                return Ok(self);
            }
            Err(e) => {
                return Err(AgentError::Config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let mut applied = 0usize;
        for entry in entries {
            let (key, value) = entry.map_err(|e| {
                AgentError::Config(format!("Invalid entry in {}: {}", path.display(), e))
            })?;

            let shell_has_value = self
                .vars
                .get(&key)
                .is_some_and(|existing| !existing.trim().is_empty());

            if precedence == DotenvPrecedence::File || !shell_has_value {
                self.vars.insert(key, value);
                applied += 1;
            } else {
                debug!("Keeping shell value for {} over {}", key, path.display());
            }
        }

        debug!("Applied {} variables from {}", applied, path.display());
        self.dotenv_path = Some(path.to_path_buf());
        Ok(self)
    }

    /// Returns the trimmed value, treating blank values as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn dotenv_path(&self) -> Option<&Path> {
        self.dotenv_path.as_deref()
    }

    /// Variables as a map, for handing to the layered config builder.
    pub fn to_map(&self) -> HashMap<String, String> {
        self.vars.clone()
    }
}
