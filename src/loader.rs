//! This module provides the `MachineLoader` struct, responsible for loading machine definitions
//! and catalogs from JSON files and strings.

use crate::catalog::Catalog;
use crate::definition::MachineDefinition;
use crate::types::LoadError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `MachineLoader` is a utility struct for loading machine definitions.
/// It provides methods to load a definition from a file or a string, to load a whole catalog,
/// and to discover and load all `.json` definitions within a directory.
pub struct MachineLoader;

impl MachineLoader {
    /// Loads a single machine definition from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(MachineDefinition)` if the file is read and the definition validates.
    /// * `Err(LoadError::File)` if the file cannot be read.
    /// * `Err(LoadError::Definition)` if the content is malformed or violates an invariant.
    pub fn load_definition(path: &Path) -> Result<MachineDefinition, LoadError> {
        let content = read(path)?;
        debug!(path = %path.display(), "loading machine definition");
        Self::load_definition_from_string(&content)
    }

    /// Loads a single machine definition from JSON content, e.g. pasted or piped in by a user.
    pub fn load_definition_from_string(content: &str) -> Result<MachineDefinition, LoadError> {
        Ok(MachineDefinition::from_json(content)?)
    }

    /// Loads a catalog document (machine key -> entry) from the specified file path.
    pub fn load_catalog(path: &Path) -> Result<Catalog, LoadError> {
        let content = read(path)?;
        debug!(path = %path.display(), "loading catalog");
        Ok(Catalog::from_json(&content)?)
    }

    /// Loads every `.json` machine definition in `directory`.
    ///
    /// Subdirectories and files with other extensions are skipped. Each file yields its own
    /// result, so one broken definition does not hide the others.
    pub fn load_definitions(
        directory: &Path,
    ) -> Vec<Result<(PathBuf, MachineDefinition), LoadError>> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(LoadError::File {
                    path: directory.to_path_buf(),
                    message: e.to_string(),
                })]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(LoadError::File {
                            path: directory.to_path_buf(),
                            message: e.to_string(),
                        }))
                    }
                };

                let path = entry.path();
                if path.is_dir() || path.extension().is_none_or(|ext| ext != "json") {
                    return None;
                }

                match Self::load_definition(&path) {
                    Ok(definition) => Some(Ok((path, definition))),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping machine definition");
                        Some(Err(e))
                    }
                }
            })
            .collect();

        // read_dir order is platform dependent.
        results.sort_by_key(|result| match result {
            Ok((path, _)) => Some(path.clone()),
            Err(_) => None,
        });
        results
    }
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|e| LoadError::File {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
