//! Catalog Validator and Department Directory
//!
//! Both are read-only collaborators of the reconciliation engine. The
//! in-memory implementations are fixed at startup and can be seeded from
//! JSON files named by configuration.

use crate::core::ConfigError;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Batched item-code existence check
pub trait CatalogValidator: Send + Sync {
    /// Codes not present in the catalog, de-duplicated, in input order
    fn missing(&self, codes: &[&str]) -> Vec<String>;
}

/// Department display name → department code
pub trait DepartmentDirectory: Send + Sync {
    fn resolve(&self, display_name: &str) -> Option<String>;
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    codes: HashSet<String>,
}

impl InMemoryCatalog {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Load from a JSON array of item codes
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let codes: Vec<String> = read_seed(path.as_ref())?;
        tracing::info!(count = codes.len(), path = %path.as_ref().display(), "Catalog seeded");
        Ok(Self::new(codes))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl CatalogValidator for InMemoryCatalog {
    fn missing(&self, codes: &[&str]) -> Vec<String> {
        let mut seen = HashSet::new();
        codes
            .iter()
            .filter(|code| !self.codes.contains(**code))
            .filter(|code| seen.insert(**code))
            .map(|code| code.to_string())
            .collect()
    }
}

// =============================================================================
// Departments
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryDepartments {
    by_name: HashMap<String, String>,
}

impl InMemoryDepartments {
    pub fn new<I, N, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        Self {
            by_name: entries
                .into_iter()
                .map(|(name, code)| (name.into(), code.into()))
                .collect(),
        }
    }

    /// Load from a JSON object of display name → department code
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let entries: HashMap<String, String> = read_seed(path.as_ref())?;
        tracing::info!(count = entries.len(), path = %path.as_ref().display(), "Departments seeded");
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl DepartmentDirectory for InMemoryDepartments {
    fn resolve(&self, display_name: &str) -> Option<String> {
        if let Some(code) = self.by_name.get(display_name) {
            return Some(code.clone());
        }
        let wanted = display_name.trim();
        self.by_name
            .iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(wanted))
            .map(|(_, code)| code.clone())
    }
}

fn read_seed<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SeedRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::SeedParse {
        path: path.to_path_buf(),
        source,
    })
}
