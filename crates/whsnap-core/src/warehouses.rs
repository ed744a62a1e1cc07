use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::channel::ChannelPolicy;
use crate::ConfigError;

/// A warehouse entry from `config/warehouses.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Catalog key used on the command line and as the output sub-directory.
    pub id: String,
    pub name: String,
    /// Two-letter state, sent as the search `userLocation`.
    pub state: String,
    /// Warehouse number understood by the enrichment API (e.g. `"388"`).
    pub number: String,
    /// Search `whloc` filter id (e.g. `"388-wh"`).
    pub warehouse_filter: String,
    /// Fulfillment location ids joined into the search `loc` parameter.
    pub location_ids: Vec<String>,
    pub notes: Option<String>,
}

impl WarehouseConfig {
    #[must_use]
    pub fn context(&self) -> WarehouseContext {
        WarehouseContext {
            warehouse_number: self.number.clone(),
            warehouse_filter: self.warehouse_filter.clone(),
            location_ids: self.location_ids.clone(),
            user_location: self.state.clone(),
        }
    }

    /// Case-insensitive name match, or substring match on the id.
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim();
        term.is_empty()
            || self.name.to_lowercase().contains(&term.to_lowercase())
            || self.id.contains(term)
    }
}

/// Per-run location parameters threaded into every request-issuing component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseContext {
    pub warehouse_number: String,
    pub warehouse_filter: String,
    pub location_ids: Vec<String>,
    pub user_location: String,
}

impl WarehouseContext {
    /// The composite `loc` query value.
    #[must_use]
    pub fn location_list(&self) -> String {
        self.location_ids.join(",")
    }
}

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub warehouses: Vec<WarehouseConfig>,
    #[serde(default)]
    pub channel_policy: ChannelPolicy,
}

impl CatalogFile {
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&WarehouseConfig> {
        self.warehouses.iter().find(|w| w.id == id)
    }

    pub fn search<'a>(&'a self, term: &'a str) -> impl Iterator<Item = &'a WarehouseConfig> + 'a {
        self.warehouses.iter().filter(move |w| w.matches(term))
    }
}

/// Load and validate the warehouse catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<CatalogFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_catalog(&content)
}

fn parse_catalog(content: &str) -> Result<CatalogFile, ConfigError> {
    let catalog: CatalogFile = serde_yaml::from_str(content)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

fn validate_catalog(catalog: &CatalogFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for warehouse in &catalog.warehouses {
        if warehouse.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "warehouse id must be non-empty".to_string(),
            ));
        }

        if warehouse.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "warehouse '{}' has an empty name",
                warehouse.id
            )));
        }

        if warehouse.number.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "warehouse '{}' has an empty number",
                warehouse.id
            )));
        }

        if warehouse.location_ids.is_empty() {
            return Err(ConfigError::Validation(format!(
                "warehouse '{}' must list at least one location id",
                warehouse.id
            )));
        }

        if !seen_ids.insert(warehouse.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate warehouse id: '{}'",
                warehouse.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "warehouses_test.rs"]
mod tests;
