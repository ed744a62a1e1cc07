//! `whsnap warehouses`: list the catalog file.

use anyhow::Context;
use whsnap_core::{load_catalog, AppConfig, CatalogFile};

pub(crate) fn list(config: &AppConfig, search: Option<&str>) -> anyhow::Result<()> {
    let catalog = load_catalog(&config.warehouses_path).with_context(|| {
        format!(
            "failed to load warehouse catalog {}",
            config.warehouses_path.display()
        )
    })?;

    let lines = render(&catalog, search.unwrap_or_default());
    if lines.is_empty() {
        println!("no warehouses match");
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// One line per matching warehouse: `id  name, state (#number)`.
pub(crate) fn render(catalog: &CatalogFile, term: &str) -> Vec<String> {
    catalog
        .search(term)
        .map(|w| format!("{:<6} {}, {} (#{})", w.id, w.name, w.state, w.number))
        .collect()
}
