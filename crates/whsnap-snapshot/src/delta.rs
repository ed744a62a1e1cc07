//! Added / removed / changed sets between two snapshots, keyed by `id`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use whsnap_core::SNAPSHOT_COLUMNS;

use crate::error::SnapshotError;
use crate::snapshot::{remove_if_exists, write_rows, SnapshotPaths, SnapshotRow};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    pub old: String,
    pub new: String,
}

/// An id present in both snapshots with at least one differing column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedRecord {
    pub id: String,
    /// Name from the current snapshot.
    pub name: String,
    /// Differing columns, in snapshot column order.
    pub diffs: Vec<(&'static str, FieldDiff)>,
}

impl ChangedRecord {
    /// `{column: {old, new}}` as a JSON object, columns in snapshot order.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] if encoding fails.
    pub fn diffs_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(&OrderedDiffs(&self.diffs))?)
    }
}

struct OrderedDiffs<'a>(&'a [(&'static str, FieldDiff)]);

impl Serialize for OrderedDiffs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, diff) in self.0 {
            map.serialize_entry(column, diff)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaSet {
    pub added: Vec<SnapshotRow>,
    pub removed: Vec<SnapshotRow>,
    pub changed: Vec<ChangedRecord>,
    /// No previous snapshot existed; all three sets are empty.
    pub first_run: bool,
}

impl DeltaSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Last row wins for a duplicated id.
fn by_id(rows: &[SnapshotRow]) -> BTreeMap<&str, &SnapshotRow> {
    rows.iter().map(|row| (row.id(), row)).collect()
}

/// Diffs `current` against `previous`. Every set is ordered by ascending
/// id. With no previous snapshot the result is empty and flagged as a
/// first run.
#[must_use]
pub fn compute_delta(current: &[SnapshotRow], previous: Option<&[SnapshotRow]>) -> DeltaSet {
    let Some(previous) = previous else {
        return DeltaSet {
            first_run: true,
            ..DeltaSet::default()
        };
    };

    let current = by_id(current);
    let previous = by_id(previous);
    let mut delta = DeltaSet::default();

    for (id, row) in &current {
        match previous.get(id) {
            None => delta.added.push((*row).clone()),
            Some(old) => {
                let diffs: Vec<(&'static str, FieldDiff)> = SNAPSHOT_COLUMNS
                    .iter()
                    .zip(old.values().iter().zip(row.values()))
                    .filter(|(_, (old, new))| old != new)
                    .map(|(column, (old, new))| {
                        (
                            *column,
                            FieldDiff {
                                old: old.clone(),
                                new: new.clone(),
                            },
                        )
                    })
                    .collect();
                if !diffs.is_empty() {
                    delta.changed.push(ChangedRecord {
                        id: (*id).to_owned(),
                        name: row.get("name").unwrap_or_default().to_owned(),
                        diffs,
                    });
                }
            }
        }
    }

    delta.removed = previous
        .iter()
        .filter(|(id, _)| !current.contains_key(*id))
        .map(|(_, row)| (*row).clone())
        .collect();

    delta
}

/// Writes each non-empty set to its table and deletes the table of every
/// empty set.
///
/// # Errors
///
/// Returns [`SnapshotError`] on any filesystem, CSV, or JSON failure.
pub fn write_delta(paths: &SnapshotPaths, delta: &DeltaSet) -> Result<(), SnapshotError> {
    if delta.first_run {
        tracing::info!(dir = %paths.dir.display(), "no previous snapshot; first run, delta is empty");
    }

    write_or_remove(&paths.added, &delta.added)?;
    write_or_remove(&paths.removed, &delta.removed)?;

    if delta.changed.is_empty() {
        remove_if_exists(&paths.changed)?;
    } else {
        write_changed(&paths.changed, &delta.changed)?;
    }

    tracing::info!(
        added = delta.added.len(),
        removed = delta.removed.len(),
        changed = delta.changed.len(),
        "wrote delta"
    );
    Ok(())
}

fn write_or_remove(path: &Path, rows: &[SnapshotRow]) -> Result<(), SnapshotError> {
    if rows.is_empty() {
        remove_if_exists(path)
    } else {
        write_rows(path, rows)
    }
}

fn write_changed(path: &Path, changed: &[ChangedRecord]) -> Result<(), SnapshotError> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp).map_err(|e| SnapshotError::csv(&tmp, e))?;
        writer
            .write_record(["id", "name", "diffs"])
            .map_err(|e| SnapshotError::csv(&tmp, e))?;
        for record in changed {
            let diffs = record.diffs_json()?;
            writer
                .write_record([record.id.as_str(), record.name.as_str(), diffs.as_str()])
                .map_err(|e| SnapshotError::csv(&tmp, e))?;
        }
        writer.flush().map_err(|e| SnapshotError::io(&tmp, e))?;
    }
    std::fs::rename(&tmp, path).map_err(|e| SnapshotError::io(path, e))
}

#[cfg(test)]
#[path = "delta_test.rs"]
mod tests;
