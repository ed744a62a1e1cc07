//! Current/previous snapshot files and the end-of-run publish sequence.

use std::io;
use std::path::{Path, PathBuf};

use whsnap_core::{NormalizedRecord, SNAPSHOT_COLUMNS};

use crate::delta::{compute_delta, write_delta};
use crate::error::SnapshotError;

/// Output files for one warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    pub dir: PathBuf,
    pub current: PathBuf,
    pub previous: PathBuf,
    pub added: PathBuf,
    pub removed: PathBuf,
    pub changed: PathBuf,
}

impl SnapshotPaths {
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            current: dir.join("catalog.csv"),
            previous: dir.join("catalog.prev.csv"),
            added: dir.join("added.csv"),
            removed: dir.join("removed.csv"),
            changed: dir.join("changed.csv"),
        }
    }
}

/// One snapshot row, values aligned with [`SNAPSHOT_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRow(Vec<String>);

impl SnapshotRow {
    /// Pads or truncates `values` to the snapshot width.
    #[must_use]
    pub fn new(mut values: Vec<String>) -> Self {
        values.resize(SNAPSHOT_COLUMNS.len(), String::new());
        Self(values)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.0[0]
    }

    /// Value of `column`, or `None` for an unknown column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        SNAPSHOT_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.0[i].as_str())
    }

    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl From<&NormalizedRecord> for SnapshotRow {
    fn from(record: &NormalizedRecord) -> Self {
        Self::new(record.to_row())
    }
}

/// Writes `rows` with the snapshot header, through a temp file renamed
/// into place.
///
/// # Errors
///
/// Returns [`SnapshotError`] if the file cannot be written or renamed.
pub fn write_rows(path: &Path, rows: &[SnapshotRow]) -> Result<(), SnapshotError> {
    let tmp = path.with_extension("csv.tmp");
    let result = write_csv(&tmp, rows)
        .and_then(|()| std::fs::rename(&tmp, path).map_err(|e| SnapshotError::io(path, e)));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn write_csv(path: &Path, rows: &[SnapshotRow]) -> Result<(), SnapshotError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| SnapshotError::csv(path, e))?;
    writer
        .write_record(SNAPSHOT_COLUMNS)
        .map_err(|e| SnapshotError::csv(path, e))?;
    for row in rows {
        writer
            .write_record(row.values())
            .map_err(|e| SnapshotError::csv(path, e))?;
    }
    writer.flush().map_err(|e| SnapshotError::io(path, e))
}

/// Rotates the current snapshot to `previous` (replacing it), then writes
/// `records` as the new current snapshot.
///
/// # Errors
///
/// Returns [`SnapshotError`] on any filesystem or CSV failure.
pub fn write_snapshot(
    paths: &SnapshotPaths,
    records: &[NormalizedRecord],
) -> Result<PathBuf, SnapshotError> {
    std::fs::create_dir_all(&paths.dir).map_err(|e| SnapshotError::io(&paths.dir, e))?;

    if paths.current.exists() {
        remove_if_exists(&paths.previous)?;
        std::fs::rename(&paths.current, &paths.previous)
            .map_err(|e| SnapshotError::io(&paths.current, e))?;
        tracing::debug!(path = %paths.previous.display(), "rotated previous snapshot");
    }

    let rows: Vec<SnapshotRow> = records.iter().map(SnapshotRow::from).collect();
    write_rows(&paths.current, &rows)?;
    tracing::info!(path = %paths.current.display(), rows = rows.len(), "wrote snapshot");
    Ok(paths.current.clone())
}

/// Reads a snapshot, mapping columns by header name. Columns absent from
/// the file read as empty; unknown columns are ignored. `Ok(None)` when
/// the file does not exist.
///
/// # Errors
///
/// Returns [`SnapshotError::Csv`] if the file is not readable CSV.
pub fn read_snapshot(path: &Path) -> Result<Option<Vec<SnapshotRow>>, SnapshotError> {
    let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(path) {
        Ok(reader) => reader,
        Err(e) => {
            if let csv::ErrorKind::Io(io_err) = e.kind() {
                if io_err.kind() == io::ErrorKind::NotFound {
                    return Ok(None);
                }
            }
            return Err(SnapshotError::csv(path, e));
        }
    };

    let headers = reader
        .headers()
        .map_err(|e| SnapshotError::csv(path, e))?
        .clone();
    let positions: Vec<Option<usize>> = SNAPSHOT_COLUMNS
        .iter()
        .map(|column| headers.iter().position(|h| h.trim() == *column))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SnapshotError::csv(path, e))?;
        let values = positions
            .iter()
            .map(|pos| {
                pos.and_then(|i| record.get(i))
                    .unwrap_or_default()
                    .to_owned()
            })
            .collect();
        rows.push(SnapshotRow::new(values));
    }
    Ok(Some(rows))
}

pub(crate) fn remove_if_exists(path: &Path) -> Result<(), SnapshotError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SnapshotError::io(path, e)),
    }
}

/// Outcome of [`publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub current: PathBuf,
    pub records: usize,
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
    pub first_run: bool,
}

/// Rotate, write the new current snapshot, then diff against the rotated
/// previous and write the three delta tables. In that order.
///
/// # Errors
///
/// Returns [`SnapshotError`] on any filesystem or CSV failure. A failure
/// after the current snapshot is written leaves it in place; rerunning
/// recomputes the delta.
pub fn publish(
    paths: &SnapshotPaths,
    records: &[NormalizedRecord],
) -> Result<RunSummary, SnapshotError> {
    let current = write_snapshot(paths, records)?;
    let current_rows: Vec<SnapshotRow> = records.iter().map(SnapshotRow::from).collect();
    let previous_rows = read_snapshot(&paths.previous)?;

    let delta = compute_delta(&current_rows, previous_rows.as_deref());
    write_delta(paths, &delta)?;

    Ok(RunSummary {
        current,
        records: records.len(),
        added: delta.added.len(),
        removed: delta.removed.len(),
        changed: delta.changed.len(),
        first_run: delta.first_run,
    })
}
