//! Record storage for flamlog.
//!
//! The whole table lives in memory and is mirrored to a single delimited
//! file. Every append rewrites that file in full.

pub mod csv;

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::record::{Record, COLUMNS, COLUMN_COUNT};

/// Suffix of the sibling file used for atomic rewrites.
const TMP_SUFFIX: &str = "tmp";

/// Suffix given to a backing file that failed to load.
const CORRUPT_SUFFIX: &str = "corrupt";

/// A record paired with its position in the full table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Zero-based position in the table.
    pub index: usize,
    /// The matching record.
    pub record: Record,
}

/// In-memory table of records backed by a delimited file.
///
/// Reads share a lock; [`RecordStore::append`] holds the write lock across
/// both the in-memory push and the file rewrite, so concurrent appends are
/// serialised and each rewrite sees every earlier append.
#[derive(Debug)]
pub struct RecordStore {
    /// Path to the backing file.
    path: PathBuf,
    /// The table, in insertion order.
    records: RwLock<Vec<Record>>,
}

impl RecordStore {
    /// Load the store from `path`.
    ///
    /// A missing file yields an empty table; the file is created on the first
    /// append.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let records = if path.exists() {
            debug!("Loading records from {}", path.display());
            let bytes = fs::read(&path).map_err(|e| Error::load(&path, e.to_string()))?;
            read_records(&path, &bytes)?
        } else {
            info!(
                "No data file at {}, starting with an empty table",
                path.display()
            );
            Vec::new()
        };

        info!("Loaded {} records from {}", records.len(), path.display());
        Ok(Self::with_records(path, records))
    }

    /// Load the store from `path`, falling back to an empty table if the file
    /// is unreadable or malformed.
    ///
    /// A file that fails to load is renamed to `<name>.corrupt` first, so the
    /// next append cannot overwrite it.
    #[must_use]
    pub fn open_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(store) => store,
            Err(e) => {
                error!("{e}; continuing with an empty table");
                let aside = sibling_path(path, CORRUPT_SUFFIX);
                match fs::rename(path, &aside) {
                    Ok(()) => warn!("Moved unreadable data file to {}", aside.display()),
                    Err(e) => error!("Could not move {} aside: {e}", path.display()),
                }
                Self::with_records(path.to_path_buf(), Vec::new())
            }
        }
    }

    fn with_records(path: PathBuf, records: Vec<Record>) -> Self {
        Self {
            path,
            records: RwLock::new(records),
        }
    }

    /// Get the path to the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The fixed column names.
    #[must_use]
    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    /// Number of records in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// A copy of every record, in table order.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.read().clone()
    }

    /// Records with any field containing `query`, ignoring case, in table
    /// order. An empty query matches every record.
    #[must_use]
    pub fn filter(&self, query: &str) -> Vec<Match> {
        let needle = query.to_lowercase();
        let matches: Vec<Match> = self
            .read()
            .iter()
            .enumerate()
            .filter(|(_, record)| record.matches_lowercase(&needle))
            .map(|(index, record)| Match {
                index,
                record: record.clone(),
            })
            .collect();
        debug!("Query {:?} matched {} records", query, matches.len());
        matches
    }

    /// Append a record and rewrite the backing file.
    ///
    /// The record is checked for encodability first; if that fails nothing
    /// changes. If the rewrite itself fails the record stays in memory, so
    /// the table and the file differ until the next successful append.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unencodable`] if a field cannot be stored, or
    /// [`Error::Write`] if the file could not be rewritten.
    pub fn append(&self, record: Record) -> Result<()> {
        if let Some((column, _)) = record.columns().find(|(_, v)| !csv::is_latin1(v)) {
            return Err(Error::unencodable(column));
        }

        let mut records = self.write();
        records.push(record);
        let count = records.len();

        if let Err(e) = self.persist(&records) {
            warn!(
                "Table holds {} records but {} was not updated",
                count,
                self.path.display()
            );
            return Err(e);
        }

        info!("Appended record {} to {}", count, self.path.display());
        Ok(())
    }

    /// Rewrite the backing file from `records`.
    ///
    /// The table is written to a sibling `.tmp` file, synced, then renamed
    /// over the target. On any failure the `.tmp` file is removed and the
    /// target is left untouched.
    fn persist(&self, records: &[Record]) -> Result<()> {
        let bytes = write_records(records).ok_or_else(|| {
            // append() screens every record, so only a hand-built table gets here
            Error::Write {
                path: self.path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "record not representable in ISO-8859-1",
                ),
            }
        })?;

        let write_err = |source: std::io::Error| Error::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let tmp_path = sibling_path(&self.path, TMP_SUFFIX);
        let result =
            write_synced(&tmp_path, &bytes).and_then(|()| fs::rename(&tmp_path, &self.path));
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(write_err(e));
        }

        debug!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Record>> {
        // Records are pushed whole, so a poisoned lock still guards a valid table.
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Record>> {
        self.records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// `<path>.<suffix>`, next to `path`.
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut f: File = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    f.write_all(bytes)?;
    f.sync_all()
}

/// Parse the backing file's bytes into records.
///
/// Columns are matched by header name, so their order in the file does not
/// matter. Extra columns are dropped. Rows shorter than the header are padded
/// with empty fields, as spreadsheet exports often omit trailing empty cells;
/// longer rows are an error.
fn read_records(path: &Path, bytes: &[u8]) -> Result<Vec<Record>> {
    let text = csv::decode_latin1(bytes);
    let rows = csv::parse(&text).map_err(|e| Error::load(path, e.to_string()))?;
    let mut rows = rows.into_iter();

    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };

    let mut positions = [0usize; COLUMN_COUNT];
    for (slot, column) in positions.iter_mut().zip(COLUMNS) {
        *slot = header
            .fields
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| Error::load(path, format!("header is missing column '{column}'")))?;
    }

    let extra: Vec<&str> = header
        .fields
        .iter()
        .map(String::as_str)
        .filter(|h| !COLUMNS.contains(&h.trim()))
        .collect();
    if !extra.is_empty() {
        warn!(
            "Ignoring unknown columns in {}: {}",
            path.display(),
            extra.join(", ")
        );
    }

    let width = header.fields.len();
    rows.map(|mut row| {
        if row.fields.len() > width {
            return Err(Error::load(
                path,
                format!(
                    "line {}: expected at most {} fields, found {}",
                    row.line,
                    width,
                    row.fields.len()
                ),
            ));
        }
        row.fields.resize(width, String::new());
        let mut column = 0;
        Record::from_lookup(|_| {
            let value = std::mem::take(&mut row.fields[positions[column]]);
            column += 1;
            Some(value)
        })
    })
    .collect()
}

/// Serialise records with a header row, or `None` if any field falls outside
/// ISO-8859-1.
fn write_records(records: &[Record]) -> Option<Vec<u8>> {
    let mut out = String::new();
    csv::write_row(&mut out, COLUMNS);
    for record in records {
        csv::write_row(&mut out, record.fields());
    }
    csv::encode_latin1(&out)
}
