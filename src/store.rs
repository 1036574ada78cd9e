//! The tabular store collaborator: a 2-D grid of cells behind a small
//! load/iterate/append/update/delete/persist contract.
//!
//! The validation core never touches files directly; it talks to a
//! [`TabularStore`]. [`CsvStore`] is the file-backed implementation (the
//! whole file is held in memory and flushed on [`TabularStore::persist`]);
//! [`MemoryStore`] backs tests and scratch sessions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, ensure};
use csv::{ReaderBuilder, WriterBuilder};

use crate::value::{CellValue, display_row};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Rows scanned when looking for the header row.
const HEADER_SCAN_ROWS: usize = 5;

/// Store row indices are 1-based positions among the data rows (the rows
/// after the header row), matching how the UI mirror addresses them.
pub trait TabularStore {
    /// Column names from the header row; blank cells fall back to
    /// `"Column {n}"`.
    fn load_headers(&self) -> Result<Vec<String>>;

    /// All data rows, in order. Rows that are entirely empty are skipped at
    /// load time, so every returned row is addressable.
    fn data_rows(&self) -> Result<Vec<Vec<String>>>;

    fn append_row(&mut self, values: &[Option<CellValue>]) -> Result<()>;

    fn update_row(&mut self, index: usize, values: &[Option<CellValue>]) -> Result<()>;

    /// Removes the row at `index`; later rows shift down by one.
    fn delete_row(&mut self, index: usize) -> Result<()>;

    /// Raw values of one column (1-based position) across all data rows.
    fn column_values(&self, position: usize) -> Result<Vec<String>>;

    /// Flushes to durable storage. In-memory state is unaffected by failure
    /// so the caller can retry.
    fn persist(&mut self) -> Result<()>;
}

pub fn resolve_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

fn fallback_header_names(raw: &[String]) -> Vec<String> {
    raw.iter()
        .enumerate()
        .map(|(idx, name)| {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                format!("Column {}", idx + 1)
            } else {
                trimmed.to_string()
            }
        })
        .collect()
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

fn check_row_index(index: usize, len: usize) -> Result<usize> {
    ensure!(
        index >= 1 && index <= len,
        "Row index {index} out of range (store holds {len} data row(s))"
    );
    Ok(index - 1)
}

/// In-memory grid store. Doubles as the test stand-in for a spreadsheet and
/// as the working set behind [`CsvStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl MemoryStore {
    pub fn new<S: Into<String>>(headers: Vec<S>, rows: Vec<Vec<S>>) -> Self {
        let headers = fallback_header_names(
            &headers.into_iter().map(Into::into).collect::<Vec<String>>(),
        );
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect::<Vec<String>>())
            .filter(|row| !is_blank_row(row))
            .collect();
        MemoryStore { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl TabularStore for MemoryStore {
    fn load_headers(&self) -> Result<Vec<String>> {
        Ok(self.headers.clone())
    }

    fn data_rows(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.rows.clone())
    }

    fn append_row(&mut self, values: &[Option<CellValue>]) -> Result<()> {
        self.rows.push(display_row(values));
        Ok(())
    }

    fn update_row(&mut self, index: usize, values: &[Option<CellValue>]) -> Result<()> {
        let idx = check_row_index(index, self.rows.len())?;
        self.rows[idx] = display_row(values);
        Ok(())
    }

    fn delete_row(&mut self, index: usize) -> Result<()> {
        let idx = check_row_index(index, self.rows.len())?;
        self.rows.remove(idx);
        Ok(())
    }

    fn column_values(&self, position: usize) -> Result<Vec<String>> {
        ensure!(position >= 1, "Column position must be 1-based");
        Ok(self
            .rows
            .iter()
            .filter_map(|row| row.get(position - 1))
            .cloned()
            .collect())
    }

    fn persist(&mut self) -> Result<()> {
        Ok(())
    }
}

/// CSV-file-backed store. The file is read fully at open time; mutations run
/// against the in-memory grid and reach disk only on `persist`.
#[derive(Debug)]
pub struct CsvStore {
    path: PathBuf,
    delimiter: u8,
    grid: MemoryStore,
}

impl CsvStore {
    pub fn open(path: &Path, delimiter: Option<u8>) -> Result<Self> {
        let delimiter = resolve_delimiter(path, delimiter);
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Opening {path:?}"))?;

        let mut physical_rows: Vec<Vec<String>> = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Reading row {} in {path:?}", idx + 1))?;
            physical_rows.push(record.iter().map(str::to_string).collect());
        }

        // First non-empty row within the first few physical rows is the
        // header row; everything after it is data.
        let header_idx = physical_rows
            .iter()
            .take(HEADER_SCAN_ROWS)
            .position(|row| !is_blank_row(row))
            .ok_or_else(|| anyhow!("No header row found in the first {HEADER_SCAN_ROWS} row(s) of {path:?}"))?;

        let headers = fallback_header_names(&physical_rows[header_idx]);
        let width = headers.len();
        let rows = physical_rows
            .into_iter()
            .skip(header_idx + 1)
            .filter(|row| !is_blank_row(row))
            .map(|mut row| {
                // Pad short rows so every cell is positionally addressable.
                row.resize(width.max(row.len()), String::new());
                row
            })
            .collect();

        Ok(CsvStore {
            path: path.to_path_buf(),
            delimiter,
            grid: MemoryStore { headers, rows },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn row_count(&self) -> usize {
        self.grid.row_count()
    }
}

impl TabularStore for CsvStore {
    fn load_headers(&self) -> Result<Vec<String>> {
        self.grid.load_headers()
    }

    fn data_rows(&self) -> Result<Vec<Vec<String>>> {
        self.grid.data_rows()
    }

    fn append_row(&mut self, values: &[Option<CellValue>]) -> Result<()> {
        self.grid.append_row(values)
    }

    fn update_row(&mut self, index: usize, values: &[Option<CellValue>]) -> Result<()> {
        self.grid.update_row(index, values)
    }

    fn delete_row(&mut self, index: usize) -> Result<()> {
        self.grid.delete_row(index)
    }

    fn column_values(&self, position: usize) -> Result<Vec<String>> {
        self.grid.column_values(position)
    }

    fn persist(&mut self) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_path(&self.path)
            .with_context(|| format!("Writing {:?}", self.path))?;
        writer
            .write_record(&self.grid.headers)
            .context("Writing header row")?;
        for (idx, row) in self.grid.rows.iter().enumerate() {
            writer
                .write_record(row)
                .with_context(|| format!("Writing data row {}", idx + 1))?;
        }
        writer.flush().context("Flushing CSV output")?;
        Ok(())
    }
}
