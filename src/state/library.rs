use log::{debug, info};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::data::MeasurementResult;
use crate::error::Result;

/// Default name of the result log inside the input folder
pub const RESULTS_FILE_NAME: &str = "innervation_results.txt";

/// Width the filename column is padded to
const FILENAME_WIDTH: usize = 30;

/// The ResultLog owns the append-only measurement file of one folder.
///
/// The file is opened, appended and closed for every row, so a crash can
/// lose at most the row being written. Existing rows are never rewritten.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    /// Open the log at `path`, writing the header only if the file is new
    pub fn open(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            fs::write(&path, header())?;
            info!("📁 Created result log at: {}", path.display());
        } else {
            debug!("📁 Appending to existing result log: {}", path.display());
        }
        Ok(Self { path })
    }

    /// Open `file_name` inside `folder`
    pub fn open_in(folder: &Path, file_name: &str) -> Result<Self> {
        Self::open(folder.join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row and close the file again
    pub fn append(&self, result: &MeasurementResult) -> Result<()> {
        let mut file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        file.write_all(format_row(result).as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Read back every data row
    ///
    /// A line is a data row when its last whitespace-delimited token is a
    /// number; the header and the rule line are skipped.
    pub fn read_rows(&self) -> Result<Vec<MeasurementResult>> {
        let content = fs::read_to_string(&self.path)?;
        Ok(content.lines().filter_map(parse_row).collect())
    }
}

/// `Filename` column header, a tab, `Index`, then a 40-dash rule
pub fn header() -> String {
    format!("{:<width$}\tIndex\n{}\n", "Filename", "-".repeat(40), width = FILENAME_WIDTH)
}

/// `<filename padded to 30>\t<index with 6 decimals>\n`
pub fn format_row(result: &MeasurementResult) -> String {
    format!(
        "{:<width$}\t{:.6}\n",
        result.filename,
        result.index,
        width = FILENAME_WIDTH
    )
}

fn parse_row(line: &str) -> Option<MeasurementResult> {
    let index = line.split_whitespace().last()?.parse::<f64>().ok()?;
    let (name, _) = line.rsplit_once('\t')?;
    Some(MeasurementResult::new(name.trim_end(), index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultLog::open_in(dir.path(), RESULTS_FILE_NAME).unwrap();
        log.append(&MeasurementResult::new("a.tif", 12.5)).unwrap();

        // Reopening must not rewrite the header or drop rows
        let log = ResultLog::open_in(dir.path(), RESULTS_FILE_NAME).unwrap();
        log.append(&MeasurementResult::new("b.tif", 0.0)).unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.matches("Filename").count(), 1);
        assert_eq!(content.lines().count(), 4);
        assert_eq!(
            log.read_rows().unwrap(),
            vec![MeasurementResult::new("a.tif", 12.5), MeasurementResult::new("b.tif", 0.0)]
        );
    }

    #[test]
    fn test_row_format() {
        let row = format_row(&MeasurementResult::new("a.tif", 100.0 / 3.0));
        assert_eq!(row, format!("a.tif{}\t33.333333\n", " ".repeat(25)));
        assert_eq!(row.split_whitespace().last(), Some("33.333333"));
    }

    #[test]
    fn test_header_format() {
        let h = header();
        let mut lines = h.lines();
        let expected = format!("Filename{}\tIndex", " ".repeat(22));
        assert_eq!(lines.next(), Some(expected.as_str()));
        assert_eq!(lines.next(), Some("-".repeat(40).as_str()));
    }

    #[test]
    fn test_long_filenames_are_not_truncated() {
        let name = "a".repeat(40) + ".tif";
        let row = format_row(&MeasurementResult::new(name.clone(), 1.0));
        assert!(row.starts_with(&name));
        assert_eq!(parse_row(row.trim_end()), Some(MeasurementResult::new(name, 1.0)));
    }
}
