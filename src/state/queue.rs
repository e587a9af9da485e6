//! Ordered queue of input images in one folder
//!
//! Files are listed once, sorted lexicographically, and consumed through a
//! cursor that only moves forward.
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Result;

/// Image extensions picked up from the input folder
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["tif", "tiff", "png", "jpg"];

/// Filenames of one folder with a monotonic cursor
#[derive(Debug, Clone)]
pub struct FileQueue {
    folder: PathBuf,
    files: Vec<String>,
    cursor: usize,
}

impl FileQueue {
    /// List the images directly inside `folder` (no recursion)
    ///
    /// Extensions are matched case-insensitively against `extensions`.
    pub fn scan<S: AsRef<str>>(folder: &Path, extensions: &[S]) -> Result<Self> {
        let mut files = Vec::new();
        for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(extension) = path.extension() else {
                continue;
            };
            let ext = extension.to_string_lossy().to_lowercase();
            if !extensions.iter().any(|e| e.as_ref().eq_ignore_ascii_case(&ext)) {
                continue;
            }

            files.push(entry.file_name().to_string_lossy().to_string());
        }
        files.sort();

        debug!("🔍 Found {} images in {}", files.len(), folder.display());
        Ok(Self::from_names(folder, files))
    }

    /// Queue over an explicit, already ordered list
    pub fn from_names(folder: &Path, files: Vec<String>) -> Self {
        Self {
            folder: folder.to_path_buf(),
            files,
            cursor: 0,
        }
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Index of the active file
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Active filename, `None` once exhausted
    pub fn current(&self) -> Option<&str> {
        self.files.get(self.cursor).map(String::as_str)
    }

    /// Full path of the active file
    pub fn current_path(&self) -> Option<PathBuf> {
        self.current().map(|name| self.folder.join(name))
    }

    /// Move to the next file; files are never revisited
    pub fn advance(&mut self) -> Option<&str> {
        if self.cursor < self.files.len() {
            self.cursor += 1;
        }
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.tif", "a.TIF", "c.png", "notes.txt", "innervation_results.txt", "d.jpeg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("sub.tif")).unwrap();
        fs::write(dir.path().join("sub.tif").join("e.tif"), b"x").unwrap();

        let queue = FileQueue::scan(dir.path(), &DEFAULT_EXTENSIONS).unwrap();
        assert_eq!(queue.files(), &["a.TIF", "b.tif", "c.png"]);
    }

    #[test]
    fn test_cursor_only_moves_forward() {
        let mut queue = FileQueue::from_names(Path::new("/data"), vec!["a.tif".into(), "b.tif".into()]);
        assert_eq!(queue.current(), Some("a.tif"));
        assert_eq!(queue.current_path(), Some(PathBuf::from("/data/a.tif")));
        assert_eq!(queue.advance(), Some("b.tif"));
        assert_eq!(queue.advance(), None);
        assert_eq!(queue.current_path(), None);
        assert_eq!(queue.advance(), None);
        assert_eq!(queue.cursor(), 2);
    }

    #[test]
    fn test_scan_missing_folder_fails() {
        assert!(FileQueue::scan(Path::new("/nonexistent/folder"), &DEFAULT_EXTENSIONS).is_err());
    }
}
