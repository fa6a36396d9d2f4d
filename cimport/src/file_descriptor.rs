//! Local file inspection
//!
//! Resolves a path into the name, size and MIME type declared to the contact
//! service when the upload is registered.

use crate::error::{ImportError, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Accepted upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MimeType {
    /// Office Open XML workbook (`.xlsx`)
    #[serde(rename = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")]
    SpreadsheetMl,
    /// Comma-separated values (`.csv`)
    #[serde(rename = "text/csv")]
    Csv,
}

impl MimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::SpreadsheetMl => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            MimeType::Csv => "text/csv",
        }
    }

    /// Map a file extension (without the dot) to its MIME type
    ///
    /// Matching is exact: `XLSX` and `Csv` are not accepted.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "xlsx" => Some(MimeType::SpreadsheetMl),
            "csv" => Some(MimeType::Csv),
            _ => None,
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File metadata captured once before the upload is registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    path: PathBuf,
    name: String,
    size_bytes: u64,
    mime_type: MimeType,
}

impl FileDescriptor {
    /// Inspect `path` and build its descriptor
    ///
    /// The file must exist and be openable; its extension must be `.xlsx`
    /// or `.csv`. The size is taken now and not re-checked later.
    pub async fn resolve(path: &Path) -> Result<Self> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|_| ImportError::FileNotFound(path.to_path_buf()))?;
        let metadata = file
            .metadata()
            .await
            .map_err(|_| ImportError::FileNotFound(path.to_path_buf()))?;
        if !metadata.is_file() {
            return Err(ImportError::FileNotFound(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ImportError::FileNotFound(path.to_path_buf()))?;

        let mime_type = match extension_of(&name) {
            Some(ext) => MimeType::from_extension(ext)
                .ok_or_else(|| ImportError::UnsupportedFileType(format!(".{}", ext)))?,
            None => {
                return Err(ImportError::UnsupportedFileType("no extension".to_string()));
            }
        };

        tracing::debug!(
            file = %name,
            size_bytes = metadata.len(),
            mime_type = %mime_type,
            "Resolved file descriptor"
        );

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size_bytes: metadata.len(),
            mime_type,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without directories
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn mime_type(&self) -> MimeType {
        self.mime_type
    }
}

/// Text after the last `.` of a file name
///
/// Unlike `Path::extension`, a leading dot counts, so `.csv` has the
/// extension `csv`. A trailing dot means no extension.
fn extension_of(name: &str) -> Option<&str> {
    name.rfind('.')
        .map(|dot| &name[dot + 1..])
        .filter(|ext| !ext.is_empty())
}
