use crate::core::import_export::{ImportExportService, ImportSummary, RecordKind};
use crate::utils::error::{CcrmError, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::ZipArchive;

const BACKUP_PREFIX: &str = "backup_";
const BACKUP_EXTENSION: &str = ".zip";
const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Written into every archive next to the CSV files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupManifest {
    pub created_at: String,
    pub app_version: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub students: ImportSummary,
    pub courses: ImportSummary,
    pub enrollments: ImportSummary,
}

pub struct BackupService {
    backup_dir: PathBuf,
    import_export: Arc<ImportExportService>,
}

impl BackupService {
    /// The backup directory must already exist.
    pub fn new(backup_dir: impl Into<PathBuf>, import_export: Arc<ImportExportService>) -> Result<Self> {
        let backup_dir = backup_dir.into();
        if !backup_dir.is_dir() {
            return Err(CcrmError::invalid_state(format!(
                "backup directory {} does not exist or is not a directory",
                backup_dir.display()
            )));
        }

        Ok(Self {
            backup_dir,
            import_export,
        })
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn create_backup(&self) -> Result<BackupInfo> {
        self.create_backup_at(Local::now())
    }

    pub fn create_backup_at(&self, now: DateTime<Local>) -> Result<BackupInfo> {
        let name = self.unique_backup_name(&now.format("%Y%m%d_%H%M%S").to_string());
        let snapshot = self.import_export.render_snapshot()?;

        let manifest = BackupManifest {
            created_at: now.to_rfc3339(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            files: snapshot.iter().map(|f| f.name.to_string()).collect(),
        };

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            for file in &snapshot {
                zip.start_file(file.name, SimpleFileOptions::default())?;
                zip.write_all(&file.contents)?;
            }

            zip.start_file(MANIFEST_FILE, SimpleFileOptions::default())?;
            zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        let path = self.backup_dir.join(&name);
        tracing::debug!("Writing backup archive ({} bytes) to {}", zip_data.len(), path.display());
        fs::write(&path, &zip_data)?;
        tracing::info!("Backup created: {}", path.display());

        Ok(BackupInfo {
            name,
            path,
            size_bytes: zip_data.len() as u64,
        })
    }

    fn unique_backup_name(&self, stamp: &str) -> String {
        let base = format!("{}{}", BACKUP_PREFIX, stamp);
        let mut candidate = format!("{}{}", base, BACKUP_EXTENSION);
        let mut counter = 1;
        while self.backup_dir.join(&candidate).exists() {
            candidate = format!("{}_{}{}", base, counter, BACKUP_EXTENSION);
            counter += 1;
        }
        candidate
    }

    /// Archives in the backup directory, oldest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_backup_name(&name) {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            backups.push(BackupInfo {
                name,
                path: entry.path(),
                size_bytes: metadata.len(),
            });
        }
        backups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(backups)
    }

    /// Recursive size of everything under the backup directory.
    pub fn total_size(&self) -> Result<u64> {
        let mut total = 0;
        for entry in WalkDir::new(&self.backup_dir) {
            let entry = entry.map_err(|e| {
                CcrmError::IoError(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed")
                }))
            })?;
            if entry.file_type().is_file() {
                total += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
        Ok(total)
    }

    /// Imports the CSV files of a backup archive into the live services.
    pub fn restore_backup(&self, name: &str) -> Result<RestoreSummary> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(CcrmError::validation(format!(
                "invalid backup name '{}'",
                name
            )));
        }
        let file_name = if name.ends_with(BACKUP_EXTENSION) {
            name.to_string()
        } else {
            format!("{}{}", name, BACKUP_EXTENSION)
        };

        let path = self.backup_dir.join(&file_name);
        if !path.is_file() {
            return Err(CcrmError::not_found("backup", file_name));
        }

        let mut archive = ZipArchive::new(fs::File::open(&path)?)?;
        let mut summary = RestoreSummary::default();

        for kind in RecordKind::IMPORT_ORDER {
            let result = match archive.by_name(kind.file_name()) {
                Ok(file) => self.import_export.import_kind_from_reader(kind, file)?,
                Err(ZipError::FileNotFound) => {
                    tracing::warn!("{} missing from {}", kind.file_name(), path.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            match kind {
                RecordKind::Students => summary.students = result,
                RecordKind::Courses => summary.courses = result,
                RecordKind::Enrollments => summary.enrollments = result,
            }
        }

        tracing::info!("Restored backup {}", path.display());
        Ok(summary)
    }
}

fn is_backup_name(name: &str) -> bool {
    name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_EXTENSION)
}
