//! # Run Archiver
//!
//! Packs `<export_root>/<label>` into `<export_root>/<stem>.zip`. Entries are
//! rooted at `<label>/`, so unpacking the archive recreates the run
//! directory. Compression happens on tokio's blocking pool.
//!
//! On success the source tree is removed. On failure the partial zip is
//! deleted and the tree is left untouched.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveError;
use crate::export::sanitize::sanitize_file_name;

pub const ARCHIVE_EXTENSION: &str = "zip";

/// `<label>` or `<label>_<sanitized host>`
pub fn archive_stem(label: &str, host: Option<&str>) -> String {
    match host {
        Some(host) => format!("{label}_{}", sanitize_file_name(host)),
        None => label.to_string(),
    }
}

/// Compresses run directories below one export root
#[derive(Debug, Clone)]
pub struct Archiver {
    export_root: PathBuf,
}

impl Archiver {
    pub fn new(export_root: impl Into<PathBuf>) -> Self {
        Self {
            export_root: export_root.into(),
        }
    }

    pub fn archive_path(&self, stem: &str) -> PathBuf {
        self.export_root.join(format!("{stem}.{ARCHIVE_EXTENSION}"))
    }

    /// Zip `<export_root>/<label>` into `<export_root>/<stem>.zip`
    pub async fn archive(&self, label: &str, stem: &str) -> Result<PathBuf, ArchiveError> {
        let source_dir = self.export_root.join(label);
        if !tokio::fs::try_exists(&source_dir)
            .await
            .map_err(|e| ArchiveError::io(&source_dir, e))?
        {
            return Err(ArchiveError::MissingSource(source_dir));
        }

        let archive_path = self.archive_path(stem);
        info!(
            source = %source_dir.display(),
            archive = %archive_path.display(),
            "Archiving export directory"
        );

        let task_source = source_dir.clone();
        let task_archive = archive_path.clone();
        let task_label = label.to_string();
        let written = tokio::task::spawn_blocking(move || {
            let result = write_archive(&task_source, &task_label, &task_archive);
            if result.is_err() {
                if let Err(e) = std::fs::remove_file(&task_archive) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!(
                            archive = %task_archive.display(),
                            error = %e,
                            "Could not remove partial archive"
                        );
                    }
                }
            }
            result
        })
        .await
        .map_err(|e| ArchiveError::Join(e.to_string()))??;

        debug!(entries = written, "Archive written");

        // The archive is complete at this point; a leftover tree is only noise
        if let Err(e) = tokio::fs::remove_dir_all(&source_dir).await {
            warn!(
                source = %source_dir.display(),
                error = %e,
                "Archive written but export directory could not be removed"
            );
        }

        info!(archive = %archive_path.display(), entries = written, "Archive created");
        Ok(archive_path)
    }
}

/// Write the zip synchronously, returning the number of file entries
fn write_archive(source_dir: &Path, label: &str, archive_path: &Path) -> Result<usize, ArchiveError> {
    let file = File::create(archive_path).map_err(|e| ArchiveError::io(archive_path, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.add_directory(format!("{label}/"), options)?;
    let files = add_tree(&mut zip, source_dir, label, options)?;

    let mut writer = zip.finish()?;
    writer.flush().map_err(|e| ArchiveError::io(archive_path, e))?;
    Ok(files)
}

fn add_tree<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    dir: &Path,
    prefix: &str,
    options: SimpleFileOptions,
) -> Result<usize, ArchiveError> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(|e| ArchiveError::io(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ArchiveError::io(dir, e))?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut files = 0;
    for entry in entries {
        let path = entry.path();
        let name = format!("{prefix}/{}", entry.file_name().to_string_lossy());
        let file_type = entry.file_type().map_err(|e| ArchiveError::io(&path, e))?;

        if file_type.is_dir() {
            zip.add_directory(format!("{name}/"), options)?;
            files += add_tree(zip, &path, &name, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut input = File::open(&path).map_err(|e| ArchiveError::io(&path, e))?;
            std::io::copy(&mut input, zip).map_err(|e| ArchiveError::io(&path, e))?;
            files += 1;
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn seed_tree(root: &Path) {
        let host = root.join("20240315").join("srv-a");
        std::fs::create_dir_all(&host).unwrap();
        std::fs::write(host.join("CPU_load.csv"), "itemid,clock,value,ns\r\n").unwrap();
    }

    #[test]
    fn test_archive_stem() {
        assert_eq!(archive_stem("20240315", None), "20240315");
        assert_eq!(archive_stem("202403", Some("web 01.local")), "202403_web_01_local");
    }

    #[tokio::test]
    async fn test_archive_contains_label_rooted_entries() {
        let temp = TempDir::new().unwrap();
        seed_tree(temp.path());

        let archiver = Archiver::new(temp.path());
        let path = archiver.archive("20240315", "20240315").await.unwrap();

        assert_eq!(path, temp.path().join("20240315.zip"));
        assert!(!temp.path().join("20240315").exists());

        let mut zip = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let names: Vec<String> = zip.file_names().map(str::to_string).collect();
        assert!(names.contains(&"20240315/".to_string()));
        assert!(names.contains(&"20240315/srv-a/".to_string()));

        let mut content = String::new();
        zip.by_name("20240315/srv-a/CPU_load.csv")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "itemid,clock,value,ns\r\n");
    }

    #[tokio::test]
    async fn test_missing_source_is_an_error() {
        let temp = TempDir::new().unwrap();
        let archiver = Archiver::new(temp.path());

        let result = archiver.archive("20240315", "20240315").await;
        assert!(matches!(result, Err(ArchiveError::MissingSource(_))));
        assert!(!temp.path().join("20240315.zip").exists());
    }

    #[tokio::test]
    async fn test_failed_archive_keeps_tree() {
        let temp = TempDir::new().unwrap();
        seed_tree(temp.path());
        // A directory where the zip should go makes File::create fail
        std::fs::create_dir(temp.path().join("20240315.zip")).unwrap();

        let archiver = Archiver::new(temp.path());
        let result = archiver.archive("20240315", "20240315").await;

        assert!(matches!(result, Err(ArchiveError::Io { .. })));
        assert!(temp.path().join("20240315").join("srv-a").join("CPU_load.csv").exists());
    }
}
