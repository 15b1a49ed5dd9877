//! 원본 아카이브 검색
//!
//! 지정 폴더 또는 준비된 광학 드라이브 루트에서 마스크와 일치하는 첫 파일을 찾는다.
//! 부수 효과 없음.

use crate::models::ArchiveSource;
use crate::system::drives::{DriveKind, DriveProvider};
use crate::system::filesystem::FileSystem;
use crate::utils::error::{Result, UpdateError};
use std::path::{Path, PathBuf};

pub struct ArchiveLocator<'a> {
    fs: FileSystem,
    drives: &'a dyn DriveProvider,
}

impl<'a> ArchiveLocator<'a> {
    pub fn new(drives: &'a dyn DriveProvider) -> Self {
        Self {
            fs: FileSystem::new(),
            drives,
        }
    }

    /// 아카이브 경로 반환, 없으면 `SourceNotFound`
    pub fn locate(&self, mask: &str, source: &ArchiveSource) -> Result<PathBuf> {
        match source {
            ArchiveSource::Folder(folder) => self.locate_in_folder(mask, folder),
            ArchiveSource::OpticalDrives => self.locate_on_optical_drives(mask),
        }
    }

    fn locate_in_folder(&self, mask: &str, folder: &Path) -> Result<PathBuf> {
        let not_found = || UpdateError::SourceNotFound {
            mask: mask.to_string(),
            location: folder.display().to_string(),
        };

        if !self.fs.directory_exists(folder) {
            tracing::info!(folder = %folder.display(), "custom source folder does not exist");
            return Err(not_found());
        }

        let found = self.fs.matching_files(folder, mask).map_err(|e| {
            tracing::warn!(folder = %folder.display(), error = %e, "cannot list source folder");
            not_found()
        })?;
        found.into_iter().next().ok_or_else(not_found)
    }

    fn locate_on_optical_drives(&self, mask: &str) -> Result<PathBuf> {
        for drive in self.drives.drives() {
            if drive.kind != DriveKind::Optical || !drive.ready {
                continue;
            }
            match self.fs.matching_files(&drive.root, mask) {
                Ok(found) => {
                    if let Some(first) = found.into_iter().next() {
                        return Ok(first);
                    }
                }
                Err(e) => {
                    tracing::warn!(drive = %drive.root.display(), error = %e, "cannot list drive root");
                }
            }
        }

        Err(UpdateError::SourceNotFound {
            mask: mask.to_string(),
            location: "optical drives".to_string(),
        })
    }
}
