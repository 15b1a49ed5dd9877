use crate::utils::cancel::CancelToken;
use crate::utils::error::{Result, UpdateError};
use crate::utils::glob::mask_match;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// 복사 버퍼 크기 (청크마다 취소 확인)
const COPY_CHUNK_SIZE: usize = 1024 * 1024;

/// 디렉토리 정리 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub files_removed: usize,
    pub dirs_removed: usize,
}

/// 파일 시스템 모듈
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystem;

impl FileSystem {
    /// 새 파일 시스템 인스턴스 생성
    pub fn new() -> Self {
        Self
    }

    /// 디렉토리 존재 여부 (캐시하지 않음, 매번 확인)
    #[allow(clippy::unused_self)]
    pub fn directory_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    /// `dir` 바로 아래에서 `mask`와 일치하는 일반 파일 목록
    ///
    /// 파일 이름순으로 정렬된다.
    #[allow(clippy::unused_self)]
    pub fn matching_files(&self, dir: &Path, mask: &str) -> Result<Vec<PathBuf>> {
        let mut matches = Vec::new();

        for entry in fs::read_dir(dir)? {
            // 읽을 수 없는 엔트리는 스킵
            let Ok(entry) = entry else { continue };
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();
            let is_file = file_type.is_file() || (file_type.is_symlink() && path.is_file());
            if !is_file {
                continue;
            }
            if mask_match(mask, &entry.file_name().to_string_lossy()) {
                matches.push(path);
            }
        }

        matches.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(matches)
    }

    /// 대상 디렉토리 비우기
    ///
    /// 바로 아래 파일을 먼저 지우고 하위 디렉토리를 재귀 삭제한다.
    /// 각 삭제 직전에 취소를 확인하며, 취소 시 이미 지운 항목은 복구하지 않는다.
    /// `on_progress(done, total)`는 항목 하나를 지울 때마다 호출된다.
    #[allow(clippy::unused_self)]
    pub fn clean_directory(
        &self,
        path: &Path,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Result<CleanSummary> {
        let mut summary = CleanSummary::default();
        if !path.exists() {
            return Ok(summary);
        }

        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            // 디렉토리 심볼릭 링크는 링크 자체만 지운다
            if file_type.is_dir() {
                dirs.push((entry.path(), EntryKind::Dir));
            } else if is_dir_link(&file_type) {
                dirs.push((entry.path(), EntryKind::DirLink));
            } else {
                files.push(entry.path());
            }
        }

        let total = files.len() + dirs.len();
        for file in &files {
            cancel.check()?;
            remove_entry(file, EntryKind::File)?;
            summary.files_removed += 1;
            on_progress(summary.files_removed, total);
        }
        for (dir, kind) in &dirs {
            cancel.check()?;
            remove_entry(dir, *kind)?;
            summary.dirs_removed += 1;
            on_progress(summary.files_removed + summary.dirs_removed, total);
        }

        Ok(summary)
    }

    /// 파일 복사 (청크 단위, 청크마다 취소 확인)
    ///
    /// 대상 파일이 있으면 덮어쓴다. 취소/실패 시 쓰다 만 대상 파일은 지운다.
    /// `on_progress(copied, total)`는 청크마다 호출된다.
    /// 반환값: 복사된 바이트 수
    #[allow(clippy::unused_self)]
    pub fn copy_file(
        &self,
        src: &Path,
        dest: &Path,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(u64, u64),
    ) -> Result<u64> {
        if src == dest {
            return Err(UpdateError::SameSourceAndDest {
                path: src.to_path_buf(),
            });
        }

        let copy_failed = |reason: String| UpdateError::CopyFailed {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
            reason,
        };

        let mut reader = File::open(src).map_err(|e| copy_failed(e.to_string()))?;
        let total = reader
            .metadata()
            .map(|m| m.len())
            .map_err(|e| copy_failed(e.to_string()))?;
        let mut writer = File::create(dest).map_err(|e| copy_failed(e.to_string()))?;

        let mut buffer = vec![0u8; COPY_CHUNK_SIZE];
        let mut copied = 0u64;
        let result = loop {
            if let Err(e) = cancel.check() {
                break Err(e);
            }
            let read = match reader.read(&mut buffer) {
                Ok(0) => break writer.sync_all().map_err(|e| copy_failed(e.to_string())),
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(copy_failed(e.to_string())),
            };
            if let Err(e) = writer.write_all(&buffer[..read]) {
                break Err(copy_failed(e.to_string()));
            }
            copied += read as u64;
            on_progress(copied, total);
        };

        if let Err(e) = result {
            drop(writer);
            let _ = fs::remove_file(dest);
            return Err(e);
        }

        Ok(copied)
    }

    /// 단일 파일 삭제
    #[allow(clippy::unused_self)]
    pub fn delete_file(&self, path: &Path) -> Result<()> {
        remove_entry(path, EntryKind::File)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir,
    /// Windows 디렉토리 심볼릭 링크/정션 (`remove_file`로는 지워지지 않음)
    DirLink,
}

#[cfg(windows)]
fn is_dir_link(file_type: &fs::FileType) -> bool {
    use std::os::windows::fs::FileTypeExt;
    file_type.is_symlink_dir()
}

#[cfg(not(windows))]
fn is_dir_link(_file_type: &fs::FileType) -> bool {
    false
}

fn remove_entry(path: &Path, kind: EntryKind) -> Result<()> {
    let result = match kind {
        EntryKind::File => fs::remove_file(path),
        EntryKind::Dir => fs::remove_dir_all(path),
        // 링크만 지우고 대상 디렉토리는 건드리지 않는다
        EntryKind::DirLink => fs::remove_dir(path),
    };
    result.map_err(|e| UpdateError::DeleteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
