use crate::utils::cancel::CancelToken;
use crate::utils::error::{Result, UpdateError};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

const EXTRACT_CHUNK_SIZE: usize = 256 * 1024;

#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub path: String,
    pub size: u64,
    pub is_dir: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub total_entries: usize,
    pub files_written: usize,
    pub dirs_created: usize,
    pub bytes_written: u64,
}

fn open_zip(path: &Path) -> std::result::Result<ZipArchive<File>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    ZipArchive::new(file).map_err(|e| e.to_string())
}

pub fn list_entries(path: &Path) -> Result<Vec<ArchiveEntry>> {
    let mut archive = open_zip(path).map_err(|reason| UpdateError::ExtractionFailed {
        path: path.to_path_buf(),
        reason,
    })?;

    let mut entries = Vec::with_capacity(archive.len());
    for idx in 0..archive.len() {
        let entry = archive
            .by_index(idx)
            .map_err(|e| UpdateError::ExtractionFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        entries.push(ArchiveEntry {
            path: entry.name().to_string(),
            size: entry.size(),
            is_dir: entry.is_dir(),
        });
    }
    Ok(entries)
}

/// 아카이브 무결성 검사
///
/// 모든 엔트리를 열어 고정 버퍼로 끝까지 읽어 버린다 (내용은 보관하지 않음).
/// zip 리더가 읽기 과정에서 수행하는 헤더/CRC 검사 중 하나라도 실패하면 `false`.
/// 파일을 만들거나 바꾸지 않는다.
pub fn verify_archive(path: &Path) -> bool {
    match try_verify_archive(path) {
        Ok(entries) => {
            tracing::debug!(path = %path.display(), entries, "archive verified");
            true
        }
        Err(reason) => {
            tracing::warn!(path = %path.display(), %reason, "archive verification failed");
            false
        }
    }
}

fn try_verify_archive(path: &Path) -> std::result::Result<usize, String> {
    let mut archive = open_zip(path)?;
    for idx in 0..archive.len() {
        let mut entry = archive.by_index(idx).map_err(|e| e.to_string())?;
        let name = entry.name().to_string();
        io::copy(&mut entry, &mut io::sink()).map_err(|e| format!("{}: {}", name, e))?;
    }
    Ok(archive.len())
}

/// 아카이브 전체를 `dest_dir`에 풀기
///
/// 기존 파일은 덮어쓴다. 엔트리마다(큰 엔트리는 청크마다) 취소를 확인하며,
/// 취소 시 이미 풀린 파일은 그대로 둔다.
/// `on_progress(done, total)`는 엔트리 하나가 끝날 때마다 호출된다.
pub fn extract_archive(
    archive_path: &Path,
    dest_dir: &Path,
    cancel: &CancelToken,
    mut on_progress: impl FnMut(usize, usize),
) -> Result<ExtractSummary> {
    let failed = |reason: String| UpdateError::ExtractionFailed {
        path: archive_path.to_path_buf(),
        reason,
    };

    if !dest_dir.is_dir() {
        return Err(failed(format!(
            "Destination directory does not exist: {}",
            dest_dir.display()
        )));
    }

    let mut archive = open_zip(archive_path).map_err(failed)?;
    let mut summary = ExtractSummary {
        total_entries: archive.len(),
        ..ExtractSummary::default()
    };

    for idx in 0..archive.len() {
        cancel.check()?;

        let mut entry = archive.by_index(idx).map_err(|e| failed(e.to_string()))?;
        let name = entry.name().to_string();
        if entry.is_dir() && names_root(&name) {
            tracing::debug!(entry = %name, "root directory entry skipped");
            on_progress(idx + 1, summary.total_entries);
            continue;
        }
        let Some(dest_path) = sanitize_extract_path(dest_dir, Path::new(&name)) else {
            return Err(failed(format!("{}: blocked unsafe path", name)));
        };

        if entry.is_dir() {
            fs::create_dir_all(&dest_path).map_err(|e| failed(format!("{}: {}", name, e)))?;
            summary.dirs_created += 1;
        } else {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent).map_err(|e| failed(format!("{}: {}", name, e)))?;
            }
            let mut out =
                File::create(&dest_path).map_err(|e| failed(format!("{}: {}", name, e)))?;
            let written = copy_with_cancel(&mut entry, &mut out, cancel).map_err(|e| match e {
                UpdateError::Cancelled => UpdateError::Cancelled,
                other => failed(format!("{}: {}", name, other)),
            })?;
            summary.files_written += 1;
            summary.bytes_written += written;
        }

        on_progress(idx + 1, summary.total_entries);
    }

    Ok(summary)
}

fn copy_with_cancel<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    cancel: &CancelToken,
) -> Result<u64> {
    let mut buffer = vec![0u8; EXTRACT_CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        cancel.check()?;
        let read = match reader.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(UpdateError::Io(e)),
        };
        writer.write_all(&buffer[..read])?;
        total += read as u64;
    }
}

/// `./` 같은 엔트리는 풀 위치 자체를 가리킨다
fn names_root(name: &str) -> bool {
    Path::new(name)
        .components()
        .all(|comp| matches!(comp, Component::CurDir))
}

fn sanitize_extract_path(dest_root: &Path, raw_path: &Path) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for comp in raw_path.components() {
        match comp {
            Component::Normal(v) => clean.push(v),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if clean.as_os_str().is_empty() {
        return None;
    }
    let out = dest_root.join(clean);
    if out.starts_with(dest_root) {
        Some(out)
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions as ZipFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    pub(crate) fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).expect("create zip");
        let mut writer = ZipWriter::new(file);
        let options = ZipFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).expect("add dir");
            } else {
                writer.start_file(*name, options).expect("start file");
                writer.write_all(data).expect("write entry");
            }
        }
        writer.finish().expect("finish zip");
    }

    /// 저장(Stored) 방식 엔트리의 내용 바이트를 직접 변조
    pub(crate) fn corrupt_first_occurrence(path: &Path, needle: &[u8]) {
        let mut bytes = fs::read(path).unwrap();
        let pos = bytes
            .windows(needle.len())
            .position(|w| w == needle)
            .expect("payload present");
        bytes[pos] ^= 0xFF;
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_sanitize_extract_path_blocks_unsafe_paths() {
        let root = PathBuf::from("/tmp/base");
        assert!(sanitize_extract_path(&root, Path::new("ok/file.txt")).is_some());
        assert!(sanitize_extract_path(&root, Path::new("./ok.txt")).is_some());
        assert!(sanitize_extract_path(&root, Path::new("../evil")).is_none());
        assert!(sanitize_extract_path(&root, Path::new("/abs/path")).is_none());
        assert!(sanitize_extract_path(&root, Path::new("")).is_none());
    }

    #[test]
    fn test_verify_accepts_well_formed_archive() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("update_v3.zip");
        write_zip(&path, &[("a.txt", b"alpha"), ("dir/", b""), ("dir/b.txt", b"beta")]);

        assert!(verify_archive(&path));
    }

    #[test]
    fn test_verify_accepts_empty_archive() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("empty.zip");
        write_zip(&path, &[]);

        assert!(verify_archive(&path));
    }

    #[test]
    fn test_verify_rejects_truncated_archive() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("truncated.zip");
        write_zip(&path, &[("a.txt", b"alpha alpha alpha"), ("b.txt", b"beta")]);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(!verify_archive(&path));
    }

    #[test]
    fn test_verify_rejects_corrupted_entry() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("corrupt.zip");
        write_zip(&path, &[("a.txt", b"PAYLOAD-PAYLOAD-PAYLOAD")]);
        corrupt_first_occurrence(&path, b"PAYLOAD-PAYLOAD-PAYLOAD");

        assert!(!verify_archive(&path));
    }

    #[test]
    fn test_verify_rejects_non_zip_and_missing() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("fake.zip");
        fs::write(&path, "definitely not a zip").unwrap();

        assert!(!verify_archive(&path));
        assert!(!verify_archive(&temp.path().join("missing.zip")));
    }

    #[test]
    fn test_verify_does_not_modify_files() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("update.zip");
        write_zip(&path, &[("a.txt", b"alpha")]);
        let before = fs::read(&path).unwrap();

        assert!(verify_archive(&path));
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_extract_writes_all_entries() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("update.zip");
        write_zip(
            &path,
            &[("a.txt", b"alpha"), ("nested/", b""), ("nested/b.txt", b"beta")],
        );
        let dest = temp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();

        let mut progress = Vec::new();
        let summary = extract_archive(&path, &dest, &CancelToken::new(), |done, total| {
            progress.push((done, total))
        })
        .unwrap();

        assert_eq!(summary.total_entries, 3);
        assert_eq!(summary.files_written, 2);
        assert_eq!(summary.dirs_created, 1);
        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"alpha");
        assert_eq!(fs::read(dest.join("nested").join("b.txt")).unwrap(), b"beta");
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_extract_skips_current_dir_entry() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("update.zip");
        write_zip(&path, &[("./", b""), ("a.txt", b"alpha"), ("./sub/", b"")]);
        let dest = temp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();

        let mut progress = Vec::new();
        let summary = extract_archive(&path, &dest, &CancelToken::new(), |done, total| {
            progress.push((done, total))
        })
        .unwrap();

        assert_eq!(summary.files_written, 1);
        assert_eq!(summary.dirs_created, 1);
        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"alpha");
        assert!(dest.join("sub").is_dir());
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_names_root() {
        assert!(names_root("./"));
        assert!(names_root("././"));
        assert!(!names_root("./sub/"));
        assert!(!names_root("/"));
        assert!(!names_root("../"));
    }

    #[test]
    fn test_extract_overwrites_existing_files() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("update.zip");
        write_zip(&path, &[("a.txt", b"new")]);
        let dest = temp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("a.txt"), "old contents").unwrap();

        extract_archive(&path, &dest, &CancelToken::new(), |_, _| {}).unwrap();
        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"new");
    }

    #[test]
    fn test_extract_blocks_zip_slip() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("evil.zip");
        write_zip(&path, &[("../escape.txt", b"evil")]);
        let dest = temp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();

        let result = extract_archive(&path, &dest, &CancelToken::new(), |_, _| {});
        assert!(matches!(result, Err(UpdateError::ExtractionFailed { .. })));
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[test]
    fn test_extract_cancelled_before_start() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("update.zip");
        write_zip(&path, &[("a.txt", b"alpha")]);
        let dest = temp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        let token = CancelToken::new();
        token.cancel();

        let result = extract_archive(&path, &dest, &token, |_, _| {});
        assert!(matches!(result, Err(UpdateError::Cancelled)));
        assert!(!dest.join("a.txt").exists());
    }

    #[test]
    fn test_extract_requires_destination() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("update.zip");
        write_zip(&path, &[("a.txt", b"alpha")]);

        let result = extract_archive(
            &path,
            &temp.path().join("missing"),
            &CancelToken::new(),
            |_, _| {},
        );
        assert!(matches!(result, Err(UpdateError::ExtractionFailed { .. })));
    }

    #[test]
    fn test_list_entries() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("update.zip");
        write_zip(&path, &[("a.txt", b"alpha"), ("b.txt", b"be")]);

        let entries = list_entries(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.path == "a.txt" && e.size == 5));
        assert!(entries.iter().all(|e| !e.is_dir));
    }
}
