//! 드라이브 열거
//!
//! - Windows: `GetLogicalDrives` + `GetDriveTypeW` (`DRIVE_CDROM`이면 광학 드라이브)
//! - Linux: `/proc/mounts`의 파일 시스템 이름 (iso9660/udf)
//! - 그 외: `sysinfo::Disks`
//!
//! 테스트에서는 `DriveProvider`를 가짜 구현으로 교체한다.

use std::path::{Path, PathBuf};

const OPTICAL_FILE_SYSTEMS: &[&str] = &["cdfs", "udf", "iso9660", "cd9660"];
const NETWORK_FILE_SYSTEMS: &[&str] = &["cifs", "smbfs", "smb2", "smb3", "nfs", "nfs4", "9p"];

#[cfg(target_os = "linux")]
const MOUNT_TABLE: &str = "/proc/mounts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveKind {
    Optical,
    Removable,
    Fixed,
    Network,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveInfo {
    /// 드라이브 루트 (마운트 포인트)
    pub root: PathBuf,
    pub kind: DriveKind,
    /// 매체가 들어 있고 루트를 읽을 수 있는지
    pub ready: bool,
}

pub trait DriveProvider: Send + Sync {
    /// 마운트된 드라이브 목록 (시스템 열거 순서)
    fn drives(&self) -> Vec<DriveInfo>;
}

/// 파일 시스템 이름으로 드라이브 종류 판별
#[cfg_attr(windows, allow(dead_code))]
pub fn classify_drive(file_system: &str, is_removable: bool) -> DriveKind {
    let fs_name = file_system.to_ascii_lowercase();
    if OPTICAL_FILE_SYSTEMS.contains(&fs_name.as_str()) {
        DriveKind::Optical
    } else if NETWORK_FILE_SYSTEMS.contains(&fs_name.as_str()) {
        DriveKind::Network
    } else if is_removable {
        DriveKind::Removable
    } else if fs_name.is_empty() {
        DriveKind::Unknown
    } else {
        DriveKind::Fixed
    }
}

/// 매번 새로 확인 (트레이가 열려 있으면 읽기 실패)
fn is_ready(root: &Path) -> bool {
    std::fs::read_dir(root).is_ok()
}

/// 실제 드라이브 목록
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDrives;

impl DriveProvider for SystemDrives {
    fn drives(&self) -> Vec<DriveInfo> {
        let drives = platform_drives();
        tracing::debug!(count = drives.len(), "drives enumerated");
        drives
    }
}

#[cfg(windows)]
fn platform_drives() -> Vec<DriveInfo> {
    use crate::system::network::wide_null;
    use windows_sys::Win32::Storage::FileSystem::{GetDriveTypeW, GetLogicalDrives};

    // SAFETY: 인자 없는 조회 함수
    let mask = unsafe { GetLogicalDrives() };
    (0u8..26)
        .filter(|bit| mask & (1u32 << bit) != 0)
        .map(|bit| {
            let root = format!("{}:\\", char::from(b'A' + bit));
            let wide = wide_null(&root);
            // SAFETY: `wide`는 호출 동안 살아 있는 NUL 종료 UTF-16 문자열
            let drive_type = unsafe { GetDriveTypeW(wide.as_ptr()) };
            let root = PathBuf::from(root);
            let ready = is_ready(&root);
            DriveInfo {
                root,
                kind: windows_drive_kind(drive_type),
                ready,
            }
        })
        .collect()
}

#[cfg(windows)]
fn windows_drive_kind(drive_type: u32) -> DriveKind {
    use windows_sys::Win32::System::WindowsProgramming::{
        DRIVE_CDROM, DRIVE_FIXED, DRIVE_RAMDISK, DRIVE_REMOTE, DRIVE_REMOVABLE,
    };
    match drive_type {
        DRIVE_CDROM => DriveKind::Optical,
        DRIVE_REMOVABLE => DriveKind::Removable,
        DRIVE_FIXED | DRIVE_RAMDISK => DriveKind::Fixed,
        DRIVE_REMOTE => DriveKind::Network,
        _ => DriveKind::Unknown,
    }
}

#[cfg(target_os = "linux")]
fn platform_drives() -> Vec<DriveInfo> {
    match std::fs::read_to_string(MOUNT_TABLE) {
        Ok(content) => parse_mount_table(&content),
        Err(e) => {
            tracing::warn!(path = MOUNT_TABLE, error = %e, "mount table not readable");
            Vec::new()
        }
    }
}

#[cfg(not(any(windows, target_os = "linux")))]
fn platform_drives() -> Vec<DriveInfo> {
    use sysinfo::Disks;

    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .map(|disk| {
            let root = disk.mount_point().to_path_buf();
            let kind = classify_drive(&disk.file_system().to_string_lossy(), disk.is_removable());
            let ready = is_ready(&root);
            DriveInfo { root, kind, ready }
        })
        .collect()
}

/// `/proc/mounts` 형식 파싱 (`<device> <mount point> <fs type> <options> 0 0`)
///
/// 블록 장치(`/dev/...`)에 마운트된 항목만 반환한다.
#[cfg(any(target_os = "linux", test))]
fn parse_mount_table(content: &str) -> Vec<DriveInfo> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mount_point = fields.next()?;
            let file_system = fields.next()?;
            if !device.starts_with("/dev/") {
                return None;
            }
            let root = unescape_mount_path(mount_point);
            let ready = is_ready(&root);
            Some(DriveInfo {
                root,
                kind: classify_drive(file_system, false),
                ready,
            })
        })
        .collect()
}

/// 마운트 경로의 8진 이스케이프 복원 (`\040` → 공백)
#[cfg(any(target_os = "linux", test))]
fn unescape_mount_path(raw: &str) -> PathBuf {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escape = bytes.get(i + 1..i + 4).filter(|digits| {
            bytes[i] == b'\\' && digits.iter().all(|d| (b'0'..=b'7').contains(d))
        });
        match escape {
            Some(digits) => {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                out.push(u8::try_from(value).unwrap_or(b'?'));
                i += 4;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    PathBuf::from(String::from_utf8_lossy(&out).into_owned())
}
