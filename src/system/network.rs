//! 네트워크 공유 접속
//!
//! 계정 정보가 있는 대상만 접속하며, 접속은 `ConnectionGuard`가 살아 있는 동안 유지된다.
//! Windows에서는 `WNetAddConnection2W`/`WNetCancelConnection2W`를 호출하고,
//! 그 외 플랫폼에서는 아무 것도 하지 않는다.

use crate::models::Credentials;
use crate::utils::error::{Result, UpdateError};
use std::io;
use std::path::{Path, PathBuf};

/// 접속 해제에 필요한 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionHandle {
    pub path: PathBuf,
}

pub trait NetworkConnector: Send + Sync {
    /// `path`에 계정으로 접속
    fn connect(&self, path: &Path, credentials: &Credentials) -> Result<ConnectionHandle>;

    /// 접속 해제 (실패는 로그만 남긴다)
    fn disconnect(&self, handle: ConnectionHandle);
}

/// NUL 종료 UTF-16 문자열 (Win32 `PCWSTR` 인자용)
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn wide_null(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Win32 오류 코드 → `Connection` 에러
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn connection_error(path: &Path, code: i32) -> UpdateError {
    UpdateError::Connection {
        path: path.to_path_buf(),
        code,
        reason: io::Error::from_raw_os_error(code).to_string(),
    }
}

/// `mpr.dll` WNet API 기반 접속 (비밀번호가 프로세스 인자에 노출되지 않음)
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WNetConnector;

#[cfg(windows)]
impl NetworkConnector for WNetConnector {
    fn connect(&self, path: &Path, credentials: &Credentials) -> Result<ConnectionHandle> {
        use windows_sys::Win32::Foundation::NO_ERROR;
        use windows_sys::Win32::NetworkManagement::WNet::{
            WNetAddConnection2W, NETRESOURCEW, RESOURCEDISPLAYTYPE_SHARE, RESOURCETYPE_DISK,
            RESOURCE_GLOBALNET,
        };

        let mut remote = wide_null(&path.to_string_lossy());
        let password = wide_null(&credentials.password);
        let username = wide_null(&credentials.username);
        let resource = NETRESOURCEW {
            dwScope: RESOURCE_GLOBALNET,
            dwType: RESOURCETYPE_DISK,
            dwDisplayType: RESOURCEDISPLAYTYPE_SHARE,
            dwUsage: 0,
            lpLocalName: std::ptr::null_mut(),
            lpRemoteName: remote.as_mut_ptr(),
            lpComment: std::ptr::null_mut(),
            lpProvider: std::ptr::null_mut(),
        };

        // SAFETY: 모든 문자열 버퍼는 호출 동안 살아 있는 NUL 종료 UTF-16
        let code = unsafe {
            WNetAddConnection2W(&resource, password.as_ptr(), username.as_ptr(), 0)
        };
        if code != NO_ERROR {
            return Err(connection_error(path, code as i32));
        }

        tracing::info!(path = %path.display(), user = %credentials.username, "network share connected");
        Ok(ConnectionHandle {
            path: path.to_path_buf(),
        })
    }

    fn disconnect(&self, handle: ConnectionHandle) {
        use windows_sys::Win32::Foundation::NO_ERROR;
        use windows_sys::Win32::NetworkManagement::WNet::WNetCancelConnection2W;

        let remote = wide_null(&handle.path.to_string_lossy());
        // SAFETY: `remote`는 호출 동안 살아 있는 NUL 종료 UTF-16
        let code = unsafe { WNetCancelConnection2W(remote.as_ptr(), 0, 1) };
        if code == NO_ERROR {
            tracing::info!(path = %handle.path.display(), "network share disconnected");
        } else {
            tracing::warn!(path = %handle.path.display(), code, "network share disconnect failed");
        }
    }
}

/// 접속 메커니즘이 없는 플랫폼용
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopConnector;

impl NetworkConnector for NoopConnector {
    fn connect(&self, path: &Path, _credentials: &Credentials) -> Result<ConnectionHandle> {
        tracing::debug!(path = %path.display(), "credentials ignored on this platform");
        Ok(ConnectionHandle {
            path: path.to_path_buf(),
        })
    }

    fn disconnect(&self, _handle: ConnectionHandle) {}
}

/// 현재 플랫폼 기본 접속기
#[cfg(windows)]
pub fn default_connector() -> Box<dyn NetworkConnector> {
    Box::new(WNetConnector)
}

/// 현재 플랫폼 기본 접속기
#[cfg(not(windows))]
pub fn default_connector() -> Box<dyn NetworkConnector> {
    Box::new(NoopConnector)
}

/// 범위 접속. drop 시 접속 해제
pub struct ConnectionGuard<'a> {
    connector: &'a dyn NetworkConnector,
    handle: Option<ConnectionHandle>,
}

impl<'a> ConnectionGuard<'a> {
    /// 계정이 없으면 접속하지 않는 빈 가드
    pub fn open(
        connector: &'a dyn NetworkConnector,
        path: &Path,
        credentials: Option<&Credentials>,
    ) -> Result<Self> {
        let handle = match credentials {
            Some(credentials) => Some(connector.connect(path, credentials)?),
            None => None,
        };
        Ok(Self { connector, handle })
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.connector.disconnect(handle);
        }
    }
}

/// `body` 실행 동안만 접속 유지
///
/// 접속 실패 시 `body`는 실행되지 않고 `Connection` 에러가 반환된다.
pub fn with_connection<T>(
    connector: &dyn NetworkConnector,
    path: &Path,
    credentials: Option<&Credentials>,
    body: impl FnOnce() -> T,
) -> Result<T> {
    let guard = ConnectionGuard::open(connector, path, credentials)?;
    tracing::debug!(path = %path.display(), connected = guard.is_connected(), "destination session");
    Ok(body())
}

/// 대상 경로 도달 가능 여부 (캐시 없음)
pub fn path_reachable(
    connector: &dyn NetworkConnector,
    path: &Path,
    credentials: Option<&Credentials>,
) -> bool {
    match with_connection(connector, path, credentials, || path.is_dir()) {
        Ok(reachable) => reachable,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "destination check failed");
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// 접속/해제 횟수를 세는 가짜 접속기
    #[derive(Default, Clone)]
    pub(crate) struct CountingConnector {
        pub connects: Arc<AtomicUsize>,
        pub disconnects: Arc<AtomicUsize>,
        /// 설정 시 접속 실패 코드
        pub fail_code: Option<i32>,
    }

    impl CountingConnector {
        pub(crate) fn failing(code: i32) -> Self {
            Self {
                fail_code: Some(code),
                ..Self::default()
            }
        }

        pub(crate) fn connect_count(&self) -> usize {
            self.connects.load(Ordering::SeqCst)
        }

        pub(crate) fn disconnect_count(&self) -> usize {
            self.disconnects.load(Ordering::SeqCst)
        }
    }

    impl NetworkConnector for CountingConnector {
        fn connect(&self, path: &Path, _credentials: &Credentials) -> Result<ConnectionHandle> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if let Some(code) = self.fail_code {
                return Err(UpdateError::Connection {
                    path: path.to_path_buf(),
                    code,
                    reason: "access denied".to_string(),
                });
            }
            Ok(ConnectionHandle {
                path: path.to_path_buf(),
            })
        }

        fn disconnect(&self, _handle: ConnectionHandle) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn creds() -> Credentials {
        Credentials::from_parts("svc", "pw").unwrap()
    }

    #[test]
    fn test_with_connection_without_credentials_skips_connect() {
        let connector = CountingConnector::default();
        let temp = TempDir::new().unwrap();

        let value = with_connection(&connector, temp.path(), None, || 42).unwrap();

        assert_eq!(value, 42);
        assert_eq!(connector.connect_count(), 0);
        assert_eq!(connector.disconnect_count(), 0);
    }

    #[test]
    fn test_with_connection_releases_after_body() {
        let connector = CountingConnector::default();
        let temp = TempDir::new().unwrap();
        let credentials = creds();

        let seen = with_connection(&connector, temp.path(), Some(&credentials), || {
            connector.disconnect_count()
        })
        .unwrap();

        assert_eq!(seen, 0);
        assert_eq!(connector.connect_count(), 1);
        assert_eq!(connector.disconnect_count(), 1);
    }

    #[test]
    fn test_with_connection_releases_on_body_error() {
        let connector = CountingConnector::default();
        let temp = TempDir::new().unwrap();
        let credentials = creds();

        let result: Result<Result<()>> =
            with_connection(&connector, temp.path(), Some(&credentials), || {
                Err(UpdateError::Cancelled)
            });

        assert!(matches!(result, Ok(Err(UpdateError::Cancelled))));
        assert_eq!(connector.disconnect_count(), 1);
    }

    #[test]
    fn test_with_connection_failure_skips_body() {
        let connector = CountingConnector::failing(1326);
        let temp = TempDir::new().unwrap();
        let credentials = creds();
        let mut ran = false;

        let result = with_connection(&connector, temp.path(), Some(&credentials), || ran = true);

        match result {
            Err(UpdateError::Connection { code, .. }) => assert_eq!(code, 1326),
            other => panic!("expected Connection error, got {:?}", other),
        }
        assert!(!ran);
        assert_eq!(connector.disconnect_count(), 0);
    }

    #[test]
    fn test_path_reachable() {
        let connector = CountingConnector::default();
        let temp = TempDir::new().unwrap();

        assert!(path_reachable(&connector, temp.path(), None));
        assert!(!path_reachable(&connector, &temp.path().join("missing"), None));
        assert!(!path_reachable(
            &CountingConnector::failing(53),
            temp.path(),
            Some(&creds())
        ));
    }

    #[test]
    fn test_wide_null_terminates_utf16() {
        assert_eq!(wide_null(r"Z:\"), vec![u16::from(b'Z'), u16::from(b':'), u16::from(b'\\'), 0]);
        assert_eq!(wide_null(""), vec![0]);
        // BMP 밖 문자는 서로게이트 쌍
        assert_eq!(wide_null("\u{1F4BF}").len(), 3);
    }

    #[test]
    fn test_connection_error_keeps_win32_code() {
        let error = connection_error(Path::new(r"\\srv\share"), 1326);
        match error {
            UpdateError::Connection { path, code, reason } => {
                assert_eq!(path, PathBuf::from(r"\\srv\share"));
                assert_eq!(code, 1326);
                assert!(!reason.is_empty());
            }
            other => panic!("expected Connection error, got {:?}", other),
        }
    }

    #[test]
    fn test_noop_connector_always_connects() {
        let guard =
            ConnectionGuard::open(&NoopConnector, Path::new("/srv/share"), Some(&creds())).unwrap();
        assert!(guard.is_connected());
    }
}
