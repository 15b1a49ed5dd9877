//! 설정 모델
//!
//! 설정 파일(`config.toml`)의 `[Settings]` 테이블과, 한 번의 실행 동안 변하지 않는
//! `UpdateConfig`를 정의한다.

use crate::utils::error::{Result, UpdateError};
use crate::utils::glob::has_wildcard;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// 설정 파일 경로 override 환경변수
pub const CONFIG_ENV_VAR: &str = "AVUPDATE_CONFIG";

pub const PRIMARY_LABEL: &str = "Primary";
pub const SECONDARY_LABEL: &str = "Secondary";

/// 설정 파일 루트
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsFile {
    #[serde(rename = "Settings", default)]
    pub settings: Settings,
}

/// `[Settings]` 테이블 (키 이름은 기존 INI 설정과 동일)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct Settings {
    pub network_path: String,
    pub archive_name: String,
    pub use_secondary_path: bool,
    pub secondary_network_path: String,
    pub secondary_username: String,
    pub secondary_password: String,
    pub use_custom_source: bool,
    pub custom_source_path: String,
    /// 화면 테마 (`Dark` / `Light`)
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network_path: r"\\network\updates".to_string(),
            archive_name: "update*.zip".to_string(),
            use_secondary_path: false,
            secondary_network_path: r"\\backup\updates".to_string(),
            secondary_username: String::new(),
            secondary_password: String::new(),
            use_custom_source: false,
            custom_source_path: String::new(),
            theme: "Dark".to_string(),
        }
    }
}

impl Settings {
    /// 설정 파일 위치
    ///
    /// `$AVUPDATE_CONFIG` → `<config_dir>/avupdate/config.toml` → `./config.toml`
    pub fn default_path() -> PathBuf {
        if let Ok(custom) = env::var(CONFIG_ENV_VAR) {
            let trimmed = custom.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }
        dirs::config_dir()
            .map(|dir| dir.join("avupdate").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// 설정 파일 로드. 파일이 없으면 기본 설정을 기록하고 반환한다.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            let settings = Settings::default();
            settings.save(path)?;
            tracing::info!(path = %path.display(), "default settings written");
            return Ok(settings);
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let file: SettingsFile = toml::from_str(&content).map_err(|e| {
            UpdateError::Config(format!("{}: {}", path.display(), e.message()))
        })?;
        Ok(file.settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = SettingsFile {
            settings: self.clone(),
        };
        let content =
            toml::to_string_pretty(&file).map_err(|e| UpdateError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 입력 필드 검증 (비어 있지 않음, 마스크에 `*` 포함)
    ///
    /// 반환값: 필드별 오류 메시지 목록 (비어 있으면 유효)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.network_path.trim().is_empty() {
            errors.push("NetworkPath: field cannot be empty".to_string());
        }
        if self.archive_name.trim().is_empty() || !has_wildcard(&self.archive_name) {
            errors.push("ArchiveName: must contain a mask (e.g. *.zip)".to_string());
        }
        if self.use_secondary_path && self.secondary_network_path.trim().is_empty() {
            errors.push("SecondaryNetworkPath: field cannot be empty".to_string());
        }
        if self.use_custom_source && self.custom_source_path.trim().is_empty() {
            errors.push("CustomSourcePath: field cannot be empty".to_string());
        }

        errors
    }
}

/// 네트워크 공유 접속 계정
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// 사용자 이름이 비어 있으면 `None`
    pub fn from_parts(username: &str, password: &str) -> Option<Self> {
        if username.trim().is_empty() {
            return None;
        }
        Some(Self {
            username: username.trim().to_string(),
            password: password.to_string(),
        })
    }
}

// 비밀번호가 로그에 남지 않도록 직접 구현
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 아카이브 검색 위치
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    /// 준비된 광학 드라이브의 루트
    OpticalDrives,
    /// 지정 폴더
    Folder(PathBuf),
}

/// 보조 대상 경로
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryTarget {
    pub path: PathBuf,
    pub credentials: Option<Credentials>,
}

/// 대상 경로 (실행마다 `UpdateConfig`에서 새로 생성)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub path: PathBuf,
    /// 상태 메시지 표시용
    pub label: String,
    pub credentials: Option<Credentials>,
}

/// 실행 설정 (실행 중 불변)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateConfig {
    pub mask: String,
    pub primary: PathBuf,
    pub secondary: Option<SecondaryTarget>,
    pub source: ArchiveSource,
}

impl UpdateConfig {
    /// 설정을 검증하고 실행 설정으로 변환
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let errors = settings.validate();
        if !errors.is_empty() {
            return Err(UpdateError::Config(errors.join("; ")));
        }

        let secondary = settings.use_secondary_path.then(|| SecondaryTarget {
            path: PathBuf::from(settings.secondary_network_path.trim()),
            credentials: Credentials::from_parts(
                &settings.secondary_username,
                &settings.secondary_password,
            ),
        });

        let source = if settings.use_custom_source {
            ArchiveSource::Folder(PathBuf::from(settings.custom_source_path.trim()))
        } else {
            ArchiveSource::OpticalDrives
        };

        Ok(Self {
            mask: settings.archive_name.trim().to_string(),
            primary: PathBuf::from(settings.network_path.trim()),
            secondary,
            source,
        })
    }

    /// 활성화된 대상 목록 (주 경로 → 보조 경로 순서)
    pub fn destinations(&self) -> Vec<Destination> {
        let mut targets = vec![Destination {
            path: self.primary.clone(),
            label: PRIMARY_LABEL.to_string(),
            credentials: None,
        }];
        if let Some(secondary) = &self.secondary {
            targets.push(Destination {
                path: secondary.path.clone(),
                label: SECONDARY_LABEL.to_string(),
                credentials: secondary.credentials.clone(),
            });
        }
        targets
    }
}
