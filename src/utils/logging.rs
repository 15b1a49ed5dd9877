//! 로깅
//!
//! - `init()` : `tracing` 구독자 설정. TUI 화면을 깨뜨리지 않도록 stderr 대신
//!   설정 디렉토리의 `avupdate.trace.log`에 기록한다. `RUST_LOG`로 레벨 조정.
//! - `UpdateLog` : 사람이 읽는 작업 기록 (`<timestamp> - <message>`), 실행 시작/단계
//!   전환/오류/완료를 한 줄씩 추가한다.

use crate::utils::formatter::{format_log_timestamp, parse_log_timestamp};
use chrono::{Duration, Local, NaiveDateTime};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const TRACE_FILE_NAME: &str = "avupdate.trace.log";
pub const JOURNAL_FILE_NAME: &str = "update.log";

/// 기록 보존 기간 (일)
pub const JOURNAL_RETENTION_DAYS: i64 = 30;

/// tracing 구독자 초기화 (앱 시작 시 1회)
pub fn init(log_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(log_dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(TRACE_FILE_NAME))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("avupdate=debug")
        } else {
            EnvFilter::new("avupdate=info")
        }
    });

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true),
    );

    // 이미 설정된 경우 무시
    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(())
}

/// 작업 기록 파일
#[derive(Debug, Clone)]
pub struct UpdateLog {
    path: PathBuf,
}

impl UpdateLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// 설정 디렉토리 기준 기본 위치
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(JOURNAL_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 한 줄 추가. 기록 실패가 작업을 중단시키지 않도록 오류는 tracing으로만 남긴다.
    pub fn append(&self, message: &str) {
        if let Err(e) = self.try_append(message) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write update log");
        }
    }

    fn try_append(&self, message: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{} - {}", format_log_timestamp(Local::now()), message)
    }

    /// `cutoff`보다 오래된 항목 삭제
    ///
    /// 타임스탬프가 없는 줄은 직전 항목에 속한 것으로 보고 함께 유지/삭제한다.
    /// 반환값: 삭제된 줄 수
    pub fn prune_before(&self, cutoff: NaiveDateTime) -> io::Result<usize> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut kept = String::with_capacity(content.len());
        let mut removed = 0usize;
        let mut keep_current = true;
        for line in content.lines() {
            if let Some(stamp) = parse_log_timestamp(line) {
                keep_current = stamp >= cutoff;
            }
            if keep_current {
                kept.push_str(line);
                kept.push('\n');
            } else {
                removed += 1;
            }
        }

        if removed > 0 {
            fs::write(&self.path, kept)?;
        }
        Ok(removed)
    }

    /// 보존 기간(30일)이 지난 항목 삭제
    pub fn prune_older_than(&self, days: i64) -> io::Result<usize> {
        let cutoff = Local::now().naive_local() - Duration::days(days);
        self.prune_before(cutoff)
    }
}
