// Formatters - 전송 크기, 로그 타임스탬프 포맷팅

use chrono::{DateTime, Local, NaiveDateTime};

/// 로그 타임스탬프 형식 (`2026-02-08 14:30:05`)
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 바이트 수를 읽기 쉬운 형식으로 포맷팅 (숫자와 단위 사이 공백)
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        0 => "0 B".to_string(),
        b if b < KB => format!("{} B", b),
        b if b < MB => format!("{:.1} KB", b as f64 / KB as f64),
        b if b < GB => format!("{:.1} MB", b as f64 / MB as f64),
        b => format!("{:.1} GB", b as f64 / GB as f64),
    }
}

/// 복사 진행 표시 (`1.5 MB / 3.0 MB`)
pub fn format_transfer(done: u64, total: u64) -> String {
    format!("{} / {}", format_file_size(done), format_file_size(total))
}

/// 로그 라인 앞에 붙는 타임스탬프
pub fn format_log_timestamp(time: DateTime<Local>) -> String {
    time.format(LOG_TIMESTAMP_FORMAT).to_string()
}

/// `<timestamp> - <message>` 로그 라인에서 타임스탬프 파싱
///
/// 형식이 맞지 않으면 `None` (여러 줄 메시지의 연속 라인 등)
pub fn parse_log_timestamp(line: &str) -> Option<NaiveDateTime> {
    let (stamp, _) = line.split_once(" - ")?;
    NaiveDateTime::parse_from_str(stamp.trim(), LOG_TIMESTAMP_FORMAT).ok()
}

/// 개수에 따라 단수/복수형 반환
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
