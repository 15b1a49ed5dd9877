// Status bar component - 상태바 컴포넌트
//
// 상태 문구와 현재 단계/진행률 표시

use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// 상태바 컴포넌트
pub struct StatusBar<'a> {
    /// 상태 문구
    status: &'a str,
    /// 현재 단계 이름
    phase: &'a str,
    /// 진행률
    percent: u8,
    bg_color: Color,
    fg_color: Color,
    dim_color: Color,
}

impl<'a> Default for StatusBar<'a> {
    fn default() -> Self {
        Self {
            status: "",
            phase: "Idle",
            percent: 0,
            bg_color: Color::Rgb(30, 30, 30),
            fg_color: Color::Rgb(212, 212, 212),
            dim_color: Color::Rgb(100, 100, 100),
        }
    }
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: &'a str) -> Self {
        self.status = status;
        self
    }

    pub fn phase(mut self, phase: &'a str) -> Self {
        self.phase = phase;
        self
    }

    pub fn percent(mut self, percent: u8) -> Self {
        self.percent = percent;
        self
    }

    /// 테마 적용
    pub fn theme(mut self, theme: &Theme) -> Self {
        self.bg_color = theme.status_bar_bg.to_color();
        self.fg_color = theme.status_bar_fg.to_color();
        self.dim_color = theme.title_bar_fg.to_color();
        self
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(self.bg_color));

        let left_info = format!(" {}", self.status);
        let right_info = format!("[{} {}%] ", self.phase, self.percent);

        let left_len = left_info.chars().count();
        let right_len = right_info.chars().count();
        let padding_len = (area.width as usize).saturating_sub(left_len + right_len);

        let spans = vec![
            Span::styled(left_info, Style::default().fg(self.fg_color)),
            Span::raw(" ".repeat(padding_len)),
            Span::styled(right_info, Style::default().fg(self.dim_color)),
        ];

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
