//! 업데이트 진행 패널
//!
//! 아카이브/현재 대상 줄, 진행률 게이지, 대상 목록을 그린다.

use crate::models::{DestinationOutcome, DestinationView};
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};

pub struct ProgressPanel<'a> {
    archive: Option<&'a str>,
    current_target: Option<&'a str>,
    percent: u8,
    destinations: &'a [DestinationView],
    theme: Theme,
}

impl<'a> ProgressPanel<'a> {
    pub fn new(destinations: &'a [DestinationView]) -> Self {
        Self {
            archive: None,
            current_target: None,
            percent: 0,
            destinations,
            theme: Theme::dark(),
        }
    }

    /// 찾은 아카이브 이름
    pub fn archive(mut self, archive: Option<&'a str>) -> Self {
        self.archive = archive;
        self
    }

    /// 처리 중인 대상 (`<label> path: <path>`)
    pub fn current_target(mut self, target: Option<&'a str>) -> Self {
        self.current_target = target;
        self
    }

    pub fn percent(mut self, percent: u8) -> Self {
        self.percent = percent.min(100);
        self
    }

    pub fn theme(mut self, theme: &Theme) -> Self {
        self.theme = theme.clone();
        self
    }

    fn destination_line(&self, view: &DestinationView) -> Line<'static> {
        let (mark, mark_color) = match view.reachable {
            Some(true) => ("●", self.theme.success.to_color()),
            Some(false) => ("●", self.theme.error.to_color()),
            None => ("○", self.theme.fg_dim.to_color()),
        };
        let outcome = match view.last_outcome {
            Some(DestinationOutcome::Success) => {
                Span::styled(" Success", Style::default().fg(self.theme.success.to_color()))
            }
            Some(DestinationOutcome::Cancelled) => {
                Span::styled(" Cancelled", Style::default().fg(self.theme.warning.to_color()))
            }
            Some(other) => Span::styled(
                format!(" {}", other.name()),
                Style::default().fg(self.theme.error.to_color()),
            ),
            None => Span::raw(""),
        };

        Line::from(vec![
            Span::styled(format!(" {} ", mark), Style::default().fg(mark_color)),
            Span::styled(
                format!("{:<10}", view.label),
                Style::default()
                    .fg(self.theme.fg_primary.to_color())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                view.path.display().to_string(),
                Style::default().fg(self.theme.fg_primary.to_color()),
            ),
            outcome,
        ])
    }
}

impl Widget for ProgressPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let fg = self.theme.fg_primary.to_color();
        let dim = self.theme.fg_dim.to_color();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.panel_border.to_color()))
            .style(Style::default().bg(self.theme.bg_primary.to_color()));
        let inner = block.inner(area);
        block.render(area, buf);

        let [archive_area, target_area, _, gauge_area, _, list_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .areas(inner);

        let archive_text = format!(" Archive: {}", self.archive.unwrap_or("-"));
        Paragraph::new(archive_text)
            .style(Style::default().fg(fg))
            .render(archive_area, buf);

        let target_text = format!(" {}", self.current_target.unwrap_or(""));
        Paragraph::new(target_text)
            .style(Style::default().fg(dim))
            .render(target_area, buf);

        let gauge_area = Rect {
            x: gauge_area.x + 1,
            width: gauge_area.width.saturating_sub(2),
            ..gauge_area
        };
        Gauge::default()
            .gauge_style(
                Style::default()
                    .fg(self.theme.progress_color(self.percent))
                    .bg(Color::Reset),
            )
            .percent(u16::from(self.percent))
            .label(format!("{}%", self.percent))
            .render(gauge_area, buf);

        let lines: Vec<Line> = self
            .destinations
            .iter()
            .map(|view| self.destination_line(view))
            .collect();
        Paragraph::new(lines).render(list_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .filter_map(|x| buf.cell((x, y)).map(|cell| cell.symbol().to_string()))
            .collect()
    }

    #[test]
    fn test_progress_panel_renders_lines() {
        let mut primary = DestinationView::new("Primary", PathBuf::from("/srv/dest1"));
        primary.reachable = Some(true);
        primary.last_outcome = Some(DestinationOutcome::Success);
        let secondary = DestinationView::new("Secondary", PathBuf::from("/srv/dest2"));
        let views = vec![primary, secondary];

        let area = Rect::new(0, 0, 60, 10);
        let mut buf = Buffer::empty(area);
        ProgressPanel::new(&views)
            .archive(Some("update_v3.zip"))
            .current_target(Some("Primary path: /srv/dest1"))
            .percent(55)
            .render(area, &mut buf);

        assert!(row_text(&buf, 1).contains("Archive: update_v3.zip"));
        assert!(row_text(&buf, 2).contains("Primary path: /srv/dest1"));
        assert!(row_text(&buf, 4).contains("55%"));
        assert!(row_text(&buf, 6).contains("/srv/dest1 Success"));
        assert!(row_text(&buf, 7).contains("/srv/dest2"));
    }

    #[test]
    fn test_gauge_uses_progress_colour() {
        let views = Vec::new();
        let area = Rect::new(0, 0, 30, 8);
        let mut buf = Buffer::empty(area);
        let theme = Theme::dark();
        ProgressPanel::new(&views)
            .percent(90)
            .theme(&theme)
            .render(area, &mut buf);

        // 게이지 첫 칸은 채워진 상태
        let cell = buf.cell((2, 4)).unwrap();
        assert_eq!(cell.fg, theme.progress_color(90));
    }
}
