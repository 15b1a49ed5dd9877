mod app;
mod core;
mod models;
mod system;
mod ui;
mod utils;

use anyhow::{Context, Result};
use app::{log_dir_for, App};
use core::actions::{find_action, generate_command_bar_items};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use models::Settings;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Terminal,
};
use std::io;
use std::time::Duration;
use ui::{CommandBar, ProgressPanel, StatusBar};
use utils::logging::{self, UpdateLog, JOURNAL_RETENTION_DAYS};

fn main() -> Result<()> {
    let log_dir = log_dir_for(&Settings::default_path());
    logging::init(&log_dir)
        .with_context(|| format!("cannot open log directory {}", log_dir.display()))?;
    let journal = UpdateLog::in_dir(&log_dir);
    match journal.prune_older_than(JOURNAL_RETENTION_DAYS) {
        Ok(0) => {}
        Ok(removed) => {
            tracing::info!(removed, path = %journal.path().display(), "old update log entries pruned")
        }
        Err(e) => {
            tracing::warn!(path = %journal.path().display(), error = %e, "update log pruning failed")
        }
    }

    // Create app (설정 파일 오류는 터미널 전환 전에 보고)
    let mut app = App::new().context("failed to load settings")?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| render_main_ui(f, app))?;

        // 업데이트 중에는 짧은 타임아웃으로 진행 상태 반영
        let poll_timeout = if app.is_updating() {
            Duration::from_millis(50)
        } else {
            Duration::from_millis(100)
        };

        // Handle events (작업 중에도 ESC 키 처리 가능)
        if event::poll(poll_timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = find_action(key.modifiers, key.code) {
                        app.execute_action(action);
                    }
                }
            }
        }

        app.process_update_events();
        app.clear_expired_toast();

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

fn render_main_ui(f: &mut ratatui::Frame<'_>, app: &App) {
    let theme = &app.theme;
    let [title_area, panel_area, toast_area, status_area, command_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(8),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(f.area());

    let title = Paragraph::new(Line::from(Span::styled(
        format!(" AV Update  [{}]", app.settings_path().display()),
        Style::default()
            .fg(theme.title_bar_fg.to_color())
            .add_modifier(Modifier::BOLD),
    )))
    .style(Style::default().bg(theme.title_bar_bg.to_color()));
    f.render_widget(title, title_area);

    let panel = ProgressPanel::new(&app.destinations)
        .archive(app.archive_name.as_deref())
        .current_target(app.current_target.as_deref())
        .percent(app.percent)
        .theme(theme);
    f.render_widget(panel, panel_area);

    if let Some(message) = app.toast_display() {
        let toast = Paragraph::new(format!(" {}", message)).style(
            Style::default()
                .fg(theme.warning.to_color())
                .bg(theme.bg_primary.to_color()),
        );
        f.render_widget(toast, toast_area);
    }

    let status_bar = StatusBar::new()
        .status(&app.status_message)
        .phase(app.phase.name())
        .percent(app.percent)
        .theme(theme);
    f.render_widget(status_bar, status_area);

    let command_bar = CommandBar::new()
        .commands(generate_command_bar_items(app.is_updating()))
        .theme(theme);
    f.render_widget(command_bar, command_area);
}
