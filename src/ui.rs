use crate::{
    app::{App, DialogChoice, InputMode, LogLevel, ToastLevel},
    config::ThemeKind,
    store::Entry,
};
use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Padding, Paragraph},
};
use std::{
    io,
    time::{Duration, Instant},
};
use time::{format_description::BorrowedFormatItem, macros::format_description};

const LOG_TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

#[derive(Clone)]
struct Theme {
    accent: Color,
    accent_soft: Color,
    border: Color,
    text: Color,
    muted: Color,
    warning: Color,
    error: Color,
    panel_bg: Color,
    header_bg: Color,
    log_bg: Color,
}

impl Theme {
    fn new(kind: ThemeKind) -> Self {
        match kind {
            ThemeKind::Dark => Self {
                accent: Color::Rgb(255, 209, 0),
                accent_soft: Color::Rgb(102, 85, 68),
                border: Color::Rgb(58, 49, 42),
                text: Color::Rgb(255, 209, 0),
                muted: Color::Rgb(128, 128, 128),
                warning: Color::Rgb(230, 160, 60),
                error: Color::Rgb(235, 100, 95),
                panel_bg: Color::Rgb(46, 42, 38),
                header_bg: Color::Rgb(30, 27, 24),
                log_bg: Color::Rgb(30, 27, 24),
            },
            ThemeKind::Light => Self {
                accent: Color::Rgb(26, 14, 0),
                accent_soft: Color::Rgb(196, 183, 156),
                border: Color::Rgb(221, 212, 192),
                text: Color::Rgb(26, 14, 0),
                muted: Color::Rgb(128, 128, 128),
                warning: Color::Rgb(170, 100, 10),
                error: Color::Rgb(180, 40, 35),
                panel_bg: Color::Rgb(255, 255, 255),
                header_bg: Color::Rgb(246, 242, 233),
                log_bg: Color::Rgb(246, 242, 233),
            },
        }
    }

    fn block(&self, title: &'static str) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.border))
            .title(Span::styled(
                title,
                Style::default()
                    .fg(self.accent)
                    .add_modifier(Modifier::BOLD),
            ))
    }

    fn panel(&self, title: &'static str) -> Block<'static> {
        self.block(title).padding(Padding {
            left: 1,
            right: 1,
            top: 0,
            bottom: 0,
        })
    }
}

pub fn run(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    save_after_failure(app, result)
}

/// Keeps the list on disk when the event loop bails out, then reports the loop error.
fn save_after_failure(app: &mut App, result: Result<()>) -> Result<()> {
    if result.is_err() {
        if let Err(err) = app.save_mounts() {
            app.log_error(format!("Save after failure: {err}"));
        }
    }
    result
}

fn run_loop(terminal: &mut Terminal<impl Backend>, app: &mut App) -> Result<()> {
    loop {
        app.tick();
        app.clamp_selection();
        terminal.draw(|frame| draw(frame, app))?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(200))? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
                Event::Paste(text) => handle_paste(app, &text),
                _ => {}
            }
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if app.dialog.is_some() {
        handle_dialog_mode(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing { .. } => handle_input_mode(app, key),
    }
}

fn handle_dialog_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') => app.dialog_choice_left(),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('L') | KeyCode::Tab => {
            app.dialog_choice_right()
        }
        KeyCode::Char('y') | KeyCode::Char('Y') => app.dialog_set_choice(DialogChoice::Yes),
        KeyCode::Char('n') | KeyCode::Char('N') => app.dialog_set_choice(DialogChoice::No),
        KeyCode::Enter | KeyCode::Char(' ') => app.dialog_confirm(),
        KeyCode::Esc => {
            app.dialog_set_choice(DialogChoice::No);
            app.dialog_confirm();
        }
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), mods) if mods.contains(KeyModifiers::CONTROL) => app.request_quit(),
        (KeyCode::Char('q'), _) | (KeyCode::Char('Q'), _) => app.request_quit(),
        (KeyCode::Char('a'), _) | (KeyCode::Char('A'), _) => app.enter_add_mode(),
        (KeyCode::Char('o'), _)
        | (KeyCode::Char('O'), _)
        | (KeyCode::Char(' '), _)
        | (KeyCode::Enter, _) => {
            if let Err(err) = app.mark_selected_obtained() {
                app.report_error("Mark obtained", &err);
            }
        }
        (KeyCode::Char('x'), _)
        | (KeyCode::Char('X'), _)
        | (KeyCode::Delete, _)
        | (KeyCode::Backspace, _) => {
            if let Err(err) = app.request_remove() {
                app.report_error("Remove", &err);
            }
        }
        (KeyCode::Char('r'), _) | (KeyCode::Char('R'), _) => app.reset_all(),
        (KeyCode::Char('t'), _) | (KeyCode::Char('T'), _) => {
            if let Err(err) = app.toggle_theme() {
                app.log_warn(format!("Theme not saved: {err}"));
            }
        }
        (KeyCode::Char('s'), _) | (KeyCode::Char('S'), _) => {
            if let Err(err) = app.save_mounts() {
                app.report_error("Save", &err);
            }
        }
        (KeyCode::Char('l'), _) | (KeyCode::Char('L'), _) => app.load_mounts(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.move_up(),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.move_down(),
        (KeyCode::Home, _) | (KeyCode::Char('g'), _) => app.select_first(),
        (KeyCode::End, _) | (KeyCode::Char('G'), _) => app.select_last(),
        (KeyCode::PageUp, _) => app.scroll_log_up(3),
        (KeyCode::PageDown, _) => app.scroll_log_down(3),
        _ => {}
    }
}

fn handle_input_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_input(),
        KeyCode::Enter => {
            if let Err(err) = app.submit_input() {
                app.report_error("Add mount", &err);
            }
        }
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL)
                || key.modifiers.contains(KeyModifiers::ALT)
            {
                return;
            }
            app.input_push(c);
        }
        KeyCode::Backspace => app.input_pop(),
        _ => {}
    }
}

fn handle_paste(app: &mut App, text: &str) {
    if !matches!(app.input_mode, InputMode::Editing { .. }) {
        return;
    }
    let line = text.lines().next().unwrap_or_default();
    for ch in line.chars() {
        app.input_push(ch);
    }
}

fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.size();
    let theme = Theme::new(app.theme());
    frame.render_widget(Block::default().style(Style::default().bg(theme.header_bg)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(7),
        ])
        .split(area);

    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                "Mount Tracker",
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                app.mounts_path.display().to_string(),
                Style::default().fg(theme.muted),
            ),
        ]),
        Line::from(vec![
            Span::styled("Mounts: ", Style::default().fg(theme.muted)),
            Span::styled(app.store.len().to_string(), Style::default().fg(theme.text)),
            Span::raw("   "),
            Span::styled("Obtained: ", Style::default().fg(theme.muted)),
            Span::styled(
                app.store.obtained_count().to_string(),
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled("Theme: ", Style::default().fg(theme.muted)),
            Span::styled(app.theme().label(), Style::default().fg(theme.text)),
        ]),
    ])
    .style(Style::default().bg(theme.header_bg))
    .alignment(Alignment::Center);
    frame.render_widget(header, chunks[0]);

    let list_block = theme.panel("Mounts").style(Style::default().bg(theme.panel_bg));
    if app.store.is_empty() {
        let empty = Paragraph::new("No mounts tracked yet. Press a to add one.")
            .style(Style::default().fg(theme.muted))
            .block(list_block)
            .alignment(Alignment::Center);
        frame.render_widget(empty, chunks[1]);
    } else {
        let items: Vec<ListItem> = app
            .store
            .list()
            .iter()
            .enumerate()
            .map(|(index, entry)| entry_item(index, entry, &theme))
            .collect();
        let list = List::new(items)
            .block(list_block)
            .highlight_style(
                Style::default()
                    .bg(theme.accent_soft)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">");
        let mut state = ListState::default();
        state.select(Some(app.selected));
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    let status_block = theme.panel("Status");
    let status_inner = status_block.inner(chunks[2]);
    let footer = Paragraph::new(status_bar_line(app, status_inner.width))
        .style(Style::default().fg(theme.text))
        .block(status_block);
    frame.render_widget(footer, chunks[2]);

    let log_block = theme.panel("Log").style(Style::default().bg(theme.log_bg));
    let log_inner = log_block.inner(chunks[3]);
    let log = Paragraph::new(build_log_lines(app, &theme, log_inner.height as usize))
        .style(Style::default().fg(theme.text).bg(theme.log_bg))
        .block(log_block);
    frame.render_widget(log, chunks[3]);

    if app.dialog.is_some() {
        draw_dialog(frame, app, &theme);
    }
    draw_toast(frame, app, &theme, chunks[1]);
}

fn entry_item(index: usize, entry: &Entry, theme: &Theme) -> ListItem<'static> {
    let style = if entry.obtained() {
        Style::default()
            .fg(theme.muted)
            .add_modifier(Modifier::DIM)
    } else {
        Style::default().fg(theme.text)
    };
    ListItem::new(Line::from(vec![
        Span::styled(format!("{:>3} ", index + 1), Style::default().fg(theme.muted)),
        Span::styled(entry.label().to_string(), style),
    ]))
}

fn status_bar_line(app: &App, width: u16) -> String {
    let width = width as usize;
    let (left, right) = match &app.input_mode {
        InputMode::Normal => (format!("Status: {}", app.status), app.hint().to_string()),
        InputMode::Editing { step, buffer, .. } => (
            format!("({}/4) {}: {buffer}", step.position(), step.prompt()),
            "Enter confirm | Esc cancel".to_string(),
        ),
    };

    if width == 0 {
        return String::new();
    }

    let left_len = left.chars().count();
    let right_len = right.chars().count();
    if left_len >= width {
        return left.chars().take(width).collect();
    }
    if left_len + right_len + 1 > width {
        let available = width.saturating_sub(left_len + 1);
        let trimmed_right: String = right.chars().take(available).collect();
        return format!("{left} {trimmed_right}");
    }

    let spaces = width - left_len - right_len;
    format!("{left}{}{right}", " ".repeat(spaces))
}

fn build_log_lines(app: &App, theme: &Theme, height: usize) -> Vec<Line<'static>> {
    if height == 0 {
        return Vec::new();
    }

    if app.logs.is_empty() {
        return vec![Line::from(Span::styled(
            "No recent events.",
            Style::default().fg(theme.muted),
        ))];
    }

    let total = app.logs.len();
    let view = height.max(1);
    let max_scroll = total.saturating_sub(view);
    let scroll = app.log_scroll.min(max_scroll);
    let start = total.saturating_sub(view + scroll);
    let end = (start + view).min(total);

    app.logs[start..end]
        .iter()
        .map(|entry| {
            let (label, color) = match entry.level {
                LogLevel::Info => ("[i]", theme.accent),
                LogLevel::Warn => ("[!]", theme.warning),
                LogLevel::Error => ("[x]", theme.error),
            };
            let stamp = entry.at.format(LOG_TIME_FORMAT).unwrap_or_default();
            Line::from(vec![
                Span::styled(stamp, Style::default().fg(theme.muted)),
                Span::raw(" "),
                Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw(" "),
                Span::styled(entry.message.clone(), Style::default().fg(theme.text)),
            ])
        })
        .collect()
}

fn draw_dialog(frame: &mut Frame<'_>, app: &App, theme: &Theme) {
    let Some(dialog) = &app.dialog else {
        return;
    };

    let area = frame.size();
    let message_lines: Vec<Line> = dialog
        .message
        .lines()
        .map(|line| Line::from(line.to_string()))
        .collect();
    let content_height = message_lines.len().max(1) as u16;
    let height = (content_height + 6).clamp(7, area.height.saturating_sub(2).max(7));
    let width = area.width.saturating_mul(2) / 3;
    let width = width.clamp(34, area.width.saturating_sub(2).max(34));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let dialog_area = Rect::new(x, y, width, height).intersection(area);

    let yes_selected = dialog.choice == DialogChoice::Yes;
    let yes_style = if yes_selected {
        Style::default()
            .fg(theme.header_bg)
            .bg(theme.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text)
    };
    let no_style = if !yes_selected {
        Style::default()
            .fg(theme.header_bg)
            .bg(theme.warning)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text)
    };

    let mut lines = vec![
        Line::from(Span::styled(
            dialog.title.clone(),
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(message_lines);
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw(" "),
        Span::styled(format!(" {} ", dialog.yes_label), yes_style),
        Span::raw("   "),
        Span::styled(format!(" {} ", dialog.no_label), no_style),
    ]));

    frame.render_widget(Clear, dialog_area);
    let dialog_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.accent_soft))
        .style(Style::default().bg(theme.header_bg));
    let dialog_widget = Paragraph::new(lines)
        .block(dialog_block)
        .style(Style::default().fg(theme.text))
        .alignment(Alignment::Center);
    frame.render_widget(dialog_widget, dialog_area);
}

fn draw_toast(frame: &mut Frame<'_>, app: &App, theme: &Theme, body_area: Rect) {
    if app.dialog.is_some() {
        return;
    }
    let Some(toast) = app.toast.as_ref() else {
        return;
    };
    if toast.expires_at <= Instant::now() {
        return;
    }

    let max_width = body_area.width.saturating_sub(4).max(24);
    let max_text = max_width.saturating_sub(4) as usize;
    let mut message: String = toast.message.chars().take(max_text).collect();
    if message.chars().count() < toast.message.chars().count() {
        message = message
            .chars()
            .take(max_text.saturating_sub(3))
            .collect::<String>()
            + "...";
    }
    let width = (message.chars().count() as u16 + 4).clamp(24, max_width);
    let x = body_area.x + (body_area.width.saturating_sub(width)) / 2;
    let y = body_area.y + 1;
    let toast_area = Rect::new(x, y, width, 3).intersection(frame.size());

    let border = match toast.level {
        ToastLevel::Info => theme.accent,
        ToastLevel::Warn => theme.warning,
        ToastLevel::Error => theme.error,
    };

    frame.render_widget(Clear, toast_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(theme.header_bg));
    let content = Paragraph::new(message)
        .block(block)
        .style(Style::default().fg(theme.text))
        .alignment(Alignment::Center);
    frame.render_widget(content, toast_area);
}
