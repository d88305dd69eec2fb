use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use crate::form::{FieldKind, Form};
use crate::players_view::PLAYER_COLUMNS;
use crate::reports::Report;
use crate::router::Section;
use crate::state::{AppState, Content, FormMode, FormPane};
use crate::statistics_view::{STATISTICS_COLUMNS, row_cells};

pub fn render(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match state.section() {
        Section::Login => render_form(frame, chunks[1], "Login", &state.login_form),
        Section::Register => render_form(frame, chunks[1], "Register", &state.register_form),
        Section::Dashboard => render_dashboard(frame, chunks[1], state),
        Section::AddPlayer | Section::EditPlayer => render_player_form(frame, chunks[1], state),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(state)).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    let area = frame.size();
    if let Some(confirm) = &state.confirm {
        render_modal(frame, area, "Confirm", &format!("{}\n\n[y] Yes   [n] No", confirm.message));
    } else if let Some(notice) = state.current_notice() {
        render_modal(frame, area, "Notice", &format!("{notice}\n\n[Enter] OK"));
    }
    if state.help_overlay {
        render_help_overlay(frame, area);
    }
}

pub fn header_text(state: &AppState) -> String {
    let backend = if state.backend_label.is_empty() {
        String::new()
    } else {
        format!(" | {}", state.backend_label)
    };
    let line1 = format!("ACADEMY ROSTER | {}{backend}", state.section().title());
    let line2 = state.header_line();
    format!("{line1}\n{line2}")
}

pub fn footer_text(state: &AppState) -> &'static str {
    match state.section() {
        Section::Login => "Tab/↑/↓ Field | Enter Sign in | F2 Register | Ctrl+C Quit",
        Section::Register => "Tab/↑/↓ Field | Enter Create account | F2 Login | Ctrl+C Quit",
        Section::Dashboard if state.search_active => "Type to filter | Enter/Esc Done | Backspace Erase",
        Section::Dashboard => {
            "p Players | a Add | s Stats | e Edit | d Delete | / Search | t/g Filter | b/i Reports | o Logout | ? Help | q Quit"
        }
        Section::AddPlayer => "Tab/↑/↓ Field | ←/→ Choose | Enter Save | Esc Back | Ctrl+C Quit",
        Section::EditPlayer => {
            "Tab/↑/↓ Field | ←/→ Choose | Space Toggle | Enter Save | Esc Back | Ctrl+C Quit"
        }
    }
}

fn render_form(frame: &mut Frame, area: Rect, title: &str, form: &Form) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let paragraph = Paragraph::new(form_lines(form)).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn form_lines(form: &Form) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(form.fields.len() + 2);
    for (idx, field) in form.fields.iter().enumerate() {
        let focused = idx == form.focus;
        let marker = if focused { "> " } else { "  " };
        let value = match &field.kind {
            FieldKind::Select { .. } => format!("< {} >", field.display_value()),
            _ => field.display_value(),
        };
        let style = if focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{:<16}", field.label), style),
            Span::raw(value),
        ]));
    }
    if let Some(err) = &form.error {
        lines.push(Line::raw(""));
        lines.push(Line::styled(err.clone(), Style::default().fg(Color::Red)));
    }
    lines
}

fn render_player_form(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = match &state.form_mode {
        FormMode::Add => "Add Player",
        FormMode::Edit { .. } => "Edit Player",
    };
    match &state.player_form {
        FormPane::Loading => render_message(frame, area, title, "Loading form..."),
        FormPane::Failed(message) => render_message(frame, area, title, message),
        FormPane::Ready(form) => render_form(frame, area, title, form),
    }
}

fn render_message(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let paragraph = Paragraph::new(message.to_string())
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_dashboard(frame: &mut Frame, area: Rect, state: &AppState) {
    match &state.content {
        Content::Idle => render_message(frame, area, "Dashboard", ""),
        Content::Loading(message) => render_message(frame, area, "Dashboard", message),
        Content::Message(message) => render_message(frame, area, "Dashboard", message),
        Content::Players(_) => render_players(frame, area, state),
        Content::Statistics(rows) => render_statistics(frame, area, rows),
        Content::Report(report) => render_report(frame, area, report),
    }
}

/// Search bar text: the name query plus any active filters.
pub fn filter_text(state: &AppState) -> String {
    let kind = state.type_filter.map_or("All", |t| t.label());
    let group = state.group_filter.as_deref().unwrap_or("All");
    format!("Search: {}   Type: {kind}   Age Group: {group}", state.search)
}

fn render_players(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let search_style = if state.search_active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let search = Paragraph::new(filter_text(state)).style(search_style);
    frame.render_widget(search, sections[0]);

    let header = Row::new(PLAYER_COLUMNS.map(Cell::from))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = state
        .visible_players()
        .into_iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.name.clone()),
                Cell::from(row.player_type.clone()),
                Cell::from(row.age_group.clone()),
                Cell::from(row.jersey.clone()),
                Cell::from("[e] Edit  [d] Delete"),
            ])
        })
        .collect();
    let empty = rows.is_empty();
    let widths = [
        Constraint::Min(20),
        Constraint::Length(6),
        Constraint::Length(14),
        Constraint::Length(9),
        Constraint::Length(22),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title("Players").borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::DarkGray));
    let mut table_state = TableState::default();
    if !empty {
        table_state.select(Some(state.selected));
    }
    frame.render_stateful_widget(table, sections[1], &mut table_state);
}

fn render_statistics(frame: &mut Frame, area: Rect, rows: &[crate::model::AgeGroupStats]) {
    let header = Row::new(STATISTICS_COLUMNS.map(Cell::from))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let body: Vec<Row> = rows
        .iter()
        .map(|stats| {
            let net_style = if stats.net() < 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Green)
            };
            let cells = row_cells(stats);
            Row::new(
                cells
                    .into_iter()
                    .enumerate()
                    .map(|(idx, text)| {
                        let cell = Cell::from(text);
                        if idx == 3 { cell.style(net_style) } else { cell }
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    let mut widths = [Constraint::Length(12); 8];
    widths[0] = Constraint::Min(14);
    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().title("Statistics").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_report(frame: &mut Frame, area: Rect, report: &Report) {
    let columns = report.kind.columns();
    let header = Row::new(columns.iter().copied().map(Cell::from).collect::<Vec<_>>())
        .style(Style::default().add_modifier(Modifier::BOLD));
    let body: Vec<Row> = report
        .rows
        .iter()
        .map(|row| Row::new(report.cells(row).into_iter().map(Cell::from).collect::<Vec<_>>()))
        .collect();
    let mut widths = vec![Constraint::Length(14); columns.len()];
    widths[0] = Constraint::Min(20);
    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().title(report.kind.title()).borders(Borders::ALL));
    frame.render_widget(table, area);
}

pub fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No activity yet".to_string();
    }
    let skip = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_modal(frame: &mut Frame, area: Rect, title: &str, text: &str) {
    let popup_area = centered_rect(50, 30, area);
    frame.render_widget(Clear, popup_area);
    let modal = Paragraph::new(text.to_string())
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(modal, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Academy Roster - Help",
        "",
        "Login / Register:",
        "  Tab / ↓      Next field",
        "  Shift+Tab/↑  Previous field",
        "  Enter        Submit",
        "  F2           Switch login/register",
        "",
        "Dashboard:",
        "  p / s        Players / Statistics",
        "  a            Add player",
        "  j/k or ↑/↓   Move",
        "  e / d        Edit / Delete selected",
        "  /            Search by name",
        "  t / g        Cycle type / age group filter",
        "  b            Birthdays this month",
        "  i / I        IDP meetings Sep / Apr",
        "  o            Logout",
        "",
        "Player form:",
        "  ←/→          Choose option",
        "  Space        Toggle flag (edit)",
        "  Esc          Back to players",
        "",
        "  ?            Toggle help",
        "  q / Ctrl+C   Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
