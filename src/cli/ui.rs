use super::app::{App, Focus};
use crowdconsole::schema::FieldKind;
use crowdconsole::{EntityKind, NoticeLevel};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Tabs, Wrap},
};

pub fn draw(f: &mut Frame, app: &mut App) {
    if app.session.is_none() {
        draw_sign_in(f, app);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(5),    // Form + table
            Constraint::Length(1), // Status line
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    draw_form(f, app, body[0]);
    draw_table(f, app, body[1]);
    draw_status(f, app, chunks[2]);

    if let Some(editor) = &app.editor {
        let height = if editor.kind.is_multiline() { 10 } else { 3 };
        let area = centered_rect(60, height, f.area());
        f.render_widget(Clear, area);
        f.render_widget(&editor.textarea, area);
    }

    if app.console.pending_delete().is_some() {
        draw_modal(
            f,
            " Confirm ",
            "Are you sure you want to delete this record?\n\n[y] Delete   [n] Keep",
            Color::Yellow,
        );
    } else if let Some(notice) = app.console.notice() {
        let (title, color) = match notice.level {
            NoticeLevel::Success => (" Success ", Color::Green),
            NoticeLevel::Error => (" Error ", Color::Red),
        };
        let text = format!("{}\n\n[Enter] OK", notice.message);
        draw_modal(f, title, &text, color);
    }
}

fn focused_block(title: String, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = EntityKind::ALL
        .iter()
        .enumerate()
        .map(|(i, kind)| Line::from(format!("{} {}", i + 1, kind.title())))
        .collect();

    let tabs = Tabs::new(titles)
        .block(focused_block(" CrowdConsole ".to_string(), app.focus == Focus::Tabs))
        .select(app.console.active_kind().index())
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_form(f: &mut Frame, app: &App, area: Rect) {
    let fields = app.console.form().fields();

    let items: Vec<ListItem> = fields
        .iter()
        .map(|field| {
            let shown = match field.kind {
                FieldKind::Password => "\u{2022}".repeat(field.text.chars().count()),
                FieldKind::Select { .. } => format!("< {} >", field.text),
                FieldKind::Flag => {
                    let mark = if field.text == "true" { "x" } else { " " };
                    format!("[{}]", mark)
                }
                _ => field.text.replace('\n', " "),
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{}: ", field.label),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(shown),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    if app.focus == Focus::Form && !fields.is_empty() {
        state.select(Some(app.field_index.min(fields.len() - 1)));
    }

    let title = format!(" {} ", app.console.heading());
    let list = List::new(items)
        .block(focused_block(title, app.focus == Focus::Form))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, &mut state);
}

fn draw_table(f: &mut Frame, app: &mut App, area: Rect) {
    let listing = app.console.listing();
    let block = focused_block(
        format!(" {} ", app.console.active_kind().title()),
        app.focus == Focus::Table,
    );

    if listing.is_empty() {
        let empty = Paragraph::new("No records yet.")
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(
        listing
            .columns
            .iter()
            .map(|column| Cell::from(column.label.clone())),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = listing
        .rows
        .iter()
        .map(|row| Row::new(row.cells.iter().map(|cell| Cell::from(cell.clone()))));

    let widths = vec![Constraint::Fill(1); listing.columns.len().max(1)];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let line = match app.busy {
        Some(label) => Line::from(Span::styled(
            label,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        None => {
            let admin = app
                .session
                .as_ref()
                .map(|session| session.admin_name())
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(format!(" {} ", admin), Style::default().fg(Color::Cyan)),
                Span::raw(
                    "1-4 tabs | Tab focus | Enter edit field | Ctrl+S save | e/d edit/delete | r refresh | Esc cancel/quit",
                ),
            ])
        }
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_sign_in(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 11, f.area());
    f.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let title = Paragraph::new(Span::styled(
        "Admin Sign In",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    f.render_widget(&app.sign_in.admin_name, chunks[1]);
    f.render_widget(&app.sign_in.password, chunks[2]);

    let status = match (&app.busy, &app.sign_in.error) {
        (Some(label), _) => Span::styled(*label, Style::default().fg(Color::Yellow)),
        (None, Some(error)) => Span::styled(error.clone(), Style::default().fg(Color::Red)),
        (None, None) => Span::raw(""),
    };
    f.render_widget(Paragraph::new(status).alignment(Alignment::Center), chunks[3]);

    let hint = Paragraph::new("Tab switch field | Enter sign in | Esc quit")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(hint, chunks[4]);
}

fn draw_modal(f: &mut Frame, title: &str, text: &str, color: Color) {
    let area = centered_rect(50, 7, f.area());
    f.render_widget(Clear, area);

    let modal = Paragraph::new(text.to_string())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(title.to_string()),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(modal, area);
}

/// Rect of `percent_x` width and `height` rows, centred in `r`.
fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height.min(r.height)),
            Constraint::Fill(1),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
