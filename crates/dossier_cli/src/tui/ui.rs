use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Tabs, Wrap,
};

use super::state::{DashboardState, Mode, SyncFilter, Tab};

const HINTS: &str = "j/k move  Tab switch  / filter  f synced  ? help  q quit";

const HELP: &[(&str, &str)] = &[
    ("j / k, ↓ / ↑", "Select project"),
    ("Tab / Shift-Tab", "Switch tab"),
    ("/", "Filter by name or description"),
    ("f", "Cycle all / synced / unsynced"),
    ("1-4", "Docs up to summary, overview, detailed, technical"),
    ("s", "Sync the selected project from GitHub"),
    ("a", "Add a project (name, owner/repo or URL)"),
    ("d", "Delete the selected project"),
    ("c", "Add a component to the selected project"),
    ("n", "Start a delta on the selected project"),
    ("[ / ]", "Select delta"),
    (">", "Advance the selected delta"),
    ("r", "Reload"),
    ("q, Esc", "Quit"),
];

pub(super) fn draw(frame: &mut Frame, state: &DashboardState) {
    let [main, status] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());
    let [left, right] =
        Layout::horizontal([Constraint::Percentage(30), Constraint::Percentage(70)]).areas(main);

    draw_projects(frame, state, left);
    draw_detail(frame, state, right);
    draw_status(frame, state, status);
    if state.mode == Mode::Help {
        draw_help(frame, frame.area());
    }
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(HELP.len() as u16 + 2),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, popup, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(64),
        Constraint::Fill(1),
    ])
    .areas(middle);

    let lines: Vec<Line> = HELP
        .iter()
        .map(|(keys, what)| {
            Line::from(vec![
                Span::styled(format!("{keys:>16}  "), Style::default().fg(Color::Yellow)),
                Span::raw(*what),
            ])
        })
        .collect();
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Keys ")),
        popup,
    );
}

fn draw_projects(frame: &mut Frame, state: &DashboardState, area: Rect) {
    let visible = state.visible();
    let items: Vec<ListItem> = visible
        .iter()
        .map(|p| {
            let marker = if p.is_synced() { "● " } else { "  " };
            ListItem::new(format!("{marker}{}", p.name))
        })
        .collect();

    let scope = match state.sync_filter {
        SyncFilter::All => String::new(),
        other => format!(" {}", other.label()),
    };
    let title = if state.filter.is_empty() && state.mode != Mode::Filter {
        format!(" Projects ({}){scope} ", visible.len())
    } else {
        format!(" Projects ({}){scope} /{} ", visible.len(), state.filter)
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    let mut list_state = ListState::default();
    if !visible.is_empty() {
        list_state.select(Some(state.selected));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn draw_detail(frame: &mut Frame, state: &DashboardState, area: Rect) {
    let [header, tabs, body] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(1),
    ])
    .areas(area);

    let header_text = match state.detail.as_ref().and_then(|d| d.project.as_ref()) {
        Some(p) => {
            let mut facts = Vec::new();
            if let Some(language) = &p.github_language {
                facts.push(language.clone());
            }
            if let Some(stars) = p.github_stars {
                facts.push(format!("★ {stars}"));
            }
            if let Some(at) = p.last_synced_at {
                facts.push(format!("synced {}", at.format("%Y-%m-%d")));
            }
            Text::from(vec![
                Line::from(vec![
                    Span::styled(p.full_name(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(format!("  {}", facts.join("  "))),
                ]),
                Line::from(p.description.clone().unwrap_or_default()),
            ])
        }
        None => Text::from("No project selected"),
    };
    frame.render_widget(
        Paragraph::new(header_text).block(Block::default().borders(Borders::BOTTOM)),
        header,
    );

    let titles: Vec<&str> = Tab::ALL.iter().map(|t| t.title()).collect();
    frame.render_widget(
        Tabs::new(titles)
            .select(state.tab.index())
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        tabs,
    );

    if state.tab == Tab::Docs {
        draw_docs(frame, state, body);
        return;
    }
    let Some(table) = state.tab_table() else {
        return;
    };
    if table.rows.is_empty() {
        let hint = match state.tab {
            Tab::Deltas => "No open deltas. Press n to start one.",
            Tab::Components => "No components. Press c to add one.",
            _ => "Nothing recorded. Sync the project from GitHub to fill this tab.",
        };
        frame.render_widget(
            Paragraph::new(hint).block(Block::default().borders(Borders::TOP)),
            body,
        );
        return;
    }

    // Last column takes the remaining width.
    let columns = table.header.len();
    let widths: Vec<Constraint> = (0..columns)
        .map(|i| {
            if i + 1 == columns {
                Constraint::Min(10)
            } else {
                Constraint::Max(32)
            }
        })
        .collect();
    let header = Row::new(table.header.iter().map(|h| Cell::from(*h)))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = table.rows.into_iter().map(Row::new);
    frame.render_widget(
        Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::TOP)),
        body,
    );
}

fn draw_docs(frame: &mut Frame, state: &DashboardState, area: Rect) {
    let sections = state.visible_sections();
    let mut lines = Vec::new();
    for section in &sections {
        lines.push(Line::from(vec![
            Span::styled(
                section.title.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  [{} / {}]", section.level, section.section_type),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.extend(section.content.lines().map(|l| Line::from(l.to_string())));
        lines.push(Line::default());
    }
    if lines.is_empty() {
        lines.push(Line::from("No documentation at this level. Press 4 for all levels."));
    }

    let title = format!(" {} sections up to {} ", sections.len(), state.level);
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::TOP).title(title)),
        area,
    );
}

fn draw_status(frame: &mut Frame, state: &DashboardState, area: Rect) {
    let badge = |text: &'static str, color: Color| {
        Span::styled(text, Style::default().fg(Color::Black).bg(color))
    };
    let line = match &state.mode {
        Mode::Filter => Line::from(vec![
            badge(" FILTER ", Color::Yellow),
            Span::raw(format!(" /{}  (Enter keep, Esc clear)", state.filter)),
        ]),
        Mode::Input(prompt) => Line::from(vec![
            badge(" INPUT ", Color::Green),
            Span::raw(format!(" {}: {}▏  (Enter submit, Esc cancel)", prompt.label(), state.input)),
        ]),
        Mode::Confirm(name) => Line::from(vec![
            badge(" DELETE ", Color::Red),
            Span::raw(format!(" Delete {name} with its docs, links and metadata? (y/n)")),
        ]),
        Mode::Normal | Mode::Help => Line::from(vec![
            badge(" DOSSIER ", Color::Cyan),
            Span::raw(format!(" {}  ", state.status)),
            Span::styled(HINTS, Style::default().fg(Color::DarkGray)),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}
