use super::presenter::{PaneView, Tone};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Everything drawn in one frame.
#[derive(Clone, Debug)]
pub struct Screen {
    pub cpu: PaneView,
    pub gpu: Option<PaneView>,
    pub host: PaneView,
    pub memory: PaneView,
    pub disk: PaneView,
    pub notes: Vec<String>,
}

#[derive(Clone, Copy)]
struct Theme {
    bg: Color,
    border: Color,
    title: Color,
    text: Color,
    graph: Color,
    muted: Color,
    warn: Color,
    critical: Color,
}

fn theme() -> Theme {
    Theme {
        bg: Color::Rgb(11, 18, 32),
        border: Color::Rgb(71, 85, 105),
        title: Color::Rgb(191, 219, 254),
        text: Color::Rgb(226, 232, 240),
        graph: Color::Rgb(56, 189, 248),
        muted: Color::Rgb(148, 163, 184),
        warn: Color::Rgb(245, 158, 11),
        critical: Color::Rgb(239, 68, 68),
    }
}

pub fn render(frame: &mut Frame, screen: &Screen) {
    let theme = theme();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.size());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[0]);

    let left: Vec<&PaneView> = std::iter::once(&screen.cpu).chain(screen.gpu.as_ref()).collect();
    draw_column(frame, &left, columns[0], theme);
    draw_column(
        frame,
        &[&screen.host, &screen.memory, &screen.disk],
        columns[1],
        theme,
    );
    frame.render_widget(footer(&screen.notes, theme), rows[1]);
}

/// Stacks panes top to bottom, each sized to its content.
fn draw_column(frame: &mut Frame, panes: &[&PaneView], area: Rect, theme: Theme) {
    let mut constraints: Vec<Constraint> = panes
        .iter()
        .map(|p| Constraint::Length(p.lines.len() as u16 + 2))
        .collect();
    constraints.push(Constraint::Min(0));
    let areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    for (pane, area) in panes.iter().zip(areas.iter()) {
        frame.render_widget(pane_widget(pane, theme), *area);
    }
}

fn pane_widget(pane: &PaneView, theme: Theme) -> Paragraph<'static> {
    let (body, border) = match pane.tone {
        Tone::Normal => (theme.graph, theme.border),
        Tone::Warning => (theme.graph, theme.warn),
        Tone::Error => (theme.critical, theme.critical),
    };
    let lines: Vec<Line> = pane
        .lines
        .iter()
        .map(|line| {
            let color = if is_graph_line(line) { body } else { theme.text };
            Line::from(Span::styled(line.clone(), Style::default().fg(color)))
        })
        .collect();

    Paragraph::new(Text::from(lines))
        .style(Style::default().fg(theme.text).bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .style(Style::default().bg(theme.bg))
                .title(Span::styled(
                    pane.title.clone(),
                    Style::default()
                        .fg(theme.title)
                        .add_modifier(Modifier::BOLD),
                )),
        )
}

fn is_graph_line(line: &str) -> bool {
    line.chars().any(|c| ('\u{2800}'..='\u{28FF}').contains(&c))
}

fn footer(notes: &[String], theme: Theme) -> Paragraph<'static> {
    let mut spans = vec![Span::styled(
        " q quit ",
        Style::default().fg(theme.muted),
    )];
    if let Some(note) = notes.last() {
        spans.push(Span::styled(
            note.clone(),
            Style::default().fg(theme.warn),
        ));
    }
    Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.bg))
}
