use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::App;

// -- Palette ----------------------------------------------------------------
// Using RGB values for consistent appearance across terminals.
const BORDER: Color = Color::Rgb(100, 100, 120); // muted blue-gray
const BORDER_ACTIVE: Color = Color::Rgb(180, 160, 60); // gold (monitoring on)
const TITLE_FG: Color = Color::Rgb(160, 170, 190); // light blue-gray
const DIM: Color = Color::Rgb(90, 95, 105); // dim text
const BAR_BG: Color = Color::Rgb(30, 32, 40); // dark bar background
const TEXT_FG: Color = Color::Rgb(200, 200, 210);
const ON: Color = Color::Rgb(80, 200, 120);

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title bar
            Constraint::Min(3),    // history
            Constraint::Length(1), // status bar
        ])
        .split(frame.area());

    render_title_bar(frame, chunks[0], app);
    render_history(frame, chunks[1], app);
    render_status_bar(frame, chunks[2], app);
}

fn render_title_bar(frame: &mut Frame, area: Rect, app: &App) {
    let toggle = if app.monitoring {
        Span::styled(
            " [Monitoring: On] ",
            Style::default().fg(ON).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(" [Monitoring: Off] ", Style::default().fg(DIM))
    };

    let title = Line::from(vec![
        Span::styled(
            " clip-exporter ",
            Style::default()
                .fg(Color::Rgb(100, 200, 220))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("| {} entries | {} ", app.entries, app.mode),
            Style::default().fg(TITLE_FG),
        ),
        toggle,
    ]);

    let bar = Paragraph::new(title).style(Style::default().bg(BAR_BG).fg(TITLE_FG));
    frame.render_widget(bar, area);
}

fn render_history(frame: &mut Frame, area: Rect, app: &mut App) {
    // Inside the borders.
    app.set_viewport_rows(area.height.saturating_sub(2));

    let title = format!(" {} ", app.store_path.display());
    let border_color = if app.monitoring { BORDER_ACTIVE } else { BORDER };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, Style::default().fg(TITLE_FG)))
        .border_style(Style::default().fg(border_color));

    let text = if app.history.is_empty() {
        Text::styled("Nothing captured yet", Style::default().fg(DIM))
    } else {
        Text::styled(app.history.as_str(), Style::default().fg(TEXT_FG))
    };

    // No wrapping: one captured line per row keeps scroll offsets exact.
    let paragraph = Paragraph::new(text).block(block).scroll((app.scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let msg = if let Some(ref status) = app.status_message {
        Span::styled(format!(" {status} "), Style::default().fg(ON))
    } else {
        Span::raw("")
    };

    let keybinds = " q:Quit  m:Monitor  c:Copy  e:Export  x:Clear  j/k:Scroll ";
    let line = Line::from(vec![msg, Span::styled(keybinds, Style::default().fg(DIM))]);

    let bar = Paragraph::new(line).style(Style::default().bg(BAR_BG));
    frame.render_widget(bar, area);
}
