use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
};
use web_builder::ChatRole;

use crate::app::{App, InputMode, Tab};
use crate::preview::html_to_text;

const INPUT_PLACEHOLDER: &str = "Describe the website you want to create...";
const INPUT_DISABLED: &str = "Generating... Please wait.";
const EMPTY_CODE: &str = "<!-- No code generated yet -->";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    // Chat on the left, the generated site on the right
    let [chat_column, site_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(body_area);

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(chat_column);

    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_site(app, frame, site_area);
    render_footer(app, frame, footer_area);

    if app.is_generating() {
        render_generating_popup(app, frame, site_area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Minimal Web Builder ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("[{}: {}]", app.provider.display_name(), app.model),
            Style::default().fg(Color::Gray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let text = if app.view.messages.is_empty() {
        Text::from(Span::styled(
            "Tell me what kind of site you want, then keep chatting to refine it.",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for msg in &app.view.messages {
            let (label, color) = match msg.role {
                ChatRole::User => ("You:", Color::Cyan),
                ChatRole::Assistant => ("Builder:", Color::Yellow),
            };
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            for line in msg.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::default());
        }
        Text::from(lines)
    };

    let chat = Paragraph::new(text).wrap(Wrap { trim: true });

    // Keep the newest messages in view; count rows after wrapping
    let inner = block.inner(area);
    let rows = u16::try_from(chat.line_count(inner.width)).unwrap_or(u16::MAX);
    let overflow = rows.saturating_sub(inner.height);

    frame.render_widget(block, area);
    frame.render_widget(chat.scroll((overflow, 0)), inner);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let generating = app.is_generating();
    let editing = app.input_mode == InputMode::Editing && !generating;

    let border_color = if generating {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 || app.cursor < inner_width {
        0
    } else {
        app.cursor - inner_width + 1
    };

    let input = if generating {
        Paragraph::new(INPUT_DISABLED).style(Style::default().fg(Color::DarkGray).italic())
    } else if app.input.is_empty() {
        Paragraph::new(INPUT_PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        let visible: String = app
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(block), area);

    if editing {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_site(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [tabs_area, content_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(inner);

    let tabs = Tabs::new(Tab::titles())
        .select(app.tab.index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider("|");
    frame.render_widget(tabs, tabs_area);

    app.content_height = content_area.height;

    let content = match (app.tab, app.artifact()) {
        (Tab::Preview, None) => {
            let lines = vec![
                Line::default(),
                Line::from(Span::styled(
                    "Start your creative journey!",
                    Style::default().fg(Color::Cyan).bold(),
                ))
                .centered(),
                Line::from(Span::styled(
                    "Describe your dream website below and watch it come to life.",
                    Style::default().fg(Color::DarkGray),
                ))
                .centered(),
            ];
            Paragraph::new(lines)
        }
        (Tab::Preview, Some(html)) => {
            Paragraph::new(html_to_text(html)).wrap(Wrap { trim: false })
        }
        (Tab::Code, None) => {
            Paragraph::new(EMPTY_CODE).style(Style::default().fg(Color::DarkGray))
        }
        (Tab::Code, Some(html)) => Paragraph::new(numbered_lines(html)),
    };

    frame.render_widget(content.scroll((app.scroll, 0)), content_area);
}

/// Source lines with a dimmed line-number gutter
fn numbered_lines(source: &str) -> Text<'static> {
    let total = source.lines().count().max(1);
    let width = total.to_string().len();

    source
        .lines()
        .enumerate()
        .map(|(i, line)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>width$} ", i + 1, width = width),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(line.to_string()),
            ])
        })
        .collect::<Vec<_>>()
        .into()
}

fn render_generating_popup(app: &App, frame: &mut Frame, area: Rect) {
    let popup_width = 44.min(area.width.saturating_sub(4));
    let popup_height = 3;

    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    // Animated ellipsis: cycles through ".", "..", "..."
    let dots = ".".repeat((app.animation_frame as usize) + 1);
    let message = Paragraph::new(format!("Generating your minimalist website{:<3}", dots))
        .style(Style::default().fg(Color::Yellow))
        .centered()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );

    frame.render_widget(message, popup_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" EDIT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    match app.input_mode {
        InputMode::Editing => spans.extend(vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" view ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" normal ", label_style),
        ]),
        InputMode::Normal => spans.extend(vec![
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" view ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" s ", key_style),
            Span::styled(" save html ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]),
    }

    if let Some(status) = &app.status {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Yellow)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::PathBuf;

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_numbered_lines_pads_gutter() {
        let source = (1..=10).map(|i| format!("l{}", i)).collect::<Vec<_>>().join("\n");
        let text = numbered_lines(&source);
        assert_eq!(text.lines.len(), 10);
        assert_eq!(text.lines[0].spans[0].content, " 1 ");
        assert_eq!(text.lines[9].spans[0].content, "10 ");
    }

    #[tokio::test]
    async fn test_chat_follows_newest_message_past_wrapping() {
        let mut app = test_app(PathBuf::from("."));
        let long_request = "with a hero banner, a pricing table and a contact form ".repeat(4);

        for turn in 0..4 {
            app.input = format!("turn{} {}", turn, long_request);
            app.submit_input();
            while app.is_generating() {
                tokio::task::yield_now().await;
                app.poll_generation().await;
            }
        }
        app.input = "LASTREQ".to_string();
        app.submit_input();
        while app.is_generating() {
            tokio::task::yield_now().await;
            app.poll_generation().await;
        }

        let screen = draw(&mut app);

        assert!(screen.contains("LASTREQ"));
        assert!(!screen.contains("turn0"));
    }

    #[test]
    fn test_empty_state_is_rendered() {
        let mut app = test_app(PathBuf::from("."));
        let screen = draw(&mut app);

        assert!(screen.contains("Minimal Web Builder"));
        assert!(screen.contains("Start your creative journey!"));
        assert!(screen.contains(INPUT_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_generating_state_disables_input() {
        let mut app = test_app(PathBuf::from("."));
        app.input = "a portfolio".to_string();
        app.submit_input();

        let screen = draw(&mut app);

        assert!(screen.contains("Generating your minimalist website"));
        assert!(screen.contains(INPUT_DISABLED));
    }
}
