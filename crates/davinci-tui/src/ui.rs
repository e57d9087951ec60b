use davinci_core::panels::{BRAND_FEATURES, BRAND_NAME, BRAND_TAGLINE, TOOLS};
use davinci_core::Role;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::app::App;

const TOOLS_WIDTH: u16 = 24;
const BRANDING_WIDTH: u16 = 34;
const STREAM_CURSOR: &str = "|";

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("**") else {
            break;
        };
        // Empty ** ** pairs are left as typed
        if close == 0 {
            spans.push(Span::raw(rest[..open + 4].to_string()));
            rest = &after_open[2..];
            continue;
        }
        if open > 0 {
            spans.push(Span::raw(rest[..open].to_string()));
        }
        spans.push(Span::styled(
            after_open[..close].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
}

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

    // Hidden panels collapse to a one-column marker, like a drawer handle
    let tools_width = if app.panels.tools { TOOLS_WIDTH } else { 1 };
    let branding_width = if app.panels.branding { BRANDING_WIDTH } else { 1 };
    let [tools_area, chat_area, branding_area] = Layout::horizontal([
        Constraint::Length(tools_width),
        Constraint::Min(20),
        Constraint::Length(branding_width),
    ])
    .areas(body_area);

    if app.panels.tools {
        render_tools(frame, tools_area);
    } else {
        render_handle(frame, tools_area, ">");
    }

    render_chat(app, frame, chat_area);

    if app.panels.branding {
        render_branding(frame, branding_area);
    } else {
        render_handle(frame, branding_area, "<");
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(format!(" {} ", BRAND_NAME), Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::Gray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.session.show_thinking() {
        (" THINKING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else if app.session.is_streaming() {
        (" ANSWERING ", Style::default().bg(Color::Magenta).fg(Color::White))
    } else {
        (" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = Vec::new();
    if app.can_send() {
        hints.extend([
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
        ]);
    }
    hints.extend([
        Span::styled(" ^N ", key_style),
        Span::styled(" new chat ", label_style),
        Span::styled(" ^T ", key_style),
        Span::styled(if app.panels.tools { " hide tools " } else { " show tools " }, label_style),
        Span::styled(" ^B ", key_style),
        Span::styled(if app.panels.branding { " hide info " } else { " show info " }, label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_handle(frame: &mut Frame, area: Rect, marker: &'static str) {
    let handle = Paragraph::new(marker).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(handle, area);
}

fn render_tools(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Tools ")
        .title_bottom(Line::from(" ^T < ").alignment(Alignment::Right));

    let items: Vec<ListItem> = TOOLS
        .iter()
        .map(|(icon, name)| ListItem::new(format!(" {} {} ", icon, name)))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_branding(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title_bottom(Line::from(" ^B > ").alignment(Alignment::Right));

    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled("◎", Style::default().fg(Color::Cyan).bold())).centered(),
        Line::from(Span::styled(BRAND_NAME, Style::default().fg(Color::Cyan).bold())).centered(),
        Line::from(Span::styled(BRAND_TAGLINE, Style::default().fg(Color::Gray))).centered(),
        Line::default(),
    ];

    for (icon, title, description) in BRAND_FEATURES {
        lines.push(Line::from(vec![
            Span::raw(format!(" {} ", icon)),
            Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        ]));
        lines.push(Line::from(Span::styled(
            format!("    {}", description),
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::default());
    }

    let branding = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(branding, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [history_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store areas for mouse hit-testing and scroll calculations
    app.chat_area = Some(history_area);
    app.chat_height = history_area.height.saturating_sub(2);
    app.chat_width = history_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat ");

    let mut lines: Vec<Line> = Vec::new();

    for msg in app.session.messages() {
        match msg.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.split('\n') {
                    lines.push(Line::from(line.to_string()));
                }
            }
            Role::Assistant => {
                lines.push(Line::from(Span::styled(
                    format!("{}:", BRAND_NAME),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.split('\n') {
                    lines.push(parse_markdown_line(line));
                }
            }
        }

        if msg.is_streaming {
            if let Some(last) = lines.last_mut() {
                last.spans.push(Span::styled(
                    STREAM_CURSOR,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::SLOW_BLINK),
                ));
            }
        }
        lines.push(Line::default());
    }

    if app.session.show_thinking() {
        lines.push(Line::from(Span::styled(
            format!("{}:", BRAND_NAME),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Three dots, one highlighted per tick
        let dots: Vec<Span> = (0..3u8)
            .map(|i| {
                let color = if i == app.animation_frame { Color::White } else { Color::DarkGray };
                Span::styled("● ", Style::default().fg(color))
            })
            .collect();
        lines.push(Line::from(dots));
    }

    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });

    // Count with the same wrapping that renders, before the block adds borders
    app.chat_lines = u16::try_from(chat.line_count(app.chat_width)).unwrap_or(u16::MAX);
    if app.follow_bottom {
        app.scroll_to_bottom();
    }
    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, history_area);

    render_input(app, frame, input_area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.session.is_busy();
    let border_color = if busy { Color::DarkGray } else { Color::Yellow };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() {
        Paragraph::new("Type your message...").style(Style::default().fg(Color::DarkGray))
    } else {
        // Get the visible slice of the input
        let visible_text: String = app.input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        let style = if busy {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        };
        Paragraph::new(visible_text).style(style)
    };

    frame.render_widget(input.block(input_block), area);

    // Show cursor only while typing is allowed
    if !busy {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}
