use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Role, TranscriptEntry, View, SUGGESTIONS};
use crate::conversation::{Evaluation, Tier};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, input, footer
    let [header_area, body_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.view {
        View::Welcome => render_welcome(app, frame, body_area),
        View::Transcript => render_transcript(app, frame, body_area),
    }

    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.show_clear_confirm {
        render_clear_confirm(frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" RAG Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" {} ", app.base_url()),
            Style::default().fg(Color::DarkGray),
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

fn render_welcome(app: &mut App, frame: &mut Frame, area: Rect) {
    let [card_area, suggestions_area] = Layout::vertical([
        Constraint::Length(6),
        Constraint::Min(0),
    ])
    .areas(area);

    let card = Paragraph::new(vec![
        Line::default(),
        Line::from(Span::styled(
            "Ask me anything about diabetes",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Answers come from the documentation corpus, scored for quality.",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .centered()
    .block(Block::default().borders(Borders::ALL));

    frame.render_widget(card, card_area);

    let items: Vec<ListItem> = SUGGESTIONS
        .iter()
        .map(|s| ListItem::new(format!(" {} ", s)))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Suggestions (↑/↓ then Enter) "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, suggestions_area, &mut app.suggestion_state);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let mut lines: Vec<Line> = Vec::new();

    for entry in &app.transcript {
        push_entry_lines(&mut lines, entry);
    }

    if app.processing {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

fn push_entry_lines(lines: &mut Vec<Line<'static>>, entry: &TranscriptEntry) {
    match entry.role {
        Role::User => {
            lines.push(Line::from(Span::styled(
                "You:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
        }
        Role::Assistant => {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
        }
    }

    let content_style = if entry.is_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    for line in entry.text.lines() {
        lines.push(Line::from(Span::styled(line.to_string(), content_style)));
    }

    // Meta line: wall time, plus the score badge on evaluated answers
    let mut meta = vec![Span::styled(
        entry.time.format("%H:%M").to_string(),
        Style::default().fg(Color::DarkGray),
    )];
    if let Some(eval) = &entry.evaluation {
        meta.push(Span::raw("  "));
        meta.push(badge_span(eval));
    }
    lines.push(Line::from(meta));
    lines.push(Line::default());
}

fn badge_span(eval: &Evaluation) -> Span<'static> {
    let color = match eval.tier() {
        Tier::Good => Color::Green,
        Tier::Medium => Color::Yellow,
        Tier::Low => Color::Red,
    };
    Span::styled(eval.badge(), Style::default().fg(color).bold())
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let (border_color, title) = if app.processing {
        (Color::DarkGray, " Waiting for reply... ")
    } else {
        (Color::Yellow, " Ask (Enter to send) ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling.
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if !app.processing && !app.show_clear_confirm {
        frame.set_cursor_position((
            area.x + (cursor_pos - scroll_offset) as u16 + 1,
            area.y + 1,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
    ];

    if app.view == View::Welcome {
        hints.extend(vec![
            Span::styled(" ↑/↓ ", key_style),
            Span::styled(" suggestion ", label_style),
        ]);
    } else {
        hints.extend(vec![
            Span::styled(" ↑/↓ ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" ^L ", key_style),
            Span::styled(" clear ", label_style),
        ]);
    }

    hints.extend(vec![
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer = Paragraph::new(Line::from(hints));
    frame.render_widget(footer, area);
}

fn render_clear_confirm(frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 44.min(area.width.saturating_sub(4));
    let popup_height = 5.min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let dialog = Paragraph::new(vec![
        Line::from("Clear this conversation?"),
        Line::default(),
        Line::from(Span::styled(
            "Enter/y confirm · Esc/n cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .centered()
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Confirmation "),
    );

    frame.render_widget(dialog, popup_area);
}
