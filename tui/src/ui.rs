use crate::app::{App, Status};
use crate::commands;
use llm::Role;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Margin},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};

const SPINNER_FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Chat area
            Constraint::Length(3), // Input area
            Constraint::Length(1), // Feedback line
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_chat(f, app, chunks[0]);

    let input_widget = Paragraph::new(commands::mask_input(app.input.value()))
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Ask something about the PDF... (/ for commands)"),
        );
    f.render_widget(input_widget, chunks[1]);

    if let Some(status) = &app.status {
        f.render_widget(Paragraph::new(status_line(status)), chunks[2]);
    }

    let status_bar = Paragraph::new(status_bar_text(app))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(status_bar, chunks[3]);

    f.set_cursor_position((
        chunks[1].x + app.input.visual_cursor() as u16 + 1,
        chunks[1].y + 1,
    ));
}

fn draw_chat(f: &mut Frame, app: &mut App, area: ratatui::layout::Rect) {
    let assistant_label = app.view.model.clone().unwrap_or_else(|| "Gemini".to_string());
    let mut all_lines: Vec<Line> = Vec::new();

    if let Some(placeholder) = app.placeholder() {
        all_lines.push(status_line(&placeholder));
        all_lines.push(Line::from(""));
    }

    if let Some(file) = &app.view.file {
        all_lines.push(Line::from(Span::styled(
            format!("📄 {}", file.label()),
            Style::default().fg(Color::DarkGray),
        )));
        all_lines.push(Line::from(""));
    }

    for msg in &app.view.messages {
        push_message(&mut all_lines, msg.role(), &assistant_label, msg.text());
    }

    if let Some(prompt) = &app.pending_prompt {
        push_message(&mut all_lines, Role::User, &assistant_label, prompt);
    }

    for note in &app.notes {
        all_lines.push(Line::from(Span::styled(
            note.clone(),
            Style::default().fg(Color::Yellow),
        )));
    }

    // scroll_offset=0 sticks to the bottom, higher values scroll up
    let total_lines = all_lines.len();
    let visible_height = area.height.saturating_sub(2) as usize;
    let max_scroll = total_lines.saturating_sub(visible_height);
    if app.scroll_offset > max_scroll {
        app.scroll_offset = max_scroll;
    }
    let effective_scroll = max_scroll.saturating_sub(app.scroll_offset);

    let chat = Paragraph::new(all_lines)
        .block(Block::default().borders(Borders::ALL).title("📄 Gemini PDF Chat"))
        .wrap(Wrap { trim: false })
        .scroll((effective_scroll as u16, 0));
    f.render_widget(chat, area);

    if total_lines > visible_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"));
        let mut scrollbar_state = ScrollbarState::new(max_scroll).position(effective_scroll);
        let scrollbar_area = area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        });
        f.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }
}

fn push_message(lines: &mut Vec<Line<'static>>, role: Role, assistant_label: &str, text: &str) {
    let (label, style) = match role {
        Role::User => ("You".to_string(), Style::default().fg(Color::Cyan)),
        Role::Assistant => (assistant_label.to_string(), Style::default().fg(Color::Green)),
    };
    lines.push(Line::from(Span::styled(
        format!("[{}]", label),
        style.add_modifier(Modifier::BOLD),
    )));
    lines.extend(text.lines().map(markdown_line));
    lines.push(Line::from(""));
}

/// Light styling for the markdown the model tends to answer with
fn markdown_line(line: &str) -> Line<'static> {
    let style = if line.starts_with("```") {
        Style::default().fg(Color::DarkGray)
    } else if line.starts_with("# ") {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else if line.starts_with("## ") || line.starts_with("### ") {
        Style::default().fg(Color::Yellow)
    } else if line.starts_with("- ") || line.starts_with("* ") {
        Style::default().fg(Color::Cyan)
    } else if line.len() > 1 && line.starts_with('`') && line.ends_with('`') {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default()
    };
    Line::from(Span::styled(line.to_string(), style))
}

fn status_line(status: &Status) -> Line<'static> {
    match status {
        Status::Info(msg) => Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Blue))),
        Status::Warning(msg) => Line::from(Span::styled(
            format!("⚠ {}", msg),
            Style::default().fg(Color::Yellow),
        )),
        Status::Error(msg) => Line::from(Span::styled(
            format!("✗ {}", msg),
            Style::default().fg(Color::Red),
        )),
    }
}

fn status_bar_text(app: &App) -> String {
    let document = app
        .view
        .file
        .as_ref()
        .map(|f| f.label().to_string())
        .unwrap_or_else(|| "no document".to_string());
    let key = if app.configured { "key ••••" } else { "no key" };

    match &app.busy {
        Some(activity) => format!(
            " {} | {} | {} | {} {}... (Esc to cancel) ",
            app.model,
            document,
            key,
            SPINNER_FRAMES[app.spinner_frame % SPINNER_FRAMES.len()],
            activity
        ),
        None => format!(
            " {} | {} | {} | {} messages ",
            app.model,
            document,
            key,
            app.view.messages.len()
        ),
    }
}
