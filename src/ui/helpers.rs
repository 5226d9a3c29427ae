use std::cmp::min;

use anyhow::Error;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

/// Footer space reserved for status messages and instructions.
pub(crate) const FOOTER_HEIGHT: u16 = 3;

/// Holds the footer message text plus its severity.
pub(crate) struct StatusMessage {
    pub(crate) text: String,
    pub(crate) kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    pub(crate) fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Split the frame into content and footer, keeping the footer only when the
/// terminal is tall enough for both.
pub(crate) fn split_footer(area: Rect) -> (Rect, Option<Rect>) {
    let footer_height = FOOTER_HEIGHT.min(area.height);
    if area.height > footer_height {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
            .split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    }
}

/// Status line on top, key hints below, separated from content by a rule.
pub(crate) fn draw_footer(
    frame: &mut Frame,
    area: Rect,
    status: Option<&StatusMessage>,
    instructions: Line<'static>,
) {
    let block = Block::default().borders(Borders::TOP);
    frame.render_widget(block.clone(), area);
    let inner = block.inner(area);

    let status_line = if let Some(status) = status {
        Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
    } else {
        Line::from("")
    };

    let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

/// Render `[key] action` pairs in the footer style.
pub(crate) fn key_hints(pairs: &[(&str, &str)]) -> Line<'static> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(pairs.len() * 2);
    for (idx, (key, action)) in pairs.iter().enumerate() {
        spans.push(Span::styled(format!("[{key}]"), key_style));
        let separator = if idx + 1 == pairs.len() { "" } else { "   " };
        spans.push(Span::raw(format!(" {action}{separator}")));
    }
    Line::from(spans)
}

/// Modal box listing one or more messages; any key dismisses it.
pub(crate) fn draw_message_dialog(frame: &mut Frame, area: Rect, title: &str, messages: &[String]) {
    let popup_area = centered_rect(60, 40, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Red));
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let mut lines: Vec<Line> = messages
        .iter()
        .map(|message| Line::from(message.clone()))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press any key to continue.",
        Style::default().fg(Color::Gray),
    )));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

/// Draw a scrolling column of fixed-height cards, keeping `selected` in view.
pub(crate) fn render_cards(
    frame: &mut Frame,
    area: Rect,
    cards: Vec<Vec<Line<'static>>>,
    selected: usize,
    card_height: u16,
) {
    if cards.is_empty() || area.height == 0 || card_height == 0 {
        return;
    }

    let capacity = ((area.height / card_height) as usize).max(1);
    let len = cards.len();
    let mut start = if selected >= capacity {
        selected + 1 - capacity
    } else {
        0
    };
    if start + capacity > len {
        start = len.saturating_sub(capacity);
    }
    let end = min(start + capacity, len);
    let visible_len = end.saturating_sub(start);
    if visible_len == 0 {
        return;
    }

    let constraints: Vec<Constraint> = (0..visible_len)
        .map(|_| Constraint::Length(card_height))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (idx, (chunk, lines)) in rows
        .iter()
        .zip(cards.into_iter().skip(start))
        .enumerate()
    {
        if chunk.height == 0 {
            continue;
        }
        let mut block = Block::default().borders(Borders::ALL);
        if start + idx == selected {
            block = block.style(Style::default().fg(Color::Yellow));
        }
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Left);
        frame.render_widget(paragraph, *chunk);
    }
}

/// Bold card heading, with a pointer when the card is selected.
pub(crate) fn card_title(text: &str, selected: bool) -> Line<'static> {
    let title = if selected {
        format!("▶ {text}")
    } else {
        text.to_string()
    };
    Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

/// `Label: value` pairs on one card line, labels in bold.
pub(crate) fn card_details(pairs: &[(&str, String)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (idx, (label, value)) in pairs.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(
            format!("{label}: "),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(value.clone()));
    }
    Line::from(spans)
}

/// Format a rupee amount with thousands separators and two decimals.
pub(crate) fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}₹{grouped}.{fraction}")
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(0.0), "₹0.00");
        assert_eq!(format_currency(999.5), "₹999.50");
        assert_eq!(format_currency(150000.0), "₹150,000.00");
        assert_eq!(format_currency(1234567.891), "₹1,234,567.89");
        assert_eq!(format_currency(-2500.0), "-₹2,500.00");
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = Err::<(), _>(anyhow!("College not found"))
            .context("failed to update college")
            .unwrap_err();
        assert_eq!(surface_error(&err), "College not found");
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 40, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert_eq!(popup.x, 20);
    }

    #[test]
    fn key_hints_render_brackets() {
        let line = key_hints(&[("Enter", "Search"), ("Esc", "Quit")]);
        let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(text, "[Enter] Search   [Esc] Quit");
    }
}
