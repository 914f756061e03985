use crate::app::SelectedApp;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use rust_decimal::Decimal;
use rusqlite::Connection;
use std::time::{Duration, Instant};

pub mod add_doctor;
pub mod dashboard;
pub mod home;
pub mod login;
pub mod medicines;
pub mod register;
pub mod visit_form;

pub trait Component {
    /// `Some(SelectedApp::None)` sends the user back to the home menu.
    fn handle_input(&mut self, conn: &Connection, event: KeyEvent) -> Result<Option<SelectedApp>>;
    fn render(&self, frame: &mut Frame);
    /// Called on idle frames.
    fn tick(&mut self) {}
}

pub mod palette {
    use ratatui::style::Color;

    pub const BACKGROUND: Color = Color::Rgb(16, 16, 28);
    pub const PANEL: Color = Color::Rgb(22, 22, 35);
    pub const INPUT: Color = Color::Rgb(26, 26, 36);
    pub const BORDER: Color = Color::Rgb(75, 75, 120);
    pub const BORDER_IDLE: Color = Color::Rgb(140, 140, 200);
    pub const TEXT: Color = Color::Rgb(230, 230, 250);
    pub const MUTED: Color = Color::Rgb(140, 140, 170);
    pub const ACCENT: Color = Color::Rgb(129, 199, 245);
    pub const FOCUS: Color = Color::Rgb(250, 250, 110);
    pub const HIGHLIGHT: Color = Color::Rgb(40, 40, 65);
    pub const SUCCESS: Color = Color::Rgb(140, 219, 140);
    pub const DANGER: Color = Color::Rgb(255, 100, 100);
}

const MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageKind {
    Error,
    Success,
}

/// One-line feedback under a form. Messages expire after five seconds.
#[derive(Debug, Default)]
pub struct StatusLine {
    message: Option<(String, MessageKind, Instant)>,
}

impl StatusLine {
    pub fn error(&mut self, message: impl Into<String>) {
        self.message = Some((message.into(), MessageKind::Error, Instant::now()));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.message = Some((message.into(), MessageKind::Success, Instant::now()));
    }

    pub fn clear(&mut self) {
        self.message = None;
    }

    pub fn text(&self) -> Option<&str> {
        self.message.as_ref().map(|(text, ..)| text.as_str())
    }

    pub fn is_error(&self) -> bool {
        matches!(self.message, Some((_, MessageKind::Error, _)))
    }

    pub fn tick(&mut self) {
        if let Some((_, _, shown_at)) = &self.message {
            if shown_at.elapsed() >= MESSAGE_TIMEOUT {
                self.clear();
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(text) = self.text() else {
            return;
        };
        let color = if self.is_error() {
            palette::DANGER
        } else {
            palette::SUCCESS
        };
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }
}

/// Yes/No popup. "No" is preselected.
#[derive(Debug, Default)]
pub struct ConfirmDialog {
    visible: bool,
    yes_selected: bool,
}

impl ConfirmDialog {
    pub fn open(&mut self) {
        self.visible = true;
        self.yes_selected = false;
    }

    pub fn is_open(&self) -> bool {
        self.visible
    }

    /// `Some(true)` when confirmed, `Some(false)` when dismissed.
    pub fn handle_input(&mut self, key: KeyEvent) -> Option<bool> {
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                self.yes_selected = !self.yes_selected;
                None
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.visible = false;
                Some(true)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.visible = false;
                Some(false)
            }
            KeyCode::Enter => {
                self.visible = false;
                Some(self.yes_selected)
            }
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame, title: &str, question: &str) {
        if !self.visible {
            return;
        }
        let area = centered_rect(50, 20, frame.area());
        let block = Block::default()
            .title(format!(" {title} "))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(palette::BORDER))
            .style(Style::default().bg(palette::PANEL));

        let option = |label: &'static str, selected: bool, color: Color| {
            if selected {
                Span::styled(
                    format!("► {label} ◄"),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(format!("  {label}  "), Style::default().fg(palette::MUTED))
            }
        };

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(question, Style::default().fg(palette::TEXT))),
            Line::from(""),
            Line::from(vec![
                option("Yes", self.yes_selected, palette::SUCCESS),
                Span::raw("    "),
                option("No", !self.yes_selected, palette::DANGER),
            ]),
        ];

        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(text).block(block).alignment(Alignment::Center),
            area,
        );
    }
}

/// Applies a typing key to a text field. Returns true if the field changed.
pub fn edit_text(field: &mut String, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) => {
            field.push(c);
            true
        }
        KeyCode::Backspace => field.pop().is_some(),
        _ => false,
    }
}

pub fn money(value: Decimal) -> String {
    format!("₹{:.2}", value.round_dp(2))
}

/// Paints the screen background and returns the full area.
pub fn screen_background(frame: &mut Frame) -> Rect {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(palette::BACKGROUND)),
        area,
    );
    area
}

pub fn render_header(frame: &mut Frame, area: Rect, title: &str) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(palette::BORDER))
        .style(Style::default().bg(palette::BACKGROUND));
    let title = Paragraph::new(title)
        .style(
            Style::default()
                .fg(palette::TEXT)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(title, area);
}

pub fn render_input(frame: &mut Frame, area: Rect, label: &str, value: &str, focused: bool) {
    let border = if focused {
        palette::FOCUS
    } else {
        palette::BORDER_IDLE
    };
    let input = Paragraph::new(value)
        .style(Style::default().fg(palette::TEXT).bg(palette::INPUT))
        .block(
            Block::default()
                .title(format!(" {label} "))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border))
                .style(Style::default().bg(palette::INPUT)),
        );
    frame.render_widget(input, area);
}

pub fn render_help(frame: &mut Frame, area: Rect, text: &str) {
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(palette::MUTED))
            .alignment(Alignment::Center),
        area,
    );
}

pub fn render_button(frame: &mut Frame, area: Rect, label: &str, focused: bool) {
    let (text, style) = if focused {
        (
            format!("► {label} ◄"),
            Style::default()
                .fg(palette::ACCENT)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (format!("  {label}  "), Style::default().fg(palette::MUTED))
    };
    frame.render_widget(
        Paragraph::new(text).style(style).alignment(Alignment::Center),
        area,
    );
}

pub fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette::BORDER))
        .style(Style::default().bg(palette::PANEL))
}

/// Helper function to create a centered rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
pub(crate) mod test_support {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    pub fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    pub fn typed(text: &str) -> Vec<KeyEvent> {
        text.chars().map(|c| key(KeyCode::Char(c))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::key;
    use super::*;

    #[test]
    fn confirm_dialog_defaults_to_no() {
        let mut dialog = ConfirmDialog::default();
        dialog.open();
        assert_eq!(dialog.handle_input(key(KeyCode::Enter)), Some(false));
        assert!(!dialog.is_open());

        dialog.open();
        assert_eq!(dialog.handle_input(key(KeyCode::Left)), None);
        assert_eq!(dialog.handle_input(key(KeyCode::Enter)), Some(true));
    }

    #[test]
    fn edit_text_handles_typing_and_backspace() {
        let mut field = String::new();
        assert!(edit_text(&mut field, key(KeyCode::Char('a'))));
        assert!(edit_text(&mut field, key(KeyCode::Char('b'))));
        assert!(edit_text(&mut field, key(KeyCode::Backspace)));
        assert!(!edit_text(&mut field, key(KeyCode::Up)));
        assert_eq!(field, "a");
    }

    #[test]
    fn status_line_tracks_kind() {
        let mut status = StatusLine::default();
        status.error("boom");
        assert!(status.is_error());
        status.tick();
        assert_eq!(status.text(), Some("boom"));
        status.success("saved");
        assert!(!status.is_error());
        status.clear();
        assert_eq!(status.text(), None);
    }

    #[test]
    fn money_rounds_to_paise() {
        assert_eq!(money(Decimal::new(12346, 3)), "₹12.35");
        assert_eq!(money(Decimal::from(40)), "₹40.00");
    }
}
