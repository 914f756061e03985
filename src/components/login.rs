//! Login screen.

use crate::app::SelectedApp;
use crate::components::{
    centered_rect, edit_text, palette, render_button, render_input, screen_background,
    Component, ConfirmDialog, StatusLine,
};
use crate::config::APP_NAME;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::Paragraph};
use rusqlite::Connection;

const EMAIL: usize = 0;
const PASSWORD: usize = 1;
const REGISTER: usize = 2;
const EXIT: usize = 3;
const FOCUS_COUNT: usize = 4;

#[derive(Debug, Default)]
pub struct Login {
    pub email: String,
    pub password: String,
    pub status: StatusLine,
    selected_index: usize,
    exit_dialog: ConfirmDialog,
}

impl Login {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the form after logout or registration.
    pub fn reset(&mut self) {
        self.email.clear();
        self.password.clear();
        self.selected_index = EMAIL;
    }

    fn field_mut(&mut self) -> Option<&mut String> {
        match self.selected_index {
            EMAIL => Some(&mut self.email),
            PASSWORD => Some(&mut self.password),
            _ => None,
        }
    }
}

impl Component for Login {
    /// `Some(SelectedApp::None)` asks the app to try the entered credentials.
    fn handle_input(&mut self, _conn: &Connection, key: KeyEvent) -> Result<Option<SelectedApp>> {
        if self.exit_dialog.is_open() {
            return Ok(match self.exit_dialog.handle_input(key) {
                Some(true) => Some(SelectedApp::Quit),
                _ => None,
            });
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.selected_index = (self.selected_index + 1) % FOCUS_COUNT;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.selected_index = (self.selected_index + FOCUS_COUNT - 1) % FOCUS_COUNT;
            }
            KeyCode::Esc => self.exit_dialog.open(),
            KeyCode::Enter => match self.selected_index {
                REGISTER => return Ok(Some(SelectedApp::Register)),
                EXIT => self.exit_dialog.open(),
                _ => {
                    if self.email.trim().is_empty() {
                        self.status.error("Email cannot be empty.");
                    } else if self.password.is_empty() {
                        self.status.error("Password cannot be empty.");
                    } else {
                        return Ok(Some(SelectedApp::None));
                    }
                }
            },
            _ => {
                if let Some(field) = self.field_mut() {
                    if edit_text(field, key) {
                        self.status.clear();
                    }
                }
            }
        }
        Ok(None)
    }

    fn tick(&mut self) {
        self.status.tick();
    }

    fn render(&self, frame: &mut Frame) {
        let area = screen_background(frame);
        let form_area = centered_rect(60, 80, area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Title
                Constraint::Length(2), // Spacing
                Constraint::Length(3), // Email
                Constraint::Length(3), // Password
                Constraint::Length(2), // Status
                Constraint::Length(1), // Register
                Constraint::Length(1), // Exit
                Constraint::Length(2),
                Constraint::Length(1), // Help
                Constraint::Min(0),
            ])
            .split(form_area);

        let title = Paragraph::new(vec![
            Line::from(Span::styled(
                format!("✚ {} ✚", APP_NAME.to_uppercase()),
                Style::default()
                    .fg(palette::ACCENT)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Doctor visits, orders and approvals in the field",
                Style::default()
                    .fg(palette::MUTED)
                    .add_modifier(Modifier::ITALIC),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(title, layout[0]);

        render_input(
            frame,
            layout[2],
            "Email",
            &self.email,
            self.selected_index == EMAIL,
        );
        render_input(
            frame,
            layout[3],
            "Password",
            &"•".repeat(self.password.chars().count()),
            self.selected_index == PASSWORD,
        );

        self.status.render(frame, layout[4]);
        render_button(
            frame,
            layout[5],
            "Register as representative",
            self.selected_index == REGISTER,
        );
        render_button(frame, layout[6], "Exit", self.selected_index == EXIT);

        let help = Paragraph::new("Tab/↑↓: Switch field | Enter: Login | Esc: Exit")
            .style(Style::default().fg(palette::MUTED))
            .alignment(Alignment::Center);
        frame.render_widget(help, layout[8]);

        self.exit_dialog
            .render(frame, "Confirm Exit", "Are you sure you want to quit?");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::test_support::{key, typed};
    use crate::db::open_memory_database;

    #[test]
    fn enter_with_credentials_requests_login() {
        let conn = open_memory_database().unwrap();
        let mut login = Login::new();
        for k in typed("admin@fieldtrack.local") {
            login.handle_input(&conn, k).unwrap();
        }
        login.handle_input(&conn, key(KeyCode::Tab)).unwrap();
        for k in typed("admin") {
            login.handle_input(&conn, k).unwrap();
        }
        assert_eq!(login.password, "admin");
        assert_eq!(
            login.handle_input(&conn, key(KeyCode::Enter)).unwrap(),
            Some(SelectedApp::None)
        );
    }

    #[test]
    fn empty_email_shows_error() {
        let conn = open_memory_database().unwrap();
        let mut login = Login::new();
        assert_eq!(login.handle_input(&conn, key(KeyCode::Enter)).unwrap(), None);
        assert!(login.status.is_error());
    }

    #[test]
    fn register_link_and_exit_dialog() {
        let conn = open_memory_database().unwrap();
        let mut login = Login::new();
        login.handle_input(&conn, key(KeyCode::Up)).unwrap();
        login.handle_input(&conn, key(KeyCode::Up)).unwrap();
        assert_eq!(
            login.handle_input(&conn, key(KeyCode::Enter)).unwrap(),
            Some(SelectedApp::Register)
        );

        login.handle_input(&conn, key(KeyCode::Esc)).unwrap();
        assert_eq!(
            login.handle_input(&conn, key(KeyCode::Char('y'))).unwrap(),
            Some(SelectedApp::Quit)
        );
    }
}
