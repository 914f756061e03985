//! Self sign-up for medical representatives.

use crate::app::SelectedApp;
use crate::auth;
use crate::components::{
    centered_rect, edit_text, palette, render_button, render_header, render_help, render_input,
    screen_background, Component, StatusLine,
};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::Paragraph};
use rusqlite::Connection;

const FULL_NAME: usize = 0;
const EMAIL: usize = 1;
const PASSWORD: usize = 2;
const CONFIRM: usize = 3;
const SUBMIT: usize = 4;
const BACK: usize = 5;
const FOCUS_COUNT: usize = 6;

#[derive(Debug, Default)]
pub struct Register {
    full_name: String,
    email: String,
    password: String,
    confirm_password: String,
    focus_index: usize,
    status: StatusLine,
    /// Set once a profile has been created; the app shows a notice on the
    /// login screen.
    pub registration_success: bool,
}

impl Register {
    pub fn new() -> Self {
        Self::default()
    }

    fn field_mut(&mut self) -> Option<&mut String> {
        match self.focus_index {
            FULL_NAME => Some(&mut self.full_name),
            EMAIL => Some(&mut self.email),
            PASSWORD => Some(&mut self.password),
            CONFIRM => Some(&mut self.confirm_password),
            _ => None,
        }
    }

    fn submit(&mut self, conn: &Connection) -> Option<SelectedApp> {
        match auth::register_representative(
            conn,
            &self.full_name,
            &self.email,
            &self.password,
            &self.confirm_password,
        ) {
            Ok(_) => {
                self.registration_success = true;
                Some(SelectedApp::None)
            }
            Err(e) => {
                self.status.error(e.to_string());
                None
            }
        }
    }
}

impl Component for Register {
    fn handle_input(&mut self, conn: &Connection, key: KeyEvent) -> Result<Option<SelectedApp>> {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus_index = (self.focus_index + 1) % FOCUS_COUNT;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_index = (self.focus_index + FOCUS_COUNT - 1) % FOCUS_COUNT;
            }
            KeyCode::Esc => return Ok(Some(SelectedApp::None)),
            KeyCode::Enter if self.focus_index == BACK => return Ok(Some(SelectedApp::None)),
            KeyCode::Enter => return Ok(self.submit(conn)),
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
        let form_area = centered_rect(60, 90, area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(2), // Notice
                Constraint::Length(3), // Full name
                Constraint::Length(3), // Email
                Constraint::Length(3), // Password
                Constraint::Length(3), // Confirm
                Constraint::Length(2), // Status
                Constraint::Length(1), // Submit
                Constraint::Length(1), // Back
                Constraint::Length(1),
                Constraint::Length(1), // Help
                Constraint::Min(0),
            ])
            .split(form_area);

        render_header(frame, layout[0], "REPRESENTATIVE SIGN-UP");

        let notice = Paragraph::new("New accounts can log in but submit visits only after admin approval.")
            .style(Style::default().fg(palette::MUTED))
            .alignment(Alignment::Center);
        frame.render_widget(notice, layout[1]);

        render_input(frame, layout[2], "Full Name", &self.full_name, self.focus_index == FULL_NAME);
        render_input(frame, layout[3], "Email", &self.email, self.focus_index == EMAIL);
        render_input(
            frame,
            layout[4],
            "Password",
            &"•".repeat(self.password.chars().count()),
            self.focus_index == PASSWORD,
        );
        render_input(
            frame,
            layout[5],
            "Confirm Password",
            &"•".repeat(self.confirm_password.chars().count()),
            self.focus_index == CONFIRM,
        );

        self.status.render(frame, layout[6]);
        render_button(frame, layout[7], "Register", self.focus_index == SUBMIT);
        render_button(frame, layout[8], "Back to Login", self.focus_index == BACK);
        render_help(frame, layout[10], "Tab/↑↓: Switch field | Enter: Register | Esc: Back");
    }
}
