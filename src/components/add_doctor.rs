use crate::app::SelectedApp;
use crate::auth::Session;
use crate::components::{
    centered_rect, edit_text, palette, render_button, render_header, render_help, render_input,
    screen_background, Component, StatusLine,
};
use crate::doctors::{self, DoctorForm};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::Paragraph};
use rusqlite::Connection;

const NAME: usize = 0;
const SPECIALIZATION: usize = 1;
const HOSPITAL: usize = 2;
const SAVE: usize = 3;
const BACK: usize = 4;
const FOCUS_COUNT: usize = 5;

pub struct AddDoctor {
    session: Session,
    form: DoctorForm,
    focus_index: usize,
    status: StatusLine,
}

impl AddDoctor {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            form: DoctorForm::default(),
            focus_index: NAME,
            status: StatusLine::default(),
        }
    }

    fn save(&mut self, conn: &Connection) {
        match doctors::register_doctor(conn, Some(&self.session), &self.form) {
            Ok(doctor) => {
                self.status
                    .success(format!("{} added. Awaiting verification.", doctor.name));
                self.form = DoctorForm::default();
                self.focus_index = NAME;
            }
            Err(e) => self.status.error(e.to_string()),
        }
    }
}

impl Component for AddDoctor {
    fn handle_input(&mut self, conn: &Connection, key: KeyEvent) -> Result<Option<SelectedApp>> {
        match key.code {
            KeyCode::Esc => return Ok(Some(SelectedApp::None)),
            KeyCode::Tab | KeyCode::Down => {
                self.focus_index = (self.focus_index + 1) % FOCUS_COUNT;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_index = (self.focus_index + FOCUS_COUNT - 1) % FOCUS_COUNT;
            }
            KeyCode::Enter if self.focus_index == BACK => return Ok(Some(SelectedApp::None)),
            KeyCode::Enter => self.save(conn),
            _ => {
                let field = match self.focus_index {
                    NAME => &mut self.form.name,
                    SPECIALIZATION => &mut self.form.specialization,
                    HOSPITAL => &mut self.form.hospital,
                    _ => return Ok(None),
                };
                edit_text(field, key);
            }
        }
        Ok(None)
    }

    fn tick(&mut self) {
        self.status.tick();
    }

    fn render(&self, frame: &mut Frame) {
        let area = screen_background(frame);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(centered_rect(60, 80, area));

        render_header(frame, layout[0], "ADD DOCTOR");
        frame.render_widget(
            Paragraph::new("New doctors appear in visit forms right away and in the admin queue until verified.")
                .style(Style::default().fg(palette::MUTED))
                .alignment(Alignment::Center),
            layout[1],
        );

        render_input(frame, layout[2], "Name *", &self.form.name, self.focus_index == NAME);
        render_input(
            frame,
            layout[3],
            "Specialization",
            &self.form.specialization,
            self.focus_index == SPECIALIZATION,
        );
        render_input(frame, layout[4], "Hospital *", &self.form.hospital, self.focus_index == HOSPITAL);

        self.status.render(frame, layout[5]);
        render_button(frame, layout[6], "Save", self.focus_index == SAVE);
        render_button(frame, layout[7], "Back", self.focus_index == BACK);
        render_help(frame, layout[9], "Tab/↑↓: Move | Enter: Save | Esc: Back");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::test_support::{key, typed};
    use crate::db::{self, open_memory_database};
    use crate::models::Role;

    #[test]
    fn saves_unverified_doctor_and_clears_form() {
        let conn = open_memory_database().unwrap();
        let mut screen = AddDoctor::new(Session {
            profile_id: 1,
            role: Role::Admin,
            full_name: "Administrator".into(),
        });
        for value in ["Dr. Mehta", "ENT", "Civil Hospital"] {
            for k in typed(value) {
                screen.handle_input(&conn, k).unwrap();
            }
            screen.handle_input(&conn, key(KeyCode::Tab)).unwrap();
        }
        screen.handle_input(&conn, key(KeyCode::Enter)).unwrap();

        let doctors = db::doctors::get_unverified_doctors(&conn).unwrap();
        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].hospital, "Civil Hospital");
        assert!(screen.form.name.is_empty());
        assert!(!screen.status.is_error());
    }

    #[test]
    fn missing_hospital_is_reported() {
        let conn = open_memory_database().unwrap();
        let mut screen = AddDoctor::new(Session {
            profile_id: 1,
            role: Role::Admin,
            full_name: "Administrator".into(),
        });
        for k in typed("Dr. Mehta") {
            screen.handle_input(&conn, k).unwrap();
        }
        screen.handle_input(&conn, key(KeyCode::Enter)).unwrap();
        assert_eq!(screen.status.text(), Some("Doctor name and hospital are required."));
    }
}
