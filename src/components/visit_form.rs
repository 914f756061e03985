//! Visit logging form with staged medicine orders.

use crate::app::SelectedApp;
use crate::auth::Session;
use crate::components::{
    edit_text, money, palette, panel, render_button, render_header, render_help, render_input,
    screen_background, Component, StatusLine,
};
use crate::db;
use crate::models::{Doctor, Medicine, Profile};
use crate::tui::Frame;
use crate::visits::{self, OrderStage, VisitDraft};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Cell, Paragraph, Row, Table, TableState},
};
use rusqlite::Connection;
use time::Date;

const DOCTOR: usize = 0;
const DATE: usize = 1;
const HOSPITAL: usize = 2;
const NOTES: usize = 3;
const MEDICINE: usize = 4;
const QUANTITY: usize = 5;
const ADD_ORDER: usize = 6;
const STAGED: usize = 7;
const SUBMIT: usize = 8;
const BACK: usize = 9;
const FOCUS_COUNT: usize = 10;

pub struct LogVisit {
    rep: Option<Profile>,
    doctors: Vec<Doctor>,
    catalog: Vec<Medicine>,
    draft: VisitDraft,
    doctor_index: Option<usize>,
    medicine_index: Option<usize>,
    quantity: String,
    stage: OrderStage,
    staged_state: TableState,
    focus_index: usize,
    status: StatusLine,
}

impl LogVisit {
    pub fn new(conn: &Connection, session: &Session, today: Date) -> Self {
        let mut form = Self {
            rep: None,
            doctors: Vec::new(),
            catalog: Vec::new(),
            draft: VisitDraft::new(today),
            doctor_index: None,
            medicine_index: None,
            quantity: String::new(),
            stage: OrderStage::new(),
            staged_state: TableState::default(),
            focus_index: DOCTOR,
            status: StatusLine::default(),
        };
        form.load(conn, session.profile_id);
        form
    }

    fn load(&mut self, conn: &Connection, rep_id: i64) {
        match db::profiles::get_profile(conn, rep_id) {
            Ok(profile) => self.rep = Some(profile),
            Err(e) => {
                tracing::warn!(rep_id, error = %e, "could not resolve representative");
                self.status.error(format!("Could not load your profile: {e}"));
            }
        }
        match db::doctors::get_all_doctors(conn) {
            Ok(doctors) => self.doctors = doctors,
            Err(e) => self.status.error(format!("Failed to load doctors: {e}")),
        }
        match db::medicines::get_all_medicines(conn) {
            Ok(catalog) => self.catalog = catalog,
            Err(e) => self.status.error(format!("Failed to load medicines: {e}")),
        }
    }

    fn cycle(index: Option<usize>, len: usize, forward: bool) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(match (index, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        })
    }

    fn cycle_doctor(&mut self, forward: bool) {
        self.doctor_index = Self::cycle(self.doctor_index, self.doctors.len(), forward);
        if let Some(doctor) = self.doctor_index.and_then(|i| self.doctors.get(i)) {
            self.draft.select_doctor(doctor);
        }
    }

    fn cycle_medicine(&mut self, forward: bool) {
        self.medicine_index = Self::cycle(self.medicine_index, self.catalog.len(), forward);
    }

    fn add_order(&mut self) {
        let Some(medicine_id) = self
            .medicine_index
            .and_then(|i| self.catalog.get(i))
            .map(|m| m.id)
        else {
            self.status.error("Select a medicine first.");
            return;
        };
        let quantity = match self.quantity.trim() {
            "" => 0,
            raw => match raw.parse::<i64>() {
                Ok(quantity) => quantity,
                Err(_) => {
                    self.status.error("Quantity must be a whole number.");
                    return;
                }
            },
        };

        match self.stage.add_order(&self.catalog, medicine_id, quantity) {
            Ok(line) => {
                let message = format!("Added {} × {}.", line.quantity, line.name);
                self.status.success(message);
                self.medicine_index = None;
                self.quantity.clear();
                self.staged_state.select(Some(self.stage.len() - 1));
                self.focus_index = MEDICINE;
            }
            Err(e) => self.status.error(e.to_string()),
        }
    }

    fn remove_selected_order(&mut self) {
        let Some(index) = self.staged_state.selected() else {
            return;
        };
        if let Some(line) = self.stage.remove_order(index) {
            self.status.success(format!("Removed {}.", line.name));
        }
        let selected = match self.stage.len() {
            0 => None,
            len => Some(index.min(len - 1)),
        };
        self.staged_state.select(selected);
    }

    fn move_staged(&mut self, forward: bool) {
        let next = Self::cycle(self.staged_state.selected(), self.stage.len(), forward);
        self.staged_state.select(next);
    }

    fn submit(&mut self, conn: &Connection) -> Option<SelectedApp> {
        match visits::submit_visit(conn, self.rep.as_ref(), &self.draft, &self.stage) {
            Ok(_) => {
                self.stage = OrderStage::new();
                Some(SelectedApp::None)
            }
            Err(e) => {
                self.status.error(e.to_string());
                None
            }
        }
    }

    fn text_field_mut(&mut self) -> Option<&mut String> {
        match self.focus_index {
            DATE => Some(&mut self.draft.visit_date),
            HOSPITAL => Some(&mut self.draft.hospital),
            NOTES => Some(&mut self.draft.notes),
            QUANTITY => Some(&mut self.quantity),
            _ => None,
        }
    }
}

impl Component for LogVisit {
    fn handle_input(&mut self, conn: &Connection, key: KeyEvent) -> Result<Option<SelectedApp>> {
        match key.code {
            KeyCode::Esc => return Ok(Some(SelectedApp::None)),
            KeyCode::Tab => self.focus_index = (self.focus_index + 1) % FOCUS_COUNT,
            KeyCode::BackTab => {
                self.focus_index = (self.focus_index + FOCUS_COUNT - 1) % FOCUS_COUNT;
            }
            KeyCode::Up if self.focus_index == STAGED => self.move_staged(false),
            KeyCode::Down if self.focus_index == STAGED => self.move_staged(true),
            KeyCode::Up => self.focus_index = (self.focus_index + FOCUS_COUNT - 1) % FOCUS_COUNT,
            KeyCode::Down => self.focus_index = (self.focus_index + 1) % FOCUS_COUNT,
            KeyCode::Left | KeyCode::Right if self.focus_index == DOCTOR => {
                self.cycle_doctor(key.code == KeyCode::Right);
            }
            KeyCode::Left | KeyCode::Right if self.focus_index == MEDICINE => {
                self.cycle_medicine(key.code == KeyCode::Right);
            }
            KeyCode::Delete | KeyCode::Backspace if self.focus_index == STAGED => {
                self.remove_selected_order();
            }
            KeyCode::Enter => match self.focus_index {
                MEDICINE | QUANTITY | ADD_ORDER => self.add_order(),
                STAGED => self.remove_selected_order(),
                SUBMIT => return Ok(self.submit(conn)),
                BACK => return Ok(Some(SelectedApp::None)),
                _ => self.focus_index = (self.focus_index + 1) % FOCUS_COUNT,
            },
            _ => {
                if let Some(field) = self.text_field_mut() {
                    edit_text(field, key);
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
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Header
                Constraint::Length(12), // Visit + order entry
                Constraint::Min(6),     // Staged orders
                Constraint::Length(1),  // Total
                Constraint::Length(1),  // Submit
                Constraint::Length(1),  // Back
                Constraint::Length(1),  // Help
                Constraint::Length(1),  // Status
            ])
            .margin(1)
            .split(area);

        render_header(frame, layout[0], "LOG VISIT");

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .spacing(2)
            .split(layout[1]);

        let visit_fields = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3); 4])
            .split(columns[0]);

        let doctor_label = match self.doctor_index.and_then(|i| self.doctors.get(i)) {
            Some(d) if d.is_verified => format!("◄ {} · {} ►", d.name, d.specialization),
            Some(d) => format!("◄ {} · {} (unverified) ►", d.name, d.specialization),
            None if self.doctors.is_empty() => "No doctors yet. Add one from the home menu.".into(),
            None => "◄ Select with ←/→ ►".into(),
        };
        render_input(frame, visit_fields[0], "Doctor", &doctor_label, self.focus_index == DOCTOR);
        render_input(
            frame,
            visit_fields[1],
            "Visit Date (YYYY-MM-DD)",
            &self.draft.visit_date,
            self.focus_index == DATE,
        );
        render_input(frame, visit_fields[2], "Hospital", &self.draft.hospital, self.focus_index == HOSPITAL);
        render_input(frame, visit_fields[3], "Notes", &self.draft.notes, self.focus_index == NOTES);

        let order_fields = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Min(0),
            ])
            .split(columns[1]);

        let medicine_label = match self.medicine_index.and_then(|i| self.catalog.get(i)) {
            Some(m) => format!("◄ {} {} ({}) ►", m.name, m.dosage, m.pack_size),
            None if self.catalog.is_empty() => "Catalog is empty".into(),
            None => "◄ Select with ←/→ ►".into(),
        };
        render_input(frame, order_fields[0], "Medicine", &medicine_label, self.focus_index == MEDICINE);
        render_input(frame, order_fields[1], "Quantity", &self.quantity, self.focus_index == QUANTITY);
        render_button(frame, order_fields[2], "Add Order", self.focus_index == ADD_ORDER);

        if let Some(m) = self.medicine_index.and_then(|i| self.catalog.get(i)) {
            let info = Paragraph::new(format!(
                "{} per pack · {} in stock",
                money(m.price),
                m.stock
            ))
            .style(Style::default().fg(palette::MUTED))
            .alignment(Alignment::Center);
            frame.render_widget(info, order_fields[3]);
        }

        let header = Row::new(
            ["Medicine", "Pack", "Unit Price", "Qty", "Line Total"]
                .into_iter()
                .map(|h| Cell::from(h).style(Style::default().fg(palette::TEXT))),
        )
        .style(Style::default().bg(palette::INPUT))
        .bottom_margin(1);
        let rows = self.stage.lines().iter().map(|line| {
            Row::new(vec![
                Cell::from(line.name.clone()),
                Cell::from(line.pack_size.clone()),
                Cell::from(money(line.unit_price)),
                Cell::from(line.quantity.to_string()),
                Cell::from(money(line.line_total)),
            ])
        });
        let staged_focused = self.focus_index == STAGED;
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(30),
                Constraint::Percentage(20),
                Constraint::Percentage(18),
                Constraint::Percentage(10),
                Constraint::Percentage(22),
            ],
        )
        .header(header)
        .style(Style::default().fg(palette::TEXT))
        .block(panel("Staged Orders").border_style(Style::default().fg(if staged_focused {
            palette::FOCUS
        } else {
            palette::BORDER
        })))
        .row_highlight_style(Style::default().bg(palette::HIGHLIGHT).add_modifier(Modifier::BOLD))
        .highlight_symbol(if staged_focused { "► " } else { "  " });
        frame.render_stateful_widget(table, layout[2], &mut self.staged_state.clone());

        let total = Paragraph::new(Line::from(vec![
            Span::styled("Order total: ", Style::default().fg(palette::MUTED)),
            Span::styled(
                money(self.stage.total()),
                Style::default()
                    .fg(palette::SUCCESS)
                    .add_modifier(Modifier::BOLD),
            ),
        ]))
        .alignment(Alignment::Right);
        frame.render_widget(total, layout[3]);

        render_button(frame, layout[4], "Submit Visit", self.focus_index == SUBMIT);
        render_button(frame, layout[5], "Back", self.focus_index == BACK);
        render_help(
            frame,
            layout[6],
            "Tab/↑↓: Move | ←→: Choose doctor/medicine | Enter: Add/Submit | Del: Remove line | Esc: Back",
        );
        self.status.render(frame, layout[7]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::test_support::{key, typed};
    use crate::db::{open_memory_database, seed};
    use crate::models::{Role, VisitStatus};
    use ratatui::{backend::TestBackend, Terminal};
    use time::Month;

    fn today() -> Date {
        Date::from_calendar_date(2024, Month::June, 20).unwrap()
    }

    fn session_for(conn: &Connection, email: &str) -> Session {
        let profile = db::profiles::get_profiles(conn)
            .unwrap()
            .into_iter()
            .find(|p| p.email == email)
            .unwrap();
        assert_eq!(profile.role, Role::Mr);
        Session {
            profile_id: profile.id,
            role: profile.role,
            full_name: profile.full_name,
        }
    }

    fn focus(form: &mut LogVisit, conn: &Connection, target: usize) {
        while form.focus_index != target {
            form.handle_input(conn, key(KeyCode::Tab)).unwrap();
        }
    }

    fn stage_line(form: &mut LogVisit, conn: &Connection, qty: &str) {
        focus(form, conn, MEDICINE);
        form.handle_input(conn, key(KeyCode::Right)).unwrap();
        focus(form, conn, QUANTITY);
        for k in typed(qty) {
            form.handle_input(conn, k).unwrap();
        }
        form.handle_input(conn, key(KeyCode::Enter)).unwrap();
    }

    #[test]
    fn selecting_doctor_prefills_hospital_but_keeps_edits() {
        let conn = open_memory_database().unwrap();
        seed::seed_demo(&conn, today()).unwrap();
        let mut form = LogVisit::new(&conn, &session_for(&conn, "priya@fieldtrack.local"), today());

        form.handle_input(&conn, key(KeyCode::Right)).unwrap();
        let hospital = form.doctors[0].hospital.clone();
        assert_eq!(form.draft.hospital, hospital);

        focus(&mut form, &conn, HOSPITAL);
        for k in typed(" OPD") {
            form.handle_input(&conn, k).unwrap();
        }
        assert_eq!(form.draft.hospital, format!("{hospital} OPD"));
    }

    #[test]
    fn staging_clears_sub_form_and_tracks_total() {
        let conn = open_memory_database().unwrap();
        seed::seed_demo(&conn, today()).unwrap();
        let mut form = LogVisit::new(&conn, &session_for(&conn, "priya@fieldtrack.local"), today());

        stage_line(&mut form, &conn, "2");
        assert_eq!(form.stage.len(), 1);
        assert!(form.quantity.is_empty());
        assert_eq!(form.medicine_index, None);
        let price = form.catalog[0].price;
        assert_eq!(form.stage.total(), price * rust_decimal::Decimal::from(2));

        stage_line(&mut form, &conn, "0");
        assert_eq!(form.stage.len(), 1);
        assert_eq!(form.status.text(), Some("Quantity must be at least 1."));

        for qty in ["2x", "99999999999999999999"] {
            stage_line(&mut form, &conn, qty);
            assert_eq!(form.stage.len(), 1);
            assert_eq!(form.status.text(), Some("Quantity must be a whole number."));
            form.quantity.clear();
        }

        focus(&mut form, &conn, STAGED);
        form.handle_input(&conn, key(KeyCode::Delete)).unwrap();
        assert!(form.stage.is_empty());
    }

    #[test]
    fn submit_writes_pending_visit_and_returns_home() {
        let conn = open_memory_database().unwrap();
        seed::seed_demo(&conn, today()).unwrap();
        let session = session_for(&conn, "priya@fieldtrack.local");
        let before = db::visits::get_visits_for_rep(&conn, session.profile_id).unwrap().len();
        let mut form = LogVisit::new(&conn, &session, today());

        form.handle_input(&conn, key(KeyCode::Right)).unwrap();
        stage_line(&mut form, &conn, "3");
        focus(&mut form, &conn, SUBMIT);
        let next = form.handle_input(&conn, key(KeyCode::Enter)).unwrap();

        assert_eq!(next, Some(SelectedApp::None));
        let visits = db::visits::get_visits_for_rep(&conn, session.profile_id).unwrap();
        assert_eq!(visits.len(), before + 1);
        let newest = visits.iter().max_by_key(|v| v.visit.id).unwrap();
        assert_eq!(newest.visit.status, VisitStatus::Pending);
        assert_eq!(newest.orders.len(), 1);
        assert_eq!(newest.orders[0].quantity, 3);
    }

    #[test]
    fn pending_account_cannot_submit() {
        let conn = open_memory_database().unwrap();
        seed::seed_demo(&conn, today()).unwrap();
        let mut form = LogVisit::new(&conn, &session_for(&conn, "meera@fieldtrack.local"), today());

        form.handle_input(&conn, key(KeyCode::Right)).unwrap();
        stage_line(&mut form, &conn, "1");
        focus(&mut form, &conn, SUBMIT);

        assert_eq!(form.handle_input(&conn, key(KeyCode::Enter)).unwrap(), None);
        assert!(form.status.is_error());
        assert_eq!(form.stage.len(), 1);

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| form.render(frame)).unwrap();
    }
}
