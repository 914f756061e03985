//! Admin dashboard: totals, trends, leaderboard and the approval queue.
//!
//! Every approve or reject reloads the whole dashboard from the database.

use super::{render_stat_card, render_trend_chart};
use crate::analytics::admin::AdminDashboard;
use crate::analytics::approvals::{self, ApprovalKind, Decision, PendingApproval};
use crate::app::SelectedApp;
use crate::auth::Session;
use crate::components::{
    money, palette, panel, render_header, render_help, screen_background, Component,
    ConfirmDialog, StatusLine,
};
use crate::db;
use crate::tui::Frame;
use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Cell, Paragraph, Row, Table, TableState},
};
use rusqlite::Connection;
use time::Date;

pub struct AdminDashboardView {
    admin_id: i64,
    today: Date,
    dashboard: AdminDashboard,
    queue_state: TableState,
    reports_saved: usize,
    last_report_at: Option<String>,
    reject_dialog: ConfirmDialog,
    status: StatusLine,
}

impl AdminDashboardView {
    pub fn new(conn: &Connection, session: &Session, today: Date) -> Self {
        let mut view = Self {
            admin_id: session.profile_id,
            today,
            dashboard: AdminDashboard::default(),
            queue_state: TableState::default(),
            reports_saved: 0,
            last_report_at: None,
            reject_dialog: ConfirmDialog::default(),
            status: StatusLine::default(),
        };
        view.refresh(conn);
        view
    }

    fn refresh(&mut self, conn: &Connection) {
        if let Err(e) = self.reload(conn) {
            self.status.error(format!("{e:#}"));
        }
    }

    fn reload(&mut self, conn: &Connection) -> Result<()> {
        self.dashboard =
            AdminDashboard::load(conn, self.today).context("Failed to load dashboard")?;
        let reports = db::reports::get_reports(conn).context("Failed to load reports")?;
        self.reports_saved = reports.len();
        self.last_report_at = reports.first().map(|r| r.created_at.clone());
        self.clamp_selection();
        Ok(())
    }

    /// Reports a completed mutation, then re-fetches. A failed re-fetch is
    /// shown as an error alongside the mutation that did happen.
    fn finish(&mut self, conn: &Connection, done: String) {
        match self.reload(conn) {
            Ok(()) => self.status.success(done),
            Err(e) => self.status.error(format!("{done} {e:#}")),
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.dashboard.pending.len();
        let selected = match self.queue_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.queue_state.select(selected);
    }

    fn selected_entry(&self) -> Option<&PendingApproval> {
        self.queue_state
            .selected()
            .and_then(|i| self.dashboard.pending.get(i))
    }

    fn apply(&mut self, conn: &Connection, decision: Decision) {
        let Some((kind, id, title)) = self
            .selected_entry()
            .map(|entry| (entry.kind(), entry.id(), entry.title()))
        else {
            self.status.error("Nothing selected.");
            return;
        };

        let result = match decision {
            Decision::Approve => approvals::approve(conn, kind, id),
            Decision::Reject => approvals::reject(conn, kind, id),
        };
        match result {
            Ok(()) => {
                let verb = match decision {
                    Decision::Approve => "approved",
                    Decision::Reject => "rejected",
                };
                self.finish(conn, format!("{} '{title}' {verb}.", kind.label()));
            }
            Err(e) => self.status.error(format!("Failed to update {}: {e}", kind.label())),
        }
    }

    fn save_report(&mut self, conn: &Connection) {
        match self.dashboard.save_report(conn, self.admin_id) {
            Ok(id) => self.finish(conn, format!("Report #{id} saved.")),
            Err(e) => self.status.error(format!("Failed to save report: {e}")),
        }
    }

    fn move_selection(&mut self, forward: bool) {
        let len = self.dashboard.pending.len();
        if len == 0 {
            return;
        }
        let current = self.queue_state.selected().unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.queue_state.select(Some(next));
    }

    fn reject_question(&self) -> &'static str {
        match self.selected_entry().map(PendingApproval::kind) {
            Some(ApprovalKind::Doctor) => "Reject and delete this doctor?",
            Some(ApprovalKind::User) => "Reject and deactivate this account?",
            _ => "Reject the selected entry?",
        }
    }
}

impl Component for AdminDashboardView {
    fn handle_input(&mut self, conn: &Connection, key: KeyEvent) -> Result<Option<SelectedApp>> {
        if self.reject_dialog.is_open() {
            if self.reject_dialog.handle_input(key) == Some(true) {
                self.apply(conn, Decision::Reject);
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Up => self.move_selection(false),
            KeyCode::Down => self.move_selection(true),
            KeyCode::Char('a') | KeyCode::Char('A') => self.apply(conn, Decision::Approve),
            KeyCode::Char('x') | KeyCode::Char('X') => {
                if self.selected_entry().is_some() {
                    self.reject_dialog.open();
                } else {
                    self.status.error("Nothing selected.");
                }
            }
            KeyCode::Char('g') | KeyCode::Char('G') => self.save_report(conn),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.status.clear();
                self.refresh(conn);
                if !self.status.is_error() {
                    self.status.success("Dashboard refreshed.");
                }
            }
            KeyCode::Esc => return Ok(Some(SelectedApp::None)),
            _ => {}
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
                Constraint::Length(4),  // Totals
                Constraint::Length(11), // Trends
                Constraint::Min(8),     // Leaderboard + queue
                Constraint::Length(1),  // Reports
                Constraint::Length(1),  // Help
                Constraint::Length(1),  // Status
            ])
            .margin(1)
            .split(area);

        render_header(frame, layout[0], "ADMIN DASHBOARD");

        let totals = &self.dashboard.totals;
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 5); 5])
            .spacing(1)
            .split(layout[1]);
        render_stat_card(
            frame,
            cards[0],
            "Representatives (active)",
            format!("{} ({})", totals.representatives, totals.active_representatives),
        );
        render_stat_card(frame, cards[1], "Doctors", totals.doctors.to_string());
        render_stat_card(frame, cards[2], "Visits", totals.visits.to_string());
        render_stat_card(frame, cards[3], "Order value (all)", money(totals.order_value));
        render_stat_card(
            frame,
            cards[4],
            "Order value (approved)",
            money(totals.approved_order_value),
        );

        let trends = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .spacing(1)
            .split(layout[2]);
        render_trend_chart(frame, trends[0], "Visits · 6 months", &self.dashboard.visit_trend);
        render_trend_chart(frame, trends[1], "Order lines · 6 months", &self.dashboard.order_trend);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .spacing(1)
            .split(layout[3]);
        self.render_leaderboard(frame, bottom[0]);
        self.render_queue(frame, bottom[1]);

        let reports = match &self.last_report_at {
            Some(at) => format!("Saved reports: {} (latest {at})", self.reports_saved),
            None => "Saved reports: none".to_string(),
        };
        frame.render_widget(
            Paragraph::new(reports)
                .style(Style::default().fg(palette::MUTED))
                .alignment(Alignment::Center),
            layout[4],
        );

        render_help(
            frame,
            layout[5],
            "↑↓: Select | A: Approve | X: Reject | G: Save report | R: Refresh | Esc: Back",
        );
        self.status.render(frame, layout[6]);

        self.reject_dialog
            .render(frame, "Confirm Reject", self.reject_question());
    }
}

impl AdminDashboardView {
    fn render_leaderboard(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(
            ["#", "Representative", "Approved", "Value"]
                .into_iter()
                .map(|h| Cell::from(h).style(Style::default().fg(palette::TEXT))),
        )
        .style(Style::default().bg(palette::INPUT))
        .bottom_margin(1);

        let rows = self
            .dashboard
            .leaderboard
            .iter()
            .enumerate()
            .map(|(rank, entry)| {
                Row::new(vec![
                    Cell::from((rank + 1).to_string()),
                    Cell::from(entry.name.clone()),
                    Cell::from(entry.visits.to_string()),
                    Cell::from(money(entry.order_value)),
                ])
            });

        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Percentage(45),
                Constraint::Length(9),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .style(Style::default().fg(palette::TEXT))
        .block(panel("Leaderboard"));
        frame.render_widget(table, area);
    }

    fn render_queue(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(
            ["Kind", "Who / What", "Details"]
                .into_iter()
                .map(|h| Cell::from(h).style(Style::default().fg(palette::TEXT))),
        )
        .style(Style::default().bg(palette::INPUT))
        .bottom_margin(1);

        let rows = self.dashboard.pending.iter().map(|entry| {
            Row::new(vec![
                Cell::from(entry.kind().label()).style(Style::default().fg(palette::ACCENT)),
                Cell::from(entry.title()),
                Cell::from(entry.detail()),
            ])
        });

        let title = format!("Pending Approvals ({})", self.dashboard.pending_count);
        let table = Table::new(
            rows,
            [
                Constraint::Length(14),
                Constraint::Percentage(40),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .style(Style::default().fg(palette::TEXT))
        .block(panel(&title))
        .row_highlight_style(
            Style::default()
                .bg(palette::HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("► ");

        frame.render_stateful_widget(table, area, &mut self.queue_state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::test_support::key;
    use crate::db::{open_memory_database, seed};
    use crate::models::Role;
    use ratatui::{backend::TestBackend, Terminal};
    use time::Month;

    fn today() -> Date {
        Date::from_calendar_date(2024, Month::June, 20).unwrap()
    }

    fn admin_view(conn: &Connection) -> AdminDashboardView {
        let session = Session {
            profile_id: 1,
            role: Role::Admin,
            full_name: "Administrator".into(),
        };
        AdminDashboardView::new(conn, &session, today())
    }

    #[test]
    fn approving_refetches_and_shrinks_queue() {
        let conn = open_memory_database().unwrap();
        seed::seed_demo(&conn, today()).unwrap();
        let mut view = admin_view(&conn);
        let before = view.dashboard.pending.len();
        assert!(before > 0);
        assert_eq!(view.queue_state.selected(), Some(0));

        view.handle_input(&conn, key(KeyCode::Char('a'))).unwrap();

        assert_eq!(view.dashboard.pending.len(), before - 1);
        assert!(!view.status.is_error());
    }

    #[test]
    fn failed_refetch_after_approval_is_reported() {
        let conn = open_memory_database().unwrap();
        seed::seed_demo(&conn, today()).unwrap();
        let mut view = admin_view(&conn);
        let before = view.dashboard.pending.len();

        conn.execute(
            "INSERT INTO visits (doctor_id, rep_id, visit_date, status)
             SELECT d.id, p.id, 'not-a-date', 'pending'
             FROM doctors d, profiles p WHERE p.role = 'mr' LIMIT 1",
            [],
        )
        .unwrap();
        view.handle_input(&conn, key(KeyCode::Char('a'))).unwrap();

        assert!(view.status.is_error());
        let text = view.status.text().unwrap();
        assert!(text.contains("approved."), "{text}");
        assert!(text.contains("Failed to load dashboard"), "{text}");
        assert_eq!(view.dashboard.pending.len(), before);
    }

    #[test]
    fn reject_waits_for_confirmation() {
        let conn = open_memory_database().unwrap();
        seed::seed_demo(&conn, today()).unwrap();
        let mut view = admin_view(&conn);
        let before = view.dashboard.pending.len();

        view.handle_input(&conn, key(KeyCode::Char('x'))).unwrap();
        view.handle_input(&conn, key(KeyCode::Esc)).unwrap();
        assert_eq!(view.dashboard.pending.len(), before);

        view.handle_input(&conn, key(KeyCode::Char('x'))).unwrap();
        view.handle_input(&conn, key(KeyCode::Char('y'))).unwrap();
        assert_eq!(view.dashboard.pending.len(), before - 1);
    }

    #[test]
    fn saving_report_is_counted_and_renders() {
        let conn = open_memory_database().unwrap();
        let mut view = admin_view(&conn);
        assert_eq!(view.reports_saved, 0);
        assert_eq!(view.queue_state.selected(), None);

        view.handle_input(&conn, key(KeyCode::Char('g'))).unwrap();
        assert_eq!(view.reports_saved, 1);
        assert!(view.last_report_at.is_some());

        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        terminal.draw(|frame| view.render(frame)).unwrap();
    }

    #[test]
    fn empty_queue_reports_nothing_selected() {
        let conn = open_memory_database().unwrap();
        let mut view = admin_view(&conn);
        view.handle_input(&conn, key(KeyCode::Char('a'))).unwrap();
        assert_eq!(view.status.text(), Some("Nothing selected."));
    }
}
