use super::{render_stat_card, render_trend_chart};
use crate::analytics::mr::MrDashboard;
use crate::app::SelectedApp;
use crate::auth::Session;
use crate::components::{
    money, palette, panel, render_button, render_header, render_help, screen_background,
    Component, StatusLine,
};
use crate::db;
use crate::models::VisitStatus;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Cell, Row, Table},
};
use rusqlite::Connection;
use time::Date;

pub struct MrDashboardView {
    rep_id: i64,
    today: Date,
    dashboard: MrDashboard,
    status: StatusLine,
}

impl MrDashboardView {
    pub fn new(conn: &Connection, session: &Session, today: Date) -> Self {
        let mut view = Self {
            rep_id: session.profile_id,
            today,
            dashboard: MrDashboard::default(),
            status: StatusLine::default(),
        };
        view.refresh(conn);
        view
    }

    fn refresh(&mut self, conn: &Connection) {
        match MrDashboard::load(conn, self.rep_id, self.today) {
            Ok(dashboard) => self.dashboard = dashboard,
            Err(e) => self.status.error(format!("Failed to load dashboard: {e}")),
        }
    }
}

fn status_color(status: VisitStatus) -> Color {
    match status {
        VisitStatus::Pending => palette::FOCUS,
        VisitStatus::Approved => palette::SUCCESS,
        VisitStatus::Rejected => palette::DANGER,
    }
}

impl Component for MrDashboardView {
    fn handle_input(&mut self, conn: &Connection, key: KeyEvent) -> Result<Option<SelectedApp>> {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.status.clear();
                self.refresh(conn);
                if !self.status.is_error() {
                    self.status.success("Dashboard refreshed.");
                }
            }
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                return Ok(Some(SelectedApp::None));
            }
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
                Constraint::Length(3), // Header
                Constraint::Length(4), // Stat cards
                Constraint::Min(8),    // Recent visits
                Constraint::Length(12), // Trend
                Constraint::Length(1), // Help
                Constraint::Length(1), // Back
                Constraint::Length(1), // Status
            ])
            .margin(1)
            .split(area);

        render_header(frame, layout[0], "MY DASHBOARD");

        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .spacing(1)
            .split(layout[1]);
        let d = &self.dashboard;
        render_stat_card(frame, cards[0], "Visits this month", d.visits_this_month.to_string());
        render_stat_card(frame, cards[1], "Orders this month", money(d.monthly_order_value));
        render_stat_card(frame, cards[2], "Doctors reached", d.unique_doctors.to_string());
        render_stat_card(frame, cards[3], "Visits logged", d.total_visits.to_string());

        let header = Row::new(
            ["Date", "Doctor", "Status", "Units", "Value"]
                .into_iter()
                .map(|h| Cell::from(h).style(Style::default().fg(palette::TEXT))),
        )
        .style(Style::default().bg(palette::INPUT))
        .bottom_margin(1);

        let rows = d.recent.iter().map(|visit| {
            Row::new(vec![
                Cell::from(db::format_date(visit.visit_date).unwrap_or_default()),
                Cell::from(visit.doctor_name.clone()),
                Cell::from(visit.status.as_str())
                    .style(Style::default().fg(status_color(visit.status))),
                Cell::from(visit.order_count.to_string()),
                Cell::from(money(visit.order_value)),
            ])
        });

        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Percentage(35),
                Constraint::Length(10),
                Constraint::Length(8),
                Constraint::Min(12),
            ],
        )
        .header(header)
        .style(Style::default().fg(palette::TEXT))
        .block(panel("Recent Visits"));
        frame.render_widget(table, layout[2]);

        render_trend_chart(frame, layout[3], "Monthly Performance", &d.trend);

        render_help(frame, layout[4], "R: Refresh | Esc: Back");
        render_button(frame, layout[5], "Back", true);
        self.status.render(frame, layout[6]);
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

    fn priya(conn: &Connection) -> Session {
        let profile = db::profiles::get_profiles(conn)
            .unwrap()
            .into_iter()
            .find(|p| p.role == Role::Mr && p.full_name.starts_with("Priya"))
            .unwrap();
        Session {
            profile_id: profile.id,
            role: profile.role,
            full_name: profile.full_name,
        }
    }

    #[test]
    fn loads_seeded_visits_and_renders() {
        let conn = open_memory_database().unwrap();
        let today = Date::from_calendar_date(2024, Month::June, 20).unwrap();
        seed::seed_demo(&conn, today).unwrap();

        let mut view = MrDashboardView::new(&conn, &priya(&conn), today);
        assert!(view.dashboard.total_visits > 0);
        assert!(!view.status.is_error());

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| view.render(frame)).unwrap();

        assert_eq!(
            view.handle_input(&conn, key(KeyCode::Esc)).unwrap(),
            Some(SelectedApp::None)
        );
    }
}
