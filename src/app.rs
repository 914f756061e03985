//! Application state and screen routing.
//!
//! The app owns the database connection and the signed-in session. One
//! screen is active at a time; screens report navigation through the
//! `SelectedApp` they return from `handle_input`.

use crate::analytics;
use crate::auth::{self, Credentials, Session};
use crate::components::dashboard::{admin::AdminDashboardView, mr::MrDashboardView};
use crate::components::{
    add_doctor::AddDoctor, home::Home, login::Login, medicines::MedicineList,
    register::Register, visit_form::LogVisit, Component,
};
use crate::db;
use crate::models::{ProfileStatus, Role};
use crate::tui::{self, Tui};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rusqlite::Connection;

/// Screens reachable from the home menu plus navigation signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedApp {
    MrDashboard,
    LogVisit,
    AddDoctor,
    Medicines,
    AdminDashboard,
    Register,
    /// Back to the previous level (home, or login from home).
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Login,
    Register,
    Home,
    Running(SelectedApp),
}

pub struct App {
    pub state: AppState,
    pub should_quit: bool,
    db: Connection,
    session: Option<Session>,
    login: Login,
    register: Register,
    home: Option<Home>,
    screen: Option<Box<dyn Component>>,
}

impl App {
    pub fn new(db: Connection) -> Self {
        Self {
            state: AppState::Login,
            should_quit: false,
            db,
            session: None,
            login: Login::new(),
            register: Register::new(),
            home: None,
            screen: None,
        }
    }

    pub fn run(&mut self, tui: &mut Tui) -> Result<()> {
        while !self.should_quit {
            tui.draw(|frame| self.render_ui(frame))?;
            match tui.next_event()? {
                tui::Event::Key(key) => self.handle_key(key)?,
                tui::Event::Resize => {}
                tui::Event::Tick => self.tick(),
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        match self.state {
            AppState::Login => match self.login.handle_input(&self.db, key)? {
                Some(SelectedApp::Quit) => self.should_quit = true,
                Some(SelectedApp::Register) => {
                    self.register = Register::new();
                    self.state = AppState::Register;
                }
                Some(SelectedApp::None) => self.attempt_login(),
                _ => {}
            },
            AppState::Register => {
                if self.register.handle_input(&self.db, key)?.is_some() {
                    if self.register.registration_success {
                        self.login.reset();
                        self.login
                            .status
                            .success("Registration successful! Please log in.");
                    }
                    self.state = AppState::Login;
                }
            }
            AppState::Home => {
                let Some(home) = self.home.as_mut() else {
                    self.logout();
                    return Ok(());
                };
                match home.handle_input(&self.db, key)? {
                    Some(SelectedApp::Quit) => self.should_quit = true,
                    Some(SelectedApp::None) => self.logout(),
                    Some(selected) => self.open_screen(selected)?,
                    None => {}
                }
            }
            AppState::Running(_) => {
                let Some(screen) = self.screen.as_mut() else {
                    self.state = AppState::Home;
                    return Ok(());
                };
                match screen.handle_input(&self.db, key)? {
                    Some(SelectedApp::Quit) => self.should_quit = true,
                    Some(_) => self.return_home()?,
                    None => {}
                }
            }
        }
        Ok(())
    }

    fn attempt_login(&mut self) {
        let credentials = Credentials {
            email: self.login.email.clone(),
            password: self.login.password.clone(),
        };
        match auth::login(&self.db, credentials) {
            Ok(session) => {
                self.login.reset();
                self.login.status.clear();
                self.session = Some(session);
                if let Err(e) = self.return_home() {
                    self.login.status.error(format!("{e:#}"));
                    self.logout();
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "login rejected");
                self.login.status.error(format!("{err:#}"));
            }
        }
    }

    /// Rebuilds the home menu so account status changes show up.
    fn return_home(&mut self) -> Result<()> {
        self.screen = None;
        let Some(session) = &self.session else {
            self.state = AppState::Login;
            return Ok(());
        };
        let status = match session.role {
            Role::Admin => ProfileStatus::Active,
            Role::Mr => db::profiles::get_profile(&self.db, session.profile_id)?.status,
        };
        self.home = Some(Home::new(session, status));
        self.state = AppState::Home;
        Ok(())
    }

    fn open_screen(&mut self, selected: SelectedApp) -> Result<()> {
        let Some(session) = self.session.clone() else {
            self.logout();
            return Ok(());
        };
        if !self.home.as_ref().is_some_and(|home| home.offers(selected)) {
            tracing::warn!(?selected, role = session.role.as_str(), "screen not available for role");
            return Ok(());
        }

        let today = analytics::local_today();
        let screen: Box<dyn Component> = match selected {
            SelectedApp::MrDashboard => Box::new(MrDashboardView::new(&self.db, &session, today)),
            SelectedApp::LogVisit => Box::new(LogVisit::new(&self.db, &session, today)),
            SelectedApp::AddDoctor => Box::new(AddDoctor::new(session)),
            SelectedApp::Medicines => Box::new(MedicineList::new(&self.db)),
            SelectedApp::AdminDashboard => {
                Box::new(AdminDashboardView::new(&self.db, &session, today))
            }
            SelectedApp::Register | SelectedApp::None | SelectedApp::Quit => return Ok(()),
        };
        tracing::debug!(?selected, "opening screen");
        self.screen = Some(screen);
        self.state = AppState::Running(selected);
        Ok(())
    }

    fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(profile_id = session.profile_id, "logout");
        }
        self.home = None;
        self.screen = None;
        self.login.reset();
        self.state = AppState::Login;
    }

    fn tick(&mut self) {
        match self.state {
            AppState::Login => self.login.tick(),
            AppState::Register => self.register.tick(),
            AppState::Home => {}
            AppState::Running(_) => {
                if let Some(screen) = self.screen.as_mut() {
                    screen.tick();
                }
            }
        }
    }

    fn render_ui(&self, frame: &mut crate::tui::Frame<'_>) {
        match self.state {
            AppState::Login => self.login.render(frame),
            AppState::Register => self.register.render(frame),
            AppState::Home => {
                if let Some(home) = &self.home {
                    home.render(frame);
                }
            }
            AppState::Running(_) => {
                if let Some(screen) = &self.screen {
                    screen.render(frame);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::test_support::{key, typed};
    use crate::db::{open_memory_database, seed, DEFAULT_ADMIN_EMAIL};
    use time::{Date, Month};

    fn log_in(app: &mut App, email: &str, password: &str) {
        for k in typed(email) {
            app.handle_key(k).unwrap();
        }
        app.handle_key(key(KeyCode::Tab)).unwrap();
        for k in typed(password) {
            app.handle_key(k).unwrap();
        }
        app.handle_key(key(KeyCode::Enter)).unwrap();
    }

    #[test]
    fn admin_logs_in_and_opens_dashboard() {
        let mut app = App::new(open_memory_database().unwrap());
        log_in(&mut app, DEFAULT_ADMIN_EMAIL, "admin");
        assert_eq!(app.state, AppState::Home);

        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.state, AppState::Running(SelectedApp::AdminDashboard));

        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.state, AppState::Home);
        assert!(app.screen.is_none());
    }

    #[test]
    fn wrong_password_stays_on_login() {
        let mut app = App::new(open_memory_database().unwrap());
        log_in(&mut app, DEFAULT_ADMIN_EMAIL, "nope");
        assert_eq!(app.state, AppState::Login);
        assert!(app.session.is_none());
        assert!(app.login.status.is_error());
    }

    #[test]
    fn representative_cannot_open_admin_dashboard() {
        let conn = open_memory_database().unwrap();
        seed::seed_demo(&conn, Date::from_calendar_date(2024, Month::June, 20).unwrap()).unwrap();
        let mut app = App::new(conn);
        log_in(&mut app, "priya@fieldtrack.local", seed::DEMO_PASSWORD);
        assert_eq!(app.state, AppState::Home);

        app.open_screen(SelectedApp::AdminDashboard).unwrap();
        assert_eq!(app.state, AppState::Home);

        app.open_screen(SelectedApp::LogVisit).unwrap();
        assert_eq!(app.state, AppState::Running(SelectedApp::LogVisit));
    }

    #[test]
    fn logout_clears_session() {
        let mut app = App::new(open_memory_database().unwrap());
        log_in(&mut app, DEFAULT_ADMIN_EMAIL, "admin");
        app.handle_key(key(KeyCode::Esc)).unwrap();
        app.handle_key(key(KeyCode::Char('y'))).unwrap();
        assert_eq!(app.state, AppState::Login);
        assert!(app.session.is_none());
    }

    #[test]
    fn ctrl_q_quits_from_anywhere() {
        let mut app = App::new(open_memory_database().unwrap());
        app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(app.should_quit);
    }
}
