use crate::app::SelectedApp;
use crate::auth::Session;
use crate::components::{palette, render_help, screen_background, Component, ConfirmDialog};
use crate::config::APP_NAME;
use crate::models::{ProfileStatus, Role};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, Padding, Paragraph, Wrap},
};
use rusqlite::Connection;

struct MenuEntry {
    label: &'static str,
    description: &'static str,
    target: SelectedApp,
}

const MR_MENU: &[MenuEntry] = &[
    MenuEntry {
        label: "My Dashboard",
        description: "This month's visits and order value, doctors reached, recent visits and the monthly trend.",
        target: SelectedApp::MrDashboard,
    },
    MenuEntry {
        label: "Log Visit",
        description: "Record a doctor visit and stage the medicines ordered. Visits are submitted as pending.",
        target: SelectedApp::LogVisit,
    },
    MenuEntry {
        label: "Add Doctor",
        description: "Add a doctor met in the field. New doctors wait for admin verification.",
        target: SelectedApp::AddDoctor,
    },
    MenuEntry {
        label: "Medicine Catalog",
        description: "Search, add, edit and remove medicines.",
        target: SelectedApp::Medicines,
    },
];

const ADMIN_MENU: &[MenuEntry] = &[
    MenuEntry {
        label: "Admin Dashboard",
        description: "Totals, six-month trends, the representative leaderboard and the approval queue.",
        target: SelectedApp::AdminDashboard,
    },
    MenuEntry {
        label: "Medicine Catalog",
        description: "Search, add, edit and remove medicines.",
        target: SelectedApp::Medicines,
    },
    MenuEntry {
        label: "Add Doctor",
        description: "Add a doctor to the directory. It still shows up in the approval queue.",
        target: SelectedApp::AddDoctor,
    },
];

/// Role-specific landing menu.
pub struct Home {
    full_name: String,
    role: Role,
    status: ProfileStatus,
    menu: &'static [MenuEntry],
    selected: usize,
    logout_focused: bool,
    logout_dialog: ConfirmDialog,
}

impl Home {
    pub fn new(session: &Session, status: ProfileStatus) -> Self {
        let menu = match session.role {
            Role::Admin => ADMIN_MENU,
            Role::Mr => MR_MENU,
        };
        Self {
            full_name: session.full_name.clone(),
            role: session.role,
            status,
            menu,
            selected: 0,
            logout_focused: false,
            logout_dialog: ConfirmDialog::default(),
        }
    }

    /// Whether this menu offers `app` at all.
    pub fn offers(&self, app: SelectedApp) -> bool {
        self.menu.iter().any(|entry| entry.target == app)
    }
}

impl Component for Home {
    /// `Some(SelectedApp::None)` means the user confirmed logout.
    fn handle_input(&mut self, _conn: &Connection, key: KeyEvent) -> Result<Option<SelectedApp>> {
        if self.logout_dialog.is_open() {
            return Ok(match self.logout_dialog.handle_input(key) {
                Some(true) => Some(SelectedApp::None),
                _ => None,
            });
        }

        match key.code {
            KeyCode::Tab => self.logout_focused = !self.logout_focused,
            KeyCode::Up if !self.logout_focused => {
                self.selected = (self.selected + self.menu.len() - 1) % self.menu.len();
            }
            KeyCode::Down if !self.logout_focused => {
                self.selected = (self.selected + 1) % self.menu.len();
            }
            KeyCode::Enter if self.logout_focused => self.logout_dialog.open(),
            KeyCode::Enter => return Ok(Some(self.menu[self.selected].target)),
            KeyCode::Esc => self.logout_dialog.open(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        let area = screen_background(frame);

        let main_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(1),
                Constraint::Min(10),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        let mut welcome = vec![Line::from(vec![
            Span::styled(
                format!("Welcome to {APP_NAME}, "),
                Style::default().fg(palette::TEXT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.full_name.as_str(),
                Style::default()
                    .fg(palette::ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
        ])];
        if self.role == Role::Mr && self.status != ProfileStatus::Active {
            welcome.push(Line::from(Span::styled(
                format!(
                    "Account {}: visits can be submitted once an admin activates it.",
                    self.status.as_str()
                ),
                Style::default().fg(palette::FOCUS),
            )));
        }

        let welcome_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(palette::BORDER))
            .style(Style::default().bg(palette::PANEL))
            .padding(Padding::new(0, 0, 1, 0));
        frame.render_widget(
            Paragraph::new(welcome)
                .alignment(Alignment::Center)
                .block(welcome_block),
            main_layout[0],
        );

        let instruction = Paragraph::new("Please select a task:")
            .style(Style::default().fg(palette::MUTED))
            .alignment(Alignment::Center);
        frame.render_widget(instruction, main_layout[1]);

        let content_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .spacing(2)
            .margin(1)
            .split(main_layout[2]);

        let menu_border = if self.logout_focused {
            palette::BORDER_IDLE
        } else {
            palette::FOCUS
        };
        let menu_title = match self.role {
            Role::Admin => " Administration ",
            Role::Mr => " Field Work ",
        };
        let items: Vec<ListItem> = self
            .menu
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                if idx == self.selected {
                    ListItem::new(format!(" ► {}", entry.label)).style(
                        Style::default()
                            .fg(palette::FOCUS)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    ListItem::new(format!("   {}", entry.label))
                        .style(Style::default().fg(palette::TEXT))
                }
            })
            .collect();
        let menu = List::new(items).block(
            Block::default()
                .title(menu_title)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(menu_border))
                .style(Style::default().bg(palette::PANEL))
                .padding(Padding::new(1, 1, 1, 0)),
        );
        frame.render_widget(menu, content_layout[0]);

        let entry = &self.menu[self.selected];
        let description = Paragraph::new(vec![
            Line::from(Span::styled(
                entry.label,
                Style::default()
                    .fg(palette::ACCENT)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(entry.description),
        ])
        .style(Style::default().fg(palette::TEXT))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(" Details ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(palette::BORDER_IDLE))
                .style(Style::default().bg(palette::PANEL))
                .padding(Padding::new(2, 2, 1, 0)),
        );
        frame.render_widget(description, content_layout[1]);

        render_help(
            frame,
            main_layout[3],
            "↑↓: Navigate | Enter: Select | Tab: Logout | Esc: Logout | Ctrl+Q: Quit",
        );

        let (logout_text, logout_color) = if self.logout_focused {
            ("[ Logout ]", palette::DANGER)
        } else {
            ("  Logout  ", palette::MUTED)
        };
        let logout = Paragraph::new(logout_text)
            .style(Style::default().fg(logout_color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(logout_color))
                    .style(Style::default().bg(palette::INPUT)),
            );
        frame.render_widget(logout, main_layout[4]);

        self.logout_dialog
            .render(frame, "Confirm Logout", "Are you sure you want to logout?");
    }
}
