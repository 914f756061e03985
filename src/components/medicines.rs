//! Medicine catalog: search, create, edit and delete.

use crate::app::SelectedApp;
use crate::catalog::{MedicineCatalog, MedicineForm};
use crate::components::{
    centered_rect, edit_text, money, palette, panel, render_button, render_header, render_help,
    render_input, screen_background, Component, ConfirmDialog, StatusLine,
};
use crate::models::Medicine;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Cell, Clear, Row, Table, TableState},
};
use rusqlite::Connection;

const SEARCH: usize = 0;
const TABLE: usize = 1;

const FORM_FIELDS: [&str; 8] = [
    "Name *",
    "Category *",
    "Type",
    "Dosage *",
    "Pack Size",
    "Price *",
    "Stock",
    "Description",
];
const FORM_SAVE: usize = FORM_FIELDS.len();
const FORM_CANCEL: usize = FORM_FIELDS.len() + 1;
const FORM_FOCUS_COUNT: usize = FORM_FIELDS.len() + 2;

struct EditForm {
    /// `None` when creating.
    medicine_id: Option<i64>,
    fields: MedicineForm,
    focus_index: usize,
}

impl EditForm {
    fn field_mut(&mut self) -> Option<&mut String> {
        let f = &mut self.fields;
        match self.focus_index {
            0 => Some(&mut f.name),
            1 => Some(&mut f.category),
            2 => Some(&mut f.medicine_type),
            3 => Some(&mut f.dosage),
            4 => Some(&mut f.pack_size),
            5 => Some(&mut f.price),
            6 => Some(&mut f.stock),
            7 => Some(&mut f.description),
            _ => None,
        }
    }

    fn values(&self) -> [&str; 8] {
        let f = &self.fields;
        [
            f.name.as_str(),
            f.category.as_str(),
            f.medicine_type.as_str(),
            f.dosage.as_str(),
            f.pack_size.as_str(),
            f.price.as_str(),
            f.stock.as_str(),
            f.description.as_str(),
        ]
    }
}

pub struct MedicineList {
    catalog: MedicineCatalog,
    search: String,
    focus_index: usize,
    table_state: TableState,
    form: Option<EditForm>,
    delete_dialog: ConfirmDialog,
    status: StatusLine,
}

impl MedicineList {
    pub fn new(conn: &Connection) -> Self {
        let mut list = Self {
            catalog: MedicineCatalog::default(),
            search: String::new(),
            focus_index: SEARCH,
            table_state: TableState::default(),
            form: None,
            delete_dialog: ConfirmDialog::default(),
            status: StatusLine::default(),
        };
        list.fetch(conn);
        list
    }

    fn fetch(&mut self, conn: &Connection) {
        match MedicineCatalog::load(conn) {
            Ok(catalog) => self.catalog = catalog,
            Err(e) => self.status.error(format!("Failed to load medicines: {e}")),
        }
        self.clamp_selection();
    }

    fn visible(&self) -> Vec<&Medicine> {
        self.catalog.search(&self.search)
    }

    fn selected_medicine(&self) -> Option<&Medicine> {
        self.table_state
            .selected()
            .and_then(|i| self.visible().get(i).copied())
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        let selected = match self.table_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    fn move_selection(&mut self, forward: bool) {
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.table_state.select(Some(next));
    }

    fn open_form(&mut self, medicine: Option<&Medicine>) {
        self.form = Some(EditForm {
            medicine_id: medicine.map(|m| m.id),
            fields: medicine.map(MedicineForm::from_medicine).unwrap_or_default(),
            focus_index: 0,
        });
    }

    fn save_form(&mut self, conn: &Connection) {
        let Some(form) = &self.form else {
            return;
        };
        let result = match form.medicine_id {
            Some(id) => self
                .catalog
                .update(conn, id, &form.fields)
                .map(|m| format!("Updated {}.", m.name)),
            None => self
                .catalog
                .create(conn, &form.fields)
                .map(|m| format!("Added {}.", m.name)),
        };
        match result {
            Ok(message) => {
                self.form = None;
                self.status.success(message);
                self.clamp_selection();
            }
            Err(e) => self.status.error(e.to_string()),
        }
    }

    fn delete_selected(&mut self, conn: &Connection) {
        let Some((id, name)) = self.selected_medicine().map(|m| (m.id, m.name.clone())) else {
            return;
        };
        match self.catalog.delete(conn, id) {
            Ok(()) => {
                self.status.success(format!("Deleted {name}."));
                self.clamp_selection();
            }
            Err(e) => self.status.error(format!("Could not delete {name}: {e}")),
        }
    }

    fn handle_form_input(&mut self, conn: &Connection, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.form = None,
            KeyCode::Tab | KeyCode::Down => {
                form.focus_index = (form.focus_index + 1) % FORM_FOCUS_COUNT;
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.focus_index = (form.focus_index + FORM_FOCUS_COUNT - 1) % FORM_FOCUS_COUNT;
            }
            KeyCode::Enter if form.focus_index == FORM_CANCEL => self.form = None,
            KeyCode::Enter => self.save_form(conn),
            _ => {
                if let Some(field) = form.field_mut() {
                    if edit_text(field, key) {
                        self.status.clear();
                    }
                }
            }
        }
    }

    fn render_form(&self, frame: &mut Frame, form: &EditForm) {
        let area = centered_rect(60, 90, frame.area());
        frame.render_widget(Clear, area);
        let title = if form.medicine_id.is_some() {
            "Edit Medicine"
        } else {
            "New Medicine"
        };
        let block = panel(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut constraints = vec![Constraint::Length(3); FORM_FIELDS.len()];
        constraints.extend([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ]);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .horizontal_margin(2)
            .split(inner);

        for (idx, (label, value)) in FORM_FIELDS.iter().zip(form.values()).enumerate() {
            render_input(frame, rows[idx], label, value, form.focus_index == idx);
        }
        let buttons = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[FORM_FIELDS.len() + 1]);
        render_button(frame, buttons[0], "Save", form.focus_index == FORM_SAVE);
        render_button(frame, buttons[1], "Cancel", form.focus_index == FORM_CANCEL);
        render_help(
            frame,
            rows[FORM_FIELDS.len() + 2],
            "* required | Tab/↑↓: Move | Enter: Save | Esc: Cancel",
        );
    }
}

impl Component for MedicineList {
    fn handle_input(&mut self, conn: &Connection, key: KeyEvent) -> Result<Option<SelectedApp>> {
        if self.delete_dialog.is_open() {
            if self.delete_dialog.handle_input(key) == Some(true) {
                self.delete_selected(conn);
            }
            return Ok(None);
        }
        if self.form.is_some() {
            self.handle_form_input(conn, key);
            return Ok(None);
        }

        match key.code {
            KeyCode::Esc => return Ok(Some(SelectedApp::None)),
            KeyCode::Tab => self.focus_index = 1 - self.focus_index,
            KeyCode::Down if self.focus_index == SEARCH => self.focus_index = TABLE,
            KeyCode::Up if self.focus_index == TABLE && self.table_state.selected() == Some(0) => {
                self.focus_index = SEARCH;
            }
            KeyCode::Up => self.move_selection(false),
            KeyCode::Down => self.move_selection(true),
            _ if self.focus_index == SEARCH => {
                if edit_text(&mut self.search, key) {
                    self.table_state.select(None);
                    self.clamp_selection();
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') => self.open_form(None),
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
                if let Some(medicine) = self.selected_medicine().cloned() {
                    self.open_form(Some(&medicine));
                }
            }
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
                if self.selected_medicine().is_some() {
                    self.delete_dialog.open();
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.fetch(conn),
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
                Constraint::Length(3), // Search
                Constraint::Min(8),    // Table
                Constraint::Length(1), // Help
                Constraint::Length(1), // Status
            ])
            .margin(1)
            .split(area);

        render_header(frame, layout[0], "MEDICINE CATALOG");
        render_input(
            frame,
            layout[1],
            "Search name, category or type",
            &self.search,
            self.focus_index == SEARCH && self.form.is_none(),
        );

        let visible = self.visible();
        let header = Row::new(
            ["Name", "Category", "Type", "Dosage", "Pack", "Price", "Stock"]
                .into_iter()
                .map(|h| Cell::from(h).style(Style::default().fg(palette::TEXT))),
        )
        .style(Style::default().bg(palette::INPUT))
        .bottom_margin(1);
        let rows = visible.iter().map(|m| {
            let stock_style = if m.stock == 0 {
                Style::default().fg(palette::DANGER)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(m.name.clone()),
                Cell::from(m.category.clone()),
                Cell::from(m.medicine_type.clone()),
                Cell::from(m.dosage.clone()),
                Cell::from(m.pack_size.clone()),
                Cell::from(money(m.price)),
                Cell::from(m.stock.to_string()).style(stock_style),
            ])
        });
        let table_focused = self.focus_index == TABLE;
        let title = format!(
            "Medicines ({} of {})",
            visible.len(),
            self.catalog.medicines().len()
        );
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(20),
                Constraint::Percentage(18),
                Constraint::Percentage(12),
                Constraint::Percentage(12),
                Constraint::Percentage(14),
                Constraint::Percentage(14),
                Constraint::Percentage(10),
            ],
        )
        .header(header)
        .style(Style::default().fg(palette::TEXT))
        .block(panel(&title).border_style(Style::default().fg(if table_focused {
            palette::FOCUS
        } else {
            palette::BORDER
        })))
        .row_highlight_style(
            Style::default()
                .bg(palette::HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(if table_focused { "► " } else { "  " });
        frame.render_stateful_widget(table, layout[2], &mut self.table_state.clone());

        render_help(
            frame,
            layout[3],
            "Type to search | Tab: Table | N: New | E/Enter: Edit | D: Delete | R: Reload | Esc: Back",
        );
        self.status.render(frame, layout[4]);

        if let Some(form) = &self.form {
            self.render_form(frame, form);
        }
        if let Some(medicine) = self.selected_medicine() {
            self.delete_dialog.render(
                frame,
                "Confirm Delete",
                &format!("Delete {} from the catalog?", medicine.name),
            );
        }
    }
}
