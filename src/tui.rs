use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, KeyEvent, KeyEventKind},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, time::Duration};

/// Smallest terminal the dashboards lay out in.
const MIN_WIDTH: u16 = 100;
const MIN_HEIGHT: u16 = 32;

#[derive(Debug, Clone)]
pub enum Event {
    /// A key press. Release and repeat events are dropped.
    Key(KeyEvent),
    Resize,
    /// No input within one frame; screens use it to expire messages.
    Tick,
}

pub type Frame<'a> = ratatui::Frame<'a>;

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    tick_rate: Duration,
}

impl Tui {
    pub fn new(terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Self {
        Self {
            terminal,
            tick_rate: Duration::from_millis(50),
        }
    }

    pub fn init(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        self.ensure_min_size()?;
        Ok(())
    }

    fn ensure_min_size(&self) -> Result<()> {
        let (width, height) = terminal::size()?;
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            io::stdout().execute(terminal::SetSize(
                width.max(MIN_WIDTH),
                height.max(MIN_HEIGHT),
            ))?;
        }
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        self.terminal.show_cursor()?;
        terminal::disable_raw_mode()?;
        crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
        Ok(())
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }

    pub fn next_event(&self) -> Result<Event> {
        if !event::poll(self.tick_rate)? {
            return Ok(Event::Tick);
        }

        Ok(match event::read()? {
            event::Event::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
            event::Event::Resize(..) => Event::Resize,
            _ => Event::Tick,
        })
    }
}
