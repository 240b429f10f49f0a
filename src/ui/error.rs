//! Full-screen error display.
//!
//! Shows a human-readable error on a red full-screen page and waits for a key
//! press, so failures are visible even when they happen mid-screen-switch.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};
use std::io::{self, Stdout};

/// Error screen for displaying human-readable error messages.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ErrorScreen {
    /// Creates a new error screen and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(ErrorScreen { terminal })
    }

    /// Displays an error message and waits for any key press to dismiss it.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, error_message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                let background = Paragraph::new("")
                    .style(Style::default().bg(Color::Rgb(140, 20, 20)));
                frame.render_widget(background, area);

                let layout = Layout::vertical([
                    Constraint::Fill(1),
                    Constraint::Length(area.height / 2),
                    Constraint::Length(1),
                ])
                .horizontal_margin(area.width / 10)
                .split(area);

                let message = Paragraph::new(error_message)
                    .style(Style::default().fg(Color::White).bg(Color::Rgb(140, 20, 20)))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true });
                frame.render_widget(message, layout[1]);

                let hint = Paragraph::new("press any key to continue")
                    .style(Style::default().fg(Color::Rgb(230, 180, 180)).bg(Color::Rgb(140, 20, 20)))
                    .alignment(Alignment::Center);
                frame.render_widget(hint, layout[2]);
            })?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Cleans up terminal state and exits alternate screen mode.
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
