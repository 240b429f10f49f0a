//! Live recording screen.
//!
//! Shown while a spoken answer is being captured: elapsed time, a scrolling
//! level meter, and the key hints. Input polling is non-blocking so the
//! caller's render loop stays responsive.

use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Sparkline},
};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

use crate::recording::format_elapsed;

/// User input command while recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingCommand {
    /// Keep recording (no key pressed)
    Continue,
    /// Finalize the answer (Enter key)
    Finish,
    /// Discard the answer (Escape or 'q')
    Cancel,
}

/// Terminal screen for an in-progress recording.
pub struct RecordingScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    volume_history: Vec<u64>,
    last_sample_time: Instant,
    sample_interval: Duration,
    terminal_width: usize,
}

impl RecordingScreen {
    /// Enters the alternate screen in raw mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        let size = terminal.size()?;
        let terminal_width = size.width as usize;

        Ok(RecordingScreen {
            terminal,
            volume_history: vec![0u64; terminal_width],
            last_sample_time: Instant::now(),
            sample_interval: Duration::from_millis(50),
            terminal_width,
        })
    }

    /// Polls for a key press without blocking longer than one frame.
    ///
    /// # Errors
    /// - If terminal event reading fails
    pub fn poll_input(&mut self) -> anyhow::Result<RecordingCommand> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                return Ok(match key.code {
                    KeyCode::Enter => RecordingCommand::Finish,
                    KeyCode::Esc | KeyCode::Char('q') => RecordingCommand::Cancel,
                    _ => RecordingCommand::Continue,
                });
            }
        }
        Ok(RecordingCommand::Continue)
    }

    /// Renders the elapsed time and level meter from the current capture.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, elapsed_secs: u64, samples: &[i16]) -> anyhow::Result<()> {
        let volume = Self::level_percent(samples);

        if self.last_sample_time.elapsed() >= self.sample_interval {
            self.volume_history.push(volume);
            if self.volume_history.len() > self.terminal_width {
                self.volume_history.remove(0);
            }
            self.last_sample_time = Instant::now();
        }

        let elapsed = format_elapsed(elapsed_secs);
        let history = self.volume_history.clone();

        self.terminal.draw(|frame| {
            let area = frame.area();
            let layout = Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

            let title = Line::from(vec![
                Span::styled("● ", Style::default().fg(Color::Red)),
                Span::styled("Recording your answer", Style::default().fg(Color::White)),
                Span::styled(format!("  {elapsed}"), Style::default().fg(Color::Gray)),
            ]);
            frame.render_widget(Paragraph::new(title), layout[0]);

            let meter = Sparkline::default()
                .data(&history)
                .max(100)
                .style(Style::default().fg(Color::Cyan));
            frame.render_widget(meter, layout[2]);

            let hint = Paragraph::new("Enter: send answer   Esc/q: discard")
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(hint, layout[3]);
        })?;

        Ok(())
    }

    /// RMS level of the most recent capture window as a 0-100 percentage.
    fn level_percent(samples: &[i16]) -> u64 {
        const WINDOW: usize = 2048;
        let window = &samples[samples.len().saturating_sub(WINDOW)..];
        if window.is_empty() {
            return 0;
        }

        let sum_squares: f64 = window
            .iter()
            .map(|&s| {
                let v = s as f64;
                v * v
            })
            .sum();
        let rms = (sum_squares / window.len() as f64).sqrt();

        // Scale so normal speech fills most of the meter.
        ((rms / i16::MAX as f64) * 400.0).min(100.0) as u64
    }

    /// Restores the terminal.
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for RecordingScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_zero_for_silence_and_grows_with_amplitude() {
        assert_eq!(RecordingScreen::level_percent(&[]), 0);
        assert_eq!(RecordingScreen::level_percent(&[0i16; 4096]), 0);

        let quiet = vec![500i16; 4096];
        let loud = vec![20_000i16; 4096];
        assert!(RecordingScreen::level_percent(&quiet) < RecordingScreen::level_percent(&loud));
        assert!(RecordingScreen::level_percent(&loud) <= 100);
    }
}
