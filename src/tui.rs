// ABOUTME: Terminal panel for the virtual clock
// ABOUTME: Shows virtual/real time, offset and speed; keys shift time and step speed

use crate::cli::{format_offset, format_timestamp};
use crate::clock::{TimeSource, VirtualClock};
use crate::config::ClockConfig;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Panel application state
pub struct PanelApp {
    config: Arc<ClockConfig>,
    clock: Arc<VirtualClock>,
    real: Arc<dyn TimeSource>,
    status: String,
    should_quit: bool,
}

impl PanelApp {
    /// Create a panel steering `clock`; `real` is shown alongside for reference
    pub fn new(config: Arc<ClockConfig>, clock: Arc<VirtualClock>, real: Arc<dyn TimeSource>) -> Self {
        Self {
            config,
            clock,
            real,
            status: String::from("Ready"),
            should_quit: false,
        }
    }

    /// Whether the user asked to leave
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Last status message
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Draw and handle input until the user quits
    pub fn run<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        let refresh = Duration::from_millis(self.config.refresh_interval_ms.max(1));

        loop {
            terminal.draw(|f| self.ui(f))?;

            // Redraw on every key, otherwise once per refresh interval
            if event::poll(refresh)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Apply one key press to the clock
    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Up | KeyCode::Char('+') => {
                let speed = self.clock.calibration().speed;
                match self.config.faster_than(speed) {
                    Some(next) => self.apply_speed(next),
                    None => self.status = format!("Already at fastest preset ({speed}x)"),
                }
            }
            KeyCode::Down | KeyCode::Char('-') => {
                let speed = self.clock.calibration().speed;
                match self.config.slower_than(speed) {
                    Some(next) => self.apply_speed(next),
                    None => self.status = format!("Already at slowest preset ({speed}x)"),
                }
            }
            KeyCode::Right => self.apply_shift(self.config.shift_step_ms),
            KeyCode::Left => self.apply_shift(-self.config.shift_step_ms),
            KeyCode::Char('r') => {
                self.clock.reset();
                self.status = String::from("Reset to real time");
            }
            _ => {}
        }
    }

    fn apply_speed(&mut self, speed: f64) {
        self.status = match self.clock.set_speed(speed) {
            Ok(()) => format!("Speed {speed}x"),
            Err(e) => e.to_string(),
        };
    }

    fn apply_shift(&mut self, delta_ms: f64) {
        self.status = match self.clock.shift(delta_ms) {
            Ok(()) => format!("Shifted {}", format_offset(delta_ms)),
            Err(e) => e.to_string(),
        };
    }

    fn ui(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6), // Clock
                Constraint::Length(3), // Status
                Constraint::Min(0),
                Constraint::Length(3), // Help
            ])
            .split(f.area());

        self.render_clock(f, chunks[0]);
        self.render_status(f, chunks[1]);
        self.render_help(f, chunks[3]);
    }

    fn render_clock(&self, f: &mut Frame, area: Rect) {
        let calibration = self.clock.calibration();
        let real_ms = self.real.now_ms();

        let speed_style = if calibration.speed == 1.0 {
            Style::default()
        } else {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        };

        let text = vec![
            Line::from(vec![
                Span::styled("Virtual: ", Style::default().fg(Color::Cyan)),
                Span::styled(
                    format_timestamp(calibration.virtual_ms),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Real:    ", Style::default().fg(Color::Cyan)),
                Span::raw(format_timestamp(real_ms)),
            ]),
            Line::from(vec![
                Span::styled("Offset:  ", Style::default().fg(Color::Cyan)),
                Span::raw(format_offset(calibration.virtual_ms - real_ms)),
            ]),
            Line::from(vec![
                Span::styled("Speed:   ", Style::default().fg(Color::Cyan)),
                Span::styled(format!("{}x", calibration.speed), speed_style),
            ]),
        ];

        let paragraph = Paragraph::new(text).block(
            Block::default()
                .title("Timewarp")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        );

        f.render_widget(paragraph, area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let paragraph = Paragraph::new(Line::from(self.status.as_str())).block(
            Block::default()
                .title("Status")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        );

        f.render_widget(paragraph, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
        let sep = |s: &'static str| Span::styled(s, Style::default().fg(Color::DarkGray));

        let text = Line::from(vec![
            key("↑/↓"),
            sep(" speed  "),
            key("←/→"),
            sep(" shift  "),
            key("r"),
            sep(" reset  "),
            key("q"),
            sep(" quit"),
        ]);

        let paragraph = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

        f.render_widget(paragraph, area);
    }
}

/// Setup TUI terminal
pub fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restore terminal to normal mode
pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use ratatui::backend::TestBackend;

    fn panel() -> (ManualClock, Arc<VirtualClock>, PanelApp) {
        let real = ManualClock::new(1_700_000_000_000.0);
        let clock = Arc::new(VirtualClock::new(real.clone()));
        let config = Arc::new(ClockConfig::default().shift_step_ms(60_000.0));
        let app = PanelApp::new(config, Arc::clone(&clock), Arc::new(real.clone()));
        (real, clock, app)
    }

    #[test]
    fn test_speed_keys_step_presets() {
        let (_real, clock, mut app) = panel();

        app.handle_key(KeyCode::Up);
        assert_eq!(clock.calibration().speed, 2.0);
        app.handle_key(KeyCode::Up);
        assert_eq!(clock.calibration().speed, 5.0);
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Down);
        assert_eq!(clock.calibration().speed, 0.5);
        assert_eq!(app.status(), "Speed 0.5x");
    }

    #[test]
    fn test_speed_keys_stop_at_ends() {
        let (_real, clock, mut app) = panel();
        for _ in 0..10 {
            app.handle_key(KeyCode::Up);
        }
        assert_eq!(clock.calibration().speed, 60.0);
        assert!(app.status().starts_with("Already at fastest"));
    }

    #[test]
    fn test_shift_and_reset_keys() {
        let (real, clock, mut app) = panel();

        app.handle_key(KeyCode::Right);
        app.handle_key(KeyCode::Right);
        assert_eq!(clock.offset_ms(), 120_000.0);

        app.handle_key(KeyCode::Left);
        assert_eq!(clock.offset_ms(), 60_000.0);

        real.advance(1_000.0);
        app.handle_key(KeyCode::Char('r'));
        assert_eq!(clock.offset_ms(), 0.0);
        assert_eq!(clock.calibration().speed, 1.0);
    }

    #[test]
    fn test_quit_keys() {
        let (_real, _clock, mut app) = panel();
        assert!(!app.should_quit());
        app.handle_key(KeyCode::Esc);
        assert!(app.should_quit());
    }

    #[test]
    fn test_render_shows_speed() {
        let (_real, clock, app) = panel();
        clock.set_speed(10.0).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|f| app.ui(f)).unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|cell| cell.symbol()).collect();
        assert!(content.contains("Timewarp"));
        assert!(content.contains("10x"));
    }
}
