//! Interactive terminal dashboard.

use std::io::{self, stdout, Stdout};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::{Frame, Terminal};

use crate::core::errors::SamplerError;
use crate::core::format::{format_load, format_network, format_uptime};
use crate::core::types::{Metric, MetricSnapshot};
use crate::sink::DisplaySink;

pub const TITLE: &str = "System Monitor";

/// Shown for values that have never been sampled.
pub const MISSING: &str = "—";

/// What the UI loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Exit,
}

/// Width of the label column: the longest label plus four.
pub fn label_width() -> usize {
    Metric::ALL
        .iter()
        .map(|m| m.label().chars().count())
        .max()
        .unwrap_or(0)
        + 4
}

/// Holds the most recent tick result and renders it.
#[derive(Debug, Default)]
pub struct Dashboard {
    last: Option<MetricSnapshot>,
    stale: Option<SamplerError>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&MetricSnapshot> {
        self.last.as_ref()
    }

    /// The error of the last tick, if it failed.
    pub fn stale_reason(&self) -> Option<&SamplerError> {
        self.stale.as_ref()
    }

    /// The single exit control is always focused, so Enter and Space press it.
    pub fn handle_key(&self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('q') | KeyCode::Esc => {
                Action::Exit
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Exit,
            _ => Action::None,
        }
    }

    pub fn title(&self) -> String {
        match &self.stale {
            Some(err) => format!(" {TITLE} [stale: {err}] "),
            None => format!(" {TITLE} "),
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .border_style(Style::default().add_modifier(Modifier::REVERSED));
        let inner = block.inner(frame.area());
        frame.render_widget(block, frame.area());

        let mut constraints: Vec<Constraint> = Metric::ALL
            .iter()
            .flat_map(|_| [Constraint::Length(1), Constraint::Length(1)])
            .collect();
        constraints.push(Constraint::Length(1));
        constraints.push(Constraint::Min(0));
        let rows = Layout::vertical(constraints).split(inner);

        for (i, metric) in Metric::ALL.into_iter().enumerate() {
            self.draw_row(frame, rows[i * 2], metric);
        }

        let exit = Paragraph::new("[ Exit ]")
            .style(Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD));
        let [_, button, _] = Layout::horizontal([
            Constraint::Length(2),
            Constraint::Length(8),
            Constraint::Min(0),
        ])
        .areas(rows[Metric::ALL.len() * 2]);
        frame.render_widget(exit, button);
    }

    fn draw_row(&self, frame: &mut Frame, area: Rect, metric: Metric) {
        let [_, label, value] = Layout::horizontal([
            Constraint::Length(2),
            Constraint::Length(label_width() as u16),
            Constraint::Min(0),
        ])
        .areas(area);
        frame.render_widget(Paragraph::new(metric.label()), label);

        let Some(snapshot) = &self.last else {
            frame.render_widget(Paragraph::new(MISSING), value);
            return;
        };

        if let Some(percent) = snapshot.percent(metric) {
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(gauge_color(percent)))
                .ratio((percent / 100.0).clamp(0.0, 1.0))
                .label(format!("{percent:.2}%"));
            frame.render_widget(gauge, value);
        } else {
            frame.render_widget(Paragraph::new(row_text(snapshot, metric)), value);
        }
    }
}

impl DisplaySink for Dashboard {
    fn update(&mut self, snapshot: MetricSnapshot) {
        self.last = Some(snapshot);
        self.stale = None;
    }

    fn update_error(&mut self, err: &SamplerError) {
        self.stale = Some(err.clone());
    }
}

fn row_text(snapshot: &MetricSnapshot, metric: Metric) -> String {
    match metric {
        Metric::Uptime => format!("Uptime: {}", format_uptime(snapshot.uptime_seconds)),
        Metric::Load => format!("Load: {}", format_load(snapshot.load_average)),
        Metric::Network => format_network(snapshot.bytes_sent, snapshot.bytes_received),
        _ => String::new(),
    }
}

fn gauge_color(percent: f64) -> Color {
    if percent >= 85.0 {
        Color::Red
    } else if percent >= 60.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

pub fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout()))
}

pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyEventKind, KeyEventState};

    use super::*;
    use crate::core::types::Metric;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn label_column_fits_longest_label() {
        assert_eq!(label_width(), "Network Traffic:".len() + 4);
    }

    #[test]
    fn exit_keys() {
        let dashboard = Dashboard::new();
        for code in [KeyCode::Enter, KeyCode::Char(' '), KeyCode::Char('q'), KeyCode::Esc] {
            assert_eq!(dashboard.handle_key(key(code, KeyModifiers::NONE)), Action::Exit);
        }
        assert_eq!(
            dashboard.handle_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Exit
        );
        assert_eq!(
            dashboard.handle_key(key(KeyCode::Char('c'), KeyModifiers::NONE)),
            Action::None
        );
    }

    #[test]
    fn stale_marker_clears_on_next_update() {
        let mut dashboard = Dashboard::new();
        dashboard.update_error(&SamplerError::failed(Metric::Memory, "busy"));
        assert!(dashboard.title().contains("stale"));
        assert!(dashboard.snapshot().is_none());

        dashboard.update(MetricSnapshot {
            cpu_percent: 1.0,
            memory_percent: 1.0,
            swap_percent: 1.0,
            disk_percent: 1.0,
            uptime_seconds: 1,
            load_average: None,
            bytes_sent: 0,
            bytes_received: 0,
            sampled_at: chrono::Local::now(),
        });
        assert_eq!(dashboard.title(), " System Monitor ");
        assert!(dashboard.stale_reason().is_none());
    }

    #[test]
    fn gauge_colors_by_level() {
        assert_eq!(gauge_color(10.0), Color::Green);
        assert_eq!(gauge_color(70.0), Color::Yellow);
        assert_eq!(gauge_color(99.0), Color::Red);
    }
}
