use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Padding, Paragraph},
};
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tui_textarea::{Input, TextArea};

use crate::encoder::{self, QrImage};
use crate::save;
use crate::url::{self, UrlInputError};

const TOAST_DURATION: Duration = Duration::from_secs(4);

// How long to wait on the event queue before checking the worker channel
// and the toast deadline again.
const TICK: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Generating,
    ResultShown,
}

struct Toast {
    title: &'static str,
    body: String,
    error: bool,
    until: Instant,
}

impl Toast {
    fn info(title: &'static str, body: impl Into<String>) -> Toast {
        Toast {
            title,
            body: body.into(),
            error: false,
            until: Instant::now() + TOAST_DURATION,
        }
    }

    fn error(title: &'static str, body: impl Into<String>) -> Toast {
        Toast {
            error: true,
            ..Toast::info(title, body)
        }
    }
}

pub struct App<'a> {
    phase: Phase,
    input: TextArea<'a>,
    image: Option<QrImage>,
    toast: Option<Toast>,
}

impl<'a> Default for App<'a> {
    fn default() -> App<'a> {
        let mut input = TextArea::default();
        input.set_cursor_line_style(Style::new());
        input.set_placeholder_text("https://example.com or example.com");

        App {
            phase: Phase::Idle,
            input,
            image: None,
            toast: None,
        }
    }
}

impl<'a> App<'a> {
    fn raw_input(&self) -> String {
        self.input.lines().join("\n")
    }

    // Validate the current input. On success the phase moves to Generating
    // and the canonical URL to encode is handed back so the caller can
    // dispatch the actual work. While a generation is already in flight
    // this does nothing.
    fn submit(&mut self) -> Option<String> {
        if self.phase == Phase::Generating {
            return None;
        }

        match url::canonicalize(&self.raw_input()) {
            Ok(canonical) => {
                self.phase = Phase::Generating;
                Some(canonical)
            }
            Err(UrlInputError::Empty) => {
                self.toast = Some(Toast::error(
                    "URL required",
                    "Enter a URL to generate a QR code.",
                ));
                None
            }
            Err(UrlInputError::Invalid) => {
                self.toast = Some(Toast::error(
                    "Invalid URL",
                    "Enter a valid URL, like example.com or https://example.com.",
                ));
                None
            }
        }
    }

    // Apply the outcome of a generation that submit() dispatched.
    fn complete(&mut self, outcome: anyhow::Result<QrImage>) {
        match outcome {
            Ok(image) => {
                self.image = Some(image);
                self.phase = Phase::ResultShown;
                self.toast = Some(Toast::info(
                    "QR code generated",
                    "Press Ctrl+s to save it as a PNG.",
                ));
            }
            Err(err) => {
                self.phase = Phase::Idle;
                tracing::error!("could not generate QR code: {err:#}");
                self.toast = Some(Toast::error(
                    "Generation failed",
                    "Could not generate the QR code. Try again.",
                ));
            }
        }
    }

    // Save the most recent image, if any.
    fn save(&mut self) {
        let Some(image) = &self.image else {
            return;
        };

        match save::save_png(&image.png, Path::new(".")) {
            Ok(path) => {
                self.toast = Some(Toast::info(
                    "Downloaded",
                    format!("QR code saved as {}.", path.display()),
                ));
            }
            Err(err) => {
                tracing::error!("could not save QR code: {err:#}");
                self.toast = Some(Toast::error(
                    "Save failed",
                    "Could not write the image file.",
                ));
            }
        }
    }

    fn tick(&mut self) {
        if let Some(toast) = &self.toast
            && toast.until <= Instant::now()
        {
            self.toast = None;
        }
    }
}

pub fn run_app_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    runtime: &tokio::runtime::Runtime,
) -> io::Result<()> {
    let (tx, rx) = mpsc::channel();

    loop {
        app.tick();
        terminal.draw(|f| draw_ui(f, app))?;

        // Pick up a finished generation, if one came back.
        if let Ok(outcome) = rx.try_recv() {
            app.complete(outcome);
        }

        if !event::poll(TICK)? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                // Handle Ctrl+Q to quit
                if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle Ctrl+S to save the current result.
                if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    app.save();
                    continue;
                }

                // Enter submits. The symbol is built on a worker so the
                // input stays editable while it runs.
                if key.code == KeyCode::Enter {
                    if let Some(url) = app.submit() {
                        let tx = tx.clone();
                        runtime.spawn_blocking(move || {
                            let _ = tx.send(encoder::encode(&url));
                        });
                    }
                    continue;
                }

                app.input.input(Input::from(Event::Key(key)));
            }
        }
    }
}

// Draw the UI.
fn draw_ui(f: &mut ratatui::Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Label
            Constraint::Length(1), // Input
            Constraint::Length(1), // Toast
            Constraint::Min(10),   // Result
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Help
        ])
        .horizontal_margin(2)
        .vertical_margin(1)
        .split(f.area());

    draw_input(f, app, (chunks[1], chunks[2]));
    draw_toast(f, app, chunks[3]);
    draw_result(f, app, chunks[4]);
    draw_help(f, chunks[6]);
}

fn draw_input(f: &mut ratatui::Frame, app: &mut App, areas: (Rect, Rect)) {
    let block = Block::default()
        .borders(Borders::LEFT)
        .border_type(BorderType::Thick)
        .border_style(Style::new().fg(Color::Blue))
        .padding(Padding::horizontal(1));

    app.input.set_block(block);
    app.input
        .set_cursor_style(Style::new().bg(Color::White).fg(Color::Black));

    f.render_widget(Paragraph::new("URL"), areas.0);
    f.render_widget(&app.input, areas.1);
}

fn draw_toast(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let Some(toast) = &app.toast else {
        return;
    };

    let style = if toast.error {
        Style::new().fg(Color::Red)
    } else {
        Style::new().fg(Color::Green)
    };

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(toast.title, style.bold()),
            " ".into(),
            Span::styled(toast.body.clone(), style),
        ])),
        area,
    );
}

fn draw_result(f: &mut ratatui::Frame, app: &App, area: Rect) {
    match app.phase {
        Phase::Idle => {}
        Phase::Generating => {
            f.render_widget(
                Paragraph::new("Generating...")
                    .fg(Color::DarkGray)
                    .alignment(Alignment::Center),
                area,
            );
        }
        Phase::ResultShown => {
            let Some(image) = &app.image else {
                return;
            };

            let mut lines = image
                .preview
                .lines()
                .map(|line| Line::from(line.to_string()))
                .collect::<Vec<Line>>();

            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("QR code for ", Style::new().fg(Color::DarkGray)),
                Span::raw(image.url.clone()),
            ]));

            f.render_widget(
                Paragraph::new(Text::from(lines)).alignment(Alignment::Center),
                area,
            );
        }
    }
}

// Add a line for help text below.
fn draw_help(f: &mut ratatui::Frame, area: Rect) {
    let muted = Style::new().fg(Color::DarkGray);

    f.render_widget(
        Paragraph::new(Line::from(vec![
            "Generate ".into(),
            Span::styled("Enter", muted),
            " ".repeat(3).into(),
            "Save ".into(),
            Span::styled("Ctrl + s", muted),
            " ".repeat(3).into(),
            "Exit ".into(),
            Span::styled("Ctrl + q", muted),
        ])),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn app_with_input(text: &str) -> App<'static> {
        let mut app = App::default();
        app.input.insert_str(text);
        app
    }

    #[test]
    fn test_submit_bare_host() {
        let mut app = app_with_input("example.com");
        let job = app.submit();

        assert_eq!(job.unwrap(), "https://example.com");
        assert_eq!(app.phase, Phase::Generating);
        assert!(app.toast.is_none());
    }

    #[test]
    fn test_submit_schemed_url() {
        let mut app = app_with_input("http://example.com");
        assert_eq!(app.submit().unwrap(), "http://example.com");
    }

    #[test]
    fn test_submit_empty_input() {
        let mut app = App::default();
        let job = app.submit();

        assert!(job.is_none());
        assert_eq!(app.phase, Phase::Idle);

        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.title, "URL required");
        assert!(toast.error);
    }

    #[test]
    fn test_submit_invalid_input() {
        let mut app = app_with_input("not a url!!");
        let job = app.submit();

        assert!(job.is_none());
        assert_eq!(app.phase, Phase::Idle);

        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.title, "Invalid URL");
        assert!(toast.error);
    }

    #[test]
    fn test_submit_is_inert_while_generating() {
        let mut app = app_with_input("example.com");

        assert!(app.submit().is_some());
        assert!(app.submit().is_none());
        assert_eq!(app.phase, Phase::Generating);
    }

    #[test]
    fn test_successful_generation_shows_result() {
        let mut app = app_with_input("example.com");
        let url = app.submit().unwrap();

        app.complete(encoder::encode(&url));

        assert_eq!(app.phase, Phase::ResultShown);
        assert!(app.image.is_some());

        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.title, "QR code generated");
        assert!(!toast.error);
    }

    #[test]
    fn test_failed_generation_returns_to_idle() {
        let mut app = app_with_input("example.com");
        app.submit().unwrap();

        app.complete(Err(anyhow!("boom")));

        assert_eq!(app.phase, Phase::Idle);
        assert!(app.image.is_none());

        let toast = app.toast.as_ref().unwrap();
        assert_eq!(toast.title, "Generation failed");
        assert!(toast.error);
    }

    #[test]
    fn test_resubmit_after_result() {
        let mut app = app_with_input("example.com");
        let url = app.submit().unwrap();
        app.complete(encoder::encode(&url));
        assert_eq!(app.phase, Phase::ResultShown);

        assert!(app.submit().is_some());
        assert_eq!(app.phase, Phase::Generating);
    }

    #[test]
    fn test_save_without_image_is_a_noop() {
        let mut app = App::default();
        app.save();

        assert!(app.toast.is_none());
        assert_eq!(app.phase, Phase::Idle);
    }

    #[test]
    fn test_toast_expires_on_tick() {
        let mut app = App::default();
        app.toast = Some(Toast {
            until: Instant::now() - Duration::from_secs(1),
            ..Toast::info("QR code generated", "")
        });

        app.tick();
        assert!(app.toast.is_none());
    }
}
