//! Terminal setup/teardown and the event stream that drives the main loop:
//! raw mode, bracketed paste, panic-hook restoration, a frame-coalescing
//! task. This wrapper always owns the full alternate screen -- there is no
//! inline viewport, since the wrapped PTY itself needs the entire frame.

use std::io::IsTerminal;
use std::io::Stdout;
use std::io::stdout;
use std::pin::Pin;
use std::time::Duration;
use std::time::Instant;

use crossterm::event::DisableBracketedPaste;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::Event;
use crossterm::event::KeyEvent;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::Terminal as RatatuiTerminal;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::disable_raw_mode;
use ratatui::crossterm::terminal::enable_raw_mode;
use tokio::select;
use tokio_stream::Stream;

use crate::error::Result;
use crate::error::WtfError;

pub type Terminal = RatatuiTerminal<CrosstermBackend<Stdout>>;

/// Enter raw mode, alternate screen, and bracketed paste. Installs a panic
/// hook that restores the terminal before the default hook runs, so a panic
/// never leaves the user's shell in raw/alt-screen mode.
pub fn init() -> Result<Terminal> {
    if !stdout().is_terminal() {
        return Err(WtfError::NotATerminal);
    }
    enable_raw_mode().map_err(WtfError::Io)?;
    execute!(stdout(), EnterAlternateScreen, EnableBracketedPaste).map_err(WtfError::Io)?;
    set_panic_hook();
    let backend = CrosstermBackend::new(stdout());
    RatatuiTerminal::new(backend).map_err(WtfError::Io)
}

pub fn restore() -> Result<()> {
    execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen).map_err(WtfError::Io)?;
    disable_raw_mode().map_err(WtfError::Io)?;
    Ok(())
}

fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore();
        hook(info);
    }));
}

#[derive(Debug)]
pub enum TuiEvent {
    Key(KeyEvent),
    Paste(String),
    Resize(u16, u16),
    Draw,
}

/// Cloneable handle for requesting a coalesced redraw.
#[derive(Clone, Debug)]
pub struct FrameRequester {
    tx: tokio::sync::mpsc::UnboundedSender<Instant>,
}

impl FrameRequester {
    pub fn schedule_frame(&self) {
        let _ = self.tx.send(Instant::now());
    }

    pub fn schedule_frame_in(&self, dur: Duration) {
        let _ = self.tx.send(Instant::now() + dur);
    }
}

pub struct Tui {
    frame_schedule_tx: tokio::sync::mpsc::UnboundedSender<Instant>,
    draw_tx: tokio::sync::broadcast::Sender<()>,
    pub terminal: Terminal,
}

impl Tui {
    pub fn new(terminal: Terminal) -> Self {
        let (frame_schedule_tx, mut frame_schedule_rx) = tokio::sync::mpsc::unbounded_channel();
        let (draw_tx, _) = tokio::sync::broadcast::channel(1);

        let draw_tx_clone = draw_tx.clone();
        tokio::spawn(async move {
            let mut next_deadline: Option<Instant> = None;
            loop {
                let target = next_deadline
                    .unwrap_or_else(|| Instant::now() + Duration::from_secs(60 * 60 * 24 * 365));
                let sleep = tokio::time::sleep_until(tokio::time::Instant::from_std(target));
                tokio::pin!(sleep);
                select! {
                    recv = frame_schedule_rx.recv() => {
                        match recv {
                            Some(at) => {
                                if next_deadline.is_none_or(|cur| at < cur) {
                                    next_deadline = Some(at);
                                }
                                continue;
                            }
                            None => break,
                        }
                    }
                    _ = &mut sleep => {
                        if next_deadline.is_some() {
                            next_deadline = None;
                            let _ = draw_tx_clone.send(());
                        }
                    }
                }
            }
        });

        Self {
            frame_schedule_tx,
            draw_tx,
            terminal,
        }
    }

    pub fn frame_requester(&self) -> FrameRequester {
        FrameRequester {
            tx: self.frame_schedule_tx.clone(),
        }
    }

    /// Merges raw crossterm input with coalesced draw notifications into a
    /// single stream the event loop selects on.
    pub fn event_stream(&self) -> Pin<Box<dyn Stream<Item = TuiEvent> + Send + 'static>> {
        use tokio_stream::StreamExt;
        let mut crossterm_events = crossterm::event::EventStream::new();
        let mut draw_rx = self.draw_tx.subscribe();
        let stream = async_stream::stream! {
            loop {
                select! {
                    Some(Ok(event)) = crossterm_events.next() => {
                        match event {
                            Event::Key(key) => yield TuiEvent::Key(key),
                            Event::Paste(text) => yield TuiEvent::Paste(text),
                            Event::Resize(w, h) => yield TuiEvent::Resize(w, h),
                            _ => {}
                        }
                    }
                    result = draw_rx.recv() => {
                        match result {
                            Ok(()) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                                yield TuiEvent::Draw;
                            }
                            Err(tokio::sync::broadcast::error::RecvError::Closed) => {}
                        }
                    }
                }
            }
        };
        Box::pin(stream)
    }

    pub fn draw(&mut self, draw_fn: impl FnOnce(&mut ratatui::Frame)) -> Result<()> {
        self.terminal.draw(draw_fn).map_err(WtfError::Io)?;
        Ok(())
    }
}
