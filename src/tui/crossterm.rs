//! Terminal input: crossterm events read on a dedicated thread and handed to
//! the UI thread over a channel.

use crate::core::command::CM_SCREEN_RESIZED;
use crate::core::config::ProgramConfig;
use crate::core::event::{
    Event, Info, KeyCode, KeyEvent, KeyModifiers, Message, MouseButtons, MouseEvent, MouseKind,
};
use crate::ui::backend::EventSource;
use crate::ui::core::geom::Point;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Converts crossterm events, pairing presses into double clicks.
#[derive(Debug)]
pub struct Translator {
    double_click: Duration,
    last_down: Option<(Instant, Point, MouseButtons)>,
}

impl Translator {
    pub fn new(double_click: Duration) -> Self {
        Self {
            double_click,
            last_down: None,
        }
    }

    pub fn translate(&mut self, event: crossterm::event::Event, now: Instant) -> Option<Event> {
        match event {
            crossterm::event::Event::Key(key) => into_key_event(key).map(Event::KeyDown),
            crossterm::event::Event::Mouse(mouse) => {
                let mut out = into_mouse_event(mouse)?;
                if out.kind == MouseKind::Down {
                    out.double = self.last_down.is_some_and(|(at, pos, buttons)| {
                        pos == out.pos
                            && buttons == out.buttons
                            && now.saturating_duration_since(at) <= self.double_click
                    });
                    // A double click does not start another pair.
                    self.last_down = (!out.double).then_some((now, out.pos, out.buttons));
                }
                Some(Event::Mouse(out))
            }
            crossterm::event::Event::Resize(w, h) => Some(Event::Command(Message::new(
                CM_SCREEN_RESIZED,
                Info::size(w, h),
            ))),
            _ => None,
        }
    }
}

/// Key presses and repeats; releases are dropped.
pub fn into_key_event(event: crossterm::event::KeyEvent) -> Option<KeyEvent> {
    if event.kind == crossterm::event::KeyEventKind::Release {
        return None;
    }
    let mut modifiers = into_key_modifiers(event.modifiers);
    let code = into_key_code(event.code, &mut modifiers);
    Some(KeyEvent::new(code, modifiers))
}

fn into_key_modifiers(mods: crossterm::event::KeyModifiers) -> KeyModifiers {
    let mut out = KeyModifiers::NONE;
    if mods.contains(crossterm::event::KeyModifiers::SHIFT) {
        out |= KeyModifiers::SHIFT;
    }
    if mods.contains(crossterm::event::KeyModifiers::CONTROL) {
        out |= KeyModifiers::CONTROL;
    }
    if mods.contains(crossterm::event::KeyModifiers::ALT) {
        out |= KeyModifiers::ALT;
    }
    if mods.contains(crossterm::event::KeyModifiers::SUPER) {
        out |= KeyModifiers::SUPER;
    }
    out
}

fn into_key_code(code: crossterm::event::KeyCode, modifiers: &mut KeyModifiers) -> KeyCode {
    match code {
        crossterm::event::KeyCode::Char(ch) => KeyCode::Char(ch),
        crossterm::event::KeyCode::Enter => KeyCode::Enter,
        crossterm::event::KeyCode::Tab => KeyCode::Tab,
        crossterm::event::KeyCode::BackTab => KeyCode::BackTab,
        crossterm::event::KeyCode::Esc => KeyCode::Esc,
        crossterm::event::KeyCode::Backspace => KeyCode::Backspace,
        crossterm::event::KeyCode::Delete => KeyCode::Delete,
        crossterm::event::KeyCode::Insert => KeyCode::Insert,
        crossterm::event::KeyCode::Up => KeyCode::Up,
        crossterm::event::KeyCode::Down => KeyCode::Down,
        crossterm::event::KeyCode::Left => KeyCode::Left,
        crossterm::event::KeyCode::Right => KeyCode::Right,
        crossterm::event::KeyCode::Home => KeyCode::Home,
        crossterm::event::KeyCode::End => KeyCode::End,
        crossterm::event::KeyCode::PageUp => KeyCode::PageUp,
        crossterm::event::KeyCode::PageDown => KeyCode::PageDown,
        crossterm::event::KeyCode::F(n) => KeyCode::F(n),
        crossterm::event::KeyCode::Null => {
            *modifiers |= KeyModifiers::CONTROL;
            KeyCode::Char(' ')
        }
        _ => KeyCode::Unknown,
    }
}

fn into_mouse_button(button: crossterm::event::MouseButton) -> MouseButtons {
    match button {
        crossterm::event::MouseButton::Left => MouseButtons::LEFT,
        crossterm::event::MouseButton::Right => MouseButtons::RIGHT,
        crossterm::event::MouseButton::Middle => MouseButtons::MIDDLE,
    }
}

/// Wheel events have no counterpart and are dropped.
pub fn into_mouse_event(event: crossterm::event::MouseEvent) -> Option<MouseEvent> {
    use crossterm::event::MouseEventKind as K;
    let (kind, buttons) = match event.kind {
        K::Down(b) => (MouseKind::Down, into_mouse_button(b)),
        K::Up(_) => (MouseKind::Up, MouseButtons::NONE),
        K::Drag(b) => (MouseKind::Move, into_mouse_button(b)),
        K::Moved => (MouseKind::Move, MouseButtons::NONE),
        _ => return None,
    };
    let pos = Point::new(event.column as i16, event.row as i16);
    let mut out = MouseEvent::new(kind, pos, buttons);
    out.modifiers = into_key_modifiers(event.modifiers);
    Some(out)
}

/// Input source backed by a reader thread. The thread only ever sends
/// events; it never touches the view tree.
pub struct CrosstermSource {
    rx: Receiver<Event>,
    tx: Sender<Event>,
    poll_interval: Duration,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    closed: bool,
}

impl CrosstermSource {
    pub fn spawn(config: &ProgramConfig) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let poll_interval = Duration::from_millis(config.poll_interval_ms.max(1));
        let mut translator = Translator::new(Duration::from_millis(config.double_click_ms));

        let thread_tx = tx.clone();
        let thread_stop = stop.clone();
        let reader = std::thread::Builder::new()
            .name("tvkit-input".into())
            .spawn(move || {
                while !thread_stop.load(Ordering::Relaxed) {
                    match crossterm::event::poll(poll_interval) {
                        Ok(true) => {}
                        Ok(false) => continue,
                        Err(err) => {
                            tracing::warn!(error = %err, "input poll failed");
                            break;
                        }
                    }
                    let event = match crossterm::event::read() {
                        Ok(event) => event,
                        Err(err) => {
                            tracing::warn!(error = %err, "input read failed");
                            break;
                        }
                    };
                    if let Some(ev) = translator.translate(event, Instant::now()) {
                        if thread_tx.send(ev).is_err() {
                            break;
                        }
                    }
                }
                tracing::debug!("input thread stopped");
            })?;

        Ok(Self {
            rx,
            tx,
            poll_interval,
            stop,
            reader: Some(reader),
            closed: false,
        })
    }

    /// A handle other threads can use to inject events (signals, timers).
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }
}

impl EventSource for CrosstermSource {
    fn poll_event(&mut self) -> Option<Event> {
        match self.rx.recv_timeout(self.poll_interval) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for CrosstermSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tui/crossterm.rs"]
mod tests;
