//! Terminal mode switching with a restore path that survives panics and
//! termination signals.

use crate::core::command::CM_QUIT;
use crate::core::event::{Event, Info, Message};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

/// How long the program gets to quit on its own after a signal.
pub const SIGNAL_GRACE: Duration = Duration::from_secs(2);

pub trait TerminalOps: Send + Sync + 'static {
    fn enter(&self) -> io::Result<()>;
    fn leave(&self) -> io::Result<()>;
}

/// Raw mode, alternate screen and mouse reporting.
#[derive(Debug, Default)]
pub struct CrosstermOps;

impl TerminalOps for CrosstermOps {
    fn enter(&self) -> io::Result<()> {
        use crossterm::{
            cursor::Hide,
            event::EnableMouseCapture,
            execute,
            terminal::{enable_raw_mode, EnterAlternateScreen},
        };

        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture, Hide)?;
        Ok(())
    }

    fn leave(&self) -> io::Result<()> {
        use crossterm::{
            cursor::Show,
            event::DisableMouseCapture,
            execute,
            terminal::{disable_raw_mode, LeaveAlternateScreen},
        };

        // Run every step; report the first failure.
        let raw = disable_raw_mode();
        let screen = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen, Show);
        raw.and(screen)
    }
}

/// Cloneable handle that puts the terminal back exactly once.
#[derive(Clone)]
pub struct Restorer {
    done: Arc<AtomicBool>,
    ops: Arc<dyn TerminalOps>,
}

impl Restorer {
    pub fn restore(&self) -> io::Result<()> {
        if self.done.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::debug!("restoring terminal");
        self.ops.leave()
    }

    pub fn is_restored(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

/// Holds the terminal in program mode until dropped.
pub struct TerminalSession {
    restorer: Restorer,
}

impl TerminalSession {
    pub fn start() -> io::Result<Self> {
        Self::with_ops(Arc::new(CrosstermOps))
    }

    pub fn with_ops(ops: Arc<dyn TerminalOps>) -> io::Result<Self> {
        ops.enter()?;
        Ok(Self {
            restorer: Restorer {
                done: Arc::new(AtomicBool::new(false)),
                ops,
            },
        })
    }

    pub fn restorer(&self) -> Restorer {
        self.restorer.clone()
    }

    /// Restore before the default panic message is printed, so the report
    /// lands on the normal screen.
    pub fn restore_on_panic(&self) {
        let restorer = self.restorer();
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = restorer.restore();
            previous(info);
        }));
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(err) = self.restorer.restore() {
            tracing::warn!(error = %err, "terminal restore failed");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Interrupt,
    Terminate,
}

impl Termination {
    pub fn exit_code(self) -> i32 {
        match self {
            Termination::Interrupt => 130,
            Termination::Terminate => 143,
        }
    }

    /// The event a signal is delivered as: a quit command naming the signal
    /// number in its payload.
    pub fn as_event(self) -> Event {
        let signo = match self {
            Termination::Interrupt => 2,
            Termination::Terminate => 15,
        };
        Event::Command(Message::new(CM_QUIT, Info::Value(signo)))
    }
}

/// Forward SIGINT and SIGTERM into the event loop as quit commands. If the
/// loop has not exited after [`SIGNAL_GRACE`], restore and exit directly.
#[cfg(unix)]
pub fn watch_signals(
    restorer: Restorer,
    events: Sender<Event>,
) -> io::Result<std::thread::JoinHandle<()>> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::Builder::new()
        .name("tvkit-signals".into())
        .spawn(move || {
            for signo in signals.forever() {
                let termination = match signo {
                    SIGINT => Termination::Interrupt,
                    SIGTERM => Termination::Terminate,
                    _ => continue,
                };
                tracing::info!(?termination, "termination signal received");
                let _ = events.send(termination.as_event());

                std::thread::sleep(SIGNAL_GRACE);
                let _ = restorer.restore();
                std::process::exit(termination.exit_code());
            }
        })
}

#[cfg(test)]
#[path = "../../tests/unit/tui/terminal_guard.rs"]
mod tests;
