use super::*;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockOps {
    calls: Mutex<Vec<&'static str>>,
}

impl TerminalOps for MockOps {
    fn enter(&self) -> std::io::Result<()> {
        self.calls.lock().unwrap().push("enter");
        Ok(())
    }

    fn leave(&self) -> std::io::Result<()> {
        self.calls.lock().unwrap().push("leave");
        Ok(())
    }
}

struct FailingOps;

impl TerminalOps for FailingOps {
    fn enter(&self) -> std::io::Result<()> {
        Err(std::io::Error::other("no tty"))
    }

    fn leave(&self) -> std::io::Result<()> {
        panic!("leave must not run when enter failed");
    }
}

#[test]
fn session_leaves_program_mode_on_drop() {
    let ops = Arc::new(MockOps::default());
    {
        let _session = TerminalSession::with_ops(ops.clone()).unwrap();
    }

    assert_eq!(&*ops.calls.lock().unwrap(), &["enter", "leave"]);
}

#[test]
fn restorer_runs_once_across_clones() {
    let ops = Arc::new(MockOps::default());
    let session = TerminalSession::with_ops(ops.clone()).unwrap();
    let a = session.restorer();
    let b = a.clone();

    a.restore().unwrap();
    b.restore().unwrap();
    assert!(b.is_restored());
    drop(session);

    assert_eq!(&*ops.calls.lock().unwrap(), &["enter", "leave"]);
}

#[test]
fn failed_enter_yields_no_session() {
    assert!(TerminalSession::with_ops(Arc::new(FailingOps)).is_err());
}

#[test]
fn signals_arrive_as_quit_commands() {
    let ev = Termination::Interrupt.as_event();
    assert_eq!(ev.as_command(), Some(CM_QUIT));
    assert_eq!(
        ev,
        Event::Command(Message::new(CM_QUIT, Info::Value(2)))
    );
    assert_eq!(Termination::Terminate.exit_code(), 143);
    assert_eq!(Termination::Interrupt.exit_code(), 130);
}
