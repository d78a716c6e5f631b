use std::error::Error;
use std::io;
use std::path::PathBuf;

use tvkit::app::{Program, ProgramView};
use tvkit::core::command::{CM_CLOSE, CM_MENU, CM_NEXT, CM_PREV, CM_QUIT, CM_ZOOM, FIRST_USER};
use tvkit::core::config::ProgramConfig;
use tvkit::core::event::{KeyCode, KeyEvent, KeyModifiers, Message};
#[cfg(unix)]
use tvkit::tui::terminal_guard::watch_signals;
use tvkit::tui::{CrosstermSource, TerminalSession};
use tvkit::ui::backend::terminal::RatatuiBackend;
use tvkit::ui::core::geom::{Point, Rect};
use tvkit::ui::core::tree::{ViewId, ViewTree};
use tvkit::ui::widgets::{Menu, MenuItem, StatusDef, StatusItem, Window};

const CM_NEW_WINDOW: u16 = FIRST_USER;

const HC_FILE: u16 = 1000;
const HC_WINDOW: u16 = 1001;

fn menu() -> Menu {
    let file = Menu::new(vec![
        MenuItem::new("~N~ew", CM_NEW_WINDOW, Some(KeyEvent::plain(KeyCode::F(4))), HC_FILE).with_param("F4"),
        MenuItem::separator(),
        MenuItem::new("E~x~it", CM_QUIT, Some(KeyEvent::alt('x')), HC_FILE).with_param("Alt-X"),
    ]);
    let window = Menu::new(vec![
        MenuItem::new("~Z~oom", CM_ZOOM, Some(KeyEvent::plain(KeyCode::F(5))), HC_WINDOW).with_param("F5"),
        MenuItem::new("~N~ext", CM_NEXT, Some(KeyEvent::plain(KeyCode::F(6))), HC_WINDOW).with_param("F6"),
        MenuItem::new("~P~revious", CM_PREV, Some(KeyEvent::new(KeyCode::F(6), KeyModifiers::SHIFT)), HC_WINDOW)
            .with_param("Shift-F6"),
        MenuItem::new("~C~lose", CM_CLOSE, Some(KeyEvent::new(KeyCode::F(3), KeyModifiers::ALT)), HC_WINDOW)
            .with_param("Alt-F3"),
    ]);
    Menu::new(vec![
        MenuItem::submenu("~F~ile", HC_FILE, file),
        MenuItem::submenu("~W~indow", HC_WINDOW, window),
    ])
}

fn status() -> Vec<StatusDef> {
    vec![StatusDef::new(
        0,
        u16::MAX,
        vec![
            StatusItem::new("~Alt-X~ Exit", Some(KeyEvent::alt('x')), CM_QUIT),
            StatusItem::new("~F4~ New", Some(KeyEvent::plain(KeyCode::F(4))), CM_NEW_WINDOW),
            StatusItem::new("~F10~ Menu", Some(KeyEvent::plain(KeyCode::F(10))), CM_MENU),
            StatusItem::new("~F6~ Next", Some(KeyEvent::plain(KeyCode::F(6))), CM_NEXT),
            StatusItem::new("", Some(KeyEvent::new(KeyCode::F(3), KeyModifiers::ALT)), CM_CLOSE),
        ],
    )]
}

/// Open a numbered window on the desktop, cascading from the top left.
fn open_window(tree: &mut ViewTree, desktop: ViewId) -> Option<ViewId> {
    let count = tree
        .children(desktop)
        .iter()
        .filter(|&&c| tree.widget::<Window>(c).is_some())
        .count();
    let n = count as i16;
    let size = tree.size(desktop);
    let bounds = Rect::new(n * 2, n, (n * 2 + 40).min(size.x), (n + 12).min(size.y));
    let number = u8::try_from(count + 1).ok().filter(|&n| n <= 9);
    let window = Window::create(tree, bounds, &format!("Window {}", count + 1), number).ok()?;
    tree.insert(desktop, window).ok()?;
    Some(window)
}

fn on_command(tree: &mut ViewTree, program: &ProgramView, message: &Message) -> bool {
    if message.command != CM_NEW_WINDOW {
        return false;
    }
    if let Some(desktop) = program.desktop() {
        open_window(tree, desktop);
    }
    true
}

fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tvkit.json"))
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = ProgramConfig::load_or_default(&config_path())?;
    let _logging = tvkit::logging::init(&config);

    let session = TerminalSession::start()?;
    session.restore_on_panic();

    let backend = RatatuiBackend::new(io::stdout())?;
    let (width, height) = backend.size();
    let source = CrosstermSource::spawn(&config)?;
    #[cfg(unix)]
    let _signals = watch_signals(session.restorer(), source.sender())?;

    let mut program = Program::new(Point::new(width as i16, height as i16), &config, menu(), status())?;
    program.on_command(on_command);
    if let Some(desktop) = program.desktop() {
        let tree = program.tree_mut();
        open_window(tree, desktop);
        open_window(tree, desktop);
    }
    program.set_io(Box::new(backend), Box::new(source));
    let result = program.run();
    tracing::info!(result, "exiting");

    drop(program);
    drop(session);
    Ok(())
}
