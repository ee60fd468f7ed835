//! Terminal session guard.
//!
//! Entering the session switches to raw mode, the alternate screen and mouse
//! capture. Dropping it undoes whatever was switched on, in reverse order, so
//! the terminal is restored on return, on `?` and while unwinding a panic. A
//! panic hook also restores the terminal before the panic message is printed.

use std::io::{self, Write};
use std::sync::OnceLock;

use crossterm::cursor::Show;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use tracing::debug;

pub struct TerminalSession<W: Write> {
    out: W,
    raw_mode: bool,
    alternate_screen: bool,
    mouse_capture: bool,
}

impl<W: Write> TerminalSession<W> {
    /// Enter raw mode, then the alternate screen and mouse capture on `out`.
    ///
    /// If a later step fails, the steps already taken are undone when the
    /// partially built session is dropped.
    pub fn enter(out: W) -> io::Result<Self> {
        install_panic_hook();

        let mut session = Self::detached(out);
        enable_raw_mode()?;
        session.raw_mode = true;
        session.enter_screen()?;
        debug!("terminal session entered");
        Ok(session)
    }

    /// A session that has not touched raw mode yet.
    fn detached(out: W) -> Self {
        Self {
            out,
            raw_mode: false,
            alternate_screen: false,
            mouse_capture: false,
        }
    }

    fn enter_screen(&mut self) -> io::Result<()> {
        execute!(self.out, EnterAlternateScreen)?;
        self.alternate_screen = true;
        execute!(self.out, EnableMouseCapture)?;
        self.mouse_capture = true;
        Ok(())
    }

    fn restore(&mut self) {
        if self.mouse_capture {
            let _ = execute!(self.out, DisableMouseCapture);
            self.mouse_capture = false;
        }
        let _ = execute!(self.out, Show);
        if self.alternate_screen {
            let _ = execute!(self.out, LeaveAlternateScreen);
            self.alternate_screen = false;
        }
        if self.raw_mode {
            let _ = disable_raw_mode();
            self.raw_mode = false;
        }
        let _ = self.out.flush();
    }
}

impl<W: Write> Drop for TerminalSession<W> {
    fn drop(&mut self) {
        self.restore();
        debug!("terminal session restored");
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let mut out = io::stdout();
            let _ = execute!(out, DisableMouseCapture, Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
            let _ = out.flush();
            previous(info);
        }));
    });
}
