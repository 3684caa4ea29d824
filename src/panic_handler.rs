use crossterm::{cursor, execute, terminal};
use std::io::{self, Write};
use std::panic;

use crate::display::kgfx;

/// Install `better-panic` behind a hook that gives the terminal back first,
/// so the report is not swallowed by the alternate screen.
pub fn initialize_panic_handler() {
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        default_hook(panic_info);
        std::process::exit(1);
    }));
}

/// Remove the frame image, leave the alternate screen and raw mode, and show
/// the cursor. Safe to call on a terminal that was never set up.
pub fn restore_terminal() {
    let mut out = io::stdout();
    let _ = kgfx::delete_all(&mut out);
    let _ = terminal::disable_raw_mode();
    let _ = execute!(out, terminal::LeaveAlternateScreen, cursor::Show);
    let _ = writeln!(io::stderr());
}
