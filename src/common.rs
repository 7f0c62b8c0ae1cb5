// Licensed under the Apache-2.0 license

//! Crate-wide logging support.
//!
//! Drivers take a [`Logger`] as a generic parameter so that builds without a
//! console pay nothing for diagnostics ([`NoOpLogger`]), while boards with a
//! UART can route messages through [`WriterLogger`].

use core::cell::RefCell;
use core::fmt::Arguments;

use critical_section::Mutex;

/// Sink for driver diagnostics.
///
/// Methods take `&self` because drivers call them from both foreground and
/// interrupt context.
pub trait Logger {
    fn debug(&self, args: Arguments<'_>);
    fn error(&self, args: Arguments<'_>);
}

/// Logger that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&self, _args: Arguments<'_>) {}
    fn error(&self, _args: Arguments<'_>) {}
}

/// Logger writing one line per message to an `embedded-io` writer.
///
/// Write failures are ignored: a broken console must never turn into a
/// driver error.
pub struct WriterLogger<W: embedded_io::Write> {
    writer: Mutex<RefCell<W>>,
}

impl<W: embedded_io::Write> WriterLogger<W> {
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(RefCell::new(writer)),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().into_inner()
    }

    fn emit(&self, level: &str, args: Arguments<'_>) {
        critical_section::with(|cs| {
            let mut writer = self.writer.borrow_ref_mut(cs);
            let _ = writer.write_fmt(format_args!("[{level}] {args}\r\n"));
        });
    }
}

impl<W: embedded_io::Write> Logger for WriterLogger<W> {
    fn debug(&self, args: Arguments<'_>) {
        self.emit("DEBUG", args);
    }

    fn error(&self, args: Arguments<'_>) {
        self.emit("ERROR", args);
    }
}
