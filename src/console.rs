//! Where the dispatcher writes help, version and diagnostics.

use std::{
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

pub trait Console: Send + Sync {
    fn write_out(&self, text: &str);
    fn write_err(&self, text: &str);
}

/// The process' stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl Console for StdConsole {
    fn write_out(&self, text: &str) {
        let _ = io::stdout().lock().write_all(text.as_bytes());
    }

    fn write_err(&self, text: &str) {
        let _ = io::stderr().lock().write_all(text.as_bytes());
    }
}

/// Keeps everything written to it, for tests.
#[derive(Debug, Default)]
pub struct BufferConsole {
    out: Mutex<String>,
    err: Mutex<String>,
}

impl BufferConsole {
    pub fn new() -> BufferConsole {
        BufferConsole::default()
    }

    pub fn out(&self) -> String {
        self.out.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn err(&self) -> String {
        self.err.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Console for BufferConsole {
    fn write_out(&self, text: &str) {
        self.out.lock().unwrap_or_else(PoisonError::into_inner).push_str(text);
    }

    fn write_err(&self, text: &str) {
        self.err.lock().unwrap_or_else(PoisonError::into_inner).push_str(text);
    }
}
