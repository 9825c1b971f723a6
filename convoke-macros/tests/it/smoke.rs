use std::{fmt, str::FromStr};

convoke::command! {
    /// LSP server for rust.
    cmd rust-analyzer {
        required workspace: PathBuf
        /// Number of concurrent jobs.
        optional jobs: u32
        /// Path to log file. By default, logs go to stderr.
        optional --log-file path: PathBuf
        repeated -v, --verbose
        required -n, --number n: u32
        repeated --data value: OsString
        optional --emoji
        optional --malloc kind: Malloc
        run start
    }
}

impl RustAnalyzer {
    fn start(&self) {}
}

#[derive(Debug)]
pub enum Malloc {
    Jemalloc,
    Mimalloc,
    Sys,
}

impl FromStr for Malloc {
    type Err = UnknownMalloc;

    fn from_str(s: &str) -> Result<Malloc, UnknownMalloc> {
        match s {
            "jemalloc" => Ok(Malloc::Jemalloc),
            "mimalloc" => Ok(Malloc::Mimalloc),
            "sys" => Ok(Malloc::Sys),
            _ => Err(UnknownMalloc),
        }
    }
}

#[derive(Debug)]
pub struct UnknownMalloc;

impl fmt::Display for UnknownMalloc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown allocator")
    }
}
