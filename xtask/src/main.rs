use std::time::Instant;

use xshell::{cmd, Shell};

fn main() -> xshell::Result<()> {
    let sh = Shell::new()?;
    let _e = sh.push_env("RUST_BACKTRACE", "1");

    step("runtime", || cmd!(sh, "cargo test -p convoke --lib").run())?;
    step("macros", || cmd!(sh, "cargo test -p convoke-macros").run())?;
    step("demo", || check_demo(&sh))?;

    Ok(())
}

/// Runs the `hello` demo and checks its exit codes and output.
fn check_demo(sh: &Shell) -> xshell::Result<()> {
    let greeting = cmd!(sh, "cargo run -q --example hello -- world --emoji").read()?;
    assert_eq!(greeting, "Hello world❣️");

    let version = cmd!(sh, "cargo run -q --example hello -- --version").read()?;
    assert!(version.starts_with("hello "), "unexpected version output: {version}");

    let output = cmd!(sh, "cargo run -q --example hello -- --emoij").ignore_status().output()?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Did you mean this?\n    --emoji"), "unexpected diagnostic: {stderr}");
    Ok(())
}

fn step(name: &str, f: impl FnOnce() -> xshell::Result<()>) -> xshell::Result<()> {
    println!("::group::{name}");
    let start = Instant::now();
    let res = f();
    eprintln!("{name}: {:.2?}", start.elapsed());
    println!("::endgroup::");
    res
}
