#![allow(dead_code)]

mod repeated_pos;
mod smoke;
mod subcommands;
mod help;
mod run;

use std::{fmt, sync::Arc};

use convoke::{BufferConsole, ExecutionContext};
use expect_test::{expect, Expect};

fn check<F, A>(f: F, args: &str, expect: Expect)
where
    F: FnOnce(Vec<String>) -> convoke::Result<A>,
    A: fmt::Debug,
{
    let args = args.split_ascii_whitespace().map(String::from).collect::<Vec<_>>();
    let res = f(args);
    match res {
        Ok(args) => {
            expect.assert_debug_eq(&args);
        }
        Err(err) => {
            expect.assert_eq(&err.to_string());
        }
    }
}

#[test]
fn smoke() {
    check(
        smoke::RustAnalyzer::from_vec,
        "-n 92 .",
        expect![[r#"
            RustAnalyzer {
                workspace: ".",
                jobs: None,
                log_file: None,
                verbose: 0,
                number: 92,
                data: [],
                emoji: false,
                malloc: None,
            }
        "#]],
    );
    check(
        smoke::RustAnalyzer::from_vec,
        "-n 92 -v --verbose -v --data 0xDEAD --log-file /tmp/log.txt --data 0xBEEF .",
        expect![[r#"
            RustAnalyzer {
                workspace: ".",
                jobs: None,
                log_file: Some(
                    "/tmp/log.txt",
                ),
                verbose: 3,
                number: 92,
                data: [
                    "0xDEAD",
                    "0xBEEF",
                ],
                emoji: false,
                malloc: None,
            }
        "#]],
    );
    check(
        smoke::RustAnalyzer::from_vec,
        "--malloc mimalloc --number=4 --emoji . 8",
        expect![[r#"
            RustAnalyzer {
                workspace: ".",
                jobs: Some(
                    8,
                ),
                log_file: None,
                verbose: 0,
                number: 4,
                data: [],
                emoji: true,
                malloc: Some(
                    Mimalloc,
                ),
            }
        "#]],
    );

    check(
        smoke::RustAnalyzer::from_vec,
        "-n 92 --werbose",
        expect![[r#"Unrecognized option: `--werbose`"#]],
    );
    check(smoke::RustAnalyzer::from_vec, "", expect![[r#"Required value missing: `workspace`"#]]);
    check(smoke::RustAnalyzer::from_vec, ".", expect![[r#"Required value missing: `--number`"#]]);
    check(
        smoke::RustAnalyzer::from_vec,
        "--number",
        expect![[r#"`--number` expects exactly one value, got 0"#]],
    );
    check(
        smoke::RustAnalyzer::from_vec,
        "--number lol",
        expect![[r#"Invalid value `lol` for `--number`, expected a non-negative integer"#]],
    );
    check(
        smoke::RustAnalyzer::from_vec,
        "--malloc tcmalloc",
        expect![[r#"Invalid value `tcmalloc` for `--malloc`, expected a valid `Malloc`"#]],
    );
    check(
        smoke::RustAnalyzer::from_vec,
        "-n 1 -n 2 .",
        expect![[r#"Option specified more than once: `--number`"#]],
    );
    check(
        smoke::RustAnalyzer::from_vec,
        "-n 1 . 92 lol",
        expect![[r#"Unrecognized command or argument: `lol`"#]],
    );
    check(
        smoke::RustAnalyzer::from_vec,
        "-n 1 . --emoji --emoji",
        expect![[r#"Option specified more than once: `--emoji`"#]],
    );
}

#[test]
fn repeated_argument() {
    check(
        repeated_pos::RepeatedPos::from_vec,
        "a 11 c d e f",
        expect![[r#"
            RepeatedPos {
                a: "a",
                b: Some(
                    11,
                ),
                c: Some(
                    "c",
                ),
                rest: [
                    "d",
                    "e",
                    "f",
                ],
            }
        "#]],
    );
    check(
        repeated_pos::RepeatedPos::from_vec,
        "a",
        expect![[r#"
            RepeatedPos {
                a: "a",
                b: None,
                c: None,
                rest: [],
            }
        "#]],
    );
    check(
        repeated_pos::RepeatedPos::from_vec,
        "a lol",
        expect![[r#"Invalid value `lol` for `b`, expected a non-negative integer"#]],
    );
}

#[test]
fn subcommands() {
    check(
        subcommands::RustAnalyzer::from_vec,
        "server launch",
        expect![[r#"
            RustAnalyzer {
                verbose: 0,
                subcommand: Some(
                    Server(
                        Server {
                            dir: None,
                            subcommand: Some(
                                Launch(
                                    Launch {
                                        log: false,
                                    },
                                ),
                            ),
                        },
                    ),
                ),
            }
        "#]],
    );

    check(
        subcommands::RustAnalyzer::from_vec,
        "server --dir . launch --log -v",
        expect![[r#"
            RustAnalyzer {
                verbose: 1,
                subcommand: Some(
                    Server(
                        Server {
                            dir: Some(
                                ".",
                            ),
                            subcommand: Some(
                                Launch(
                                    Launch {
                                        log: true,
                                    },
                                ),
                            ),
                        },
                    ),
                ),
            }
        "#]],
    );

    check(
        subcommands::RustAnalyzer::from_vec,
        "server watch",
        expect![[r#"
            RustAnalyzer {
                verbose: 0,
                subcommand: Some(
                    Server(
                        Server {
                            dir: None,
                            subcommand: Some(
                                Watch(
                                    Watch,
                                ),
                            ),
                        },
                    ),
                ),
            }
        "#]],
    );

    check(
        subcommands::RustAnalyzer::from_vec,
        "-v analysis-stats . --parallel",
        expect![[r#"
            RustAnalyzer {
                verbose: 1,
                subcommand: Some(
                    AnalysisStats(
                        AnalysisStats {
                            path: ".",
                            parallel: true,
                        },
                    ),
                ),
            }
        "#]],
    );

    check(
        subcommands::RustAnalyzer::from_vec,
        "",
        expect![[r#"A subcommand is required for `rust-analyzer`: server, analysis-stats"#]],
    );
    check(
        subcommands::RustAnalyzer::from_vec,
        "server",
        expect![[r#"A subcommand is required for `rust-analyzer server`: launch, watch"#]],
    );
    check(
        subcommands::RustAnalyzer::from_vec,
        "analysis-stats . --dir .",
        expect![[r#"Unrecognized option: `--dir`"#]],
    );
}

#[test]
fn help() {
    check(
        help::Helpful::from_vec,
        "-s FAST",
        expect![[r#"
            Helpful {
                src: None,
                extra: "none",
                switch: "fast",
                subcommand: None,
            }
        "#]],
    );
    check(
        help::Helpful::from_vec,
        "-s slow sub -f",
        expect![[r#"
            Helpful {
                src: None,
                extra: "none",
                switch: "slow",
                subcommand: Some(
                    Sub(
                        Sub {
                            flag: true,
                        },
                    ),
                ),
            }
        "#]],
    );
    check(
        help::Helpful::from_vec,
        "-s medium",
        expect![[r#"Invalid value `medium` for `--switch`, expected one of `fast`, `slow`"#]],
    );

    check(
        help::Helpful::from_vec,
        "--help",
        expect![[r#"
            helpful
              Does stuff.
              Helpful stuff.

            ARGS:
                [src]
                  With an arg.

                [extra]
                  Another arg.
                  [default: none]

            OPTIONS:
                -s, --switch <mode>
                  And a switch.

                -?, -h, --help
                  Show help information.

                --version
                  Show version information.

            SUBCOMMANDS:
                sub
                  And even a subcommand!
        "#]],
    );
    check(
        help::Helpful::from_vec,
        "sub -h",
        expect![[r#"
            helpful sub
              And even a subcommand!

            OPTIONS:
                -f, --flag
                  With an optional flag. This has a really long
                  description that spans multiple lines.

                -?, -h, --help
                  Show help information.
        "#]],
    );
    check(
        help::Helpful::from_vec,
        "--version",
        expect![[r#"
            helpful 0.1.0
        "#]],
    );
}

fn context(args: &str, console: &Arc<BufferConsole>) -> convoke::ContextBuilder {
    ExecutionContext::builder()
        .arguments(args.split_ascii_whitespace())
        .working_directory("/srv/notes")
        .console(console.clone())
}

fn execute(args: &str) -> (convoke::Result<i32>, Arc<BufferConsole>) {
    let console = Arc::new(BufferConsole::new());
    let ctx = context(args, &console).service(run::User("ada".to_string())).build().unwrap();
    (convoke::execute::<run::Notes>(ctx), console)
}

#[test]
fn runs_entry_points() {
    let (code, console) = execute("add milk -t food --tag weekly");
    assert_eq!(code.unwrap(), 0);
    assert_eq!(console.out(), "added \"milk\" [\"food\", \"weekly\"]\n");

    let (code, console) = execute("-q whoami");
    assert_eq!(code.unwrap(), 0);
    assert_eq!(console.out(), "ada\n");

    let (code, console) = execute("push");
    assert_eq!(code.unwrap(), 3);
    assert_eq!(console.out(), "pushing /srv/notes to origin\n");

    let (code, console) = execute("check");
    assert_eq!(code.unwrap_err().to_string(), "notes are corrupted");
    assert_eq!(console.out(), "");
}

#[test]
fn reports_bad_input() {
    let (code, console) = execute("ad milk");
    assert_eq!(code.unwrap(), 1);
    assert_eq!(console.out(), "");
    assert_eq!(
        console.err(),
        "Unrecognized command or argument: `ad`\n\nDid you mean this?\n    add\n"
    );

    let (code, console) = execute("add milk --tga food");
    assert_eq!(code.unwrap(), 1);
    assert_eq!(console.err(), "Unrecognized option: `--tga`\n\nDid you mean this?\n    --tag\n");

    let (code, console) = execute("");
    assert_eq!(code.unwrap(), 1);
    assert_eq!(console.err(), "A subcommand is required for `notes`: add, push, check, whoami\n");

    let (code, console) = execute("--version");
    assert_eq!(code.unwrap(), 0);
    assert_eq!(console.out(), "notes 2.1.0\n");
    assert_eq!(console.err(), "");
}

#[test]
fn missing_service() {
    let console = Arc::new(BufferConsole::new());
    let ctx = context("whoami", &console).build().unwrap();
    let err = convoke::execute::<run::Notes>(ctx).unwrap_err();
    assert!(err.to_string().starts_with("no service of type `"), "{}", err);
    assert!(err.to_string().ends_with("User` is available"), "{}", err);
}

#[tokio::test]
async fn runs_async_entry_points() {
    let console = Arc::new(BufferConsole::new());
    let ctx = context("push --remote backup", &console).build().unwrap();
    let code = convoke::execute_async::<run::Notes>(ctx).await.unwrap();
    assert_eq!(code, 3);
    assert_eq!(console.out(), "pushing /srv/notes to backup\n");
}
