//! Declarative command line applications.
//!
//! A command type describes its options, positional arguments and
//! subcommands as a [`Descriptor`]. The [`Builder`] runs that description
//! through a pipeline of conventions to get a [`CommandModel`], the parser
//! matches process arguments against the model, and the binder writes the
//! parsed values back onto the command before running its entry point.
//!
//! Most of the time the descriptor and the binding glue are generated by
//! [`command!`]:
//!
//! ```ignore
//! convoke::command! {
//!     /// Says hello.
//!     cmd hello {
//!         required name: String
//!         optional -e, --emoji
//!         run greet
//!     }
//! }
//!
//! impl Hello {
//!     fn greet(&self) {
//!         println!("Hello {}{}", self.name, if self.emoji { "❣️" } else { "!" });
//!     }
//! }
//!
//! fn main() {
//!     let ctx = convoke::ExecutionContext::from_env().unwrap();
//!     std::process::exit(convoke::execute::<Hello>(ctx).unwrap())
//! }
//! ```

mod bind;
mod build;
mod console;
mod dispatch;
mod error;
mod help;
mod meta;
mod model;
mod parse;
mod settings;
mod suggest;
mod value;

pub use convoke_macros::command;

pub use crate::{
    bind::{Command, EntryPoint, IntoExitCode, Services, WorkingDirectory},
    build::{Builder, BuildCx, Convention},
    console::{BufferConsole, Console, StdConsole},
    dispatch::{
        execute, execute_async, execute_with, execute_with_async, from_env, from_vec,
        render_diagnostic, ContextBuilder, ExecutionContext, SUCCESS_EXIT_CODE,
        VALIDATION_EXIT_CODE,
    },
    error::{ConfigError, Error, ParsingError},
    help::{render_help, render_version},
    meta::{Arity, Descriptor, EntryKind, Kind, Member},
    model::{ArgumentDef, ArgumentKey, CommandModel, CommandNode, NodeId, OptionDef, OptionKey, OptionRole},
    parse::{parse, ParseOutcome, ParseResult},
    settings::Settings,
    suggest::suggest,
    value::{FromValue, Resolved, Value, ValueType},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;
