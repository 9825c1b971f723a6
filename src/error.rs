use thiserror::Error;

use crate::{meta::Arity, suggest::suggest};

/// A mistake in a command's declarations.
///
/// These are programming errors: they are raised while the command model is
/// built or while parsed values are bound, never because of user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("duplicate option name `{name}` in command `{command}`")]
    DuplicateOptionName { command: String, name: String },
    #[error(
        "argument `{argument}` of command `{command}` follows the variadic argument `{variadic}`"
    )]
    InvalidArgumentOrder { command: String, argument: String, variadic: String },
    #[error("duplicate subcommand `{name}` in command `{command}`")]
    DuplicateCommandName { command: String, name: String },
    #[error("invalid member `{member}` in command `{command}`: {reason}")]
    InvalidMember { command: String, member: String, reason: String },
    #[error("default `{value}` of `{member}` in command `{command}` is not {expected}")]
    InvalidDefault { command: String, member: String, value: String, expected: String },
    #[error("command `{command}` has no entry point")]
    MissingEntryPoint { command: String },
    #[error("no service of type `{type_name}` is available")]
    MissingService { type_name: &'static str },
    #[error("command has no member `{member}`")]
    UnknownMember { member: String },
    #[error("command has no subcommand `{name}`")]
    UnknownSubcommand { name: String },
    #[error("can't bind `{member}`, {message}")]
    Bind { member: String, message: String },
    #[error("execution context is missing the {0}")]
    IncompleteContext(&'static str),
}

/// Bad user input, reported as a diagnostic and a validation exit code.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParsingError {
    #[error("Unrecognized command or argument: `{token}`")]
    UnrecognizedCommand { token: String, candidates: Vec<String> },
    #[error("Unrecognized option: `{token}`")]
    UnrecognizedOption { token: String, candidates: Vec<String> },
    #[error("Required value missing: `{name}`")]
    MissingRequiredValue { name: String },
    #[error("Invalid value `{raw}` for `{name}`, expected {expected}")]
    InvalidValueFormat { name: String, raw: String, expected: String },
    #[error("`{name}` expects {expected}, got {actual}")]
    ArityViolation { name: String, expected: Arity, actual: usize },
    #[error("Ambiguous option: `{token}` could be any of {}", .matches.join(", "))]
    AmbiguousOption { token: String, matches: Vec<String> },
    #[error("Option specified more than once: `{name}`")]
    DuplicateOption { name: String },
    #[error("A subcommand is required for `{command}`: {}", .candidates.join(", "))]
    MissingSubcommand { command: String, candidates: Vec<String> },
}

impl ParsingError {
    /// Nearest known name for an unrecognized command or option.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            ParsingError::UnrecognizedCommand { token, candidates }
            | ParsingError::UnrecognizedOption { token, candidates } => suggest(token, candidates),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] ParsingError),
    /// Help or version text requested on the command line.
    #[error("{0}")]
    Help(String),
    /// The entry point itself failed.
    #[error(transparent)]
    Entry(anyhow::Error),
}

impl Error {
    pub fn is_help(&self) -> bool {
        matches!(self, Error::Help(_))
    }
}
