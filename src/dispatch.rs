//! Entry points tying building, parsing, binding and invocation together.

use std::{
    env, fmt,
    ops::ControlFlow,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::debug;

use crate::{
    bind::{self, Command, Services, WorkingDirectory},
    build::Builder,
    console::{Console, StdConsole},
    error::{ConfigError, Error, ParsingError},
    help::{render_help, render_version},
    model::CommandModel,
    parse::{parse, ParseOutcome, ParseResult},
    settings::Settings,
};

pub const SUCCESS_EXIT_CODE: i32 = 0;
pub const VALIDATION_EXIT_CODE: i32 = 1;

/// Everything a single execution needs from its host.
pub struct ExecutionContext {
    arguments: Vec<String>,
    working_directory: PathBuf,
    console: Arc<dyn Console>,
    settings: Settings,
    services: Services,
    builder: Builder,
}

impl ExecutionContext {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Process arguments without the program name, the current directory and
    /// the standard streams.
    pub fn from_env() -> Result<ExecutionContext, ConfigError> {
        let arguments =
            env::args_os().skip(1).map(|it| it.to_string_lossy().into_owned()).collect::<Vec<_>>();
        let working_directory =
            env::current_dir().map_err(|_| ConfigError::IncompleteContext("working directory"))?;
        ExecutionContext::builder()
            .arguments(arguments)
            .working_directory(working_directory)
            .console(Arc::new(StdConsole))
            .build()
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn console(&self) -> &Arc<dyn Console> {
        &self.console
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("arguments", &self.arguments)
            .field("working_directory", &self.working_directory)
            .field("settings", &self.settings)
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    arguments: Option<Vec<String>>,
    working_directory: Option<PathBuf>,
    console: Option<Arc<dyn Console>>,
    settings: Settings,
    services: Services,
    builder: Option<Builder>,
}

impl ContextBuilder {
    pub fn arguments<I>(mut self, arguments: I) -> ContextBuilder
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.arguments = Some(arguments.into_iter().map(Into::into).collect());
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> ContextBuilder {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn console(mut self, console: Arc<dyn Console>) -> ContextBuilder {
        self.console = Some(console);
        self
    }

    pub fn settings(mut self, settings: Settings) -> ContextBuilder {
        self.settings = settings;
        self
    }

    /// Makes `value` available to entry methods that take a `T`.
    pub fn service<T: 'static>(mut self, value: T) -> ContextBuilder {
        self.services.insert(value);
        self
    }

    /// Replaces the standard convention pipeline.
    pub fn conventions(mut self, builder: Builder) -> ContextBuilder {
        self.builder = Some(builder);
        self
    }

    pub fn build(self) -> Result<ExecutionContext, ConfigError> {
        let arguments = self.arguments.ok_or(ConfigError::IncompleteContext("arguments"))?;
        let working_directory =
            self.working_directory.ok_or(ConfigError::IncompleteContext("working directory"))?;
        let console = self.console.ok_or(ConfigError::IncompleteContext("console"))?;

        let mut services = self.services;
        services.insert(Arc::clone(&console));
        services.insert(WorkingDirectory(working_directory.clone()));
        Ok(ExecutionContext {
            arguments,
            working_directory,
            console,
            settings: self.settings,
            services,
            builder: self.builder.unwrap_or_default(),
        })
    }
}

/// Parses the context's arguments into a fresh `T` and runs it.
///
/// Help and version requests print to the console and return
/// [`SUCCESS_EXIT_CODE`]; bad input prints a diagnostic and returns the
/// validation exit code. Declaration mistakes and entry failures are errors.
pub fn execute<T: Command + Default>(ctx: ExecutionContext) -> Result<i32, Error> {
    let mut command = T::default();
    execute_with(&mut command, ctx)
}

pub fn execute_with<T: Command>(command: &mut T, ctx: ExecutionContext) -> Result<i32, Error> {
    let model = ctx.builder.build(&T::descriptor())?;
    let res = match dispatch(&model, &ctx) {
        ControlFlow::Continue(res) => res,
        ControlFlow::Break(code) => return Ok(code),
    };
    let leaf = bind::bind(&model, &res, command)?;
    let entry = bind::entry_point(&model, &res, leaf)?;
    bind::invoke_blocking(entry, &ctx.services)
}

pub async fn execute_async<T: Command + Default>(ctx: ExecutionContext) -> Result<i32, Error> {
    let mut command = T::default();
    execute_with_async(&mut command, ctx).await
}

pub async fn execute_with_async<T: Command>(
    command: &mut T,
    ctx: ExecutionContext,
) -> Result<i32, Error> {
    let model = ctx.builder.build(&T::descriptor())?;
    let res = match dispatch(&model, &ctx) {
        ControlFlow::Continue(res) => res,
        ControlFlow::Break(code) => return Ok(code),
    };
    let leaf = bind::bind(&model, &res, command)?;
    let entry = bind::entry_point(&model, &res, leaf)?;
    bind::invoke(entry, &ctx.services).await
}

fn dispatch(model: &CommandModel, ctx: &ExecutionContext) -> ControlFlow<i32, ParseResult> {
    match parse(model, &ctx.settings, ctx.arguments.clone()) {
        Ok(ParseOutcome::Matched(res)) => ControlFlow::Continue(res),
        Ok(ParseOutcome::Help(id)) => {
            ctx.console.write_out(&render_help(model, id));
            ControlFlow::Break(SUCCESS_EXIT_CODE)
        }
        Ok(ParseOutcome::Version(id)) => {
            ctx.console.write_out(&render_version(model, id));
            ControlFlow::Break(SUCCESS_EXIT_CODE)
        }
        Err(err) => {
            let code = ctx.settings.validation_exit_code;
            debug!(error = %err, code, "parse failed");
            ctx.console.write_err(&render_diagnostic(&err, ctx.settings.suggestions));
            ControlFlow::Break(code)
        }
    }
}

/// The message, followed by a "did you mean" hint when one is found.
pub fn render_diagnostic(err: &ParsingError, suggestions: bool) -> String {
    let mut buf = format!("{}\n", err);
    if let Some(candidate) = err.suggestion().filter(|_| suggestions) {
        buf.push_str(&format!("\nDid you mean this?\n    {}\n", candidate));
    }
    buf
}

/// Parses `args` into a `T` without running it.
///
/// Help and version requests come back as [`Error::Help`].
pub fn from_vec<T: Command + Default>(args: Vec<String>) -> Result<T, Error> {
    from_args(args, &Settings::default())
}

/// Like [`from_vec`], with the process arguments.
pub fn from_env<T: Command + Default>() -> Result<T, Error> {
    let args = env::args_os().skip(1).map(|it| it.to_string_lossy().into_owned()).collect();
    from_vec(args)
}

fn from_args<T: Command + Default>(args: Vec<String>, settings: &Settings) -> Result<T, Error> {
    let model = Builder::default().build(&T::descriptor())?;
    let res = match parse(&model, settings, args)? {
        ParseOutcome::Matched(res) => res,
        ParseOutcome::Help(id) => return Err(Error::Help(render_help(&model, id))),
        ParseOutcome::Version(id) => return Err(Error::Help(render_version(&model, id))),
    };
    let mut command = T::default();
    bind::bind(&model, &res, &mut command)?;
    Ok(command)
}
