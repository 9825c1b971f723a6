//! Writing parsed values onto a command and running its entry point.

use std::{
    any::{self, Any, TypeId},
    collections::HashMap,
    fmt,
    future::Future,
    path::PathBuf,
    sync::Arc,
};

use futures::future::{FutureExt, LocalBoxFuture};
use tracing::debug;

use crate::{
    console::Console,
    error::{ConfigError, Error},
    meta::Descriptor,
    model::CommandModel,
    parse::ParseResult,
    value::Resolved,
};

/// A type that can be parsed into and run.
///
/// Usually implemented by [`command!`](crate::command).
pub trait Command {
    fn descriptor() -> Descriptor
    where
        Self: Sized;

    /// Stores the values resolved for `member`.
    fn assign(&mut self, member: &str, values: Resolved) -> Result<(), ConfigError>;

    /// Instantiates the subcommand `name` and hands it out for binding.
    fn enter(&mut self, _name: &str) -> Option<&mut dyn Command> {
        None
    }

    fn entry_point(&mut self) -> Option<EntryPoint<'_>> {
        None
    }
}

/// The method to run once binding is done.
pub enum EntryPoint<'a> {
    Sync(Box<dyn FnOnce(&Services) -> Result<i32, Error> + 'a>),
    Async(Box<dyn FnOnce(&'a Services) -> LocalBoxFuture<'a, Result<i32, Error>> + 'a>),
}

impl<'a> EntryPoint<'a> {
    pub fn sync<F>(f: F) -> EntryPoint<'a>
    where
        F: FnOnce(&Services) -> Result<i32, Error> + 'a,
    {
        EntryPoint::Sync(Box::new(f))
    }

    pub fn asynchronous<F, Fut>(f: F) -> EntryPoint<'a>
    where
        F: FnOnce(&'a Services) -> Fut + 'a,
        Fut: Future<Output = Result<i32, Error>> + 'a,
    {
        EntryPoint::Async(Box::new(move |services: &'a Services| f(services).boxed_local()))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, EntryPoint::Async(_))
    }
}

impl fmt::Debug for EntryPoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPoint::Sync(_) => f.write_str("EntryPoint::Sync"),
            EntryPoint::Async(_) => f.write_str("EntryPoint::Async"),
        }
    }
}

/// What an entry method may return.
pub trait IntoExitCode {
    fn into_exit_code(self) -> anyhow::Result<i32>;
}

impl IntoExitCode for () {
    fn into_exit_code(self) -> anyhow::Result<i32> {
        Ok(0)
    }
}

impl IntoExitCode for i32 {
    fn into_exit_code(self) -> anyhow::Result<i32> {
        Ok(self)
    }
}

impl IntoExitCode for u8 {
    fn into_exit_code(self) -> anyhow::Result<i32> {
        Ok(i32::from(self))
    }
}

impl<T, E> IntoExitCode for Result<T, E>
where
    T: IntoExitCode,
    E: Into<anyhow::Error>,
{
    fn into_exit_code(self) -> anyhow::Result<i32> {
        match self {
            Ok(it) => it.into_exit_code(),
            Err(err) => Err(err.into()),
        }
    }
}

/// Values an entry method can ask for besides the bound members.
#[derive(Default)]
pub struct Services {
    values: HashMap<TypeId, Box<dyn Any>>,
}

impl Services {
    pub fn new() -> Services {
        Services::default()
    }

    /// Registers `value`, replacing an earlier value of the same type.
    pub fn insert<T: Any>(&mut self, value: T) {
        self.values.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.values.get(&TypeId::of::<T>())?.downcast_ref()
    }

    pub fn resolve<T: Any + Clone>(&self) -> Result<T, ConfigError> {
        self.get::<T>()
            .cloned()
            .ok_or(ConfigError::MissingService { type_name: any::type_name::<T>() })
    }

    pub fn console(&self) -> Option<Arc<dyn Console>> {
        self.get::<Arc<dyn Console>>().cloned()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").field("len", &self.values.len()).finish()
    }
}

/// The directory the command was started in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirectory(pub PathBuf);

/// Assigns everything in `res` along the selected path and returns the
/// selected command.
pub(crate) fn bind<'c>(
    model: &CommandModel,
    res: &ParseResult,
    target: &'c mut dyn Command,
) -> Result<&'c mut dyn Command, ConfigError> {
    let mut current = target;
    for (i, &id) in res.path().iter().enumerate() {
        if i > 0 {
            let name = &model.node(id).name;
            current = current
                .enter(name)
                .ok_or_else(|| ConfigError::UnknownSubcommand { name: name.clone() })?;
        }
        for resolved in res.resolved(model, id) {
            let member = resolved.member().to_string();
            current.assign(&member, resolved)?;
        }
    }
    Ok(current)
}

pub(crate) fn entry_point<'c>(
    model: &CommandModel,
    res: &ParseResult,
    command: &'c mut dyn Command,
) -> Result<EntryPoint<'c>, ConfigError> {
    command
        .entry_point()
        .ok_or_else(|| ConfigError::MissingEntryPoint { command: model.qualified_name(res.node()) })
}

/// Runs `entry` to completion on the current thread.
pub(crate) fn invoke_blocking<'a>(
    entry: EntryPoint<'a>,
    services: &'a Services,
) -> Result<i32, Error> {
    let code = match entry {
        EntryPoint::Sync(f) => f(services),
        EntryPoint::Async(f) => futures::executor::block_on(f(services)),
    }?;
    debug!(code, "entry point returned");
    Ok(code)
}

pub(crate) async fn invoke<'a>(entry: EntryPoint<'a>, services: &'a Services) -> Result<i32, Error> {
    let code = match entry {
        EntryPoint::Sync(f) => f(services),
        EntryPoint::Async(f) => f(services).await,
    }?;
    debug!(code, "entry point returned");
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Token(&'static str);

    #[test]
    fn services_resolve_by_type() {
        let mut services = Services::new();
        services.insert(Token("secret"));
        services.insert(WorkingDirectory("/tmp".into()));
        assert_eq!(services.resolve::<Token>(), Ok(Token("secret")));
        assert_eq!(services.get::<WorkingDirectory>(), Some(&WorkingDirectory("/tmp".into())));
        assert!(services.console().is_none());

        let err = services.resolve::<u64>().unwrap_err();
        assert_eq!(err.to_string(), "no service of type `u64` is available");
    }

    #[test]
    fn exit_codes() {
        assert_eq!(().into_exit_code().unwrap(), 0);
        assert_eq!(3i32.into_exit_code().unwrap(), 3);
        assert_eq!(Ok::<u8, std::io::Error>(7).into_exit_code().unwrap(), 7);
        let err = Err::<(), _>(anyhow::format_err!("disk full")).into_exit_code().unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn entry_points_are_tagged() {
        let sync = EntryPoint::sync(|_| Ok(0));
        assert!(!sync.is_async());
        let services = Services::new();
        let asynchronous = EntryPoint::asynchronous(|_| async { Ok::<_, Error>(5) });
        assert!(asynchronous.is_async());
        assert_eq!(invoke_blocking(asynchronous, &services).unwrap(), 5);
    }
}
