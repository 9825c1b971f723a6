#[derive(Debug)]
pub(crate) struct Cmd {
    pub(crate) name: String,
    pub(crate) doc: Option<String>,
    /// Rust expression producing the version text.
    pub(crate) version: Option<String>,
    pub(crate) args: Vec<Arg>,
    pub(crate) flags: Vec<Flag>,
    pub(crate) subcommands: Vec<Cmd>,
    pub(crate) entry: Option<Entry>,
    /// Declaration order of args and flags, as the runtime sees it.
    pub(crate) members: Vec<MemberRef>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum MemberRef {
    Arg(usize),
    Flag(usize),
}

#[derive(Debug)]
pub(crate) struct Arg {
    pub(crate) arity: Arity,
    pub(crate) doc: Option<String>,
    pub(crate) val: Val,
}

#[derive(Debug)]
pub(crate) struct Flag {
    pub(crate) arity: Arity,
    pub(crate) name: String,
    pub(crate) short: Option<String>,
    pub(crate) doc: Option<String>,
    pub(crate) inherited: bool,
    pub(crate) val: Option<Val>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arity {
    Optional,
    Required,
    Repeated,
}

#[derive(Debug)]
pub(crate) struct Val {
    pub(crate) name: String,
    pub(crate) count: Count,
    pub(crate) ty: Ty,
    pub(crate) default: Option<String>,
}

/// How many values one occurrence takes: `name`, `name?` or `name...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Count {
    One,
    Maybe,
    Many,
}

#[derive(Debug)]
pub(crate) enum Ty {
    /// A type the runtime converts to directly.
    Builtin(String),
    /// `{auto | always | never}`, bound as a `String`.
    Choice(Vec<String>),
    FromStr(String),
}

#[derive(Debug)]
pub(crate) struct Entry {
    pub(crate) method: String,
    pub(crate) is_async: bool,
    /// Types of the extra parameters, resolved from services.
    pub(crate) params: Vec<String>,
}
