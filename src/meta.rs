//! What a command type says about itself.
//!
//! A [`Descriptor`] is plain data: members, subcommands, version text and the
//! kind of entry point. It is produced either by hand through the builder
//! methods below or by the `command!` macro, and consumed by
//! [`Builder`](crate::Builder).

use std::fmt;

use crate::value::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Option,
    Argument,
    HelpFlag,
    VersionFlag,
}

/// How many values a single occurrence of a member consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Zero,
    ExactlyOne,
    ZeroOrOne,
    ZeroOrMany,
}

impl Arity {
    pub fn takes_value(self) -> bool {
        self != Arity::Zero
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Arity::Zero => "no value",
            Arity::ExactlyOne => "exactly one value",
            Arity::ZeroOrOne => "at most one value",
            Arity::ZeroOrMany => "any number of values",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Sync,
    Async,
}

/// One bound member of a command type.
#[derive(Debug, Clone)]
pub struct Member {
    /// Identity used when binding, usually the field name.
    pub member: String,
    pub kind: Kind,
    /// Long name for options, display name for arguments.
    pub name: String,
    pub short: Option<String>,
    pub value_type: ValueType,
    pub value_name: Option<String>,
    pub arity: Arity,
    pub required: bool,
    pub repeatable: bool,
    pub inherited: bool,
    pub default: Option<String>,
    pub doc: Option<String>,
}

impl Member {
    /// A switch named after `member`, `log_file` becomes `--log-file`.
    ///
    /// Call [`Member::value`] to make it take a value.
    pub fn option(member: &str) -> Member {
        Member::new(member, Kind::Option, member.replace('_', "-"), Arity::Zero)
    }

    pub fn argument(member: &str, value_type: ValueType) -> Member {
        Member::new(member, Kind::Argument, member.to_string(), Arity::ExactlyOne)
            .value(value_type)
    }

    pub fn help_flag(member: &str) -> Member {
        Member::new(member, Kind::HelpFlag, "help".to_string(), Arity::Zero).short("h")
    }

    pub fn version_flag(member: &str) -> Member {
        Member::new(member, Kind::VersionFlag, "version".to_string(), Arity::Zero)
    }

    fn new(member: &str, kind: Kind, name: String, arity: Arity) -> Member {
        Member {
            member: member.to_string(),
            kind,
            name,
            short: None,
            value_type: ValueType::Text,
            value_name: None,
            arity,
            required: false,
            repeatable: false,
            inherited: false,
            default: None,
            doc: None,
        }
    }

    pub fn long(mut self, name: &str) -> Member {
        self.name = name.to_string();
        self
    }

    pub fn short(mut self, name: &str) -> Member {
        self.short = Some(name.to_string());
        self
    }

    /// Sets the value type; a switch becomes a single-valued option.
    pub fn value(mut self, value_type: ValueType) -> Member {
        self.value_type = value_type;
        if self.arity == Arity::Zero {
            self.arity = Arity::ExactlyOne;
        }
        self
    }

    pub fn value_name(mut self, name: &str) -> Member {
        self.value_name = Some(name.to_string());
        self
    }

    pub fn arity(mut self, arity: Arity) -> Member {
        self.arity = arity;
        self
    }

    pub fn required(mut self) -> Member {
        self.required = true;
        self
    }

    pub fn repeatable(mut self) -> Member {
        self.repeatable = true;
        self
    }

    /// Makes the option visible to every subcommand below the declaring one.
    pub fn inherited(mut self) -> Member {
        self.inherited = true;
        self
    }

    pub fn default_value(mut self, raw: &str) -> Member {
        self.default = Some(raw.to_string());
        self
    }

    pub fn doc(mut self, doc: &str) -> Member {
        self.doc = Some(doc.to_string());
        self
    }

    /// Variadic arguments and multi-valued options.
    pub fn is_variadic(&self) -> bool {
        self.arity == Arity::ZeroOrMany
    }
}

/// Declared shape of a command type.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub name: String,
    pub doc: Option<String>,
    pub version: Option<String>,
    pub members: Vec<Member>,
    pub subcommands: Vec<Descriptor>,
    pub entry: Option<EntryKind>,
    pub implicit_help: bool,
}

impl Descriptor {
    pub fn new(name: &str) -> Descriptor {
        Descriptor {
            name: name.to_string(),
            doc: None,
            version: None,
            members: Vec::new(),
            subcommands: Vec::new(),
            entry: None,
            implicit_help: true,
        }
    }

    pub fn doc(mut self, doc: &str) -> Descriptor {
        self.doc = Some(doc.to_string());
        self
    }

    pub fn version(mut self, version: &str) -> Descriptor {
        self.version = Some(version.to_string());
        self
    }

    pub fn member(mut self, member: Member) -> Descriptor {
        self.members.push(member);
        self
    }

    pub fn subcommand(mut self, descriptor: Descriptor) -> Descriptor {
        self.subcommands.push(descriptor);
        self
    }

    pub fn entry(mut self, kind: EntryKind) -> Descriptor {
        self.entry = Some(kind);
        self
    }

    /// Opts out of the implicit `-?, -h, --help` flag.
    pub fn without_help(mut self) -> Descriptor {
        self.implicit_help = false;
        self
    }

    pub(crate) fn members_of(&self, kind: Kind) -> impl Iterator<Item = (usize, &Member)> {
        self.members.iter().enumerate().filter(move |(_, it)| it.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_names_follow_the_member() {
        let member = Member::option("log_file");
        assert_eq!(member.name, "log-file");
        assert_eq!(member.arity, Arity::Zero);

        let member = Member::option("log_file").long("log").value(ValueType::Path);
        assert_eq!(member.name, "log");
        assert_eq!(member.arity, Arity::ExactlyOne);
    }

    #[test]
    fn value_keeps_explicit_arity() {
        let member = Member::option("include").arity(Arity::ZeroOrMany).value(ValueType::Path);
        assert_eq!(member.arity, Arity::ZeroOrMany);
        assert!(member.is_variadic());
    }
}
