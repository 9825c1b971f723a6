//! Turns a [`Descriptor`] into a [`CommandModel`].
//!
//! The builder is a pipeline of [`Convention`]s. Each convention looks at the
//! descriptor of one command and adds to the node being built; it never
//! removes or reorders what earlier conventions added. The standard pipeline
//! is options, arguments, subcommands, help flag, version flag, in that order.

use tracing::debug;

use crate::{
    error::ConfigError,
    meta::{Arity, Descriptor, Kind, Member},
    model::{ArgumentDef, ArgumentKey, CommandModel, NodeId, OptionDef, OptionKey, OptionRole},
};

pub trait Convention {
    fn apply(
        &self,
        cx: &mut BuildCx<'_>,
        node: NodeId,
        descriptor: &Descriptor,
    ) -> Result<(), ConfigError>;
}

/// State shared by the conventions while a model is being built.
pub struct BuildCx<'a> {
    pub model: CommandModel,
    pipeline: &'a [Box<dyn Convention>],
}

impl BuildCx<'_> {
    /// Runs the whole pipeline for a new child of `parent`.
    pub fn build_child(
        &mut self,
        parent: NodeId,
        descriptor: &Descriptor,
    ) -> Result<NodeId, ConfigError> {
        let id = self.model.add_node(&descriptor.name, Some(parent));
        self.run(id, descriptor)?;
        Ok(id)
    }

    fn run(&mut self, id: NodeId, descriptor: &Descriptor) -> Result<(), ConfigError> {
        {
            let node = self.model.node_mut(id);
            node.doc = descriptor.doc.clone();
            node.entry = descriptor.entry;
        }
        let pipeline = self.pipeline;
        for convention in pipeline {
            convention.apply(self, id, descriptor)?;
        }
        Ok(())
    }

    fn command_name(&self, id: NodeId) -> String {
        self.model.qualified_name(id)
    }

    /// Adds an option to `id`, rejecting spellings that are already taken.
    pub fn add_option(&mut self, id: NodeId, def: OptionDef) -> Result<(), ConfigError> {
        let node = self.model.node(id);
        if let Some(name) = def.spellings().into_iter().find(|it| node.find_option(it).is_some()) {
            return Err(ConfigError::DuplicateOptionName { command: self.command_name(id), name });
        }
        debug!(command = %node.name, option = %def.display_name(), "registered option");
        self.model.node_mut(id).options.push(def);
        Ok(())
    }

    fn is_taken(&self, id: NodeId, spelling: &str) -> bool {
        self.model.node(id).find_option(spelling).is_some()
    }
}

pub struct Builder {
    conventions: Vec<Box<dyn Convention>>,
}

impl Default for Builder {
    fn default() -> Self {
        Builder::standard()
    }
}

impl Builder {
    pub fn standard() -> Builder {
        Builder {
            conventions: vec![
                Box::new(OptionConvention),
                Box::new(ArgumentConvention),
                Box::new(SubcommandConvention),
                Box::new(HelpConvention),
                Box::new(VersionConvention),
            ],
        }
    }

    /// A builder that runs only the given conventions.
    pub fn empty() -> Builder {
        Builder { conventions: Vec::new() }
    }

    pub fn with_convention(mut self, convention: impl Convention + 'static) -> Builder {
        self.conventions.push(Box::new(convention));
        self
    }

    pub fn build(&self, descriptor: &Descriptor) -> Result<CommandModel, ConfigError> {
        let mut cx = BuildCx { model: CommandModel::default(), pipeline: &self.conventions };
        let root = cx.model.add_node(&descriptor.name, None);
        cx.run(root, descriptor)?;
        Ok(cx.model)
    }
}

struct OptionConvention;

impl Convention for OptionConvention {
    fn apply(
        &self,
        cx: &mut BuildCx<'_>,
        id: NodeId,
        descriptor: &Descriptor,
    ) -> Result<(), ConfigError> {
        for (order, member) in descriptor.members_of(Kind::Option) {
            check_option(cx, id, member)?;
            let index = cx.model.node(id).options.len();
            let def = option_def(OptionKey { node: id, index }, order, member, OptionRole::Value);
            cx.add_option(id, def)?;
        }

        let inherited = match cx.model.node(id).parent {
            Some(parent) => cx
                .model
                .node(parent)
                .options
                .iter()
                .filter(|it| it.inherited && it.role == OptionRole::Value)
                .cloned()
                .collect::<Vec<_>>(),
            None => Vec::new(),
        };
        for def in inherited {
            cx.add_option(id, def)?;
        }
        Ok(())
    }
}

fn check_option(cx: &BuildCx<'_>, id: NodeId, member: &Member) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidMember {
        command: cx.command_name(id),
        member: member.member.clone(),
        reason: reason.to_string(),
    };
    if member.arity == Arity::Zero && member.required {
        return Err(invalid("a switch can't be required"));
    }
    if member.arity == Arity::Zero && member.default.is_some() {
        return Err(invalid("a switch can't have a default"));
    }
    check_default(cx, id, member)
}

fn check_default(cx: &BuildCx<'_>, id: NodeId, member: &Member) -> Result<(), ConfigError> {
    if let Some(default) = &member.default {
        if member.value_type.convert(default).is_none() {
            return Err(ConfigError::InvalidDefault {
                command: cx.command_name(id),
                member: member.member.clone(),
                value: default.clone(),
                expected: member.value_type.describe(),
            });
        }
    }
    Ok(())
}

fn option_def(key: OptionKey, order: usize, member: &Member, role: OptionRole) -> OptionDef {
    OptionDef {
        key,
        member: member.member.clone(),
        role,
        long: Some(member.name.clone()),
        short: member.short.clone(),
        aliases: Vec::new(),
        value_type: member.value_type.clone(),
        value_name: member.value_name.clone().unwrap_or_else(|| member.name.clone()),
        arity: member.arity,
        required: member.required,
        repeatable: member.repeatable || member.arity == Arity::ZeroOrMany,
        inherited: member.inherited,
        default: member.default.clone(),
        doc: member.doc.clone(),
        order,
    }
}

struct ArgumentConvention;

impl Convention for ArgumentConvention {
    fn apply(
        &self,
        cx: &mut BuildCx<'_>,
        id: NodeId,
        descriptor: &Descriptor,
    ) -> Result<(), ConfigError> {
        let mut variadic: Option<String> = None;
        for (order, member) in descriptor.members_of(Kind::Argument) {
            if !matches!(member.arity, Arity::ExactlyOne | Arity::ZeroOrMany) {
                return Err(ConfigError::InvalidMember {
                    command: cx.command_name(id),
                    member: member.member.clone(),
                    reason: format!("an argument can't take {}", member.arity),
                });
            }
            if let Some(variadic) = &variadic {
                return Err(ConfigError::InvalidArgumentOrder {
                    command: cx.command_name(id),
                    argument: member.name.clone(),
                    variadic: variadic.clone(),
                });
            }
            if member.is_variadic() {
                variadic = Some(member.name.clone());
            }
            check_default(cx, id, member)?;

            let node = cx.model.node_mut(id);
            let key = ArgumentKey { node: id, index: node.arguments.len() };
            debug!(command = %node.name, argument = %member.name, "registered argument");
            node.arguments.push(ArgumentDef {
                key,
                member: member.member.clone(),
                name: member.name.clone(),
                value_type: member.value_type.clone(),
                arity: member.arity,
                required: member.required,
                default: member.default.clone(),
                doc: member.doc.clone(),
                order,
            });
        }
        Ok(())
    }
}

struct SubcommandConvention;

impl Convention for SubcommandConvention {
    fn apply(
        &self,
        cx: &mut BuildCx<'_>,
        id: NodeId,
        descriptor: &Descriptor,
    ) -> Result<(), ConfigError> {
        for sub in &descriptor.subcommands {
            if cx.model.node(id).find_subcommand(&sub.name).is_some() {
                return Err(ConfigError::DuplicateCommandName {
                    command: cx.command_name(id),
                    name: sub.name.clone(),
                });
            }
            let child = cx.build_child(id, sub)?;
            cx.model.node_mut(id).subcommands.push((sub.name.clone(), child));
        }
        if descriptor.subcommands.is_empty() && descriptor.entry.is_none() {
            return Err(ConfigError::MissingEntryPoint { command: cx.command_name(id) });
        }
        Ok(())
    }
}

struct HelpConvention;

impl Convention for HelpConvention {
    fn apply(
        &self,
        cx: &mut BuildCx<'_>,
        id: NodeId,
        descriptor: &Descriptor,
    ) -> Result<(), ConfigError> {
        let index = cx.model.node(id).options.len();
        let key = OptionKey { node: id, index };
        let declared = descriptor.members_of(Kind::HelpFlag).next();
        let def = match declared {
            Some((order, member)) => option_def(key, order, member, OptionRole::Help),
            None if descriptor.implicit_help => {
                let implicit = Member::help_flag("help").doc("Show help information.");
                let mut def = option_def(key, descriptor.members.len(), &implicit, OptionRole::Help);
                def.aliases = vec!["-?".to_string()];
                def.aliases.retain(|it| !cx.is_taken(id, it));
                def.short = def.short.filter(|it| !cx.is_taken(id, &format!("-{}", it)));
                def.long = def.long.filter(|it| !cx.is_taken(id, &format!("--{}", it)));
                if def.spellings().is_empty() {
                    return Ok(());
                }
                def
            }
            None => return Ok(()),
        };
        cx.add_option(id, def)
    }
}

struct VersionConvention;

impl Convention for VersionConvention {
    fn apply(
        &self,
        cx: &mut BuildCx<'_>,
        id: NodeId,
        descriptor: &Descriptor,
    ) -> Result<(), ConfigError> {
        let declared = descriptor.members_of(Kind::VersionFlag).next();
        let version = match &descriptor.version {
            Some(it) => it.clone(),
            None => {
                if let Some((_, member)) = declared {
                    return Err(ConfigError::InvalidMember {
                        command: cx.command_name(id),
                        member: member.member.clone(),
                        reason: "a version flag needs version text".to_string(),
                    });
                }
                return Ok(());
            }
        };
        cx.model.node_mut(id).version = Some(version);

        let index = cx.model.node(id).options.len();
        let key = OptionKey { node: id, index };
        let def = match declared {
            Some((order, member)) => option_def(key, order, member, OptionRole::Version),
            None => {
                if cx.is_taken(id, "--version") {
                    return Ok(());
                }
                let implicit = Member::version_flag("version").doc("Show version information.");
                option_def(key, descriptor.members.len() + 1, &implicit, OptionRole::Version)
            }
        };
        cx.add_option(id, def)
    }
}
