//! The runtime command tree.
//!
//! Nodes live in a flat table owned by [`CommandModel`] and refer to each
//! other by [`NodeId`], so the parent link is a plain index.

use crate::{
    meta::{Arity, EntryKind},
    value::ValueType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies an option by the node that declares it and its position there.
///
/// Inherited copies of an option keep the key of the original, which is how
/// their values find their way back to the declaring command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OptionKey {
    pub node: NodeId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArgumentKey {
    pub node: NodeId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionRole {
    Value,
    Help,
    Version,
}

#[derive(Debug, Clone)]
pub struct OptionDef {
    pub key: OptionKey,
    pub member: String,
    pub role: OptionRole,
    pub long: Option<String>,
    pub short: Option<String>,
    /// Extra spellings, dashes included, such as `-?`.
    pub aliases: Vec<String>,
    pub value_type: ValueType,
    pub value_name: String,
    pub arity: Arity,
    pub required: bool,
    pub repeatable: bool,
    pub inherited: bool,
    pub default: Option<String>,
    pub doc: Option<String>,
    /// Position among the declaring command's members.
    pub order: usize,
}

impl OptionDef {
    /// The spelling used in messages: the long name when there is one.
    pub fn display_name(&self) -> String {
        match (&self.long, &self.short) {
            (Some(long), _) => format!("--{}", long),
            (None, Some(short)) => format!("-{}", short),
            (None, None) => self.aliases.first().cloned().unwrap_or_default(),
        }
    }

    /// Every spelling, in the order they are shown in help.
    pub fn spellings(&self) -> Vec<String> {
        let mut res = self.aliases.clone();
        res.extend(self.short.iter().map(|it| format!("-{}", it)));
        res.extend(self.long.iter().map(|it| format!("--{}", it)));
        res
    }

    pub fn matches(&self, token: &str) -> bool {
        if let Some(long) = token.strip_prefix("--") {
            return self.long.as_deref() == Some(long) || self.is_alias(token);
        }
        if let Some(short) = token.strip_prefix('-') {
            return self.short.as_deref() == Some(short) || self.is_alias(token);
        }
        false
    }

    fn is_alias(&self, token: &str) -> bool {
        self.aliases.iter().any(|it| it == token)
    }

    pub fn is_short_circuit(&self) -> bool {
        self.role != OptionRole::Value
    }
}

#[derive(Debug, Clone)]
pub struct ArgumentDef {
    pub key: ArgumentKey,
    pub member: String,
    pub name: String,
    pub value_type: ValueType,
    pub arity: Arity,
    pub required: bool,
    pub default: Option<String>,
    pub doc: Option<String>,
    pub order: usize,
}

impl ArgumentDef {
    pub fn is_variadic(&self) -> bool {
        self.arity == Arity::ZeroOrMany
    }
}

#[derive(Debug, Clone)]
pub struct CommandNode {
    pub id: NodeId,
    pub name: String,
    pub doc: Option<String>,
    pub parent: Option<NodeId>,
    pub options: Vec<OptionDef>,
    pub arguments: Vec<ArgumentDef>,
    pub subcommands: Vec<(String, NodeId)>,
    pub version: Option<String>,
    pub entry: Option<EntryKind>,
}

impl CommandNode {
    pub fn find_option(&self, token: &str) -> Option<&OptionDef> {
        self.options.iter().find(|it| it.matches(token))
    }

    pub fn find_subcommand(&self, name: &str) -> Option<NodeId> {
        self.subcommands.iter().find(|(it, _)| it == name).map(|&(_, id)| id)
    }

    pub fn has_subcommands(&self) -> bool {
        !self.subcommands.is_empty()
    }

    pub fn subcommand_names(&self) -> Vec<String> {
        self.subcommands.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Spellings of every option usable at this node, in declaration order.
    pub fn option_spellings(&self) -> Vec<String> {
        self.options.iter().flat_map(|it| it.spellings()).collect()
    }

    /// Options declared here, as opposed to inherited copies.
    pub fn own_options(&self) -> impl Iterator<Item = &OptionDef> {
        let id = self.id;
        self.options.iter().filter(move |it| it.key.node == id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandModel {
    nodes: Vec<CommandNode>,
}

impl CommandModel {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut CommandNode {
        &mut self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[CommandNode] {
        &self.nodes
    }

    pub fn option(&self, key: OptionKey) -> &OptionDef {
        &self.node(key.node).options[key.index]
    }

    pub fn argument(&self, key: ArgumentKey) -> &ArgumentDef {
        &self.node(key.node).arguments[key.index]
    }

    pub(crate) fn add_node(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(CommandNode {
            id,
            name: name.to_string(),
            doc: None,
            parent,
            options: Vec::new(),
            arguments: Vec::new(),
            subcommands: Vec::new(),
            version: None,
            entry: None,
        });
        id
    }

    /// Nodes from the root down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut res = vec![id];
        let mut curr = id;
        while let Some(parent) = self.node(curr).parent {
            res.push(parent);
            curr = parent;
        }
        res.reverse();
        res
    }

    /// Space separated names from the root, `tool server watch`.
    pub fn qualified_name(&self, id: NodeId) -> String {
        let names = self.path(id).into_iter().map(|it| self.node(it).name.as_str()).collect::<Vec<_>>();
        names.join(" ")
    }

    /// Finds a node by its names below the root, `["server", "watch"]`.
    pub fn lookup(&self, names: &[&str]) -> Option<NodeId> {
        let mut curr = self.root();
        for name in names {
            curr = self.node(curr).find_subcommand(name)?;
        }
        Some(curr)
    }
}
