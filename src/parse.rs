//! Matches an argument vector against a [`CommandModel`].

use std::{cmp::Reverse, collections::BTreeMap};

use tracing::{debug, trace};

use crate::{
    error::ParsingError,
    meta::Arity,
    model::{ArgumentKey, CommandModel, CommandNode, NodeId, OptionDef, OptionKey, OptionRole},
    settings::Settings,
    value::{Resolved, Value, ValueType},
};

#[derive(Debug)]
pub enum ParseOutcome {
    Matched(ParseResult),
    /// Help was requested for this node.
    Help(NodeId),
    /// Version was requested for this node.
    Version(NodeId),
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Occurrences {
    count: usize,
    values: Vec<Value>,
}

/// Values resolved by one successful parse.
#[derive(Debug)]
pub struct ParseResult {
    path: Vec<NodeId>,
    options: BTreeMap<OptionKey, Occurrences>,
    arguments: BTreeMap<ArgumentKey, Vec<Value>>,
}

impl ParseResult {
    /// The selected command, the last node of the path.
    pub fn node(&self) -> NodeId {
        self.path[self.path.len() - 1]
    }

    /// Selected nodes, root first.
    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    /// Names of the selected subcommands; empty when the root was selected.
    pub fn subcommand_path<'m>(&self, model: &'m CommandModel) -> Vec<&'m str> {
        self.path[1..].iter().map(|&it| model.node(it).name.as_str()).collect()
    }

    pub fn option_values(&self, key: OptionKey) -> &[Value] {
        self.options.get(&key).map(|it| it.values.as_slice()).unwrap_or_default()
    }

    pub fn argument_values(&self, key: ArgumentKey) -> &[Value] {
        self.arguments.get(&key).map(|it| it.as_slice()).unwrap_or_default()
    }

    /// Everything resolved for the members declared by `id`, in declaration
    /// order. Members that got nothing are left out.
    pub fn resolved(&self, model: &CommandModel, id: NodeId) -> Vec<Resolved> {
        let node = model.node(id);
        let mut res = Vec::new();
        for def in node.own_options() {
            if let Some(occurrences) = self.options.get(&def.key) {
                let resolved =
                    Resolved::new(&def.member, occurrences.count, occurrences.values.clone());
                res.push((def.order, resolved));
            }
        }
        for def in &node.arguments {
            if let Some(values) = self.arguments.get(&def.key) {
                let resolved = Resolved::new(&def.member, values.len(), values.clone());
                res.push((def.order, resolved));
            }
        }
        res.sort_by_key(|(order, _)| *order);
        res.into_iter().map(|(_, it)| it).collect()
    }

    /// Looks a member up along the selected path.
    pub fn get(&self, model: &CommandModel, member: &str) -> Option<Resolved> {
        self.path
            .iter()
            .flat_map(|&id| self.resolved(model, id))
            .find(|it| it.member() == member)
    }
}

pub fn parse(
    model: &CommandModel,
    settings: &Settings,
    args: Vec<String>,
) -> Result<ParseOutcome, ParsingError> {
    Parser::new(model, settings, args).run()
}

enum Token {
    Flag(String),
    Positional(String),
}

struct Parser<'a> {
    model: &'a CommandModel,
    settings: &'a Settings,
    rargs: Vec<String>,
    after_double_dash: bool,
    node: NodeId,
    path: Vec<NodeId>,
    next_argument: usize,
    options: BTreeMap<OptionKey, Occurrences>,
    arguments: BTreeMap<ArgumentKey, Vec<Value>>,
}

impl<'a> Parser<'a> {
    fn new(model: &'a CommandModel, settings: &'a Settings, mut args: Vec<String>) -> Self {
        args.reverse();
        let root = model.root();
        Parser {
            model,
            settings,
            rargs: args,
            after_double_dash: false,
            node: root,
            path: vec![root],
            next_argument: 0,
            options: BTreeMap::new(),
            arguments: BTreeMap::new(),
        }
    }

    fn current(&self) -> &'a CommandNode {
        self.model.node(self.node)
    }

    fn run(mut self) -> Result<ParseOutcome, ParsingError> {
        while let Some(token) = self.pop() {
            match token {
                Token::Flag(flag) => {
                    if let Some(outcome) = self.option(&flag)? {
                        return Ok(outcome);
                    }
                }
                Token::Positional(arg) => self.positional(arg)?,
            }
        }
        self.finish()
    }

    fn pop(&mut self) -> Option<Token> {
        loop {
            let arg = self.rargs.pop()?;
            if self.after_double_dash {
                return Some(Token::Positional(arg));
            }
            if self.is_separator(&arg) {
                self.after_double_dash = true;
                continue;
            }
            let token =
                if self.looks_like_option(&arg) { Token::Flag(arg) } else { Token::Positional(arg) };
            return Some(token);
        }
    }

    fn is_separator(&self, arg: &str) -> bool {
        arg == "--" && self.settings.allow_argument_separator
    }

    fn looks_like_option(&self, arg: &str) -> bool {
        if !arg.starts_with('-') || arg == "-" || arg == "--" {
            return false;
        }
        !(is_negative_number(arg) && self.current().find_option(arg).is_none())
    }

    /// A registered spelling at the current node, possibly with an inline value.
    fn is_registered(&self, arg: &str) -> bool {
        let node = self.current();
        node.find_option(arg).is_some()
            || split_inline(arg).map_or(false, |(name, _)| node.find_option(name).is_some())
    }

    fn option(&mut self, token: &str) -> Result<Option<ParseOutcome>, ParsingError> {
        let node = self.current();
        if let Some(def) = node.find_option(token) {
            return self.apply(def, None);
        }
        if let Some((name, value)) = split_inline(token) {
            if let Some(def) = node.find_option(name) {
                return self.apply(def, Some(value.to_string()));
            }
        }
        if self.settings.cluster_short_options && !token.starts_with("--") && token.len() > 2 {
            for (def, inline) in resolve_cluster(node, token)? {
                if let Some(outcome) = self.apply(def, inline)? {
                    return Ok(Some(outcome));
                }
            }
            return Ok(None);
        }
        let name = split_inline(token).map_or(token, |(name, _)| name);
        Err(ParsingError::UnrecognizedOption {
            token: name.to_string(),
            candidates: node.option_spellings(),
        })
    }

    fn apply(
        &mut self,
        def: &'a OptionDef,
        inline: Option<String>,
    ) -> Result<Option<ParseOutcome>, ParsingError> {
        if def.is_short_circuit() {
            return Ok(Some(self.short_circuit(def)));
        }

        let name = def.display_name();
        let mut raw = Vec::new();
        match def.arity {
            Arity::Zero => {
                if inline.is_some() {
                    return Err(ParsingError::ArityViolation {
                        name,
                        expected: Arity::Zero,
                        actual: 1,
                    });
                }
            }
            Arity::ExactlyOne => match inline.or_else(|| self.next_value()) {
                Some(value) => raw.push(value),
                None => {
                    if let Some(outcome) = self.pending_short_circuit() {
                        return Ok(Some(outcome));
                    }
                    return Err(ParsingError::ArityViolation {
                        name,
                        expected: Arity::ExactlyOne,
                        actual: 0,
                    });
                }
            },
            Arity::ZeroOrOne => raw.extend(inline),
            Arity::ZeroOrMany => {
                raw.extend(inline);
                while let Some(value) = self.next_many_value() {
                    raw.push(value);
                }
            }
        }

        let values = raw
            .into_iter()
            .map(|it| convert(&name, &def.value_type, it))
            .collect::<Result<Vec<_>, _>>()?;
        let slot = self.options.entry(def.key).or_default();
        if slot.count > 0 && !def.repeatable {
            return Err(ParsingError::DuplicateOption { name });
        }
        trace!(option = %name, values = values.len(), "matched option");
        slot.count += 1;
        slot.values.extend(values);
        Ok(None)
    }

    fn short_circuit(&self, def: &OptionDef) -> ParseOutcome {
        debug!(command = %self.current().name, flag = %def.display_name(), "short-circuit");
        match def.role {
            OptionRole::Version => ParseOutcome::Version(self.node),
            _ => ParseOutcome::Help(self.node),
        }
    }

    /// `--name --help` shows help rather than complaining about `--name`.
    fn pending_short_circuit(&mut self) -> Option<ParseOutcome> {
        let next = self.rargs.last()?;
        let def = self.current().find_option(next).filter(|it| it.is_short_circuit())?;
        self.rargs.pop();
        Some(self.short_circuit(def))
    }

    fn next_value(&mut self) -> Option<String> {
        let next = self.rargs.last()?;
        if self.is_separator(next) || self.is_registered(next) {
            return None;
        }
        self.rargs.pop()
    }

    fn next_many_value(&mut self) -> Option<String> {
        let next = self.rargs.last()?;
        if self.is_separator(next) || self.looks_like_option(next) {
            return None;
        }
        self.rargs.pop()
    }

    fn positional(&mut self, arg: String) -> Result<(), ParsingError> {
        let node = self.current();
        if !self.after_double_dash {
            if let Some(child) = node.find_subcommand(&arg) {
                debug!(command = %arg, "entering subcommand");
                self.node = child;
                self.path.push(child);
                self.next_argument = 0;
                return Ok(());
            }
        }
        match node.arguments.get(self.next_argument) {
            Some(def) => {
                let value = convert(&def.name, &def.value_type, arg)?;
                self.arguments.entry(def.key).or_default().push(value);
                if !def.is_variadic() {
                    self.next_argument += 1;
                }
                Ok(())
            }
            None => Err(ParsingError::UnrecognizedCommand {
                token: arg,
                candidates: node.subcommand_names(),
            }),
        }
    }

    fn finish(mut self) -> Result<ParseOutcome, ParsingError> {
        let model = self.model;
        for &id in &self.path {
            let node = model.node(id);
            for def in node.own_options() {
                if let Some(default) = &def.default {
                    if !self.options.contains_key(&def.key) {
                        let value = convert(&def.display_name(), &def.value_type, default.clone())?;
                        self.options.insert(def.key, Occurrences { count: 0, values: vec![value] });
                    }
                }
            }
            for def in &node.arguments {
                if let Some(default) = &def.default {
                    if !self.arguments.contains_key(&def.key) {
                        let value = convert(&def.name, &def.value_type, default.clone())?;
                        self.arguments.insert(def.key, vec![value]);
                    }
                }
            }
        }

        for &id in &self.path {
            if let Some(name) = self.first_missing(model.node(id)) {
                return Err(ParsingError::MissingRequiredValue { name });
            }
        }

        let node = self.current();
        if node.has_subcommands() && node.entry.is_none() {
            return Err(ParsingError::MissingSubcommand {
                command: model.qualified_name(self.node),
                candidates: node.subcommand_names(),
            });
        }

        Ok(ParseOutcome::Matched(ParseResult {
            path: self.path,
            options: self.options,
            arguments: self.arguments,
        }))
    }

    /// The first required member of `node` without a value, in declaration order.
    fn first_missing(&self, node: &CommandNode) -> Option<String> {
        let mut missing = Vec::new();
        for def in node.own_options().filter(|it| it.required) {
            let given = self
                .options
                .get(&def.key)
                .map_or(false, |it| it.count > 0 || !it.values.is_empty());
            if !given {
                missing.push((def.order, def.display_name()));
            }
        }
        for def in node.arguments.iter().filter(|it| it.required) {
            if !self.arguments.contains_key(&def.key) {
                missing.push((def.order, def.name.clone()));
            }
        }
        missing.into_iter().min_by_key(|(order, _)| *order).map(|(_, name)| name)
    }
}

fn convert(name: &str, value_type: &ValueType, raw: String) -> Result<Value, ParsingError> {
    match value_type.convert(&raw) {
        Some(value) => Ok(value),
        None => Err(ParsingError::InvalidValueFormat {
            name: name.to_string(),
            raw,
            expected: value_type.describe(),
        }),
    }
}

/// `--name=value` and `--name:value`.
fn split_inline(token: &str) -> Option<(&str, &str)> {
    let idx = token.find(|c| c == '=' || c == ':')?;
    Some((&token[..idx], &token[idx + 1..]))
}

/// `-5`, `-0.5` or `-.5`, but not `-inf` or `-nan`.
fn is_negative_number(arg: &str) -> bool {
    let digits = match arg.strip_prefix('-') {
        Some(it) => it,
        None => return false,
    };
    let starts_numeric = match digits.as_bytes() {
        [b'0'..=b'9', ..] => true,
        [b'.', b'0'..=b'9', ..] => true,
        _ => false,
    };
    starts_numeric && digits.parse::<f64>().is_ok()
}

/// Splits `-abc` into the options it is made of.
///
/// At every position the longest matching short name wins. A value-taking
/// option swallows the rest of the cluster as its value. When resolution
/// fails after a position with several matches, `AmbiguousOption` lists
/// those matches in declaration order.
fn resolve_cluster<'m>(
    node: &'m CommandNode,
    token: &str,
) -> Result<Vec<(&'m OptionDef, Option<String>)>, ParsingError> {
    let mut res = Vec::new();
    let mut branch: Option<Vec<String>> = None;
    let mut rest = &token[1..];
    while !rest.is_empty() {
        let mut matches = node
            .options
            .iter()
            .filter_map(|def| {
                let short = def.short.as_deref()?;
                if rest.starts_with(short) {
                    Some((def, short))
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();
        if matches.len() > 1 && branch.is_none() {
            branch = Some(matches.iter().map(|(_, short)| format!("-{}", short)).collect());
        }
        matches.sort_by_key(|&(_, short)| Reverse(short.len()));

        let (def, short) = match matches.first() {
            Some(&it) => it,
            None => {
                return Err(match branch {
                    Some(matches) => {
                        ParsingError::AmbiguousOption { token: token.to_string(), matches }
                    }
                    None => ParsingError::UnrecognizedOption {
                        token: token.to_string(),
                        candidates: node.option_spellings(),
                    },
                })
            }
        };

        rest = &rest[short.len()..];
        if def.arity.takes_value() && !rest.is_empty() {
            res.push((def, Some(rest.to_string())));
            break;
        }
        res.push((def, None));
    }
    Ok(res)
}
