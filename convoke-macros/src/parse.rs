use std::{fmt, mem};

#[cfg(not(test))]
use proc_macro::{Delimiter, TokenStream, TokenTree};
#[cfg(test)]
use proc_macro2::{Delimiter, TokenStream, TokenTree};

use crate::ast;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub(crate) struct Error {
    msg: String,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.msg, f)
    }
}

macro_rules! format_err {
    ($($tt:tt)*) => {
        Error { msg: format!($($tt)*) }
    };
}

macro_rules! bail {
    ($($tt:tt)*) => {
        return Err(format_err!($($tt)*))
    };
}

pub(crate) fn command(ts: TokenStream) -> Result<ast::Cmd> {
    let p = &mut Parser::new(ts);
    let doc = opt_doc(p)?;
    let mut cmd = cmd(p)?;
    cmd.doc = doc;
    if !p.end() {
        bail!("expected a single `cmd`, got `{}`", p.rest())
    }
    Ok(cmd)
}

fn cmd(p: &mut Parser) -> Result<ast::Cmd> {
    p.expect_keyword("cmd")?;
    let name = cmd_name(p)?;

    let mut res = ast::Cmd {
        name,
        doc: None,
        version: None,
        args: Vec::new(),
        flags: Vec::new(),
        subcommands: Vec::new(),
        entry: None,
        members: Vec::new(),
    };

    p.enter_delim(Delimiter::Brace)?;
    while !p.end() {
        let doc = opt_doc(p)?;
        if p.at_keyword("cmd") {
            let mut cmd = cmd(p)?;
            cmd.doc = doc;
            if res.subcommands.iter().any(|it| it.name == cmd.name) {
                bail!("duplicate subcommand `{}` in `{}`", cmd.name, res.name)
            }
            res.subcommands.push(cmd);
        } else if p.eat_keyword("version") {
            if res.version.is_some() {
                bail!("`{}` already has a version", res.name)
            }
            res.version = Some(version(p)?);
        } else if p.eat_keyword("run") {
            if res.entry.is_some() {
                bail!("`{}` already has a `run` method", res.name)
            }
            res.entry = Some(entry(p)?);
        } else {
            let inherited = p.eat_keyword("inherited");
            let arity = arity(p)?;
            let is_val = p.at_val();
            let name = p.expect_name()?;
            if name.starts_with('-') {
                let mut flag = flag(p, name)?;
                flag.doc = doc;
                flag.arity = arity;
                flag.inherited = inherited;
                check_flag(&flag)?;
                res.members.push(ast::MemberRef::Flag(res.flags.len()));
                res.flags.push(flag);
            } else if is_val {
                if inherited {
                    bail!("only flags can be inherited, `{name}` is an argument")
                }
                let val = val(p, name)?;
                let arg = ast::Arg { arity, doc, val };
                check_arg(&arg)?;
                res.members.push(ast::MemberRef::Arg(res.args.len()));
                res.args.push(arg);
            } else {
                bail!("expected `--flag` or `arg: Type`, got `{name}`")
            }
        }
    }
    p.exit_delim()?;

    if res.entry.is_none() && res.subcommands.is_empty() {
        bail!("`{}` needs a `run` method or a subcommand", res.name)
    }
    Ok(res)
}

fn flag(p: &mut Parser, name: String) -> Result<ast::Flag> {
    let short;
    let long;
    if name.starts_with("--") {
        short = None;
        long = name;
    } else {
        if !p.eat_punct(',') {
            bail!("long option is required for `{name}`");
        }
        short = Some(name);
        long = flag_name(p)?;
        if !long.starts_with("--") {
            bail!("long name must begin with `--`: `{long}`");
        }
    }

    let val = if p.at_val() {
        let name = p.expect_name()?;
        Some(val(p, name)?)
    } else {
        None
    };
    Ok(ast::Flag {
        arity: ast::Arity::Required,
        name: long[2..].to_string(),
        short: short.map(|it| it[1..].to_string()),
        doc: None,
        inherited: false,
        val,
    })
}

fn check_flag(flag: &ast::Flag) -> Result<()> {
    let name = &flag.name;
    match &flag.val {
        None if flag.arity == ast::Arity::Required => {
            bail!("a switch can't be required: `--{name}`")
        }
        Some(val) if val.count == ast::Count::Maybe && flag.arity != ast::Arity::Optional => {
            bail!("only optional flags can have an optional value: `--{name}`")
        }
        Some(val) if val.default.is_some() && flag.arity == ast::Arity::Repeated => {
            bail!("a repeated flag can't have a default: `--{name}`")
        }
        _ => Ok(()),
    }
}

fn check_arg(arg: &ast::Arg) -> Result<()> {
    let name = &arg.val.name;
    if arg.val.count != ast::Count::One {
        bail!("an argument takes one value per position, use `repeated {name}` instead")
    }
    if arg.val.default.is_some() && arg.arity != ast::Arity::Optional {
        bail!("only optional arguments can have a default: `{name}`")
    }
    Ok(())
}

/// Everything after the value name: `?` or `...`, the type and a default.
fn val(p: &mut Parser, name: String) -> Result<ast::Val> {
    let count = if p.eat_punct('?') {
        ast::Count::Maybe
    } else if p.eat_punct('.') {
        p.expect_punct('.')?;
        p.expect_punct('.')?;
        ast::Count::Many
    } else {
        ast::Count::One
    };
    p.expect_punct(':')?;
    let ty = ty(p)?;
    let default = if p.eat_punct('=') { Some(default_value(p)?) } else { None };
    Ok(ast::Val { name, count, ty, default })
}

fn arity(p: &mut Parser) -> Result<ast::Arity> {
    if p.eat_keyword("optional") {
        return Ok(ast::Arity::Optional);
    }
    if p.eat_keyword("required") {
        return Ok(ast::Arity::Required);
    }
    if p.eat_keyword("repeated") {
        return Ok(ast::Arity::Repeated);
    }
    if let Some(name) = p.eat_name() {
        bail!("expected one of `optional`, `required`, `repeated`, got `{name}`")
    }
    bail!("expected one of `optional`, `required`, `repeated`, got `{}`", p.rest())
}

const BUILTIN_TYPES: &[&str] = &[
    "String", "PathBuf", "OsString", "bool", "i8", "i16", "i32", "i64", "i128", "isize", "u8",
    "u16", "u32", "u64", "u128", "usize", "f32", "f64",
];

fn ty(p: &mut Parser) -> Result<ast::Ty> {
    if p.at_delim(Delimiter::Brace) {
        p.enter_delim(Delimiter::Brace)?;
        let mut choices = vec![p.expect_name()?];
        while p.eat_punct('|') {
            choices.push(p.expect_name()?);
        }
        p.exit_delim()?;
        return Ok(ast::Ty::Choice(choices));
    }

    let mut name = p.expect_name()?;
    while p.lookahead_punct(':', 0) && p.lookahead_punct(':', 1) {
        p.expect_punct(':')?;
        p.expect_punct(':')?;
        name.push_str("::");
        name.push_str(&p.expect_name()?);
    }
    let res = if BUILTIN_TYPES.contains(&name.as_str()) {
        ast::Ty::Builtin(name)
    } else {
        ast::Ty::FromStr(name)
    };
    Ok(res)
}

fn default_value(p: &mut Parser) -> Result<String> {
    let sign = if p.eat_punct('-') { "-" } else { "" };
    match p.ts.pop() {
        Some(TokenTree::Literal(lit)) => {
            let text = lit.to_string();
            let value = if text.starts_with('"') || text.starts_with('r') {
                str_lit_value(text)
            } else {
                text
            };
            Ok(format!("{sign}{value}"))
        }
        Some(TokenTree::Ident(ident)) if sign.is_empty() => Ok(ident.to_string()),
        _ => bail!("expected a literal default value"),
    }
}

fn version(p: &mut Parser) -> Result<String> {
    match p.ts.pop() {
        Some(TokenTree::Literal(lit)) if lit.to_string().starts_with('"') => {
            Ok(format!("{:?}", str_lit_value(lit.to_string())))
        }
        Some(TokenTree::Ident(mac)) if p.eat_punct('!') => match p.ts.pop() {
            Some(TokenTree::Group(args)) => Ok(format!("{}!{}", mac, args)),
            _ => bail!("expected arguments for `{mac}!`"),
        },
        _ => bail!("expected a version string or a macro call like `env!(\"CARGO_PKG_VERSION\")`"),
    }
}

fn entry(p: &mut Parser) -> Result<ast::Entry> {
    let is_async = p.eat_keyword("async");
    let method = match p.ts.pop() {
        Some(TokenTree::Ident(ident)) => ident.to_string(),
        _ => bail!("expected a method name after `run`"),
    };

    let mut params = Vec::new();
    if p.at_delim(Delimiter::Parenthesis) {
        p.enter_delim(Delimiter::Parenthesis)?;
        let mut param = Vec::new();
        let mut depth = 0usize;
        while let Some(tt) = p.ts.pop() {
            if let TokenTree::Punct(punct) = &tt {
                match punct.as_char() {
                    '<' => depth += 1,
                    '>' => depth = depth.saturating_sub(1),
                    ',' if depth == 0 => {
                        params.push(type_text(mem::take(&mut param))?);
                        continue;
                    }
                    _ => (),
                }
            }
            param.push(tt);
        }
        if !param.is_empty() {
            params.push(type_text(param)?);
        }
        p.exit_delim()?;
    }
    Ok(ast::Entry { method, is_async, params })
}

fn type_text(tokens: Vec<TokenTree>) -> Result<String> {
    if tokens.is_empty() {
        bail!("expected a parameter type")
    }
    Ok(tokens.into_iter().collect::<TokenStream>().to_string())
}

fn opt_single_doc(p: &mut Parser) -> Result<Option<String>> {
    if !p.eat_punct('#') {
        return Ok(None);
    }
    p.enter_delim(Delimiter::Bracket)?;
    p.expect_keyword("doc")?;
    p.expect_punct('=')?;
    let mut res = p.expect_string()?;
    if let Some(suf) = res.strip_prefix(' ') {
        res = suf.to_string();
    }
    p.exit_delim()?;
    Ok(Some(res))
}

fn opt_doc(p: &mut Parser) -> Result<Option<String>> {
    let lines =
        std::iter::from_fn(|| opt_single_doc(p).transpose()).collect::<Result<Vec<String>>>()?;
    let lines = lines.join("\n");

    if lines.is_empty() {
        Ok(None)
    } else {
        Ok(Some(lines))
    }
}

fn cmd_name(p: &mut Parser) -> Result<String> {
    let name = p.expect_name()?;
    if name.starts_with('-') {
        bail!("command name can't begin with `-`: `{name}`");
    }
    Ok(name)
}

fn flag_name(p: &mut Parser) -> Result<String> {
    let name = p.expect_name()?;
    if !name.starts_with('-') {
        bail!("flag name should begin with `-`: `{name}`");
    }
    Ok(name)
}

struct Parser {
    stack: Vec<Vec<TokenTree>>,
    ts: Vec<TokenTree>,
}

impl Parser {
    fn new(ts: TokenStream) -> Self {
        let mut ts = ts.into_iter().collect::<Vec<_>>();
        ts.reverse();
        Self { stack: Vec::new(), ts }
    }

    fn at_delim(&mut self, delimiter: Delimiter) -> bool {
        match self.ts.last() {
            Some(TokenTree::Group(g)) => g.delimiter() == delimiter,
            _ => false,
        }
    }
    fn enter_delim(&mut self, delimiter: Delimiter) -> Result<()> {
        match self.ts.pop() {
            Some(TokenTree::Group(g)) if g.delimiter() == delimiter => {
                let mut ts = g.stream().into_iter().collect::<Vec<_>>();
                ts.reverse();
                let ts = mem::replace(&mut self.ts, ts);
                self.stack.push(ts);
            }
            _ => bail!("expected `{}`", open_delim(delimiter)),
        }
        Ok(())
    }
    fn exit_delim(&mut self) -> Result<()> {
        if !self.end() {
            bail!("unexpected `{}`", self.rest())
        }
        self.ts = self.stack.pop().ok_or_else(|| format_err!("unbalanced delimiters"))?;
        Ok(())
    }
    fn end(&mut self) -> bool {
        self.ts.last().is_none()
    }
    /// The remaining tokens at this level, for error messages.
    fn rest(&self) -> String {
        self.ts.iter().rev().map(|it| it.to_string()).collect::<Vec<_>>().join(" ")
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        if !self.eat_keyword(kw) {
            bail!("expected `{kw}`")
        }
        Ok(())
    }
    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.at_keyword(kw) {
            self.ts.pop();
            true
        } else {
            false
        }
    }
    fn at_keyword(&mut self, kw: &str) -> bool {
        match self.ts.last() {
            Some(TokenTree::Ident(ident)) => ident.to_string() == kw,
            _ => false,
        }
    }

    fn expect_name(&mut self) -> Result<String> {
        self.eat_name().ok_or_else(|| {
            let next = self.ts.pop().map(|it| it.to_string()).unwrap_or_default();
            format_err!("expected a name, got: `{next}`")
        })
    }
    fn eat_name(&mut self) -> Option<String> {
        let mut buf = String::new();
        let mut prev_ident = false;
        loop {
            match self.ts.last() {
                Some(TokenTree::Punct(p)) if p.as_char() == '-' => {
                    prev_ident = false;
                    buf.push('-');
                }
                Some(TokenTree::Ident(ident)) if !prev_ident => {
                    prev_ident = true;
                    buf.push_str(&ident.to_string());
                }
                _ => break,
            }
            self.ts.pop();
        }
        if buf.is_empty() {
            None
        } else {
            Some(buf)
        }
    }

    fn expect_punct(&mut self, punct: char) -> Result<()> {
        if !self.eat_punct(punct) {
            bail!("expected `{punct}`")
        }
        Ok(())
    }
    fn eat_punct(&mut self, punct: char) -> bool {
        match self.ts.last() {
            Some(TokenTree::Punct(p)) if p.as_char() == punct => {
                self.ts.pop();
                true
            }
            _ => false,
        }
    }
    /// `name: Type`, `name?: Type` or `name...: Type` ahead.
    fn at_val(&mut self) -> bool {
        self.lookahead_punct(':', 1) || self.lookahead_punct('?', 1) || self.lookahead_punct('.', 1)
    }
    fn lookahead_punct(&mut self, punct: char, n: usize) -> bool {
        match self.ts.iter().rev().nth(n) {
            Some(TokenTree::Punct(p)) => p.as_char() == punct,
            _ => false,
        }
    }

    fn expect_string(&mut self) -> Result<String> {
        match self.ts.pop() {
            Some(TokenTree::Literal(lit)) if is_str_lit(&lit.to_string()) => {
                Ok(str_lit_value(lit.to_string()))
            }
            _ => bail!("expected a string"),
        }
    }
}

fn open_delim(delimiter: Delimiter) -> &'static str {
    match delimiter {
        Delimiter::Brace => "{",
        Delimiter::Bracket => "[",
        Delimiter::Parenthesis => "(",
        Delimiter::None => "group",
    }
}

fn is_str_lit(text: &str) -> bool {
    text.starts_with('"') || text.starts_with("r\"") || text.starts_with("r#")
}

/// The value of a string literal, raw or not.
///
/// Doc comments arrive as either, depending on their contents.
fn str_lit_value(lit: String) -> String {
    if let Some(raw) = lit.strip_prefix('r') {
        let raw = raw.trim_matches('#');
        return raw.strip_prefix('"').and_then(|it| it.strip_suffix('"')).unwrap_or(raw).to_string();
    }
    let text = lit.strip_prefix('"').and_then(|it| it.strip_suffix('"')).unwrap_or(&lit);

    let mut res = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            res.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => res.push('\n'),
            Some('t') => res.push('\t'),
            Some('r') => res.push('\r'),
            Some('0') => res.push('\0'),
            Some(c @ ('\\' | '"' | '\'')) => res.push(c),
            Some(c) => {
                res.push('\\');
                res.push(c);
            }
            None => res.push('\\'),
        }
    }
    res
}
