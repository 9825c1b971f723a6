use crate::ast;

use std::fmt::Write;

pub(crate) fn emit(cmd: &ast::Cmd) -> String {
    let mut buf = String::new();

    emit_cmd(&mut buf, cmd);
    blank_line(&mut buf);
    emit_api(&mut buf, cmd);
    blank_line(&mut buf);
    emit_impls_rec(&mut buf, cmd);

    buf
}

macro_rules! w {
    ($($tt:tt)*) => {
        drop(write!($($tt)*))
    };
}

fn emit_cmd(buf: &mut String, cmd: &ast::Cmd) {
    if let Some(doc) = &cmd.doc {
        w!(buf, "#[doc = {:?}]\n", doc);
    }
    w!(buf, "#[derive(Debug, Default)]\n");
    w!(buf, "pub struct {}", cmd.ident());
    if cmd.args.is_empty() && cmd.flags.is_empty() && cmd.subcommands.is_empty() {
        w!(buf, ";\n");
        return;
    }
    w!(buf, " {{\n");

    for arg in &cmd.args {
        w!(buf, "    pub {}: {},\n", arg.val.ident(), gen_arg_ty(arg));
    }

    if !cmd.args.is_empty() && !cmd.flags.is_empty() {
        blank_line(buf);
    }

    for flag in &cmd.flags {
        w!(buf, "    pub {}: {},\n", flag.ident(), gen_flag_ty(flag));
    }

    if cmd.has_subcommands() {
        w!(buf, "    pub subcommand: Option<{}>,\n", cmd.cmd_enum_ident());
    }
    w!(buf, "}}\n");

    if cmd.has_subcommands() {
        blank_line(buf);
        w!(buf, "#[derive(Debug)]\n");
        w!(buf, "pub enum {} {{\n", cmd.cmd_enum_ident());
        for sub in &cmd.subcommands {
            let name = sub.ident();
            w!(buf, "    {}({}),\n", name, name);
        }
        w!(buf, "}}\n");

        for sub in &cmd.subcommands {
            blank_line(buf);
            emit_cmd(buf, sub);
        }
    }
}

fn gen_flag_ty(flag: &ast::Flag) -> String {
    match &flag.val {
        None => match flag.arity {
            ast::Arity::Repeated => "u32".to_string(),
            ast::Arity::Optional | ast::Arity::Required => "bool".to_string(),
        },
        Some(val) => match val.count {
            ast::Count::Many => format!("Vec<{}>", val.ty.rust()),
            ast::Count::Maybe => format!("Option<Option<{}>>", val.ty.rust()),
            ast::Count::One => gen_val_ty(flag.arity, val),
        },
    }
}

fn gen_arg_ty(arg: &ast::Arg) -> String {
    gen_val_ty(arg.arity, &arg.val)
}

fn gen_val_ty(arity: ast::Arity, val: &ast::Val) -> String {
    let ty = val.ty.rust();
    match arity {
        ast::Arity::Optional if val.default.is_none() => format!("Option<{}>", ty),
        ast::Arity::Optional | ast::Arity::Required => ty,
        ast::Arity::Repeated => format!("Vec<{}>", ty),
    }
}

fn emit_api(buf: &mut String, cmd: &ast::Cmd) {
    w!(buf, "impl {} {{\n", cmd.ident());

    w!(buf, "    pub fn from_env() -> convoke::Result<Self> {{\n");
    w!(buf, "        convoke::from_env::<Self>()\n");
    w!(buf, "    }}\n");
    blank_line(buf);

    w!(buf, "    pub fn from_vec(args: Vec<String>) -> convoke::Result<Self> {{\n");
    w!(buf, "        convoke::from_vec::<Self>(args)\n");
    w!(buf, "    }}\n");
    w!(buf, "}}\n");
}

fn emit_impls_rec(buf: &mut String, cmd: &ast::Cmd) {
    emit_impl(buf, cmd);
    for sub in &cmd.subcommands {
        blank_line(buf);
        emit_impls_rec(buf, sub);
    }
}

fn emit_impl(buf: &mut String, cmd: &ast::Cmd) {
    w!(buf, "impl convoke::Command for {} {{\n", cmd.ident());
    emit_descriptor(buf, cmd);
    blank_line(buf);
    emit_assign(buf, cmd);
    if cmd.has_subcommands() {
        blank_line(buf);
        emit_enter(buf, cmd);
    }
    if let Some(entry) = &cmd.entry {
        blank_line(buf);
        emit_entry_point(buf, entry);
    }
    w!(buf, "}}\n");
}

fn emit_descriptor(buf: &mut String, cmd: &ast::Cmd) {
    w!(buf, "    fn descriptor() -> convoke::Descriptor {{\n");
    w!(buf, "        convoke::Descriptor::new({:?})\n", cmd.name);
    if let Some(doc) = &cmd.doc {
        w!(buf, "            .doc({:?})\n", doc);
    }
    if let Some(version) = &cmd.version {
        w!(buf, "            .version({})\n", version);
    }
    for member in &cmd.members {
        w!(buf, "            .member(");
        match *member {
            ast::MemberRef::Arg(idx) => emit_arg_member(buf, &cmd.args[idx]),
            ast::MemberRef::Flag(idx) => emit_flag_member(buf, &cmd.flags[idx]),
        }
        w!(buf, ")\n");
    }
    for sub in &cmd.subcommands {
        w!(buf, "            .subcommand(<{} as convoke::Command>::descriptor())\n", sub.ident());
    }
    if let Some(entry) = &cmd.entry {
        let kind = if entry.is_async { "Async" } else { "Sync" };
        w!(buf, "            .entry(convoke::EntryKind::{})\n", kind);
    }
    w!(buf, "    }}\n");
}

fn emit_arg_member(buf: &mut String, arg: &ast::Arg) {
    let val = &arg.val;
    w!(buf, "convoke::Member::argument({:?}, {})", val.ident(), val.ty.value_type());
    if val.ident() != val.name {
        w!(buf, ".long({:?})", val.name);
    }
    match arg.arity {
        ast::Arity::Optional => (),
        ast::Arity::Required => w!(buf, ".required()"),
        ast::Arity::Repeated => w!(buf, ".arity(convoke::Arity::ZeroOrMany)"),
    }
    emit_common(buf, val.default.as_deref(), arg.doc.as_deref());
}

fn emit_flag_member(buf: &mut String, flag: &ast::Flag) {
    w!(buf, "convoke::Member::option({:?})", flag.ident());
    if flag.ident().replace('_', "-") != flag.name {
        w!(buf, ".long({:?})", flag.name);
    }
    if let Some(short) = &flag.short {
        w!(buf, ".short({:?})", short);
    }
    if let Some(val) = &flag.val {
        w!(buf, ".value({}).value_name({:?})", val.ty.value_type(), val.name);
        match val.count {
            ast::Count::One => (),
            ast::Count::Maybe => w!(buf, ".arity(convoke::Arity::ZeroOrOne)"),
            ast::Count::Many => w!(buf, ".arity(convoke::Arity::ZeroOrMany)"),
        }
    }
    match flag.arity {
        ast::Arity::Optional => (),
        ast::Arity::Required => w!(buf, ".required()"),
        ast::Arity::Repeated => w!(buf, ".repeatable()"),
    }
    if flag.inherited {
        w!(buf, ".inherited()");
    }
    let default = flag.val.as_ref().and_then(|it| it.default.as_deref());
    emit_common(buf, default, flag.doc.as_deref());
}

fn emit_common(buf: &mut String, default: Option<&str>, doc: Option<&str>) {
    if let Some(default) = default {
        w!(buf, ".default_value({:?})", default);
    }
    if let Some(doc) = doc {
        w!(buf, ".doc({:?})", doc);
    }
}

fn emit_assign(buf: &mut String, cmd: &ast::Cmd) {
    let values = if cmd.members.is_empty() { "_values" } else { "values" };
    w!(
        buf,
        "    fn assign(&mut self, member: &str, {}: convoke::Resolved) -> ::std::result::Result<(), convoke::ConfigError> {{\n",
        values
    );
    let unknown = "convoke::ConfigError::UnknownMember { member: member.to_string() }";
    if cmd.members.is_empty() {
        w!(buf, "        Err({})\n", unknown);
        w!(buf, "    }}\n");
        return;
    }

    w!(buf, "        match member {{\n");
    for arg in &cmd.args {
        let val = &arg.val;
        let extract = match arg.arity {
            ast::Arity::Optional if val.default.is_none() => "optional",
            ast::Arity::Optional | ast::Arity::Required => "single",
            ast::Arity::Repeated => "many",
        };
        w!(buf, "            {:?} => self.{} = ", val.ident(), val.ident());
        w!(buf, "values.{}{}()?,\n", extract, val.ty.parsed_suffix());
    }
    for flag in &cmd.flags {
        w!(buf, "            {:?} => self.{} = ", flag.ident(), flag.ident());
        match &flag.val {
            None => match flag.arity {
                ast::Arity::Repeated => w!(buf, "values.count()"),
                ast::Arity::Optional | ast::Arity::Required => w!(buf, "values.switch()"),
            },
            Some(val) => {
                let suffix = val.ty.parsed_suffix();
                match (val.count, flag.arity) {
                    (ast::Count::Many, _) | (ast::Count::One, ast::Arity::Repeated) => {
                        w!(buf, "values.many{}()?", suffix)
                    }
                    (ast::Count::Maybe, _) => w!(buf, "Some(values.optional{}()?)", suffix),
                    (ast::Count::One, ast::Arity::Optional) if val.default.is_none() => {
                        w!(buf, "values.optional{}()?", suffix)
                    }
                    (ast::Count::One, _) => w!(buf, "values.single{}()?", suffix),
                }
            }
        }
        w!(buf, ",\n");
    }
    w!(buf, "            _ => return Err({}),\n", unknown);
    w!(buf, "        }}\n");
    w!(buf, "        Ok(())\n");
    w!(buf, "    }}\n");
}

fn emit_enter(buf: &mut String, cmd: &ast::Cmd) {
    let enum_ident = cmd.cmd_enum_ident();
    w!(buf, "    #[allow(unreachable_patterns)]\n");
    w!(buf, "    fn enter(&mut self, name: &str) -> Option<&mut dyn convoke::Command> {{\n");
    w!(buf, "        match name {{\n");
    for sub in &cmd.subcommands {
        let ident = sub.ident();
        w!(
            buf,
            "            {:?} => match self.subcommand.insert({}::{}(Default::default())) {{\n",
            sub.name,
            enum_ident,
            ident
        );
        w!(buf, "                {}::{}(it) => Some(it as &mut dyn convoke::Command),\n", enum_ident, ident);
        w!(buf, "                _ => None,\n");
        w!(buf, "            }},\n");
    }
    w!(buf, "            _ => None,\n");
    w!(buf, "        }}\n");
    w!(buf, "    }}\n");
}

fn emit_entry_point(buf: &mut String, entry: &ast::Entry) {
    let services = if entry.params.is_empty() { "_services" } else { "services" };
    let mut call = format!("Self::{}(self", entry.method);
    for param in &entry.params {
        w!(call, ", services.resolve::<{}>()?", param);
    }
    call.push(')');

    w!(buf, "    fn entry_point(&mut self) -> Option<convoke::EntryPoint<'_>> {{\n");
    if entry.is_async {
        w!(buf, "        Some(convoke::EntryPoint::asynchronous(move |{}| async move {{\n", services);
        w!(buf, "            convoke::IntoExitCode::into_exit_code({}.await)\n", call);
    } else {
        w!(buf, "        Some(convoke::EntryPoint::sync(move |{}| {{\n", services);
        w!(buf, "            convoke::IntoExitCode::into_exit_code({})\n", call);
    }
    w!(buf, "                .map_err(convoke::Error::Entry)\n");
    w!(buf, "        }}))\n");
    w!(buf, "    }}\n");
}

impl ast::Cmd {
    fn ident(&self) -> String {
        camel(&self.name)
    }
    fn cmd_enum_ident(&self) -> String {
        format!("{}Cmd", self.ident())
    }
    fn has_subcommands(&self) -> bool {
        !self.subcommands.is_empty()
    }
}

impl ast::Flag {
    fn ident(&self) -> String {
        snake(&self.name)
    }
}

impl ast::Val {
    fn ident(&self) -> String {
        snake(&self.name)
    }
}

impl ast::Ty {
    /// The field type.
    fn rust(&self) -> String {
        match self {
            ast::Ty::Builtin(name) => match name.as_str() {
                "PathBuf" => "std::path::PathBuf".to_string(),
                "OsString" => "std::ffi::OsString".to_string(),
                _ => name.clone(),
            },
            ast::Ty::Choice(_) => "String".to_string(),
            ast::Ty::FromStr(name) => name.clone(),
        }
    }

    /// The runtime `ValueType` expression.
    fn value_type(&self) -> String {
        match self {
            ast::Ty::Builtin(name) => {
                let variant = match name.as_str() {
                    "String" => "Text",
                    "PathBuf" | "OsString" => "Path",
                    "bool" => "Bool",
                    "f32" | "f64" => "Float",
                    it if it.starts_with('u') => "UInt",
                    _ => "Int",
                };
                format!("convoke::ValueType::{}", variant)
            }
            ast::Ty::Choice(choices) => format!("convoke::ValueType::choice(&{:?})", choices),
            ast::Ty::FromStr(name) => format!("convoke::ValueType::custom::<{}>()", name),
        }
    }

    fn parsed_suffix(&self) -> &'static str {
        match self {
            ast::Ty::FromStr(_) => "_parsed",
            ast::Ty::Builtin(_) | ast::Ty::Choice(_) => "",
        }
    }
}

fn blank_line(buf: &mut String) {
    w!(buf, "\n");
}

fn camel(s: &str) -> String {
    s.split(|c| c == '-' || c == '_').map(first_upper).collect()
}

fn first_upper(s: &str) -> String {
    s.chars()
        .next()
        .map(|it| it.to_ascii_uppercase())
        .into_iter()
        .chain(s.chars().skip(1))
        .collect()
}

fn snake(s: &str) -> String {
    s.replace('-', "_")
}

#[cfg(test)]
mod tests {
    use proc_macro2::TokenStream;

    fn compile(src: &str) -> String {
        let res = crate::compile(src);
        if let Err(err) = res.parse::<TokenStream>() {
            panic!("generated invalid code: {}\n{}", err, res);
        }
        res
    }

    #[test]
    fn leaf_command() {
        let res = compile(
            r#"
            /// Says hello.
            cmd hello {
                required name: String
                optional -e, --emoji
                repeated -v, --verbose
                optional --greeting text: String = "Hello"
                run greet
            }
            "#,
        );
        assert!(res.contains("#[doc = \"Says hello.\"]\n#[derive(Debug, Default)]\npub struct Hello {"));
        assert!(res.contains("    pub name: String,\n\n    pub emoji: bool,\n    pub verbose: u32,\n"));
        assert!(res.contains("    pub greeting: String,\n"));
        assert!(res.contains(
            ".member(convoke::Member::argument(\"name\", convoke::ValueType::Text).required())"
        ));
        assert!(res.contains(".member(convoke::Member::option(\"emoji\").short(\"e\"))"));
        assert!(res.contains(
            ".member(convoke::Member::option(\"greeting\").value(convoke::ValueType::Text).value_name(\"text\").default_value(\"Hello\"))"
        ));
        assert!(res.contains("\"verbose\" => self.verbose = values.count(),"));
        assert!(res.contains("\"greeting\" => self.greeting = values.single()?,"));
        assert!(res.contains("Some(convoke::EntryPoint::sync(move |_services| {"));
        assert!(res.contains("convoke::IntoExitCode::into_exit_code(Self::greet(self))"));
        assert!(!res.contains("fn enter"));
    }

    #[test]
    fn subcommands_and_services() {
        let res = compile(
            r#"
            cmd tool {
                version env!("CARGO_PKG_VERSION")
                inherited optional --dry-run
                cmd serve {
                    optional --port port: u16 = 8080
                    optional --malloc kind: Malloc
                    run async serve(Arc<dyn Console>, WorkingDirectory)
                }
                cmd init {
                    optional path: PathBuf
                    run init
                }
            }
            "#,
        );
        assert!(res.contains("pub subcommand: Option<ToolCmd>,"));
        assert!(res.contains("pub enum ToolCmd {\n    Serve(Serve),\n    Init(Init),\n}"));
        assert!(res.contains(".version(env!(\"CARGO_PKG_VERSION\"))"));
        assert!(res.contains(".member(convoke::Member::option(\"dry_run\").inherited())"));
        assert!(res.contains(".subcommand(<Serve as convoke::Command>::descriptor())"));
        assert!(res.contains(".entry(convoke::EntryKind::Async)"));
        assert!(res.contains("pub malloc: Option<Malloc>,"));
        assert!(res.contains("\"malloc\" => self.malloc = values.optional_parsed()?,"));
        assert!(res.contains("pub path: Option<std::path::PathBuf>,"));
        assert!(res.contains("\"serve\" => match self.subcommand.insert(ToolCmd::Serve(Default::default())) {"));
        assert!(res.contains("Some(convoke::EntryPoint::asynchronous(move |services| async move {"));
        assert!(res.contains("Self::serve(self, services.resolve::<Arc"));
        assert!(res.contains(", services.resolve::<WorkingDirectory>()?).await"));
        assert!(res.contains(
            "fn assign(&mut self, member: &str, values: convoke::Resolved)"
        ));
    }

    #[test]
    fn syntax_errors_become_compile_errors() {
        let err = crate::compile_error_text("invalid command syntax, `tool` needs a `run` method or a subcommand");
        assert_eq!(
            err,
            "compile_error!(\"invalid command syntax, `tool` needs a `run` method or a subcommand\");"
        );
    }
}
