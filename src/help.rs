//! Plain-text help and version output.

use std::fmt::Write;

use crate::{
    meta::Arity,
    model::{ArgumentDef, CommandModel, NodeId, OptionDef},
};

macro_rules! w {
    ($($tt:tt)*) => {
        drop(write!($($tt)*))
    };
}

pub fn render_help(model: &CommandModel, id: NodeId) -> String {
    let node = model.node(id);
    let mut buf = String::new();

    w!(buf, "{}\n", model.qualified_name(id));
    if let Some(doc) = &node.doc {
        for line in doc.lines() {
            w!(buf, "  {}\n", line);
        }
    }

    if !node.arguments.is_empty() {
        blank_line(&mut buf);
        w!(buf, "ARGS:\n");

        let mut blank = "";
        for arg in &node.arguments {
            w!(buf, "{}", blank);
            blank = "\n";
            w!(buf, "    {}\n", argument_usage(arg));
            entry_doc(&mut buf, arg.doc.as_deref(), arg.default.as_deref());
        }
    }

    if !node.options.is_empty() {
        blank_line(&mut buf);
        w!(buf, "OPTIONS:\n");

        let mut blank = "";
        for opt in &node.options {
            w!(buf, "{}", blank);
            blank = "\n";
            w!(buf, "    {}\n", option_usage(opt));
            entry_doc(&mut buf, opt.doc.as_deref(), opt.default.as_deref());
        }
    }

    if node.has_subcommands() {
        blank_line(&mut buf);
        w!(buf, "SUBCOMMANDS:\n");

        let mut blank = "";
        for (name, child) in &node.subcommands {
            w!(buf, "{}", blank);
            blank = "\n";
            w!(buf, "    {}\n", name);
            let doc = model.node(*child).doc.as_deref().and_then(|it| it.lines().next());
            entry_doc(&mut buf, doc, None);
        }
    }
    buf
}

/// `<name> <version>`, using the root name and the nearest declared version.
pub fn render_version(model: &CommandModel, id: NodeId) -> String {
    let root = model.node(model.root());
    let version = model
        .path(id)
        .into_iter()
        .rev()
        .find_map(|it| model.node(it).version.as_deref())
        .unwrap_or_default();
    format!("{} {}\n", root.name, version)
}

fn argument_usage(arg: &ArgumentDef) -> String {
    let (l, r) = match (arg.required, arg.is_variadic()) {
        (true, false) => ("<", ">"),
        (false, false) => ("[", "]"),
        (true, true) => ("<", ">..."),
        (false, true) => ("[", "]..."),
    };
    format!("{}{}{}", l, arg.name, r)
}

fn option_usage(opt: &OptionDef) -> String {
    let value = match opt.arity {
        Arity::Zero => String::new(),
        Arity::ExactlyOne => format!(" <{}>", opt.value_name),
        Arity::ZeroOrOne => format!("[=<{}>]", opt.value_name),
        Arity::ZeroOrMany => format!(" <{}>...", opt.value_name),
    };
    format!("{}{}", opt.spellings().join(", "), value)
}

fn entry_doc(buf: &mut String, doc: Option<&str>, default: Option<&str>) {
    if let Some(doc) = doc {
        for line in doc.lines() {
            w!(buf, "      {}\n", line);
        }
    }
    if let Some(default) = default {
        w!(buf, "      [default: {}]\n", default);
    }
}

fn blank_line(buf: &mut String) {
    w!(buf, "\n");
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use crate::{
        build::Builder,
        meta::{Arity, Descriptor, EntryKind, Member},
        value::ValueType,
    };

    use super::*;

    fn tool() -> Descriptor {
        Descriptor::new("tool")
            .doc("Workspace helper.")
            .version("0.3.1")
            .member(
                Member::option("verbose").short("v").repeatable().inherited().doc("Say more."),
            )
            .member(
                Member::option("jobs")
                    .short("j")
                    .value(ValueType::UInt)
                    .value_name("n")
                    .default_value("4")
                    .doc("Number of parallel jobs."),
            )
            .subcommand(
                Descriptor::new("build")
                    .doc("Compile the workspace.\nArtifacts go to `target`.")
                    .member(Member::option("log").value(ValueType::Path).arity(Arity::ZeroOrOne))
                    .member(
                        Member::option("features").value(ValueType::Text).arity(Arity::ZeroOrMany),
                    )
                    .member(Member::argument("package", ValueType::Text).required())
                    .member(
                        Member::argument("targets", ValueType::Text)
                            .arity(Arity::ZeroOrMany)
                            .doc("Targets to build."),
                    )
                    .entry(EntryKind::Sync),
            )
            .subcommand(Descriptor::new("clean").entry(EntryKind::Sync))
    }

    #[test]
    fn root_help() {
        let model = Builder::default().build(&tool()).unwrap();
        expect![[r#"
            tool
              Workspace helper.

            OPTIONS:
                -v, --verbose
                  Say more.

                -j, --jobs <n>
                  Number of parallel jobs.
                  [default: 4]

                -?, -h, --help
                  Show help information.

                --version
                  Show version information.

            SUBCOMMANDS:
                build
                  Compile the workspace.

                clean
        "#]]
        .assert_eq(&render_help(&model, model.root()));
    }

    #[test]
    fn subcommand_help() {
        let model = Builder::default().build(&tool()).unwrap();
        let build = model.lookup(&["build"]).unwrap();
        expect![[r#"
            tool build
              Compile the workspace.
              Artifacts go to `target`.

            ARGS:
                <package>

                [targets]...
                  Targets to build.

            OPTIONS:
                --log[=<log>]

                --features <features>...

                -v, --verbose
                  Say more.

                -?, -h, --help
                  Show help information.
        "#]]
        .assert_eq(&render_help(&model, build));
    }

    #[test]
    fn version_comes_from_the_nearest_declaration() {
        let model = Builder::default().build(&tool()).unwrap();
        assert_eq!(render_version(&model, model.root()), "tool 0.3.1\n");
        let clean = model.lookup(&["clean"]).unwrap();
        assert_eq!(render_version(&model, clean), "tool 0.3.1\n");
    }
}
