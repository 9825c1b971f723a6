convoke::command! {
    /// Does stuff.
    /// Helpful stuff.
    cmd helpful {
        version "0.1.0"
        /// With an arg.
        optional src: PathBuf
        /// Another arg.
        optional extra: String = "none"
        /// And a switch.
        required -s, --switch mode: {fast | slow}

        /// And even a subcommand!
        cmd sub {
            /// With an optional flag. This has a really long
            /// description that spans multiple lines.
            optional -f, --flag
            run sub
        }

        run main
    }
}

impl Helpful {
    fn main(&self) {}
}

impl Sub {
    fn sub(&self) {}
}
