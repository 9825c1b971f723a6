convoke::command! {
    cmd repeated-pos {
        required a: PathBuf
        optional b: u32
        optional c: OsString
        repeated rest: OsString
        run go
    }
}

impl RepeatedPos {
    fn go(&self) {}
}
