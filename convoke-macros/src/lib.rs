mod ast;
mod parse;
mod emit;

#[cfg(not(test))]
#[proc_macro]
pub fn command(ts: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let text = match parse::command(ts) {
        Ok(cmd) => emit::emit(&cmd),
        Err(err) => compile_error_text(&format!("invalid command syntax, {}", err)),
    };
    text.parse().unwrap()
}

fn compile_error_text(msg: &str) -> String {
    format!("compile_error!({:?});", msg)
}

#[cfg(test)]
pub fn compile(src: &str) -> String {
    use proc_macro2::TokenStream;

    let ts = src.parse::<TokenStream>().unwrap();
    let cmd = parse::command(ts).unwrap();
    emit::emit(&cmd)
}
