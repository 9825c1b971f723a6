use std::sync::Arc;

use convoke::Console;
use tracing_subscriber::EnvFilter;

mod flags {
    use std::sync::Arc;

    use convoke::Console;

    convoke::command! {
        /// Says hello.
        cmd hello {
            version env!("CARGO_PKG_VERSION")
            /// Who to greet.
            required name: String
            /// Add some love.
            optional -e, --emoji
            run greet(Arc<dyn Console>)
        }
    }
}

impl flags::Hello {
    fn greet(&self, console: Arc<dyn Console>) {
        let bang = if self.emoji { "❣️" } else { "!" };
        console.write_out(&format!("Hello {}{}\n", self.name, bang));
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let code = convoke::ExecutionContext::from_env()
        .map_err(convoke::Error::from)
        .and_then(convoke::execute::<flags::Hello>);
    match code {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2)
        }
    }
}
