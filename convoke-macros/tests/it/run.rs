use std::sync::Arc;

use convoke::{Console, WorkingDirectory};

convoke::command! {
    /// Manages notes.
    cmd notes {
        version "2.1.0"
        inherited optional -q, --quiet

        /// Adds a note.
        cmd add {
            required text: String
            repeated -t, --tag tag: String
            run add(Arc<dyn Console>)
        }

        /// Uploads notes.
        cmd push {
            optional --remote url: String = "origin"
            run async push(Arc<dyn Console>, WorkingDirectory)
        }

        cmd check {
            run check
        }

        cmd whoami {
            run whoami(Arc<dyn Console>, User)
        }
    }
}

#[derive(Debug, Clone)]
pub struct User(pub String);

impl Add {
    fn add(&self, console: Arc<dyn Console>) {
        console.write_out(&format!("added {:?} {:?}\n", self.text, self.tag));
    }
}

impl Push {
    async fn push(&self, console: Arc<dyn Console>, dir: WorkingDirectory) -> anyhow::Result<i32> {
        console.write_out(&format!("pushing {} to {}\n", dir.0.display(), self.remote));
        Ok(3)
    }
}

impl Check {
    fn check(&self) -> anyhow::Result<()> {
        anyhow::bail!("notes are corrupted")
    }
}

impl Whoami {
    fn whoami(&self, console: Arc<dyn Console>, user: User) -> u8 {
        console.write_out(&format!("{}\n", user.0));
        0
    }
}
