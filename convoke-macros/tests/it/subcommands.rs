convoke::command! {
    cmd rust-analyzer {
        inherited repeated -v, --verbose

        cmd server {
            optional --dir path: PathBuf

            cmd launch {
                optional --log
                run launch
            }
            cmd watch {
                run watch
            }
        }

        cmd analysis-stats {
            required path: PathBuf
            optional --parallel
            run stats
        }
    }
}

impl Launch {
    fn launch(&self) {}
}

impl Watch {
    fn watch(&self) {}
}

impl AnalysisStats {
    fn stats(&self) {}
}
