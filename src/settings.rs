use crate::dispatch::VALIDATION_EXIT_CODE;

/// Parser and dispatcher knobs.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Read `-abc` as `-a -b -c` when there is no `-abc` option.
    pub cluster_short_options: bool,
    /// Treat everything after `--` as positional.
    pub allow_argument_separator: bool,
    /// Add a "did you mean" hint to unrecognized command and option errors.
    pub suggestions: bool,
    pub validation_exit_code: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            cluster_short_options: true,
            allow_argument_separator: true,
            suggestions: true,
            validation_exit_code: VALIDATION_EXIT_CODE,
        }
    }
}
