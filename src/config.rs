//! Settings shared by the library entry points and the command line.

/// Options that change how a source file is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of columns a tab counts for when measuring indentation
    pub tab_width: usize,
    /// Treat warnings as failures
    pub deny_warnings: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tab_width: 4,
            deny_warnings: false,
        }
    }
}
