// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Console logging for corpus preparation.
//!
//! Output goes through a small set of macros gated by a process-wide
//! [`Verbosity`]. Warnings and errors always reach stderr.

use std::sync::atomic::{AtomicU8, Ordering};

/// How much progress output is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Warnings and errors only.
    Quiet = 0,
    /// Summaries and results.
    Normal = 1,
    /// Per-stage progress and timings.
    Verbose = 2,
}

impl Verbosity {
    const fn from_u8(level: u8) -> Self {
        match level {
            0 => Self::Quiet,
            1 => Self::Normal,
            _ => Self::Verbose,
        }
    }
}

/// Global verbosity level.
static LEVEL: AtomicU8 = AtomicU8::new(Verbosity::Verbose as u8);

/// Set the global verbosity level.
pub fn set_verbosity(level: Verbosity) {
    LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Current global verbosity level.
pub fn verbosity() -> Verbosity {
    Verbosity::from_u8(LEVEL.load(Ordering::Relaxed))
}

/// Toggle between [`Verbosity::Verbose`] and [`Verbosity::Normal`].
pub fn set_verbose(verbose: bool) {
    set_verbosity(if verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });
}

/// Check if per-stage progress output is enabled.
pub fn is_verbose() -> bool {
    verbosity() >= Verbosity::Verbose
}

/// Check if summary output is enabled.
pub fn is_normal() -> bool {
    verbosity() >= Verbosity::Normal
}

/// Summary message, hidden when quiet.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        if $crate::cli::logging::is_normal() {
            println!($($arg)*);
        }
    }
}

/// Warning on stderr.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        eprintln!("{} {}", "WARNING ⚠️".yellow().bold(), format!($($arg)*));
    }}
}

/// Error on stderr.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        eprintln!("{} {}", "Error:".red().bold(), format!($($arg)*));
    }}
}

/// Success message, hidden when quiet.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        if $crate::cli::logging::is_normal() {
            println!("{} {}", "✅".green(), format!($($arg)*));
        }
    }}
}

/// Progress message, shown only when verbose.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        if $crate::cli::logging::is_verbose() {
            println!($($arg)*);
        }
    }
}

/// Section header, shown only when verbose.
#[macro_export]
macro_rules! section {
    ($($arg:tt)*) => {{
        use colored::Colorize;
        if $crate::cli::logging::is_verbose() {
            println!();
            println!("{}", format!($($arg)*).cyan().bold());
        }
    }}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        set_verbosity(Verbosity::Quiet);
        assert!(!is_normal());
        assert!(!is_verbose());

        set_verbose(false);
        assert_eq!(verbosity(), Verbosity::Normal);
        assert!(is_normal());
        assert!(!is_verbose());

        set_verbose(true);
        assert_eq!(verbosity(), Verbosity::Verbose);
        assert!(is_verbose());
    }

    #[test]
    fn test_macros_expand_in_one_scope() {
        warn!("first {}", 1);
        warn!("second {}", 2);
        section!("header");
        verbose!("detail {}", 3);
    }
}
