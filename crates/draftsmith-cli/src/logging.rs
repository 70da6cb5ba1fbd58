// Logging and verbosity control

use std::sync::atomic::{AtomicU8, Ordering};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Global verbosity level
static VERBOSITY: AtomicU8 = AtomicU8::new(1);

/// Verbosity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    /// Quiet mode - results only
    Quiet = 0,
    /// Normal mode - standard output
    Normal = 1,
    /// Verbose mode - debug logging
    Verbose = 2,
}

impl VerbosityLevel {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            VerbosityLevel::Quiet
        } else if verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Get the current verbosity level
    pub fn current() -> Self {
        match VERBOSITY.load(Ordering::Relaxed) {
            0 => VerbosityLevel::Quiet,
            1 => VerbosityLevel::Normal,
            _ => VerbosityLevel::Verbose,
        }
    }

    pub fn set(level: Self) {
        VERBOSITY.store(level as u8, Ordering::Relaxed);
    }

    /// Check if we should output at this level
    pub fn should_output(&self) -> bool {
        self <= &Self::current()
    }

    /// Default `tracing` directive when `RUST_LOG` is unset
    pub fn default_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "debug,hyper=info,reqwest=info",
        }
    }
}

/// Initialize logging based on CLI flags
///
/// `RUST_LOG` wins over the flags. Log lines go to stderr so generated content on
/// stdout stays clean for piping.
pub fn init_logging(verbose: bool, quiet: bool) {
    let level = VerbosityLevel::from_flags(verbose, quiet);
    VerbosityLevel::set(level);

    if tracing::dispatcher::has_been_set() {
        return;
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| level.default_directive().into());
    let fmt_layer = fmt::layer()
        .with_target(level == VerbosityLevel::Verbose)
        .with_writer(std::io::stderr)
        .compact();

    // A subscriber installed elsewhere (tests) is not an error
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

/// Print a status line to stderr unless running quietly
pub fn info(message: &str) {
    if VerbosityLevel::Normal.should_output() {
        eprintln!("{}", message);
    }
}
