//! Full-screen TUI for finq.

pub mod common;
pub mod effects;
pub mod events;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;
pub mod views;

use std::io::{IsTerminal, Write, stderr};

use anyhow::Result;
use finq_core::config::Config;
pub use runtime::TuiRuntime;

/// Runs the interactive finance tracker.
pub fn run_interactive(config: Config) -> Result<()> {
    if !stderr().is_terminal() {
        anyhow::bail!(
            "Interactive mode requires a terminal.\n\
             Use `finq list <collection>` for non-interactive access."
        );
    }

    // Pre-TUI info goes to stderr (replaced by the alternate screen)
    let mut err = stderr();
    writeln!(err, "finq")?;
    writeln!(err, "API: {}", config.api.base_url)?;
    err.flush()?;

    let mut runtime = TuiRuntime::new(config)?;
    runtime.run()?;

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
