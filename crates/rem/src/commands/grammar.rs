//! `rem grammar` command implementation.

use std::io::Write;

use clap::Args;
use rem_markup::{Mode, grammar};

use crate::error::CliError;

/// Arguments for the grammar command.
#[derive(Args)]
pub(crate) struct GrammarArgs {
    /// Which grammar to print: `trusted` or `untrusted`.
    #[arg(short, long, default_value_t = Mode::Untrusted)]
    mode: Mode,
}

impl GrammarArgs {
    /// Execute the grammar command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{}", grammar(self.mode))?;
        stdout.flush()?;
        Ok(())
    }
}
