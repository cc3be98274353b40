//! `rem render` command implementation.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use rem_config::{CliSettings, Config, MarkupConfig};
use rem_markup::{Mode, render_bounded};

use crate::error::CliError;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Text file to render (default: read stdin).
    file: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover rem.toml).
    #[arg(short, long, env = "REM_CONFIG")]
    config: Option<PathBuf>,

    /// Render mode: `trusted` or `untrusted` (overrides config).
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Maximum input length in characters (overrides config).
    #[arg(long)]
    max_input_chars: Option<usize>,

    /// Maximum rule applications per render, 0 for no limit (overrides config).
    #[arg(long)]
    max_steps: Option<u64>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the input can't be read, or
    /// the input exceeds the configured limits.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            mode: self.mode,
            max_input_chars: self.max_input_chars,
            max_steps: self.max_steps,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }

        let text = read_input(self.file.as_deref())?;
        let html = render_text(&text, &config.markup)?;

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(html.as_bytes())?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
        Ok(())
    }
}

/// Render `text` under the mode and limits of `markup`.
fn render_text(text: &str, markup: &MarkupConfig) -> Result<String, CliError> {
    let text = strip_final_newline(text);
    let html = render_bounded(markup.mode, text, &markup.limits())?;
    tracing::info!(
        mode = %markup.mode,
        input_bytes = text.len(),
        output_bytes = html.len(),
        "Rendered markup"
    );
    Ok(html)
}

/// Read the whole input file, or stdin when no file is given.
fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Drop the line terminator that ends almost every text file, so it doesn't
/// render as a trailing `<br />`.
fn strip_final_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rem_markup::RenderError;

    #[test]
    fn test_strip_final_newline() {
        assert_eq!(strip_final_newline("a\n"), "a");
        assert_eq!(strip_final_newline("a\r\n"), "a");
        assert_eq!(strip_final_newline("a\n\n"), "a\n");
        assert_eq!(strip_final_newline("a"), "a");
        assert_eq!(strip_final_newline(""), "");
    }

    #[test]
    fn test_render_text_uses_configured_mode() {
        let mut markup = MarkupConfig::default();
        assert_eq!(render_text("<b>\n", &markup).unwrap(), "<p>&lt;b&gt;</p>");

        markup.mode = Mode::Trusted;
        assert_eq!(render_text("<b>\n", &markup).unwrap(), "<p><b></p>");
    }

    #[test]
    fn test_render_text_enforces_input_limit() {
        let markup = MarkupConfig {
            max_input_chars: 2,
            ..MarkupConfig::default()
        };
        let err = render_text("abc", &markup).unwrap_err();
        assert!(matches!(
            err,
            CliError::Render(RenderError::InputTooLong { len: 3, max: 2 })
        ));
    }

    #[test]
    fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "**hi**\n").unwrap();
        let text = read_input(Some(&path)).unwrap();
        assert_eq!(text, "**hi**\n");
    }

    #[test]
    fn test_read_input_missing_file() {
        let err = read_input(Some(Path::new("/nonexistent/rem/input.txt"))).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
