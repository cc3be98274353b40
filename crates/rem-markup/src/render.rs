//! Entry points.
//!
//! [`render_trusted`] and [`render_untrusted`] are total: every input renders.
//! Inputs with many unbalanced delimiters can backtrack heavily, so callers
//! rendering text from visitors should prefer [`render_bounded`] with
//! [`Limits`].

use crate::engine::{StepBudget, Unbounded};
use crate::grammar::{Mode, grammar};

/// Render editorial content: markup only, HTML passes through.
///
/// ```
/// assert_eq!(rem_markup::render_trusted("**hi**"), "<p><b>hi</b></p>");
/// ```
pub fn render_trusted(text: &str) -> String {
    render(Mode::Trusted, text)
}

/// Render visitor content: `<`, `>` and `&` are escaped, then markup applies.
///
/// ```
/// assert_eq!(rem_markup::render_untrusted("<b>"), "<p>&lt;b&gt;</p>");
/// ```
pub fn render_untrusted(text: &str) -> String {
    render(Mode::Untrusted, text)
}

/// Render `text` with the grammar for `mode`.
pub fn render(mode: Mode, text: &str) -> String {
    grammar(mode).render(text)
}

/// Call-site bounds on rendering work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    /// Reject inputs with more characters than this.
    pub max_input_chars: Option<usize>,
    /// Abort after this many rule applications.
    ///
    /// Every render takes at least one step, so `Some(0)` rejects every
    /// input, the empty one included.
    pub max_steps: Option<u64>,
}

impl Limits {
    /// No limits; [`render_bounded`] then behaves like [`render`].
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// Rendering gave up under [`Limits`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("input is {len} characters long, limit is {max}")]
    InputTooLong { len: usize, max: usize },
    #[error("rendering exceeded {max} steps")]
    StepLimitExceeded { max: u64 },
}

/// Render `text` with the grammar for `mode`, within `limits`.
pub fn render_bounded(mode: Mode, text: &str, limits: &Limits) -> Result<String, RenderError> {
    let input: Vec<char> = text.chars().collect();

    if let Some(max) = limits.max_input_chars
        && input.len() > max
    {
        tracing::warn!(%mode, len = input.len(), max, "Rejected oversized markup input");
        return Err(RenderError::InputTooLong {
            len: input.len(),
            max,
        });
    }

    let grammar = grammar(mode);
    let Some(max_steps) = limits.max_steps else {
        let Ok(html) = grammar.run(&input, Unbounded);
        return Ok(html.unwrap_or_default());
    };

    match grammar.run(&input, StepBudget::new(max_steps)) {
        Ok(html) => Ok(html.unwrap_or_default()),
        Err(_) => {
            tracing::warn!(%mode, len = input.len(), max_steps, "Markup rendering ran out of steps");
            Err(RenderError::StepLimitExceeded { max: max_steps })
        }
    }
}
