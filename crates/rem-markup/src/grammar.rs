//! The two built-in markup grammars.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::block::{define_breaks, define_document, define_quote};
use crate::engine::{Grammar, GrammarBuilder, GrammarError};
use crate::escape::define_escapes;
use crate::inline::define_decorations;

static TRUSTED: LazyLock<Grammar> = LazyLock::new(|| {
    build_grammar(Mode::Trusted).expect("trusted markup grammar is well-formed")
});

static UNTRUSTED: LazyLock<Grammar> = LazyLock::new(|| {
    build_grammar(Mode::Untrusted).expect("untrusted markup grammar is well-formed")
});

/// Which rule set to render with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mode {
    /// Markup only. For editorial content.
    Trusted,
    /// Escape `<`, `>` and `&` before markup. For anything visitors submit.
    #[default]
    Untrusted,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Trusted => "trusted",
            Mode::Untrusted => "untrusted",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised [`Mode`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown render mode `{0}` (expected `trusted` or `untrusted`)")]
pub struct ParseModeError(String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trusted" => Ok(Mode::Trusted),
            "untrusted" => Ok(Mode::Untrusted),
            _ => Err(ParseModeError(s.to_owned())),
        }
    }
}

/// Build the markup grammar for `mode`.
///
/// Entities are tried in this order at every position: escapes (untrusted
/// only), quote, paragraph or line break, decoration.
pub fn build_grammar(mode: Mode) -> Result<Grammar, GrammarError> {
    let mut builder = GrammarBuilder::new();

    let escape = match mode {
        Mode::Trusted => None,
        Mode::Untrusted => Some(define_escapes(&mut builder)),
    };
    let breaks = define_breaks(&mut builder);
    let inline = define_decorations(&mut builder, breaks.newline, escape)?;
    let quote = define_quote(&mut builder, breaks.breaks, inline.nested);

    let mut entities = Vec::with_capacity(4);
    entities.extend(escape);
    entities.extend([quote, breaks.breaks, inline.decoration]);
    let document = define_document(&mut builder, &entities);

    let grammar = builder.build(document)?;
    tracing::debug!(%mode, rules = grammar.len(), "Built markup grammar");
    Ok(grammar)
}

/// The shared, process-wide grammar for `mode`.
pub fn grammar(mode: Mode) -> &'static Grammar {
    match mode {
        Mode::Trusted => &TRUSTED,
        Mode::Untrusted => &UNTRUSTED,
    }
}
