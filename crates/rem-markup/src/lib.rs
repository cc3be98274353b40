//! Markup renderer for comic commentary, news posts and reader comments.
//!
//! Plain text goes in, an HTML fragment comes out. The dialect is small:
//!
//! - `**bold**`, `*italics*`, `_underline_`, nestable, never across lines
//! - a single line break becomes `<br />`, a blank line starts a new paragraph
//! - a `>` line between two other lines becomes a quote
//!
//! # Architecture
//!
//! The dialect is a PEG-style [`Grammar`]: a table of [`Rule`] trees (literal,
//! any char, negative lookahead, sequence, ordered choice, repetition, output
//! actions) interpreted by one backtracking matcher. Two grammars are built
//! once per process:
//!
//! - [`Mode::Trusted`]: markup only, for content editors control
//! - [`Mode::Untrusted`]: `<`, `>` and `&` are escaped ahead of any markup
//!
//! Rendering is a pure function and never fails. Untrusted input can be
//! bounded with [`render_bounded`].
//!
//! # Example
//!
//! ```
//! use rem_markup::{render_trusted, render_untrusted};
//!
//! assert_eq!(render_trusted("**_hi_**"), "<p><b><u>hi</u></b></p>");
//! assert_eq!(render_untrusted("a <b>"), "<p>a &lt;b&gt;</p>");
//! ```

mod block;
mod engine;
mod escape;
mod grammar;
mod inline;
mod render;

pub use engine::{ActionFn, Grammar, GrammarBuilder, GrammarError, Match, Rule, RuleId};
pub use escape::escape_html;
pub use grammar::{Mode, ParseModeError, build_grammar, grammar};
pub use render::{Limits, RenderError, render, render_bounded, render_trusted, render_untrusted};
