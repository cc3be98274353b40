//! HTML metacharacter escaping for untrusted input.

use crate::engine::{GrammarBuilder, Rule, RuleId};

/// Define the escape rules and return the choice over all of them.
pub(crate) fn define_escapes(builder: &mut GrammarBuilder) -> RuleId {
    let lt = builder.rule("less_than", Rule::Literal('<').emit("&lt;"));
    let gt = builder.rule("greater_than", Rule::Literal('>').emit("&gt;"));
    let amp = builder.rule("ampersand", Rule::Literal('&').emit("&amp;"));
    builder.rule("escape", Rule::choice([Rule::Ref(lt), Rule::Ref(gt), Rule::Ref(amp)]))
}

/// Escape `<`, `>` and `&`.
///
/// This is the same mapping the untrusted grammar applies, without any markup.
///
/// ```
/// assert_eq!(rem_markup::escape_html("a < b && c"), "a &lt; b &amp;&amp; c");
/// ```
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}
