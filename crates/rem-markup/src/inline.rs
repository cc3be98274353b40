//! Inline decorations: `**bold**`, `*italics*` and `_underline_`.
//!
//! Decorations nest inside each other to any depth but never span a line
//! terminator. Bold is tried before italics so that `**` is never read as two
//! italics openers.

use crate::engine::{GrammarBuilder, GrammarError, Rule, RuleId};

/// Rule ids other rule groups build on.
pub(crate) struct InlineRules {
    /// Bold, italics or underline.
    pub(crate) decoration: RuleId,
    /// A decoration or a single character that is not a line terminator.
    pub(crate) nested: RuleId,
}

/// Define the decoration rules.
///
/// `newline` bounds every span. When `escape` is given, plain characters
/// inside decorations go through it before being copied.
pub(crate) fn define_decorations(
    builder: &mut GrammarBuilder,
    newline: RuleId,
    escape: Option<RuleId>,
) -> Result<InlineRules, GrammarError> {
    let decoration = builder.declare("decoration");

    let character = match escape {
        Some(escape) => Rule::choice([Rule::Ref(escape), Rule::AnyChar]),
        None => Rule::AnyChar,
    };
    let text_char = builder.rule(
        "text_char",
        Rule::seq([Rule::not(Rule::Ref(newline)), character]),
    );
    let nested = builder.rule(
        "nested",
        Rule::choice([Rule::Ref(decoration), Rule::Ref(text_char)]),
    );

    let double_star = builder.rule("double_star", Rule::literal("**"));
    let single_star = builder.rule(
        "single_star",
        Rule::seq([Rule::Literal('*'), Rule::not(Rule::Literal('*'))]),
    );

    let bold = builder.rule(
        "bold",
        delimited(&Rule::Ref(double_star), nested).action(wrap_bold),
    );
    let italics = builder.rule(
        "italics",
        delimited(&Rule::Ref(single_star), nested).action(wrap_italics),
    );
    let underline = builder.rule(
        "underline",
        delimited(&Rule::Literal('_'), nested).action(wrap_underline),
    );

    builder.define(
        decoration,
        Rule::choice([Rule::Ref(bold), Rule::Ref(italics), Rule::Ref(underline)]),
    )?;

    Ok(InlineRules { decoration, nested })
}

/// `delim (!delim nested)+ delim`
fn delimited(delim: &Rule, nested: RuleId) -> Rule {
    Rule::seq([
        delim.clone(),
        Rule::many1(Rule::seq([Rule::not(delim.clone()), Rule::Ref(nested)])),
        delim.clone(),
    ])
}

fn wrap_bold(captures: &[String]) -> String {
    tagged("b", captures)
}

fn wrap_italics(captures: &[String]) -> String {
    tagged("i", captures)
}

fn wrap_underline(captures: &[String]) -> String {
    tagged("u", captures)
}

/// Wrap the body (the capture between the two delimiters) in `tag`.
fn tagged(tag: &str, captures: &[String]) -> String {
    let body = captures.get(1).map_or("", String::as_str);
    format!("<{tag}>{body}</{tag}>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Grammar;
    use pretty_assertions::assert_eq;

    /// A grammar with only the decoration rules and a `\n` terminator.
    fn decorations() -> (Grammar, RuleId) {
        let mut builder = GrammarBuilder::new();
        let newline = builder.rule("newline", Rule::Literal('\n'));
        let rules = define_decorations(&mut builder, newline, None).unwrap();
        (builder.build(rules.decoration).unwrap(), rules.decoration)
    }

    fn decorate(input: &str) -> Option<(String, usize)> {
        let (grammar, decoration) = decorations();
        let chars: Vec<char> = input.chars().collect();
        grammar
            .apply(decoration, &chars, 0)
            .map(|m| (m.output, m.cursor))
    }

    #[test]
    fn test_bold() {
        assert_eq!(decorate("**hi** there"), Some(("<b>hi</b>".to_owned(), 6)));
    }

    #[test]
    fn test_italics() {
        assert_eq!(decorate("*hi*"), Some(("<i>hi</i>".to_owned(), 4)));
    }

    #[test]
    fn test_underline() {
        assert_eq!(decorate("_hi_"), Some(("<u>hi</u>".to_owned(), 4)));
    }

    #[test]
    fn test_bold_wins_over_italics() {
        assert_eq!(decorate("**x**"), Some(("<b>x</b>".to_owned(), 5)));
    }

    #[test]
    fn test_italics_inside_bold() {
        assert_eq!(
            decorate("**a*b*c**"),
            Some(("<b>a<i>b</i>c</b>".to_owned(), 9))
        );
    }

    #[test]
    fn test_bold_inside_italics() {
        assert_eq!(
            decorate("*a**b**c*"),
            Some(("<i>a<b>b</b>c</i>".to_owned(), 9))
        );
    }

    #[test]
    fn test_three_levels_deep() {
        assert_eq!(
            decorate("_*a**b**a*_"),
            Some(("<u><i>a<b>b</b>a</i></u>".to_owned(), 11))
        );
    }

    #[test]
    fn test_empty_span_does_not_match() {
        assert_eq!(decorate("****"), None);
        assert_eq!(decorate("__"), None);
    }

    #[test]
    fn test_unterminated_does_not_match() {
        assert_eq!(decorate("*oops"), None);
        assert_eq!(decorate("**oops*"), None);
        assert_eq!(decorate("_oops"), None);
    }

    #[test]
    fn test_span_stops_at_newline() {
        assert_eq!(decorate("*a\nb*"), None);
        assert_eq!(decorate("**a\nb**"), None);
    }

    #[test]
    fn test_escape_applies_inside_spans() {
        let mut builder = GrammarBuilder::new();
        let newline = builder.rule("newline", Rule::Literal('\n'));
        let escape = builder.rule("escape", Rule::Literal('<').emit("&lt;"));
        let rules = define_decorations(&mut builder, newline, Some(escape)).unwrap();
        let grammar = builder.build(rules.decoration).unwrap();

        let chars: Vec<char> = "_a<b_".chars().collect();
        let matched = grammar.apply(rules.decoration, &chars, 0).unwrap();
        assert_eq!(matched.output, "<u>a&lt;b</u>");
    }
}
