//! Block structure: line breaks, paragraph breaks and quotes.

use crate::engine::{GrammarBuilder, Rule, RuleId};

/// Rule ids for line terminators.
pub(crate) struct BreakRules {
    /// A bare line terminator, `\r\n` or `\n`.
    pub(crate) newline: RuleId,
    /// A paragraph break or, failing that, a line break.
    pub(crate) breaks: RuleId,
}

pub(crate) fn define_breaks(builder: &mut GrammarBuilder) -> BreakRules {
    let newline = builder.rule(
        "newline",
        Rule::choice([Rule::literal("\r\n"), Rule::Literal('\n')]),
    );
    let line_break = builder.rule("line_break", Rule::Ref(newline).emit("<br />"));
    let paragraph_break = builder.rule(
        "paragraph_break",
        Rule::seq([Rule::Ref(newline), Rule::Ref(newline)]).emit("</p><p>"),
    );
    let breaks = builder.rule(
        "breaks",
        Rule::choice([Rule::Ref(paragraph_break), Rule::Ref(line_break)]),
    );
    BreakRules { newline, breaks }
}

/// A `>` line between two line terminators.
///
/// Both terminators are part of the match, so a quote on the first or last
/// line of the input never matches and its `>` is copied as plain text.
pub(crate) fn define_quote(builder: &mut GrammarBuilder, breaks: RuleId, nested: RuleId) -> RuleId {
    builder.rule(
        "quote",
        Rule::seq([
            Rule::Ref(breaks),
            Rule::Literal('>'),
            Rule::many1(Rule::Ref(nested)),
            Rule::Ref(breaks),
        ])
        .action(wrap_quote),
    )
}

/// The top-level rule: any number of entities or plain characters, wrapped in
/// one paragraph.
///
/// `entities` are tried in order at every position. The plain-character
/// fallback makes this rule match every input in full. An entity nested too
/// deeply to finish is abandoned as a whole and the fallback copies one
/// character, so an escape entity listed first still sees every character
/// before the fallback does.
pub(crate) fn define_document(builder: &mut GrammarBuilder, entities: &[RuleId]) -> RuleId {
    let entity = builder.rule("entity", Rule::choice(entities.iter().copied().map(Rule::Ref)));
    builder.rule(
        "document",
        Rule::many0(Rule::choice([Rule::Ref(entity).recover(), Rule::AnyChar]))
            .action(wrap_paragraph),
    )
}

fn wrap_quote(captures: &[String]) -> String {
    match captures {
        [head, _, body, tail] => format!(r#"{head}<span class="quote">&gt;{body}</span>{tail}"#),
        _ => String::new(),
    }
}

fn wrap_paragraph(captures: &[String]) -> String {
    format!("<p>{}</p>", captures.concat())
}
