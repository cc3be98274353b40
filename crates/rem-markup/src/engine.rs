//! Backtracking match engine.
//!
//! A [`Grammar`] is a table of [`Rule`] trees interpreted by a single
//! recursive matcher. Rules never mutate shared state: the cursor is passed
//! by value and only returned on success, so backtracking is just "try the
//! next alternative from the same position".
//!
//! Output is accumulated in one `String` per parse. A failing rule truncates
//! the buffer back to the length it had on entry, so partial output from a
//! failed attempt is never observable.

use std::convert::Infallible;
use std::fmt;

/// Builds a replacement output from the outputs captured by an
/// [`Rule::Action`].
pub type ActionFn = fn(&[String]) -> String;

/// Index of a rule in a [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(usize);

/// A grammar rule.
///
/// Rules form a small closed set of node kinds. Recursion goes through
/// [`Rule::Ref`], which names another entry of the rule table.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Exactly this character.
    Literal(char),
    /// Any single character.
    AnyChar,
    /// Zero-width: succeeds iff the inner rule fails here.
    NotFollowedBy(Box<Rule>),
    /// Every rule in order.
    Sequence(Vec<Rule>),
    /// First alternative that matches wins.
    Choice(Vec<Rule>),
    /// Greedy repetition with a lower bound on the number of matches.
    Repeat { rule: Box<Rule>, min: usize },
    /// Replaces the output of the inner rule with a constant.
    Emit { rule: Box<Rule>, output: &'static str },
    /// Rebuilds the output from the captured sub-outputs.
    ///
    /// When the inner rule is a [`Rule::Sequence`], each item's output is
    /// captured separately; otherwise the whole output is the only capture.
    Action { rule: Box<Rule>, build: ActionFn },
    /// Fails where the inner rule would nest past the depth limit.
    ///
    /// Anywhere else, running out of depth aborts the parse up to the
    /// nearest enclosing `Recover`, so no choice ever falls through to a
    /// later alternative because an earlier one ran out of depth.
    Recover(Box<Rule>),
    /// Another rule of the same grammar.
    Ref(RuleId),
}

impl Rule {
    /// Match a string literally, one character at a time.
    pub fn literal(s: &str) -> Self {
        let mut chars: Vec<Rule> = s.chars().map(Rule::Literal).collect();
        if chars.len() == 1 {
            chars.remove(0)
        } else {
            Rule::Sequence(chars)
        }
    }

    pub fn not(rule: Rule) -> Self {
        Rule::NotFollowedBy(Box::new(rule))
    }

    pub fn seq(rules: impl IntoIterator<Item = Rule>) -> Self {
        Rule::Sequence(rules.into_iter().collect())
    }

    pub fn choice(rules: impl IntoIterator<Item = Rule>) -> Self {
        Rule::Choice(rules.into_iter().collect())
    }

    /// Zero or more repetitions.
    pub fn many0(rule: Rule) -> Self {
        Rule::Repeat {
            rule: Box::new(rule),
            min: 0,
        }
    }

    /// One or more repetitions.
    pub fn many1(rule: Rule) -> Self {
        Rule::Repeat {
            rule: Box::new(rule),
            min: 1,
        }
    }

    #[must_use]
    pub fn emit(self, output: &'static str) -> Self {
        Rule::Emit {
            rule: Box::new(self),
            output,
        }
    }

    #[must_use]
    pub fn action(self, build: ActionFn) -> Self {
        Rule::Action {
            rule: Box::new(self),
            build,
        }
    }

    #[must_use]
    pub fn recover(self) -> Self {
        Rule::Recover(Box::new(self))
    }

    /// Visit every rule reference in this tree.
    fn refs(&self, visit: &mut impl FnMut(RuleId)) {
        match self {
            Rule::Literal(_) | Rule::AnyChar => {}
            Rule::Ref(id) => visit(*id),
            Rule::NotFollowedBy(rule)
            | Rule::Recover(rule)
            | Rule::Repeat { rule, .. }
            | Rule::Emit { rule, .. }
            | Rule::Action { rule, .. } => rule.refs(visit),
            Rule::Sequence(rules) | Rule::Choice(rules) => {
                for rule in rules {
                    rule.refs(visit);
                }
            }
        }
    }
}

/// A successful match: the produced output and the cursor after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub output: String,
    pub cursor: usize,
}

/// Error building a [`Grammar`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    /// A rule was declared but never given a body.
    #[error("rule `{0}` is declared but never defined")]
    Undefined(&'static str),
    /// A rule body was supplied twice.
    #[error("rule `{0}` is defined more than once")]
    Redefined(&'static str),
    /// A reference points outside the rule table.
    #[error("rule `{rule}` refers to unknown rule #{target}")]
    UnknownRef { rule: &'static str, target: usize },
}

/// Incrementally assembles a [`Grammar`].
///
/// Recursive rules are declared first and defined later:
///
/// ```
/// use rem_markup::{GrammarBuilder, Rule};
///
/// let mut builder = GrammarBuilder::new();
/// let nested = builder.declare("nested");
/// let parens = builder.rule(
///     "parens",
///     Rule::seq([Rule::Literal('('), Rule::many0(Rule::Ref(nested)), Rule::Literal(')')]),
/// );
/// builder.define(nested, Rule::choice([Rule::Ref(parens), Rule::Literal('x')])).unwrap();
/// let grammar = builder.build(parens).unwrap();
///
/// assert_eq!(grammar.apply(parens, &['(', 'x', '(', ')', ')'], 0).unwrap().cursor, 5);
/// ```
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    names: Vec<&'static str>,
    rules: Vec<Option<Rule>>,
    redefined: Option<&'static str>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a named slot for a rule defined later with [`Self::define`].
    pub fn declare(&mut self, name: &'static str) -> RuleId {
        self.names.push(name);
        self.rules.push(None);
        RuleId(self.rules.len() - 1)
    }

    /// Supply the body of a declared rule.
    pub fn define(&mut self, id: RuleId, rule: Rule) -> Result<(), GrammarError> {
        let name = self.names.get(id.0).copied().ok_or(GrammarError::UnknownRef {
            rule: "<builder>",
            target: id.0,
        })?;
        let slot = &mut self.rules[id.0];
        if slot.is_some() {
            self.redefined.get_or_insert(name);
            return Err(GrammarError::Redefined(name));
        }
        *slot = Some(rule);
        Ok(())
    }

    /// Declare and define a rule in one step.
    pub fn rule(&mut self, name: &'static str, rule: Rule) -> RuleId {
        self.names.push(name);
        self.rules.push(Some(rule));
        RuleId(self.rules.len() - 1)
    }

    /// Finish the grammar, with `start` as the rule used by [`Grammar::render`].
    pub fn build(self, start: RuleId) -> Result<Grammar, GrammarError> {
        if let Some(name) = self.redefined {
            return Err(GrammarError::Redefined(name));
        }

        let mut rules = Vec::with_capacity(self.rules.len());
        for (&name, rule) in self.names.iter().zip(self.rules) {
            rules.push(rule.ok_or(GrammarError::Undefined(name))?);
        }

        let len = rules.len();
        for (&name, rule) in self.names.iter().zip(&rules) {
            let mut unknown = None;
            rule.refs(&mut |id| {
                if id.0 >= len {
                    unknown.get_or_insert(id.0);
                }
            });
            if let Some(target) = unknown {
                return Err(GrammarError::UnknownRef { rule: name, target });
            }
        }
        if start.0 >= len {
            return Err(GrammarError::UnknownRef {
                rule: "<start>",
                target: start.0,
            });
        }

        Ok(Grammar {
            names: self.names,
            rules,
            start,
        })
    }
}

/// An immutable table of rules with a designated start rule.
#[derive(Debug, Clone)]
pub struct Grammar {
    names: Vec<&'static str>,
    rules: Vec<Rule>,
    start: RuleId,
}

impl Grammar {
    /// The start rule.
    pub fn start(&self) -> RuleId {
        self.start
    }

    /// Look up a rule by name.
    pub fn find(&self, name: &str) -> Option<RuleId> {
        self.names.iter().position(|n| *n == name).map(RuleId)
    }

    pub fn name(&self, id: RuleId) -> Option<&'static str> {
        self.names.get(id.0).copied()
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0)
    }

    /// Number of rules in the table.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply one rule at `cursor`.
    ///
    /// Returns `None` if the rule does not match there, or if `rule` does not
    /// belong to this grammar.
    pub fn apply(&self, rule: RuleId, input: &[char], cursor: usize) -> Option<Match> {
        let rule = self.rule(rule)?;
        let mut output = String::new();
        match Matcher::new(self, input, Unbounded).apply(rule, cursor, &mut output) {
            Ok(end) => end.map(|cursor| Match { output, cursor }),
            Err(Halt::TooDeep) => None,
            Err(Halt::Budget(never)) => match never {},
        }
    }

    /// Apply the start rule to the whole of `text`.
    ///
    /// Returns an empty string if the start rule fails, which never happens
    /// for a start rule with a catch-all fallback.
    pub fn render(&self, text: &str) -> String {
        let input: Vec<char> = text.chars().collect();
        let Ok(output) = self.run(&input, Unbounded);
        output.unwrap_or_default()
    }

    /// Apply the start rule to `input`, charging `budget` for every rule
    /// application.
    ///
    /// Nesting past the depth limit outside any [`Rule::Recover`] fails the
    /// whole parse with `Ok(None)`.
    pub(crate) fn run<B: Budget>(
        &self,
        input: &[char],
        budget: B,
    ) -> Result<Option<String>, B::Error> {
        let Some(rule) = self.rule(self.start) else {
            return Ok(None);
        };
        let mut output = String::with_capacity(input.len() + input.len() / 4);
        match Matcher::new(self, input, budget).apply(rule, 0, &mut output) {
            Ok(end) => Ok(end.map(|_| output)),
            Err(Halt::TooDeep) => Ok(None),
            Err(Halt::Budget(err)) => Err(err),
        }
    }

    fn write_rule(&self, f: &mut fmt::Formatter<'_>, rule: &Rule, nested: bool) -> fmt::Result {
        match rule {
            Rule::Literal(c) => write!(f, "{c:?}"),
            Rule::AnyChar => f.write_str("."),
            Rule::NotFollowedBy(inner) => {
                f.write_str("!")?;
                self.write_rule(f, inner, true)
            }
            Rule::Sequence(items) => {
                if nested {
                    f.write_str("(")?;
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    self.write_rule(f, item, true)?;
                }
                if nested {
                    f.write_str(")")?;
                }
                Ok(())
            }
            Rule::Choice(alts) => {
                if nested {
                    f.write_str("(")?;
                }
                for (i, alt) in alts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    self.write_rule(f, alt, true)?;
                }
                if nested {
                    f.write_str(")")?;
                }
                Ok(())
            }
            Rule::Repeat { rule, min } => {
                self.write_rule(f, rule, true)?;
                match min {
                    0 => f.write_str("*"),
                    1 => f.write_str("+"),
                    n => write!(f, "{{{n},}}"),
                }
            }
            Rule::Emit { rule, output } => {
                self.write_rule(f, rule, nested)?;
                write!(f, " => {output:?}")
            }
            Rule::Action { rule, .. } => {
                self.write_rule(f, rule, nested)?;
                f.write_str(" => action")
            }
            Rule::Recover(inner) => {
                f.write_str("recover(")?;
                self.write_rule(f, inner, false)?;
                f.write_str(")")
            }
            Rule::Ref(id) => f.write_str(self.name(*id).unwrap_or("?")),
        }
    }
}

/// Prints the rule table in PEG notation, one rule per line.
impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, rule) in self.names.iter().zip(&self.rules) {
            write!(f, "{name} <- ")?;
            self.write_rule(f, rule, false)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Accounting for rule applications during one parse.
pub(crate) trait Budget {
    type Error;

    /// Charge one rule application.
    fn charge(&mut self) -> Result<(), Self::Error>;
}

/// No limit on rule applications.
pub(crate) struct Unbounded;

impl Budget for Unbounded {
    type Error = Infallible;

    fn charge(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// The step budget ran out before the parse finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StepsExhausted;

/// At most `remaining` more rule applications.
pub(crate) struct StepBudget {
    remaining: u64,
}

impl StepBudget {
    pub(crate) fn new(max_steps: u64) -> Self {
        Self {
            remaining: max_steps,
        }
    }
}

impl Budget for StepBudget {
    type Error = StepsExhausted;

    fn charge(&mut self) -> Result<(), StepsExhausted> {
        self.remaining = self.remaining.checked_sub(1).ok_or(StepsExhausted)?;
        Ok(())
    }
}

/// Deepest chain of nested rule applications. A rule that would go deeper
/// aborts the parse up to the nearest [`Rule::Recover`].
const MAX_DEPTH: usize = 1024;

/// Why a parse stopped before reaching a result.
enum Halt<E> {
    /// The budget ran out.
    Budget(E),
    /// Nesting reached [`MAX_DEPTH`].
    TooDeep,
}

type Outcome<T, E> = Result<Option<T>, Halt<E>>;

/// Interprets rules against one input.
struct Matcher<'g, 'i, B> {
    grammar: &'g Grammar,
    input: &'i [char],
    budget: B,
    depth: usize,
}

impl<'g, 'i, B: Budget> Matcher<'g, 'i, B> {
    fn new(grammar: &'g Grammar, input: &'i [char], budget: B) -> Self {
        Self {
            grammar,
            input,
            budget,
            depth: 0,
        }
    }

    /// Apply `rule` at `pos`, appending its output to `out`.
    ///
    /// Returns the cursor after the match. On failure or abort `out` is left
    /// unchanged.
    fn apply(&mut self, rule: &Rule, pos: usize, out: &mut String) -> Outcome<usize, B::Error> {
        if self.depth == MAX_DEPTH {
            return Err(Halt::TooDeep);
        }
        self.budget.charge().map_err(Halt::Budget)?;

        let mark = out.len();
        self.depth += 1;
        let end = self.step(rule, pos, out);
        self.depth -= 1;

        if !matches!(end, Ok(Some(_))) {
            out.truncate(mark);
        }
        end
    }

    fn step(&mut self, rule: &Rule, pos: usize, out: &mut String) -> Outcome<usize, B::Error> {
        let mark = out.len();

        let end = match rule {
            Rule::Literal(expected) => match self.input.get(pos) {
                Some(&c) if c == *expected => {
                    out.push(c);
                    Some(pos + 1)
                }
                _ => None,
            },
            Rule::AnyChar => self.input.get(pos).map(|&c| {
                out.push(c);
                pos + 1
            }),
            Rule::NotFollowedBy(inner) => {
                let ahead = self.apply(inner, pos, out)?;
                out.truncate(mark);
                match ahead {
                    Some(_) => None,
                    None => Some(pos),
                }
            }
            Rule::Sequence(items) => {
                let mut cursor = Some(pos);
                for item in items {
                    let Some(at) = cursor else { break };
                    cursor = self.apply(item, at, out)?;
                }
                cursor
            }
            Rule::Choice(alts) => {
                let mut found = None;
                for alt in alts {
                    found = self.apply(alt, pos, out)?;
                    if found.is_some() {
                        break;
                    }
                }
                found
            }
            Rule::Repeat { rule, min } => {
                let mut cursor = pos;
                let mut count = 0;
                while let Some(next) = self.apply(rule, cursor, out)? {
                    count += 1;
                    // A body that matches without consuming would loop forever.
                    if next == cursor {
                        break;
                    }
                    cursor = next;
                }
                (count >= *min).then_some(cursor)
            }
            Rule::Emit { rule, output } => {
                let end = self.apply(rule, pos, out)?;
                if end.is_some() {
                    out.truncate(mark);
                    out.push_str(output);
                }
                end
            }
            Rule::Action { rule, build } => self.capture(rule, pos)?.map(|(captures, end)| {
                out.push_str(&build(&captures));
                end
            }),
            Rule::Recover(inner) => match self.apply(inner, pos, out) {
                Err(Halt::TooDeep) => None,
                end => end?,
            },
            Rule::Ref(id) => match self.grammar.rule(*id) {
                Some(target) => self.apply(target, pos, out)?,
                None => None,
            },
        };

        Ok(end)
    }

    /// Apply `rule`, keeping each sequence item's output separate.
    fn capture(&mut self, rule: &Rule, pos: usize) -> Outcome<(Vec<String>, usize), B::Error> {
        if let Rule::Sequence(items) = rule {
            let mut captures = Vec::with_capacity(items.len());
            let mut cursor = pos;
            for item in items {
                let mut output = String::new();
                match self.apply(item, cursor, &mut output)? {
                    Some(next) => {
                        captures.push(output);
                        cursor = next;
                    }
                    None => return Ok(None),
                }
            }
            return Ok(Some((captures, cursor)));
        }

        let mut output = String::new();
        let end = self.apply(rule, pos, &mut output)?;
        Ok(end.map(|end| (vec![output], end)))
    }
}
