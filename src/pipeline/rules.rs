//! Rewrite rules and the ordered tables built from them.
//!
//! A [`RewriteRule`] pairs a compiled pattern with either a literal template
//! or a pure callback over the match groups. A [`RuleTable`] applies its rules
//! in order to the *whole* evolving string: rule N sees the output of rule
//! N-1, so order is part of the table's meaning.
//!
//! All built-in tables live in one [`RuleSet`], compiled once and handed to
//! the pipeline functions by reference. [`RuleSet::shared`] exposes a lazily
//! built process-wide instance for callers that don't need their own.

use crate::error::Html2LatexError;
use crate::pipeline::numeric;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;

/// Pure function computing a replacement from the captured groups of a match.
pub type RewriteFn = fn(&Captures<'_>) -> String;

/// What a rule substitutes for each match.
#[derive(Clone, Copy)]
pub enum Replacement {
    /// Literal template; `${n}` expands to capture group `n`.
    Template(&'static str),
    /// Replacement computed from the match groups.
    Callback(RewriteFn),
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Replacement::Callback(_) => f.write_str("Callback(<fn>)"),
        }
    }
}

/// A single `(pattern, replacement)` pair.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    name: &'static str,
    pattern: Regex,
    replacement: Replacement,
}

impl RewriteRule {
    /// Compile a rule. Fails only if `pattern` is not a valid regex.
    pub fn new(
        name: &'static str,
        pattern: &str,
        replacement: Replacement,
    ) -> Result<Self, Html2LatexError> {
        let pattern = Regex::new(pattern).map_err(|source| Html2LatexError::InvalidPattern {
            name: name.to_string(),
            source,
        })?;
        Ok(Self {
            name,
            pattern,
            replacement,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Replace every non-overlapping match in `text`.
    pub fn apply(&self, text: &str) -> String {
        match self.replacement {
            Replacement::Template(template) => {
                self.pattern.replace_all(text, template).into_owned()
            }
            Replacement::Callback(rewrite) => self
                .pattern
                .replace_all(text, |caps: &Captures<'_>| rewrite(caps))
                .into_owned(),
        }
    }
}

/// An ordered, immutable sequence of rules.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<RewriteRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// Thread `text` through every rule in order.
    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(RewriteRule::name).collect()
    }

    /// Return a new table with `rule` appended after the existing ones.
    pub fn with_rule(mut self, rule: RewriteRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// LaTeX quotation convention for a quoted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// ` ``…" `
    Double,
    /// `` `…' ``
    Single,
}

impl QuoteStyle {
    /// Rebuild a quoted span from its (already formatted) content and the
    /// punctuation captured before and after the closing mark.
    pub fn reassemble(self, inner: &str, before: &str, after: &str) -> String {
        match self {
            QuoteStyle::Double => format!(" ``{inner}{before}{after}\" "),
            QuoteStyle::Single => format!(" `{inner}'{before}{after} "),
        }
    }
}

/// A quotation rule. Group 1 is the quoted content, group 2 the `.`/`?`
/// before the closing mark, group 3 the `.`/`?` after it.
#[derive(Debug, Clone)]
pub struct QuoteRule {
    name: &'static str,
    pattern: Regex,
    style: QuoteStyle,
}

impl QuoteRule {
    pub fn new(
        name: &'static str,
        pattern: &str,
        style: QuoteStyle,
    ) -> Result<Self, Html2LatexError> {
        let pattern = Regex::new(pattern).map_err(|source| Html2LatexError::InvalidPattern {
            name: name.to_string(),
            source,
        })?;
        Ok(Self {
            name,
            pattern,
            style,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn style(&self) -> QuoteStyle {
        self.style
    }
}

/// Every table the rewrite pipeline needs.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub(crate) numeric: RuleTable,
    pub(crate) formatting: RuleTable,
    pub(crate) quotes: Vec<QuoteRule>,
    pub(crate) graphics: Regex,
    pub(crate) paragraph_endings: RuleTable,
    pub(crate) self_closing: Regex,
    pub(crate) line_break: Regex,
}

static SHARED: Lazy<RuleSet> = Lazy::new(RuleSet::builtin);

fn builtin(name: &'static str, pattern: &str, replacement: Replacement) -> RewriteRule {
    RewriteRule::new(name, pattern, replacement).expect("built-in rewrite pattern compiles")
}

fn builtin_quote(name: &'static str, pattern: &str, style: QuoteStyle) -> QuoteRule {
    QuoteRule::new(name, pattern, style).expect("built-in quote pattern compiles")
}

impl RuleSet {
    /// The process-wide instance of the built-in tables.
    pub fn shared() -> &'static RuleSet {
        &SHARED
    }

    /// Compile the built-in tables.
    pub fn builtin() -> Self {
        use Replacement::{Callback, Template};

        let numeric = RuleTable::new(vec![
            builtin(
                "decimal-period",
                r"([0-9]*)\s*(\.)(\s*)([0-9]*)?",
                Callback(numeric::guard_period),
            ),
            builtin(
                "comma-grouping",
                r"([0-9]*)\s*(,)(\s*)([0-9]*)?",
                Callback(numeric::guard_comma),
            ),
        ]);

        let formatting = RuleTable::new(vec![
            builtin("colon", r"\s*:\s*", Template(": ")),
            builtin("semicolon", r"\s*;\s*", Template("; ")),
            builtin("question-mark", r"\s*\?\s*", Template("? ")),
            builtin(
                "parenthesis",
                r"\s*\(\s*([^\)]*)\s*\)\s*",
                Template(" (${1}) "),
            ),
            builtin("trailing-par", r"\\par\s*$", Template("")),
            builtin("greater-than", r">", Template(r"\textgreater ")),
            builtin("greater-than-entity", r"&gt;", Template(r"\textgreater ")),
            builtin("less-than", r"<", Template(r"\textless ")),
            builtin("less-than-entity", r"&lt;", Template(r"\textless ")),
        ]);

        let quotes = vec![
            builtin_quote(
                "straight-double",
                r#"\s*"\s*([^"]*)\s*([.?]{0,1})\s*"\s*([.?]{0,1})\s*"#,
                QuoteStyle::Double,
            ),
            builtin_quote(
                "straight-single",
                r"\s*'\s*([^']*)\s*([.?]{0,1})\s*'\s*([.?]{0,1})\s*",
                QuoteStyle::Single,
            ),
            builtin_quote(
                "curly-double",
                r"“\s*([^”]*)\s*([.?]{0,1})\s*”\s*([.?]{0,1})\s*",
                QuoteStyle::Double,
            ),
            builtin_quote(
                "curly-single",
                r"\s*‘\s*([^’]*)\s*([.?]{0,1})\s*’\s*([.?]{0,1})\s*",
                QuoteStyle::Single,
            ),
        ];

        let graphics = Regex::new(
            r"(?:\\includegraphics\s*\[\s*[^\]]*\s*\]\s*\{\s*[^\}]*\s*\}\s*|\\scalegraphics\s*\{\s*[^\}]*\s*\}\s*)+",
        )
        .expect("built-in graphics pattern compiles");

        let paragraph_endings = RuleTable::new(vec![
            builtin("nbsp-before-close", r"(?:&nbsp;\s*)+</p>", Template("</p>")),
            builtin("self-closing-br-before-close", r"(?:<br\s*/>\s*)+</p>", Template("</p>")),
            builtin("open-br-before-close", r"(?:<br\s*>\s*)+</p>", Template("</p>")),
            builtin("space-before-close", r"\s*</p>", Template("</p>")),
        ]);

        Self {
            numeric,
            formatting,
            quotes,
            graphics,
            paragraph_endings,
            self_closing: Regex::new(r"\s*/>").expect("built-in pattern compiles"),
            line_break: Regex::new(r"<br\s*/?>").expect("built-in pattern compiles"),
        }
    }

    pub fn numeric(&self) -> &RuleTable {
        &self.numeric
    }

    pub fn formatting(&self) -> &RuleTable {
        &self.formatting
    }

    pub fn quotes(&self) -> &[QuoteRule] {
        &self.quotes
    }

    pub fn paragraph_endings(&self) -> &RuleTable {
        &self.paragraph_endings
    }

    /// Append a caller-supplied rule to the end of the formatting table.
    pub fn with_formatting_rule(mut self, rule: RewriteRule) -> Self {
        self.formatting = self.formatting.with_rule(rule);
        self
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_keep_their_order() {
        let rules = RuleSet::builtin();
        assert_eq!(
            rules.numeric().names(),
            vec!["decimal-period", "comma-grouping"]
        );
        let formatting = rules.formatting().names();
        assert_eq!(formatting.first(), Some(&"colon"));
        assert_eq!(formatting.last(), Some(&"less-than-entity"));
        assert_eq!(rules.formatting().len(), 9);
        assert_eq!(rules.quotes().len(), 4);
        assert_eq!(rules.paragraph_endings().len(), 4);
    }

    #[test]
    fn template_rule_expands_groups() {
        let rule = RewriteRule::new(
            "parenthesis",
            r"\s*\(\s*([^\)]*)\s*\)\s*",
            Replacement::Template(" (${1}) "),
        )
        .unwrap();
        assert_eq!(rule.apply("see(page 3)now"), "see (page 3) now");
    }

    #[test]
    fn callback_rule_sees_captures() {
        fn shout(caps: &Captures<'_>) -> String {
            caps[1].to_uppercase()
        }
        let rule = RewriteRule::new("shout", r"<(\w+)>", Replacement::Callback(shout)).unwrap();
        assert_eq!(rule.apply("a <b> c <d>"), "a B c D");
    }

    #[test]
    fn table_chains_rules() {
        let table = RuleTable::new(vec![
            RewriteRule::new("a-to-b", "a", Replacement::Template("b")).unwrap(),
            RewriteRule::new("b-to-c", "b", Replacement::Template("c")).unwrap(),
        ]);
        assert_eq!(table.apply("aab"), "ccc");
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = RewriteRule::new("broken", "(unclosed", Replacement::Template("")).unwrap_err();
        assert!(matches!(err, Html2LatexError::InvalidPattern { ref name, .. } if name == "broken"));
    }

    #[test]
    fn custom_formatting_rule_runs_last() {
        let rules = RuleSet::builtin().with_formatting_rule(
            RewriteRule::new("percent", "%", Replacement::Template(r"\%")).unwrap(),
        );
        assert_eq!(rules.formatting().names().last(), Some(&"percent"));
        assert_eq!(rules.formatting().apply("50% off"), r"50\% off");
    }

    #[test]
    fn quote_styles_reassemble() {
        assert_eq!(QuoteStyle::Double.reassemble("hi", "", "."), " ``hi.\" ");
        assert_eq!(QuoteStyle::Single.reassemble("hi", "?", ""), " `hi'? ");
    }
}
