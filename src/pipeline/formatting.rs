//! Formatting normaliser: punctuation spacing, LaTeX escapes, quotation marks
//! and graphics-command cleanup.
//!
//! ## Stage order
//!
//! 1. Spacing/escaping table (`:`, `;`, `?`, parentheses, trailing `\par`,
//!    `<`/`>` and their entities). Each rule rescans the whole string.
//! 2. A leading `A)` enumerator (optionally after `\noindent `) is lowered to
//!    `a)`.
//! 3. Quotation rules, in table order. The content of every quoted span is
//!    run through this whole normaliser again before it is reassembled, so
//!    punctuation and nested quotes inside a quotation are fixed too.
//! 4. Runs of `\includegraphics[..]{..}` / `\scalegraphics{..}` lose their
//!    surrounding whitespace.
//!
//! Quote spacing must run after stage 1: the quote templates insert the
//! single spaces that stage 1 would otherwise collapse.

use crate::error::Html2LatexError;
use crate::pipeline::numeric;
use crate::pipeline::rules::{QuoteRule, RuleSet};
use regex::Captures;
use tracing::debug;

/// Deepest quotation nesting the formatter will recurse into.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Applies the formatting stages of a [`RuleSet`].
///
/// Cheap to construct and `Copy`; holds only a reference to the tables.
#[derive(Debug, Clone, Copy)]
pub struct LatexFormatter<'r> {
    rules: &'r RuleSet,
    max_depth: usize,
}

impl Default for LatexFormatter<'static> {
    fn default() -> Self {
        Self::new(RuleSet::shared())
    }
}

impl<'r> LatexFormatter<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the quotation recursion cap.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Numeric-literal guard only.
    pub fn fix_text(&self, text: &str) -> String {
        numeric::fix_text(self.rules, text)
    }

    /// Run the formatting stages on `text`.
    ///
    /// Never fails on ordinary input; returns
    /// [`Html2LatexError::RecursionLimit`] if quotation nesting goes deeper
    /// than [`max_depth`](Self::max_depth).
    pub fn fix_formatting(&self, text: &str) -> Result<String, Html2LatexError> {
        self.format_at_depth(text, 0)
    }

    /// Numeric guard followed by formatting.
    pub fn latexify(&self, text: &str) -> Result<String, Html2LatexError> {
        self.fix_formatting(&self.fix_text(text))
    }

    fn format_at_depth(&self, text: &str, depth: usize) -> Result<String, Html2LatexError> {
        if depth > self.max_depth {
            return Err(Html2LatexError::RecursionLimit {
                depth: self.max_depth,
            });
        }

        let text = self.rules.formatting.apply(text);
        let text = lower_leading_enumerator(text);

        let mut text = text;
        for rule in &self.rules.quotes {
            text = self.convert_quotes(rule, &text, depth)?;
        }

        let text = self.clean_graphics(&text);
        if depth == 0 {
            debug!("formatted {} bytes", text.len());
        }
        Ok(text)
    }

    /// `Regex::replace_all` cannot propagate errors out of its closure, so
    /// the matches are stitched together by hand.
    fn convert_quotes(
        &self,
        rule: &QuoteRule,
        text: &str,
        depth: usize,
    ) -> Result<String, Html2LatexError> {
        let mut out = String::with_capacity(text.len() + 8);
        let mut last = 0;

        for caps in rule.pattern().captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);

            let inner = self.format_at_depth(group(&caps, 1).trim_end(), depth + 1)?;
            let before = group(&caps, 2).trim_end();
            let after = group(&caps, 3).trim_end();
            out.push_str(&rule.style().reassemble(&inner, before, after));

            last = whole.end();
        }

        out.push_str(&text[last..]);
        Ok(out)
    }

    fn clean_graphics(&self, text: &str) -> String {
        self.rules
            .graphics
            .replace_all(text, |caps: &Captures<'_>| caps[0].trim().to_string())
            .into_owned()
    }
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}

/// Enumerated-list labels are never capitalised in the target style.
fn lower_leading_enumerator(text: String) -> String {
    if let Some(rest) = text.strip_prefix("A)") {
        format!("a){rest}")
    } else if let Some(rest) = text.strip_prefix("\\noindent A)") {
        format!("\\noindent a){rest}")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(text: &str) -> String {
        LatexFormatter::default().fix_formatting(text).unwrap()
    }

    #[test]
    fn punctuation_spacing() {
        assert_eq!(format("Answer:yes;no"), "Answer: yes; no");
        assert_eq!(format("Is it ?Yes"), "Is it? Yes");
        assert_eq!(format("see(page 3)now"), "see (page 3) now");
    }

    #[test]
    fn angle_brackets_are_escaped() {
        assert_eq!(format("a>b"), r"a\textgreater b");
        assert_eq!(format("a<b"), r"a\textless b");
        assert_eq!(format("x &gt y"), r"x &gt y");
        assert_eq!(format("x&lt;y"), r"x\textless  y");
    }

    #[test]
    fn trailing_par_is_removed() {
        assert_eq!(format(r"End of paragraph\par  "), "End of paragraph");
        assert_eq!(format(r"\par in the middle"), r"\par in the middle");
    }

    #[test]
    fn leading_enumerator_is_lowered() {
        assert!(format("A) First option").starts_with("a) First option"));
        assert!(format(r"\noindent A) First option").starts_with(r"\noindent a) First option"));
        assert_eq!(format("B) Second"), "B) Second");
    }

    #[test]
    fn straight_double_quotes() {
        let out = format(r#"He said "hello.""#);
        assert!(out.contains("``hello.\""), "got: {out}");
        assert_eq!(out, "He said ``hello.\" ");
    }

    #[test]
    fn punctuation_after_closing_quote() {
        assert_eq!(format(r#"Say "hi" ."#), "Say ``hi.\" ");
    }

    #[test]
    fn straight_single_quotes() {
        assert_eq!(format("a 'word' here"), "a `word' here");
    }

    #[test]
    fn curly_quotes() {
        assert_eq!(format("a “word” here"), "a  ``word\" here");
        assert_eq!(format("a ‘word’ here"), "a `word' here");
    }

    #[test]
    fn lone_quote_is_left_alone() {
        assert_eq!(format(r#"a " b"#), r#"a " b"#);
        assert_eq!(format("it's"), "it's");
    }

    #[test]
    fn odd_quote_count_pairs_from_the_left() {
        assert_eq!(format(r#"a "b" c "d"#), "a ``b\" c \"d");
    }

    #[test]
    fn apostrophes_pair_as_single_quotes() {
        assert_eq!(format("don't and can't"), "don `t and can' t");
        assert_eq!(
            format(r#""don't and can't""#),
            " ``don `t and can' t\" "
        );
    }

    #[test]
    fn quoted_content_is_formatted_recursively() {
        let out = format(r#"He asked "why?not""#);
        assert_eq!(out, "He asked ``why? not\" ");
    }

    #[test]
    fn nested_quotes_are_converted() {
        let out = format("“she said ‘no’ twice”");
        assert!(out.contains("`no'"), "got: {out}");
        assert!(out.contains("``she said"), "got: {out}");
    }

    #[test]
    fn graphics_run_keeps_interior_spacing() {
        let input = r"\includegraphics[x]{y}   \includegraphics[a]{b}";
        assert_eq!(format(input), input);
    }

    #[test]
    fn graphics_run_loses_trailing_whitespace() {
        assert_eq!(
            format("Figure:\\scalegraphics{a.png}   \n"),
            "Figure: \\scalegraphics{a.png}"
        );
    }

    #[test]
    fn no_graphics_leaves_text_alone() {
        assert_eq!(format("plain words"), "plain words");
    }

    #[test]
    fn formatting_is_idempotent_on_stable_input() {
        for input in [
            "Answer:see(page 3)now",
            "x > y",
            "A) choose;or not",
            r"\includegraphics[width=2in]{a.png}  ",
        ] {
            let once = format(input);
            assert_eq!(format(&once), once, "input: {input}");
        }
    }

    #[test]
    fn recursion_cap_is_enforced() {
        let formatter = LatexFormatter::default().with_max_depth(0);
        assert!(formatter.fix_formatting("no quotes").is_ok());
        let err = formatter.fix_formatting(r#"a "b" c"#).unwrap_err();
        assert!(matches!(err, Html2LatexError::RecursionLimit { depth: 0 }));
    }

    #[test]
    fn latexify_runs_numeric_guard_first() {
        let out = LatexFormatter::default()
            .latexify("Pi is 3.14,not 3")
            .unwrap();
        assert_eq!(out, "Pi is 3.14, not 3");
    }
}
