//! Paragraph-ending cleanup for HTML fragments.
//!
//! Editors leave `&nbsp;`, `<br/>` and stray whitespace in front of `</p>`,
//! which LaTeX turns into empty lines or overfull boxes. Forced breaks inside
//! underlined text split the `\underline{}` group, so they become spaces.
//!
//! The underline pass is a *textual* patch: the source text of each `<u>`
//! element is rewritten and spliced back by byte range. The tree is never
//! re-serialised, so entity spelling and attribute quoting elsewhere in the
//! fragment are left exactly as the caller wrote them.

use crate::error::Html2LatexError;
use crate::pipeline::markup::{self, ElementSpan};
use crate::pipeline::rules::RuleSet;
use tracing::debug;

/// Strip trailing `&nbsp;`/`<br>` runs and whitespace before every `</p>`,
/// tighten `/>`, and turn line breaks inside `<u>` into spaces.
///
/// # Errors
/// [`Html2LatexError::Parse`] if the fragment does not nest properly.
pub fn clean_paragraph_ending(rules: &RuleSet, html: &str) -> Result<String, Html2LatexError> {
    let html = rules.paragraph_endings.apply(html);
    let html = rules
        .self_closing
        .replace_all(html.trim_end(), "/>")
        .into_owned();

    let spans = markup::scan_elements(&html)?;
    let underlines = outermost(spans.iter().filter(|span| span.name == "u"));
    if underlines.is_empty() {
        return Ok(html);
    }
    debug!("rewriting line breaks in {} underline span(s)", underlines.len());

    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for span in underlines {
        out.push_str(&html[last..span.start]);
        out.push_str(&rules.line_break.replace_all(span.source(&html), " "));
        last = span.end;
    }
    out.push_str(&html[last..]);
    Ok(out)
}

/// Spans are ordered by start offset, so a span nested in an earlier one
/// starts before that one ends.
fn outermost<'a>(spans: impl Iterator<Item = &'a ElementSpan>) -> Vec<&'a ElementSpan> {
    let mut kept: Vec<&ElementSpan> = Vec::new();
    for span in spans {
        if kept.last().is_some_and(|outer| outer.contains(span)) {
            continue;
        }
        kept.push(span);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(html: &str) -> Result<String, Html2LatexError> {
        clean_paragraph_ending(RuleSet::shared(), html)
    }

    #[test]
    fn trailing_nbsp_is_removed() {
        assert_eq!(clean("<p>text&nbsp;&nbsp;</p>").unwrap(), "<p>text</p>");
        assert_eq!(clean("<p>text&nbsp; &nbsp; </p>").unwrap(), "<p>text</p>");
    }

    #[test]
    fn trailing_breaks_are_removed() {
        assert_eq!(clean("<p>text<br/><br /></p>").unwrap(), "<p>text</p>");
        assert_eq!(clean("<p>text<br> <br></p>").unwrap(), "<p>text</p>");
    }

    #[test]
    fn whitespace_before_close_is_removed() {
        assert_eq!(clean("<p>text \n\t</p>\n").unwrap(), "<p>text</p>");
    }

    #[test]
    fn self_closing_tags_are_tightened() {
        assert_eq!(
            clean(r#"<p>a<br />b<img src="x.png"  /></p>"#).unwrap(),
            r#"<p>a<br/>b<img src="x.png"/></p>"#
        );
    }

    #[test]
    fn breaks_inside_underline_become_spaces() {
        assert_eq!(clean("<u>a<br/>b</u>").unwrap(), "<u>a b</u>");
        assert_eq!(
            clean("<p><u>one<br>two</u> and<br/>three</p>").unwrap(),
            "<p><u>one two</u> and<br/>three</p>"
        );
    }

    #[test]
    fn nested_underlines_are_rewritten_once() {
        assert_eq!(
            clean("<u>a<br/><u>b<br/>c</u></u>").unwrap(),
            "<u>a <u>b c</u></u>"
        );
    }

    #[test]
    fn several_underlines() {
        assert_eq!(
            clean("<p><u>a<br/>b</u> x <u>c<br/>d</u></p>").unwrap(),
            "<p><u>a b</u> x <u>c d</u></p>"
        );
    }

    #[test]
    fn empty_fragment_is_fine() {
        assert_eq!(clean("").unwrap(), "");
        assert_eq!(clean("   ").unwrap(), "");
    }

    #[test]
    fn omitted_end_tags_are_accepted() {
        assert_eq!(
            clean("<ul><li>one<li>two</ul>").unwrap(),
            "<ul><li>one<li>two</ul>"
        );
        assert_eq!(clean("<p>first<p>second").unwrap(), "<p>first<p>second");
        assert_eq!(
            clean("<p><u>a<br>b</u><p>next&nbsp;</p>").unwrap(),
            "<p><u>a b</u><p>next</p>"
        );
    }

    #[test]
    fn malformed_markup_fails() {
        let err = clean("<p><u>text</p>").unwrap_err();
        assert!(matches!(err, Html2LatexError::Parse { .. }), "got: {err}");
    }
}
