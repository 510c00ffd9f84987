//! Convenience entry points over the shared built-in rule tables.
//!
//! These wrap [`LatexFormatter`] and [`paragraph::clean_paragraph_ending`]
//! with [`RuleSet::shared`]. Callers that want their own tables build a
//! [`RuleSet`] and use the pipeline types directly.

use crate::error::Html2LatexError;
use crate::pipeline::formatting::LatexFormatter;
use crate::pipeline::paragraph;
use crate::pipeline::rules::RuleSet;

/// Keep decimal points and digit grouping attached to their numbers and
/// space out clause punctuation.
///
/// ```rust
/// assert_eq!(html2latex::fix_text("3.14"), "3.14");
/// assert_eq!(html2latex::fix_text("Rs.500"), "Rs. 500");
/// ```
pub fn fix_text(text: &str) -> String {
    LatexFormatter::default().fix_text(text)
}

/// Normalise spacing, escape `<`/`>`, convert quotation marks and tidy
/// graphics commands.
///
/// ```rust
/// let out = html2latex::fix_formatting(r#"He said "hello.""#).unwrap();
/// assert!(out.contains("``hello.\""));
/// ```
pub fn fix_formatting(text: &str) -> Result<String, Html2LatexError> {
    LatexFormatter::default().fix_formatting(text)
}

/// [`fix_text`] followed by [`fix_formatting`].
pub fn latexify(text: &str) -> Result<String, Html2LatexError> {
    LatexFormatter::default().latexify(text)
}

/// Remove padding before `</p>` and line breaks inside `<u>`.
///
/// ```rust
/// assert_eq!(
///     html2latex::clean_paragraph_ending("<p>text&nbsp;&nbsp;</p>").unwrap(),
///     "<p>text</p>"
/// );
/// ```
pub fn clean_paragraph_ending(html: &str) -> Result<String, Html2LatexError> {
    paragraph::clean_paragraph_ending(RuleSet::shared(), html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_tables_are_reused() {
        assert!(std::ptr::eq(RuleSet::shared(), RuleSet::shared()));
    }

    #[test]
    fn entry_points_agree_with_formatter() {
        let rules = RuleSet::builtin();
        let formatter = LatexFormatter::new(&rules);
        let input = "Cost:Rs.500 (approx)";
        assert_eq!(latexify(input).unwrap(), formatter.latexify(input).unwrap());
        assert_eq!(fix_text(input), formatter.fix_text(input));
    }

    #[test]
    fn concurrent_calls_do_not_interfere() {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                std::thread::spawn(move || {
                    let input = format!("Item {i}:{i}.5 (each)");
                    (input.clone(), latexify(&input).unwrap())
                })
            })
            .collect();
        for handle in handles {
            let (input, output) = handle.join().unwrap();
            assert_eq!(output, latexify(&input).unwrap());
        }
    }
}
