//! Spell-check hook applied to table HTML before it is hashed and rendered.

use crate::error::Html2LatexError;

/// Corrects spelling in an HTML fragment, leaving the markup intact.
pub trait SpellChecker: Send + Sync {
    fn check_html(&self, html: &str) -> Result<String, Html2LatexError>;
}

/// Returns the fragment unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpellCheck;

impl SpellChecker for NoSpellCheck {
    fn check_html(&self, html: &str) -> Result<String, Html2LatexError> {
        Ok(html.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity() {
        assert_eq!(NoSpellCheck.check_html("<td>teh</td>").unwrap(), "<td>teh</td>");
    }
}
