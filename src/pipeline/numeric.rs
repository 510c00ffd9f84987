//! Numeric-literal guard.
//!
//! Runs before the formatting stage so that `3.14` and `1,000` keep their
//! separators glued to the digits, while a `.` or `,` that ends a clause is
//! normalised to separator-plus-space.
//!
//! Each match is resolved from four groups (leading digits, separator,
//! whitespace, trailing digits):
//!
//! | leading | trailing | output                      |
//! |---------|----------|-----------------------------|
//! | yes     | no       | `{leading}{sep} `           |
//! | no      | yes      | `{sep} {trailing}`          |
//! | yes     | yes      | `{leading}{sep}{trailing}`  |
//! | no      | no       | `{sep} `                    |

use crate::pipeline::rules::RuleSet;
use regex::Captures;
use tracing::debug;

/// Apply the numeric table to `text`. Rules chain: the comma rule runs on the
/// output of the period rule.
pub fn fix_text(rules: &RuleSet, text: &str) -> String {
    let fixed = rules.numeric.apply(text);
    debug!(
        "numeric guard: {} → {} bytes",
        text.len(),
        fixed.len()
    );
    fixed
}

/// Callback for the decimal-period rule.
pub fn guard_period(caps: &Captures<'_>) -> String {
    guard(caps, '.')
}

/// Callback for the comma-grouping rule.
pub fn guard_comma(caps: &Captures<'_>) -> String {
    guard(caps, ',')
}

fn guard(caps: &Captures<'_>, separator: char) -> String {
    let leading = caps.get(1).map_or("", |m| m.as_str()).trim_end();
    let trailing = caps.get(4).map_or("", |m| m.as_str()).trim_start();

    match (leading.is_empty(), trailing.is_empty()) {
        (false, true) => format!("{leading}{separator} "),
        (true, false) => format!("{separator} {trailing}"),
        (false, false) => format!("{leading}{separator}{trailing}"),
        (true, true) => format!("{separator} "),
    }
}
