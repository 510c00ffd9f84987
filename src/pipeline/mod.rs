//! The text rewrite pipeline.
//!
//! Every stage is a pure `&str → String` transform driven by the compiled
//! tables in [`rules::RuleSet`]; no stage holds state between calls, so the
//! functions are safe to call from any number of threads at once.
//!
//! ## Data Flow
//!
//! ```text
//! text ──▶ numeric ──▶ formatting ──▶ LaTeX-ready text
//!          (guard)     (spacing, escapes, quotes, graphics)
//!
//! html ──▶ paragraph ──▶ cleaned fragment
//!          (endings, <u> line breaks; uses markup)
//! ```
//!
//! 1. [`rules`]       rule records and the ordered built-in tables
//! 2. [`numeric`]     keeps `3.14` / `1,000` intact, spaces clause punctuation
//! 3. [`formatting`]  spacing/escaping table, enumerator fix, recursive quote
//!    conversion, graphics-run cleanup
//! 4. [`markup`]      byte-range element scanner for HTML fragments
//! 5. [`paragraph`]   `</p>` ending cleanup and underline line breaks

pub mod formatting;
pub mod markup;
pub mod numeric;
pub mod paragraph;
pub mod rules;
