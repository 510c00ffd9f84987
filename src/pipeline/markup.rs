//! Element scanner for HTML fragments.
//!
//! Walks a fragment with `quick-xml` events and reports, for every element,
//! the byte range its source text occupies. Callers patch the original string
//! through those ranges instead of re-serialising a tree, so markup outside
//! the patched spans comes back byte-for-byte.
//!
//! The scanner follows the HTML rules editors rely on:
//!
//! * void elements (`<br>`, `<img>`, …) never open a scope;
//! * `li`, `td`, `tr`, `p`, `option` and the other elements whose end tag
//!   may be omitted are closed by a sibling's start tag, by their parent's
//!   end tag, or by the end of input.
//!
//! Anything else must nest properly: a mismatched or orphaned closing tag,
//! or an element with a required end tag still open at the end of input, is
//! a [`Html2LatexError::Parse`].

use crate::error::Html2LatexError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const OPTIONAL_END: &[&str] = &[
    "li", "dt", "dd", "p", "td", "th", "tr", "thead", "tbody", "tfoot", "colgroup", "option",
    "optgroup",
];

/// Start tags that end an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "menu", "nav", "ol", "p",
    "pre", "section", "table", "ul",
];

/// A start tag named in `openers` implicitly ends the nearest open element
/// named in `closes`, and everything opened inside it, unless an element in
/// `scope` is reached first.
struct ImpliedEnd {
    openers: &'static [&'static str],
    closes: &'static [&'static str],
    scope: &'static [&'static str],
}

const IMPLIED_ENDS: &[ImpliedEnd] = &[
    ImpliedEnd {
        openers: &["li"],
        closes: &["li"],
        scope: &["ul", "ol", "menu"],
    },
    ImpliedEnd {
        openers: &["dt", "dd"],
        closes: &["dt", "dd"],
        scope: &["dl"],
    },
    ImpliedEnd {
        openers: &["td", "th"],
        closes: &["td", "th"],
        scope: &["tr", "table"],
    },
    ImpliedEnd {
        openers: &["tr"],
        closes: &["td", "th", "tr"],
        scope: &["table", "thead", "tbody", "tfoot"],
    },
    ImpliedEnd {
        openers: &["thead", "tbody", "tfoot"],
        closes: &["td", "th", "tr", "thead", "tbody", "tfoot", "colgroup"],
        scope: &["table"],
    },
    ImpliedEnd {
        openers: &["option"],
        closes: &["option"],
        scope: &["select", "datalist", "optgroup"],
    },
    ImpliedEnd {
        openers: &["optgroup"],
        closes: &["option", "optgroup"],
        scope: &["select"],
    },
    ImpliedEnd {
        openers: CLOSES_PARAGRAPH,
        closes: &["p"],
        scope: &["td", "th", "caption", "table", "button"],
    },
];

/// One element of the fragment and the source bytes it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpan {
    /// Lower-cased tag name.
    pub name: String,
    /// Value of the `class` attribute, if any.
    pub class: Option<String>,
    /// Byte offset of the opening `<`.
    pub start: usize,
    /// Byte offset just past the closing `>`, or where the element was
    /// implicitly ended.
    pub end: usize,
}

impl ElementSpan {
    /// The element's source text, tags included.
    pub fn source<'a>(&self, html: &'a str) -> &'a str {
        &html[self.start..self.end]
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class
            .as_deref()
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn contains(&self, other: &ElementSpan) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

struct OpenElement {
    name: String,
    class: Option<String>,
    start: usize,
}

impl OpenElement {
    fn close(self, end: usize) -> ElementSpan {
        ElementSpan {
            name: self.name,
            class: self.class,
            start: self.start,
            end,
        }
    }
}

/// Scan `html` and return every element, ordered by start offset.
pub fn scan_elements(html: &str) -> Result<Vec<ElementSpan>, Html2LatexError> {
    let mut reader = Reader::from_str(html);
    reader.trim_text(false);
    reader.check_end_names(false);

    let mut open: Vec<OpenElement> = Vec::new();
    let mut spans = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) => {
                let end = reader.buffer_position();
                let start = tag_start(html, end);
                let name = tag_name(&tag);
                close_implied(&mut open, &mut spans, &name, start);
                let class = class_attribute(&tag);
                if is_void(&name) {
                    spans.push(ElementSpan {
                        name,
                        class,
                        start,
                        end,
                    });
                } else {
                    open.push(OpenElement { name, class, start });
                }
            }
            Ok(Event::Empty(tag)) => {
                let end = reader.buffer_position();
                let start = tag_start(html, end);
                let name = tag_name(&tag);
                close_implied(&mut open, &mut spans, &name, start);
                spans.push(ElementSpan {
                    name,
                    class: class_attribute(&tag),
                    start,
                    end,
                });
            }
            Ok(Event::End(tag)) => {
                let end = reader.buffer_position();
                let name = String::from_utf8_lossy(tag.name().as_ref()).to_ascii_lowercase();
                if is_void(&name) {
                    continue;
                }
                close_explicit(&mut open, &mut spans, &name, tag_start(html, end), end)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Html2LatexError::Parse {
                    position: reader.buffer_position(),
                    detail: e.to_string(),
                })
            }
        }
    }

    while let Some(element) = open.pop() {
        if !has_optional_end(&element.name) {
            return Err(Html2LatexError::Parse {
                position: element.start,
                detail: format!("<{}> is never closed", element.name),
            });
        }
        spans.push(element.close(html.len()));
    }

    spans.sort_by_key(|span| span.start);
    Ok(spans)
}

/// End the elements a `<name>` start tag at byte `at` implicitly closes.
fn close_implied(open: &mut Vec<OpenElement>, spans: &mut Vec<ElementSpan>, name: &str, at: usize) {
    let Some(rule) = IMPLIED_ENDS.iter().find(|rule| rule.openers.contains(&name)) else {
        return;
    };

    let mut target = None;
    for (idx, element) in open.iter().enumerate().rev() {
        let element = element.name.as_str();
        if rule.closes.contains(&element) {
            target = Some(idx);
        } else if rule.scope.contains(&element) || !has_optional_end(element) {
            break;
        }
    }

    if let Some(idx) = target {
        for element in open.drain(idx..).rev() {
            spans.push(element.close(at));
        }
    }
}

/// Match `</name>` (spanning `start..end`) with its opener. Open elements
/// above the opener are implicitly ended at `start` if their end tag is
/// optional; any other element in the way is a mismatch.
fn close_explicit(
    open: &mut Vec<OpenElement>,
    spans: &mut Vec<ElementSpan>,
    name: &str,
    start: usize,
    end: usize,
) -> Result<(), Html2LatexError> {
    let Some(idx) = open.iter().rposition(|element| element.name == name) else {
        return Err(Html2LatexError::Parse {
            position: start,
            detail: format!("</{name}> has no matching opening tag"),
        });
    };

    if let Some(blocker) = open[idx + 1..]
        .iter()
        .rev()
        .find(|element| !has_optional_end(&element.name))
    {
        return Err(Html2LatexError::Parse {
            position: start,
            detail: format!("expected </{}> but found </{}>", blocker.name, name),
        });
    }

    let mut closed = open.split_off(idx);
    let element = closed.remove(0);
    for implied in closed.into_iter().rev() {
        spans.push(implied.close(start));
    }
    spans.push(element.close(end));
    Ok(())
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

fn has_optional_end(name: &str) -> bool {
    OPTIONAL_END.contains(&name)
}

/// The reader sits just past a tag's `>`; its `<` is the last one before it.
fn tag_start(html: &str, tag_end: usize) -> usize {
    html[..tag_end].rfind('<').unwrap_or(0)
}

fn tag_name(tag: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(tag.name().as_ref()).to_ascii_lowercase()
}

fn class_attribute(tag: &BytesStart<'_>) -> Option<String> {
    tag.html_attributes()
        .flatten()
        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(b"class"))
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_cover_source_text() {
        let html = r#"<p>one <u class="hl">two</u></p>"#;
        let spans = scan_elements(html).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "p");
        assert_eq!(spans[0].source(html), html);
        assert_eq!(spans[1].source(html), r#"<u class="hl">two</u>"#);
        assert!(spans[1].has_class("hl"));
        assert!(spans[0].contains(&spans[1]));
    }

    #[test]
    fn void_elements_need_no_closing_slash() {
        let html = "<p>a<br>b<br/>c<img src=x.png></p>";
        let spans = scan_elements(html).unwrap();
        let names: Vec<&str> = spans.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["p", "br", "br", "img"]);
        assert_eq!(spans[1].source(html), "<br>");
        assert_eq!(spans[2].source(html), "<br/>");
    }

    #[test]
    fn entities_and_plain_text_are_accepted() {
        assert!(scan_elements("text&nbsp;only").unwrap().is_empty());
        assert!(scan_elements("").unwrap().is_empty());
    }

    #[test]
    fn multiple_classes() {
        let spans = scan_elements(r#"<span class="a math-tex b">x</span>"#).unwrap();
        assert!(spans[0].has_class("math-tex"));
        assert!(!spans[0].has_class("math"));
    }

    #[test]
    fn mismatched_closing_tag_is_a_parse_error() {
        let err = scan_elements("<p><u>text</p></u>").unwrap_err();
        assert!(matches!(err, Html2LatexError::Parse { .. }), "got: {err}");
    }

    #[test]
    fn orphan_closing_tag_is_a_parse_error() {
        let err = scan_elements("text</p>").unwrap_err();
        match err {
            Html2LatexError::Parse { position, .. } => assert_eq!(position, 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unclosed_element_is_a_parse_error() {
        let err = scan_elements("<div><u>open</u>").unwrap_err();
        assert!(err.to_string().contains("<div> is never closed"), "got: {err}");
    }

    fn sources<'a>(html: &'a str, spans: &[ElementSpan]) -> Vec<&'a str> {
        spans.iter().map(|span| span.source(html)).collect()
    }

    #[test]
    fn list_items_end_at_the_next_item() {
        let html = "<ul><li>one<li>two</ul>";
        let spans = scan_elements(html).unwrap();
        assert_eq!(sources(html, &spans), vec![html, "<li>one", "<li>two"]);
    }

    #[test]
    fn paragraphs_end_at_the_next_block_or_end_of_input() {
        let html = "<p>first<p>second";
        assert_eq!(
            sources(html, &scan_elements(html).unwrap()),
            vec!["<p>first", "<p>second"]
        );

        let html = "<p>intro<ul><li>x</li></ul>";
        let spans = scan_elements(html).unwrap();
        assert_eq!(spans[0].source(html), "<p>intro");
        assert_eq!(spans[1].name, "ul");
    }

    #[test]
    fn table_cells_and_rows_end_implicitly() {
        let html = "<table><tr><td>S.No<td>Name<tr><th>1</table>";
        let spans = scan_elements(html).unwrap();
        assert_eq!(
            sources(html, &spans),
            vec![
                html,
                "<tr><td>S.No<td>Name",
                "<td>S.No",
                "<td>Name",
                "<tr><th>1",
                "<th>1",
            ]
        );
    }

    #[test]
    fn options_end_at_the_next_option() {
        let html = "<select><option>a<option>b</select>";
        let names: Vec<String> = scan_elements(html)
            .unwrap()
            .into_iter()
            .map(|span| span.name)
            .collect();
        assert_eq!(names, vec!["select", "option", "option"]);
    }

    #[test]
    fn required_end_tags_are_not_implied() {
        let err = scan_elements("<ul><li><b>bold<li>next</ul>").unwrap_err();
        assert!(
            err.to_string().contains("expected </b> but found </ul>"),
            "got: {err}"
        );
    }

    #[test]
    fn nested_lists_keep_their_own_items() {
        let html = "<ul><li>a<ul><li>b<li>c</ul><li>d</ul>";
        let spans = scan_elements(html).unwrap();
        assert_eq!(
            sources(html, &spans),
            vec![
                html,
                "<li>a<ul><li>b<li>c</ul>",
                "<ul><li>b<li>c</ul>",
                "<li>b",
                "<li>c",
                "<li>d",
            ]
        );
    }
}
