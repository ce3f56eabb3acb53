//! Plain-text rendering of rich-text fields.
//!
//! Petition titles and bodies are edited with an HTML editor. Meta tags,
//! previews and email subjects need the text without markup, so tags are
//! dropped and character references decoded.

use scraper::Html;

/// Strip all tags from `html` and decode entities.
///
/// Whitespace is kept as written.
pub fn to_plain_text(html: &str) -> String {
    if !html.contains(['<', '&']) {
        return html.to_string();
    }
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect()
}

/// Decode character references in `text`, leaving anything tag-like as
/// written.
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(&text.replace('<', "&lt;"));
    fragment.root_element().text().collect()
}

/// [`to_plain_text`] with surrounding whitespace trimmed.
pub fn to_plain_line(html: &str) -> String {
    to_plain_text(html).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_entities() {
        assert_eq!(to_plain_line("<b>Hello</b> &amp; co"), "Hello & co");
        assert_eq!(to_plain_line("  <p> Save the <em>bees</em> </p>\n"), "Save the bees");
    }

    #[test]
    fn test_plain_input_untouched() {
        assert_eq!(to_plain_text("no markup here"), "no markup here");
        assert_eq!(to_plain_text(""), "");
    }

    #[test]
    fn test_keeps_inner_whitespace() {
        assert_eq!(
            to_plain_text("<p>line one</p>\n<p>line two</p>"),
            "line one\nline two"
        );
    }

    #[test]
    fn test_entities() {
        assert_eq!(to_plain_text("caf&eacute; &lt;3 &#39;quoted&#39;"), "café <3 'quoted'");
        assert_eq!(to_plain_text("&quot;A&quot; &gt; B"), "\"A\" > B");
    }

    #[test]
    fn test_unescape_keeps_angle_brackets() {
        assert_eq!(unescape("Jean <JP>"), "Jean <JP>");
        assert_eq!(unescape("O&amp;Neil <b>x</b>"), "O&Neil <b>x</b>");
        assert_eq!(unescape("&lt;3 caf&eacute;"), "<3 café");
    }

    #[test]
    fn test_nested_markup() {
        assert_eq!(
            to_plain_line(r#"<div class="x"><a href="/p/1">Sign <strong>now</strong></a></div>"#),
            "Sign now"
        );
    }
}
