//! Message body sanitization
//!
//! Archived bodies are semi-structured markup of unknown origin. Everything
//! that reaches a display surface goes through [`sanitize`], which keeps only
//! bold, italic and line breaks. Plain-text helpers here feed matching,
//! excerpts and previews.

use std::collections::HashSet;
use std::sync::LazyLock;

use ammonia::Builder;
use regex::Regex;

/// Placeholder shown for a message without a body
pub const NO_CONTENT: &str = "No content";

static HTML_SANITIZER: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut b = Builder::new();
    b.tags(
        ["b", "strong", "i", "em", "br", "p"]
            .into_iter()
            .collect::<HashSet<&'static str>>(),
    );
    // Dropped together with their content, not just unwrapped
    b.clean_content_tags(["script", "style"].into_iter().collect::<HashSet<_>>());
    b.generic_attributes(HashSet::new());
    b.link_rel(None);
    b
});

/// Text-only cleaner: the HTML parser decodes every named and numeric entity
static PLAIN_TEXT: LazyLock<Builder<'static>> = LazyLock::new(Builder::empty);

/// Any single tag, used to walk text segments of display HTML
pub(crate) static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static BR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static P_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</p\s*>").expect("valid regex"));
static P_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<p(\s[^>]*)?>").expect("valid regex"));
static B_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<b(\s[^>]*)?>").expect("valid regex"));
static B_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</b\s*>").expect("valid regex"));
static I_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<i(\s[^>]*)?>").expect("valid regex"));
static I_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</i\s*>").expect("valid regex"));

/// Tags that survive into display text
const KEPT_TAGS: [&str; 4] = ["<strong>", "</strong>", "<em>", "</em>"];

/// Sanitize raw message markup into safe display HTML
///
/// The result contains escaped text, `<br>` line breaks and `<strong>`/`<em>`
/// emphasis only. Executable content and event-handler attributes never
/// survive. Sanitizing the output again yields the same output.
pub fn sanitize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return NO_CONTENT.to_string();
    }

    let cleaned = HTML_SANITIZER.clean(raw).to_string();
    let cleaned = cleaned.trim();

    let formatted = BR.replace_all(cleaned, "\n");
    let formatted = P_CLOSE.replace_all(&formatted, "\n\n");
    let formatted = P_OPEN.replace_all(&formatted, "");
    let formatted = B_OPEN.replace_all(&formatted, "<strong>");
    let formatted = B_CLOSE.replace_all(&formatted, "</strong>");
    let formatted = I_OPEN.replace_all(&formatted, "<em>");
    let formatted = I_CLOSE.replace_all(&formatted, "</em>");

    let mut out = String::with_capacity(formatted.len());
    let mut last = 0;
    for tag in TAG.find_iter(&formatted) {
        push_text(&mut out, &formatted[last..tag.start()]);
        let tag_text = tag.as_str().to_ascii_lowercase();
        if KEPT_TAGS.contains(&tag_text.as_str()) {
            out.push_str(&tag_text);
        }
        last = tag.end();
    }
    push_text(&mut out, &formatted[last..]);

    let out = trim_display(&out);
    if out.is_empty() {
        return NO_CONTENT.to_string();
    }
    out.to_string()
}

/// Drop surrounding whitespace and trailing line breaks
///
/// Decoded `&nbsp;` only turns into whitespace after the input trim, so the
/// output is trimmed again.
fn trim_display(html: &str) -> &str {
    let mut html = html.trim();
    while let Some(rest) = html.strip_suffix("<br>") {
        html = rest.trim_end();
    }
    html
}

/// Escape a text segment and turn its newlines into `<br>`
fn push_text(out: &mut String, segment: &str) {
    let decoded = decode_entities(segment);
    let mut lines = decoded.split('\n');
    if let Some(first) = lines.next() {
        out.push_str(&html_escape(first));
    }
    for line in lines {
        out.push_str("<br>");
        out.push_str(&html_escape(line));
    }
}

/// Strip all markup, leaving the text a reader would see
///
/// Used for matching, excerpts and previews. Script and style content is
/// dropped and all entities (`&rsquo;`, `&#8217;`, ...) are decoded, so the
/// result is raw text and must be escaped again before display.
pub fn strip_tags(html: &str) -> String {
    let text = PLAIN_TEXT.clean(html).to_string();
    decode_entities(&text).trim().to_string()
}

/// Plain text of already-sanitized display HTML, as copied to the clipboard
pub fn display_text(sanitized: &str) -> String {
    let text = BR.replace_all(sanitized, "\n");
    strip_tags(&text)
}

/// Simple HTML escape for user-generated content
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Decode the entities the sanitizer and [`html_escape`] produce
///
/// The parser behind [`sanitize`] and [`strip_tags`] has already decoded
/// everything else.
pub(crate) fn decode_entities(s: &str) -> String {
    // &amp; last so "&amp;lt;" decodes to "&lt;", not "<"
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
