use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::annotate;
use crate::config::ConvertOptions;
use crate::entities;
use crate::normalize;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern")
}

static COMMENT: Lazy<Regex> = Lazy::new(|| re(r"(?s)<!--.*?(?:-->|\z)"));

// Removed regions. An unterminated one swallows the rest of the document.
static REGIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        "script", "style", "noscript", "title", "iframe", "object", "applet", "template",
    ]
    .iter()
    .map(|tag| re(&format!(r"(?is)<{tag}\b[^>]*>.*?(?:</{tag}\s*>|\z)")))
    .collect()
});

// A head without its end tag stops at the body.
static HEAD: Lazy<Regex> =
    Lazy::new(|| re(r"(?is)<head\b[^>]*>.*?(?:</head\s*>|<body\b[^>]*>|\z)"));

static EMBED: Lazy<Regex> = Lazy::new(|| re(r"(?is)<embed\b[^>]*>"));

static ANCHOR: Lazy<Regex> = Lazy::new(|| {
    re(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))[^>]*>(.*?)</a\s*>"#)
});

static IMG: Lazy<Regex> = Lazy::new(|| re(r"(?is)<img\b[^>]*>"));

static ATTR: Lazy<Regex> = Lazy::new(|| {
    re(r#"(?is)([a-z][a-z0-9:_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#)
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| re(r"\s+"));
static BREAK: Lazy<Regex> = Lazy::new(|| re(r"(?i)<br\b[^>]*>"));
static PRE_CODE_OPEN: Lazy<Regex> = Lazy::new(|| re(r"(?is)(<pre\b[^>]*>)\s*<code\b[^>]*>"));
static PRE_CODE_CLOSE: Lazy<Regex> = Lazy::new(|| re(r"(?is)</code\s*>\s*(</pre\s*>)"));
static BLOCK: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)</?(?:p|div|h[1-6]|ul|ol|li|tr|table|thead|tbody|tfoot|caption|blockquote|pre|hr|section|article|header|footer|main|nav|aside|figure|figcaption|address|center|form|fieldset|dl|dt|dd)\b[^>]*>")
});
static CELL: Lazy<Regex> = Lazy::new(|| re(r"(?i)<t[dh]\b[^>]*>"));
static CODE: Lazy<Regex> = Lazy::new(|| re(r"(?i)</?(?:code|kbd|samp|tt)\b[^>]*>"));
static TAG: Lazy<Regex> = Lazy::new(|| re(r"<[a-zA-Z/!?][^>]*>"));
static TRAILING_TAG: Lazy<Regex> = Lazy::new(|| re(r"<[a-zA-Z/!?][^>]*\z"));

/// Convert markup without building a tree. Each stage is a plain pattern
/// substitution over the whole string, so malformed input cannot make it
/// fail.
pub fn fallback_convert(raw: &str, opts: &ConvertOptions) -> String {
    let text = strip_regions(&normalize::strip_sentinels(raw));
    let text = ANCHOR.replace_all(&text, |caps: &Captures| render_anchor(caps, opts));
    let text = IMG.replace_all(&text, |caps: &Captures| render_img(&caps[0]));
    let text = tags_to_breaks(&text);
    let text = entities::decode_with(&text, opts.numeric_policy());
    normalize::collapse_whitespace(&text)
}

fn strip_regions(raw: &str) -> String {
    let mut text = COMMENT.replace_all(raw, "").into_owned();
    for region in REGIONS.iter().chain(std::iter::once(&*HEAD)) {
        text = region.replace_all(&text, "").into_owned();
    }
    EMBED.replace_all(&text, "").into_owned()
}

fn render_anchor(caps: &Captures, opts: &ConvertOptions) -> String {
    let href = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map_or("", |m| m.as_str());
    let inner = caps.get(4).map_or("", |m| m.as_str());
    let inner = IMG.replace_all(inner, |img: &Captures| {
        format!(" {} ", image_alt(&img[0]).unwrap_or_default())
    });
    let text = plain_text(&TAG.replace_all(&inner, " "), opts);
    if !annotate::is_followable(href) {
        return escape(&text);
    }
    let href = plain_text(href, opts);
    escape(&annotate::render_link(&href, &text, opts))
}

fn render_img(tag: &str) -> String {
    if is_tracking_pixel(tag) {
        return String::new();
    }
    let alt = image_alt(tag);
    format!(" {} ", escape(&annotate::render_image(alt.as_deref())))
}

fn attr(tag: &str, name: &str) -> Option<String> {
    ATTR.captures_iter(tag)
        .find(|caps| caps[1].eq_ignore_ascii_case(name))
        .and_then(|caps| caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4)))
        .map(|m| m.as_str().to_string())
}

fn image_alt(tag: &str) -> Option<String> {
    attr(tag, "alt")
        .or_else(|| attr(tag, "title"))
        .map(|alt| entities::decode(&alt).trim().to_string())
        .filter(|alt| !alt.is_empty())
}

fn is_tracking_pixel(tag: &str) -> bool {
    let dimension = |name| {
        attr(tag, name).and_then(|v| {
            let digits: String = v.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u32>().ok()
        })
    };
    matches!((dimension("width"), dimension("height")), (Some(w), Some(h)) if w <= 1 && h <= 1)
}

fn tags_to_breaks(text: &str) -> String {
    let text = WHITESPACE.replace_all(text, " ");
    let text = BREAK.replace_all(&text, "\n");
    let text = PRE_CODE_OPEN.replace_all(&text, "$1");
    let text = PRE_CODE_CLOSE.replace_all(&text, "$1");
    let text = BLOCK.replace_all(&text, "\n");
    let text = CELL.replace_all(&text, "\t");
    let text = CODE.replace_all(&text, "`");
    let text = TAG.replace_all(&text, "");
    TRAILING_TAG.replace_all(&text, "").into_owned()
}

fn plain_text(s: &str, opts: &ConvertOptions) -> String {
    let decoded = entities::decode_with(s, opts.numeric_policy());
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Annotations are built from decoded text but spliced back into markup that
/// is decoded once more at the end.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(raw: &str) -> String {
        fallback_convert(raw, &ConvertOptions::default())
    }

    #[test]
    fn removes_scripts_styles_and_comments() {
        let out = convert("<p>keep</p><script>var x = 1;</script><style>p{}</style><!-- hidden -->");
        assert_eq!(out, "keep");
    }

    #[test]
    fn unterminated_regions_run_to_end() {
        assert_eq!(convert("before<script>alert(1)"), "before");
        assert_eq!(convert("before<!-- never closed <p>x</p>"), "before");
    }

    #[test]
    fn removes_embedded_objects() {
        let html = concat!(
            "<p>A</p><iframe src=x>frame text</iframe>",
            "<object data=x><param name=a>object text</object>",
            "<embed src=x.swf><applet code=x>applet text</applet><p>B</p>",
        );
        assert_eq!(convert(html), "A\n\nB");
    }

    #[test]
    fn unterminated_objects_run_to_end() {
        assert_eq!(convert("<p>A</p><object data=x><param name=a>SECRETFLASH"), "A");
        assert_eq!(convert("<p>A</p><iframe src=x>hidden"), "A");
        assert_eq!(convert("<p>A</p><noscript>enable js"), "A");
    }

    #[test]
    fn unterminated_head_stops_at_body() {
        let html = "<html><head><title>Subject</title><body><p>Hello</p></body>";
        assert_eq!(convert(html), "Hello");
    }

    #[test]
    fn sentinel_characters_in_input_are_dropped() {
        assert_eq!(convert("a\u{2}b\u{3}c"), "abc");
    }

    #[test]
    fn classifies_anchors() {
        assert_eq!(
            convert(r#"<a href="mailto:x@y.com">Mail me</a>"#),
            "Mail me (x@y.com)"
        );
        assert_eq!(
            convert(r#"<a href='https://example.com/'>Site</a>"#),
            "Site [Link]"
        );
        assert_eq!(
            convert(r#"<a href="https://example.com/pic.png"><img src="t.png" alt="Cat"></a>"#),
            "[Image: Cat]"
        );
        assert_eq!(convert(r##"<a href="#top">Top</a>"##), "Top");
    }

    #[test]
    fn images_use_alt() {
        assert_eq!(convert(r#"a <img src="x.png" alt="Logo &amp; mark"> b"#), "a [Image: Logo & mark] b");
        assert_eq!(convert(r#"<img src="x.png">"#), "[Image]");
        assert_eq!(convert(r#"x<img src="p.gif" width="1" height="1">"#), "x");
    }

    #[test]
    fn blocks_become_lines() {
        assert_eq!(convert("<h1>Title</h1><p>Body</p>"), "Title\n\nBody");
        assert_eq!(convert("one<br>two"), "one\ntwo");
        assert_eq!(convert("<table><tr><td>a</td><td>b</td></tr></table>"), "a\tb");
    }

    #[test]
    fn code_outside_pre_is_backticked() {
        assert_eq!(convert("run <code>ls</code> now"), "run `ls` now");
        assert_eq!(convert("<pre><code>ls -l</code></pre>"), "ls -l");
    }

    #[test]
    fn entities_decode_once() {
        assert_eq!(convert("&amp;lt; &hellip; &#65;&#9731;"), "&lt; ... A&#9731;");
        assert_eq!(convert(r#"<a href="https://e.com/?a=1&amp;b=2">&lt;go&gt;</a>"#), "<go> [Link]");
    }

    #[test]
    fn strips_unterminated_trailing_tag() {
        assert_eq!(convert("text <div class="), "text");
    }
}
