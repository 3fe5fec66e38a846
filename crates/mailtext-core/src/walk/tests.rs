use encoding_rs::UTF_8;

use crate::config::ConvertOptions;
use crate::error::ConvertError;
use crate::normalize::normalize_document;
use crate::types::MarkupDocument;

use super::walk;

fn render_with(html: &str, opts: &ConvertOptions) -> String {
    let document = MarkupDocument::new(html, UTF_8);
    let raw = walk(&document, opts).unwrap();
    normalize_document(&raw, opts)
}

fn render(html: &str) -> String {
    render_with(html, &ConvertOptions::default())
}

#[test]
fn headings_and_paragraphs_are_separated() {
    assert_eq!(render("<h1>Title</h1><p>Body</p>"), "=== Title ===\n\nBody");
    assert_eq!(render("<h2>Sub</h2><h3>Minor</h3><h4>Plain</h4>"), "== Sub ==\n\n= Minor =\n\nPlain");
}

#[test]
fn skipped_elements_leave_no_text() {
    let html = "<p>Hi</p><script>alert(1)</script><style>.x{}</style><noscript>enable js</noscript>";
    assert_eq!(render(html), "Hi");
}

#[test]
fn entities_follow_the_decoder_policy() {
    assert_eq!(render("<p>Wait&hellip; snow &#9731;</p>"), "Wait... snow &#9731;");
    let opts = ConvertOptions {
        full_numeric_entities: true,
        ..ConvertOptions::default()
    };
    assert_eq!(
        render_with("<p>Wait&hellip; snow &#9731;</p>", &opts),
        "Wait... snow \u{2603}"
    );
}

#[test]
fn attribute_values_are_decoded() {
    let opts = ConvertOptions {
        show_link_targets: true,
        ..ConvertOptions::default()
    };
    assert_eq!(
        render_with(r#"<a href="https://e.com/?a=1&amp;b=2">go</a>"#, &opts),
        "go [Link: https://e.com/?a=1&b=2]"
    );
    assert_eq!(
        render(r#"<img src="l.png" alt="Logo &amp; mark">"#),
        "[Image: Logo & mark]"
    );
}

#[test]
fn sentinel_characters_in_text_do_not_open_preserved_regions() {
    let html = "<p>x\u{2}</p><p>Same   line</p><div>Same   line</div>";
    assert_eq!(render(html), "x\n\nSame line");
}

#[test]
fn embedded_objects_are_skipped() {
    let html = concat!(
        "<p>A</p><iframe src=x>frame text</iframe>",
        "<object data=x><param name=a>object text</object>",
        "<embed src=x.swf><applet code=x>applet text</applet><p>B</p>",
    );
    assert_eq!(render(html), "A\n\nB");
    assert_eq!(render("<p>A</p><object data=x><param name=a>SECRETFLASH"), "A");
    assert_eq!(render("<p>A</p><iframe src=x>hidden"), "A");
}

#[test]
fn collapses_whitespace_in_text() {
    assert_eq!(render("<p>  lots   of\n space </p>"), "lots of space");
}

#[test]
fn text_is_not_decoded_twice() {
    assert_eq!(render("<p>&amp;lt;tag&amp;gt;</p>"), "&lt;tag&gt;");
}

#[test]
fn annotates_links() {
    assert_eq!(
        render(r#"<p>Write <a href="mailto:x@y.com">me</a> now</p>"#),
        "Write me (x@y.com) now"
    );
    assert_eq!(
        render(r#"<a href="https://example.com">Example</a>"#),
        "Example [Link]"
    );
    assert_eq!(
        render(r#"<a href="tel:+15551234">Call us</a>"#),
        "Call us (Phone: +15551234)"
    );
    assert_eq!(render(r##"<a href="#top">Back to top</a>"##), "Back to top");
}

#[test]
fn shows_link_targets_when_asked() {
    let opts = ConvertOptions {
        show_link_targets: true,
        ..ConvertOptions::default()
    };
    assert_eq!(
        render_with(r#"<a href="https://example.com">Example</a>"#, &opts),
        "Example [Link: https://example.com]"
    );
}

#[test]
fn image_links_use_image_text() {
    let html = r#"<a href="https://x.com/images/banner"><img src="b.png" alt="Sale"></a>"#;
    assert_eq!(render(html), "[Image: Sale]");
    let html = r#"<a href="https://x.com/pic.jpg"><img src="b.png"></a>"#;
    assert_eq!(render(html), "[Image link]");
}

#[test]
fn annotates_images() {
    assert_eq!(
        render(r#"<p>Logo: <img src="l.png" alt="ACME"></p>"#),
        "Logo: [Image: ACME]"
    );
    assert_eq!(render(r#"<img src="x.png">"#), "[Image]");
    assert_eq!(
        render(r#"<p>hi<img src="t.gif" width="1" height="1"></p>"#),
        "hi"
    );
}

#[test]
fn quotes_prefix_every_line() {
    let html = "<blockquote><p>one</p><p>two</p></blockquote><p>after</p>";
    assert_eq!(render(html), "> one\n\n> two\n\nafter");
    assert_eq!(render("<blockquote>one<br>two</blockquote>"), "> one\n> two");
}

#[test]
fn quotes_prefix_first_line_only_when_asked() {
    let opts = ConvertOptions {
        quote_first_line_only: true,
        ..ConvertOptions::default()
    };
    assert_eq!(
        render_with("<blockquote>one<br>two</blockquote>", &opts),
        "> one\ntwo"
    );
}

#[test]
fn table_cells_are_tab_separated() {
    let html = "<table><tr><td>a</td><td>b</td></tr><tr><th>c</th><td>d</td></tr></table>";
    assert_eq!(render(html), "a\tb\nc\td");
}

#[test]
fn preformatted_text_is_kept_verbatim() {
    let html = "<pre>  x = 1\n    y\n    y</pre><p>after</p>";
    assert_eq!(render(html), "  x = 1\n    y\n    y\nafter");
}

#[test]
fn lists_get_bullets() {
    assert_eq!(render("<ol><li>one</li><li>two</li></ol>"), "1. one\n2. two");
    assert_eq!(render("<ul><li></li><li>a</li></ul>"), "• a");
}

#[test]
fn nested_lists_keep_one_bullet_per_line() {
    assert_eq!(render("<ul><li><ul><li>a</li></ul></li></ul>"), "• a");
    assert_eq!(
        render("<ul><li>top<ul><li>inner</li></ul></li></ul>"),
        "• top\n• inner"
    );
}

#[test]
fn empty_elements_leave_no_markers() {
    assert_eq!(render("<h2></h2><p>x</p>"), "x");
    assert_eq!(render("<p>a <b></b> b</p>"), "a b");
}

#[test]
fn emphasis_markers() {
    assert_eq!(render("<p>a <b>bold</b> c</p>"), "a **bold** c");
    assert_eq!(render("<p><s>old</s> new</p>"), "~~old~~ new");
    assert_eq!(
        render(r#"<a href="https://e.com"><b>Go</b></a>"#),
        "Go [Link]"
    );
}

#[test]
fn horizontal_rule() {
    assert_eq!(render("<p>a</p><hr><p>b</p>"), "a\n\n----------\nb");
}

#[test]
fn frameset_has_no_body_to_walk() {
    let html = r#"<html><frameset><frame src="a.html"></frameset></html>"#;
    let document = MarkupDocument::new(html, UTF_8);
    let result = walk(&document, &ConvertOptions::default());
    assert!(matches!(result, Err(ConvertError::ParseUnavailable(_))));
}
