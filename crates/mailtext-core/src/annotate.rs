use once_cell::sync::Lazy;
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

use crate::config::ConvertOptions;
use crate::types::LinkKind;

pub const IMAGE_PLACEHOLDER: &str = "[Image]";
pub const IMAGE_LINK_PLACEHOLDER: &str = "[Image link]";
pub const LINK_MARKER: &str = "[Link]";
pub const ELLIPSIS: &str = "...";

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "ico", "tif", "tiff", "heic", "avif",
];
const IMAGE_SEGMENTS: &[&str] = &["image", "images", "img", "imgs", "photos"];

// Relative hrefs are resolved against a dummy base so they still yield a path.
static BASE: Lazy<Url> = Lazy::new(|| Url::parse("http://localhost/").expect("static base url"));

/// Whether an anchor's `href` is worth annotating at all. Empty hrefs,
/// in-page fragments and script URLs render as their plain text.
pub fn is_followable(href: &str) -> bool {
    let href = href.trim();
    !(href.is_empty()
        || href.starts_with('#')
        || href.to_ascii_lowercase().starts_with("javascript:"))
}

pub fn classify_href(href: &str) -> LinkKind {
    let href = href.trim();
    if is_image_url(href) {
        return LinkKind::Image;
    }
    if let Some(rest) = strip_scheme(href, "mailto:") {
        let addr = rest.split('?').next().unwrap_or_default().trim();
        if !addr.is_empty() {
            return LinkKind::Mail(addr.to_string());
        }
    }
    if let Some(rest) = strip_scheme(href, "tel:").or_else(|| strip_scheme(href, "callto:")) {
        let number = rest.trim();
        if !number.is_empty() {
            return LinkKind::Phone(number.to_string());
        }
    }
    LinkKind::Web
}

fn strip_scheme<'a>(href: &'a str, scheme: &str) -> Option<&'a str> {
    let head = href.get(..scheme.len())?;
    head.eq_ignore_ascii_case(scheme)
        .then(|| &href[scheme.len()..])
}

pub fn is_image_url(href: &str) -> bool {
    let Ok(url) = BASE.join(href) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https" | "ftp" | "cid") {
        return false;
    }
    let Some(segments) = url.path_segments() else {
        return false;
    };
    let segments: Vec<String> = segments
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    let Some(last) = segments.last() else {
        return false;
    };
    let has_image_ext = last
        .rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext));
    has_image_ext
        || segments[..segments.len() - 1]
            .iter()
            .any(|s| IMAGE_SEGMENTS.contains(&s.as_str()))
}

/// Render an anchor as inline text. `text` is the collected link text.
pub fn render_link(href: &str, text: &str, opts: &ConvertOptions) -> String {
    let href = href.trim();
    let text = collapse_spaces(text);
    match classify_href(href) {
        LinkKind::Image => {
            if text.is_empty() {
                IMAGE_LINK_PLACEHOLDER.to_string()
            } else {
                format!("[Image: {}]", text)
            }
        }
        LinkKind::Mail(addr) => {
            if text.is_empty() || same_target(&text, &addr) || same_target(&text, href) {
                addr
            } else {
                format!("{} ({})", text, addr)
            }
        }
        LinkKind::Phone(number) => {
            if text.is_empty() || same_target(&text, &number) || same_target(&text, href) {
                format!("Phone: {}", number)
            } else {
                format!("{} (Phone: {})", text, number)
            }
        }
        LinkKind::Web => {
            if text.is_empty() {
                format!("[Link: {}]", truncate(href, opts.link_url_limit))
            } else if same_target(&text, href) {
                text
            } else if opts.show_link_targets {
                format!("{} [Link: {}]", text, truncate(href, opts.link_url_limit))
            } else {
                format!("{} {}", text, LINK_MARKER)
            }
        }
    }
}

pub fn render_image(alt: Option<&str>) -> String {
    match alt.map(collapse_spaces).filter(|alt| !alt.is_empty()) {
        Some(alt) => format!("[Image: {}]", alt),
        None => IMAGE_PLACEHOLDER.to_string(),
    }
}

/// Shorten to `limit` graphemes, marking the cut with an ellipsis.
pub fn truncate(s: &str, limit: usize) -> String {
    let mut graphemes = s.graphemes(true);
    let head: String = graphemes.by_ref().take(limit).collect();
    if graphemes.next().is_some() {
        format!("{}{}", head, ELLIPSIS)
    } else {
        head
    }
}

fn same_target(text: &str, target: &str) -> bool {
    fn bare(s: &str) -> &str {
        let s = s.trim().trim_end_matches('/');
        ["https://", "http://", "mailto:", "tel:"]
            .iter()
            .find_map(|scheme| strip_scheme(s, scheme))
            .unwrap_or(s)
    }
    bare(text).eq_ignore_ascii_case(bare(target))
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
