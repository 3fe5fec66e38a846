use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::charset;
use crate::config::ConvertOptions;
use crate::fallback::fallback_convert;
use crate::normalize::normalize_document;
use crate::types::MarkupDocument;
use crate::walk::walk;

/// Convert an HTML body to readable text with default options.
pub fn convert_html_to_text(html: &str, declared_charset: Option<&str>) -> String {
    convert_html_with_options(html, declared_charset, &ConvertOptions::default())
}

/// Convert when the caller knows nothing about the encoding; the markup's own
/// meta declaration decides.
pub fn extract_text_with_charset_detection(html: &str) -> String {
    convert_html_to_text(html, None)
}

/// Convert with explicit options. Never fails: a tree that cannot be built
/// sends the markup through the pattern converter, and any unexpected panic
/// returns the input unchanged.
pub fn convert_html_with_options(
    html: &str,
    declared_charset: Option<&str>,
    opts: &ConvertOptions,
) -> String {
    let encoding = charset::resolve(html, declared_charset);
    let document = MarkupDocument::new(html, encoding);
    panic::catch_unwind(AssertUnwindSafe(|| convert_document(&document, opts))).unwrap_or_else(
        |_| {
            warn!("conversion panicked, returning input unchanged");
            html.to_string()
        },
    )
}

/// Convert an undecoded body. The bytes are decoded with the resolved
/// charset, retrying UTF-8 and finally decoding lossily.
pub fn convert_html_bytes(
    bytes: &[u8],
    declared_charset: Option<&str>,
    opts: &ConvertOptions,
) -> String {
    let (html, encoding) = charset::decode_bytes(bytes, declared_charset);
    debug!(charset = encoding.name(), "decoded message body");
    // the bytes are already decoded, so the meta tag must not override again
    convert_html_with_options(&html, Some(encoding.name()), opts)
}

fn convert_document(document: &MarkupDocument, opts: &ConvertOptions) -> String {
    let text = if opts.force_fallback {
        fallback_convert(document.raw(), opts)
    } else {
        match walk(document, opts) {
            Ok(text) => text,
            Err(err) => {
                debug!(charset = document.charset().name(), "{err}, using pattern converter");
                fallback_convert(document.raw(), opts)
            }
        }
    };
    normalize_document(&text, opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(convert_html_to_text("", None), "");
    }

    #[test]
    fn frameset_documents_use_pattern_converter() {
        let html = "<html><frameset><frame src=\"a.html\"></frameset><noframes>Old browser</noframes></html>";
        let out = convert_html_to_text(html, None);
        assert!(!out.contains('<'));
    }

    #[test]
    fn forced_fallback_matches_words() {
        let opts = ConvertOptions {
            force_fallback: true,
            ..ConvertOptions::default()
        };
        let out = convert_html_with_options("<p>Hello <b>there</b></p>", None, &opts);
        assert_eq!(out, "Hello there");
    }

    #[test]
    fn bytes_are_decoded_with_declared_charset() {
        let bytes = b"<p>caf\xe9</p>";
        let out = convert_html_bytes(bytes, Some("iso-8859-1"), &ConvertOptions::default());
        assert_eq!(out, "caf\u{e9}");
    }
}
