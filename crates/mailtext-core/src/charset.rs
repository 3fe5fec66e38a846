use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::ConvertError;

static CONTENT_TYPE_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)content\s*=\s*["']?\s*text/html\s*;\s*charset\s*=\s*["']?\s*([A-Za-z0-9_:.+-]+)"#)
        .expect("content-type charset pattern")
});

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\b[^>]*?\bcharset\s*=\s*["']?\s*([A-Za-z0-9_:.+-]+)"#)
        .expect("meta charset pattern")
});

/// Pick the charset for a document. Never fails: unknown names and missing
/// declarations resolve to UTF-8.
pub fn resolve(raw_markup: &str, declared: Option<&str>) -> &'static Encoding {
    match resolve_strict(raw_markup, declared) {
        Ok(encoding) => encoding,
        Err(err) => {
            debug!("{err}, using UTF-8");
            UTF_8
        }
    }
}

/// Like [`resolve`] but reports an unusable name instead of swallowing it.
/// A document with no declaration at all is UTF-8, not an error.
pub fn resolve_strict(
    raw_markup: &str,
    declared: Option<&str>,
) -> Result<&'static Encoding, ConvertError> {
    if let Some(label) = declared.map(str::trim).filter(|l| !l.is_empty()) {
        return lookup(label);
    }
    match declared_in_markup(raw_markup) {
        Some(label) => lookup(label).map(|encoding| {
            // A meta tag can't meaningfully declare a 16-bit encoding for
            // markup we could already read as ASCII.
            if encoding == UTF_16LE || encoding == UTF_16BE {
                UTF_8
            } else {
                encoding
            }
        }),
        None => Ok(UTF_8),
    }
}

/// First charset declaration in document order, from either meta form.
pub fn declared_in_markup(raw_markup: &str) -> Option<&str> {
    let content = CONTENT_TYPE_CHARSET.captures(raw_markup);
    let direct = META_CHARSET.captures(raw_markup);
    let pick = match (content, direct) {
        (Some(a), Some(b)) => {
            let a_start = a.get(0).map_or(usize::MAX, |m| m.start());
            let b_start = b.get(0).map_or(usize::MAX, |m| m.start());
            if a_start <= b_start {
                a
            } else {
                b
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    pick.get(1).map(|m| m.as_str())
}

fn lookup(label: &str) -> Result<&'static Encoding, ConvertError> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| ConvertError::UnknownCharset(label.to_string()))
}

/// Decode a raw body. A byte-order mark wins over any declaration; after
/// that the declared or scanned charset is tried, then strict UTF-8, then a
/// lossy UTF-8 read.
pub fn decode_bytes(bytes: &[u8], declared: Option<&str>) -> (String, &'static Encoding) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (text.into_owned(), encoding);
    }
    let ascii_view = String::from_utf8_lossy(bytes);
    let encoding = resolve(&ascii_view, declared);
    match decode_strict(bytes, encoding) {
        Ok(text) => (text, encoding),
        Err(err) => {
            warn!("{err}, retrying as UTF-8");
            match decode_strict(bytes, UTF_8) {
                Ok(text) => (text, UTF_8),
                Err(err) => {
                    warn!("{err}, decoding lossily");
                    (ascii_view.into_owned(), UTF_8)
                }
            }
        }
    }
}

pub fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Result<String, ConvertError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or(ConvertError::DecodeFailure {
            charset: encoding.name(),
        })
}
