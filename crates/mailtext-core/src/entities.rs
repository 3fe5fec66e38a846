use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Longest reference body (between `&` and `;`) we try to interpret.
const MAX_ENTITY_LEN: usize = 32;

/// How numeric references (`&#65;`, `&#x41;`) are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericPolicy {
    /// Only printable ASCII (32..=126) is decoded; anything else stays verbatim.
    PrintableAscii,
    /// Any valid Unicode scalar value is decoded.
    Unicode,
}

static ENTITIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        // core
        ("amp", "&"),
        ("lt", "<"),
        ("gt", ">"),
        ("quot", "\""),
        ("apos", "'"),
        ("nbsp", " "),
        // punctuation
        ("hellip", "..."),
        ("mdash", "\u{2014}"),
        ("ndash", "\u{2013}"),
        ("lsquo", "\u{2018}"),
        ("rsquo", "\u{2019}"),
        ("sbquo", "\u{201A}"),
        ("ldquo", "\u{201C}"),
        ("rdquo", "\u{201D}"),
        ("bdquo", "\u{201E}"),
        ("laquo", "\u{00AB}"),
        ("raquo", "\u{00BB}"),
        ("lsaquo", "\u{2039}"),
        ("rsaquo", "\u{203A}"),
        ("bull", "\u{2022}"),
        ("middot", "\u{00B7}"),
        ("dagger", "\u{2020}"),
        ("Dagger", "\u{2021}"),
        ("prime", "\u{2032}"),
        ("Prime", "\u{2033}"),
        ("iexcl", "\u{00A1}"),
        ("iquest", "\u{00BF}"),
        ("sect", "\u{00A7}"),
        ("para", "\u{00B6}"),
        ("copy", "\u{00A9}"),
        ("reg", "\u{00AE}"),
        ("trade", "\u{2122}"),
        ("deg", "\u{00B0}"),
        ("shy", ""),
        ("ensp", " "),
        ("emsp", " "),
        ("thinsp", " "),
        ("zwnj", ""),
        ("zwj", ""),
        ("lrm", ""),
        ("rlm", ""),
        ("ordf", "\u{00AA}"),
        ("ordm", "\u{00BA}"),
        ("acute", "\u{00B4}"),
        ("cedil", "\u{00B8}"),
        ("uml", "\u{00A8}"),
        ("macr", "\u{00AF}"),
        ("brvbar", "\u{00A6}"),
        // latin letters
        ("Agrave", "\u{00C0}"),
        ("Aacute", "\u{00C1}"),
        ("Auml", "\u{00C4}"),
        ("Aring", "\u{00C5}"),
        ("AElig", "\u{00C6}"),
        ("Ccedil", "\u{00C7}"),
        ("Eacute", "\u{00C9}"),
        ("Ntilde", "\u{00D1}"),
        ("Ouml", "\u{00D6}"),
        ("Oslash", "\u{00D8}"),
        ("Uuml", "\u{00DC}"),
        ("szlig", "\u{00DF}"),
        ("agrave", "\u{00E0}"),
        ("aacute", "\u{00E1}"),
        ("acirc", "\u{00E2}"),
        ("auml", "\u{00E4}"),
        ("aring", "\u{00E5}"),
        ("aelig", "\u{00E6}"),
        ("ccedil", "\u{00E7}"),
        ("egrave", "\u{00E8}"),
        ("eacute", "\u{00E9}"),
        ("ecirc", "\u{00EA}"),
        ("euml", "\u{00EB}"),
        ("iacute", "\u{00ED}"),
        ("ntilde", "\u{00F1}"),
        ("oacute", "\u{00F3}"),
        ("ouml", "\u{00F6}"),
        ("oslash", "\u{00F8}"),
        ("uacute", "\u{00FA}"),
        ("uuml", "\u{00FC}"),
        // math
        ("times", "\u{00D7}"),
        ("divide", "\u{00F7}"),
        ("plusmn", "\u{00B1}"),
        ("minus", "\u{2212}"),
        ("frac12", "\u{00BD}"),
        ("frac14", "\u{00BC}"),
        ("frac34", "\u{00BE}"),
        ("sup1", "\u{00B9}"),
        ("sup2", "\u{00B2}"),
        ("sup3", "\u{00B3}"),
        ("micro", "\u{00B5}"),
        ("permil", "\u{2030}"),
        ("ne", "\u{2260}"),
        ("le", "\u{2264}"),
        ("ge", "\u{2265}"),
        ("asymp", "\u{2248}"),
        ("equiv", "\u{2261}"),
        ("infin", "\u{221E}"),
        ("sum", "\u{2211}"),
        ("prod", "\u{220F}"),
        ("radic", "\u{221A}"),
        ("part", "\u{2202}"),
        ("int", "\u{222B}"),
        ("forall", "\u{2200}"),
        ("exist", "\u{2203}"),
        ("empty", "\u{2205}"),
        ("isin", "\u{2208}"),
        ("notin", "\u{2209}"),
        ("cap", "\u{2229}"),
        ("cup", "\u{222A}"),
        ("and", "\u{2227}"),
        ("or", "\u{2228}"),
        ("not", "\u{00AC}"),
        ("loz", "\u{25CA}"),
        // greek
        ("Alpha", "\u{0391}"),
        ("Beta", "\u{0392}"),
        ("Gamma", "\u{0393}"),
        ("Delta", "\u{0394}"),
        ("Theta", "\u{0398}"),
        ("Lambda", "\u{039B}"),
        ("Pi", "\u{03A0}"),
        ("Sigma", "\u{03A3}"),
        ("Phi", "\u{03A6}"),
        ("Psi", "\u{03A8}"),
        ("Omega", "\u{03A9}"),
        ("alpha", "\u{03B1}"),
        ("beta", "\u{03B2}"),
        ("gamma", "\u{03B3}"),
        ("delta", "\u{03B4}"),
        ("epsilon", "\u{03B5}"),
        ("zeta", "\u{03B6}"),
        ("eta", "\u{03B7}"),
        ("theta", "\u{03B8}"),
        ("iota", "\u{03B9}"),
        ("kappa", "\u{03BA}"),
        ("lambda", "\u{03BB}"),
        ("mu", "\u{03BC}"),
        ("nu", "\u{03BD}"),
        ("xi", "\u{03BE}"),
        ("omicron", "\u{03BF}"),
        ("pi", "\u{03C0}"),
        ("rho", "\u{03C1}"),
        ("sigma", "\u{03C3}"),
        ("tau", "\u{03C4}"),
        ("upsilon", "\u{03C5}"),
        ("phi", "\u{03C6}"),
        ("chi", "\u{03C7}"),
        ("psi", "\u{03C8}"),
        ("omega", "\u{03C9}"),
        // currency
        ("cent", "\u{00A2}"),
        ("pound", "\u{00A3}"),
        ("curren", "\u{00A4}"),
        ("yen", "\u{00A5}"),
        ("euro", "\u{20AC}"),
        // arrows
        ("larr", "\u{2190}"),
        ("uarr", "\u{2191}"),
        ("rarr", "\u{2192}"),
        ("darr", "\u{2193}"),
        ("harr", "\u{2194}"),
        ("crarr", "\u{21B5}"),
        ("lArr", "\u{21D0}"),
        ("uArr", "\u{21D1}"),
        ("rArr", "\u{21D2}"),
        ("dArr", "\u{21D3}"),
        ("hArr", "\u{21D4}"),
    ]
    .into_iter()
    .collect()
});

/// Decode character references with the conservative numeric policy.
pub fn decode(text: &str) -> String {
    decode_with(text, NumericPolicy::PrintableAscii)
}

/// Decode named, decimal and hex references. Anything that is not a
/// recognised reference is copied through unchanged. Raw U+00A0 becomes a
/// plain space.
pub fn decode_with(text: &str, policy: NumericPolicy) -> String {
    if !text.contains('&') && !text.contains('\u{00A0}') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match reference_at(tail, policy) {
            Some((decoded, consumed)) => {
                out.push_str(&decoded);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    if out.contains('\u{00A0}') {
        out = out.replace('\u{00A0}', " ");
    }
    out
}

/// `tail` starts with `&`. Returns the replacement and the number of bytes
/// consumed when a complete reference is found.
fn reference_at(tail: &str, policy: NumericPolicy) -> Option<(String, usize)> {
    let window = &tail.as_bytes()[1..tail.len().min(MAX_ENTITY_LEN + 2)];
    let semi = window.iter().position(|&b| b == b';')?;
    let body = &tail[1..1 + semi];
    if body.is_empty() {
        return None;
    }
    let consumed = semi + 2;
    if let Some(numeric) = body.strip_prefix('#') {
        let code = parse_numeric(numeric)?;
        let ch = decode_code_point(code, policy)?;
        return Some((ch.to_string(), consumed));
    }
    if !body.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    ENTITIES
        .get(body)
        .map(|value| ((*value).to_string(), consumed))
}

fn parse_numeric(numeric: &str) -> Option<u32> {
    let (digits, radix) = match numeric.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 16),
        None => (numeric, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}

fn decode_code_point(code: u32, policy: NumericPolicy) -> Option<char> {
    match policy {
        NumericPolicy::PrintableAscii => (32..=126).contains(&code).then(|| code as u8 as char),
        NumericPolicy::Unicode => match code {
            0xA0 => Some(' '),
            0x09 | 0x0A | 0x0D => char::from_u32(code),
            0..=0x1F | 0x7F => None,
            _ => char::from_u32(code),
        },
    }
}
