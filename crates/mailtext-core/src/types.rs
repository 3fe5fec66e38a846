use encoding_rs::Encoding;

/// Raw markup plus the charset chosen for it. Built once per conversion.
#[derive(Clone, Debug)]
pub struct MarkupDocument {
    raw: String,
    charset: &'static Encoding,
}

impl MarkupDocument {
    pub fn new(raw: impl Into<String>, charset: &'static Encoding) -> Self {
        Self {
            raw: raw.into(),
            charset,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn charset(&self) -> &'static Encoding {
        self.charset
    }
}

/// What an anchor's `href` points at. Drives the link annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkKind {
    Image,
    Mail(String),
    Phone(String),
    Web,
}

/// Structural role of an element in the tree walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagRole {
    Block,
    Paragraph,
    Heading(u8),
    List { ordered: bool },
    ListItem,
    Break,
    Rule,
    Preformatted,
    Code,
    Quote,
    Row,
    Cell,
    Anchor,
    Image,
    Bold,
    Strike,
    Skip,
    Other,
}

impl TagRole {
    pub fn of(tag: &str) -> Self {
        if let Some(level) = heading_level(tag) {
            return TagRole::Heading(level);
        }
        match tag {
            "p" => TagRole::Paragraph,
            "div" | "section" | "article" | "header" | "footer" | "nav" | "aside" | "table"
            | "main" | "figure" | "figcaption" | "address" | "center" | "form" | "fieldset"
            | "dl" | "dt" | "dd" | "tbody" | "thead" | "tfoot" | "caption" => TagRole::Block,
            "ul" => TagRole::List { ordered: false },
            "ol" => TagRole::List { ordered: true },
            "li" => TagRole::ListItem,
            "br" => TagRole::Break,
            "hr" => TagRole::Rule,
            "pre" => TagRole::Preformatted,
            "code" | "kbd" | "samp" | "tt" => TagRole::Code,
            "blockquote" => TagRole::Quote,
            "tr" => TagRole::Row,
            "td" | "th" => TagRole::Cell,
            "a" => TagRole::Anchor,
            "img" => TagRole::Image,
            "b" | "strong" => TagRole::Bold,
            "s" | "strike" | "del" => TagRole::Strike,
            "script" | "style" | "noscript" | "iframe" | "object" | "embed" | "applet" | "head"
            | "template" | "title" => TagRole::Skip,
            _ => TagRole::Other,
        }
    }
}

fn heading_level(tag: &str) -> Option<u8> {
    (tag.len() == 2 && tag.starts_with('h'))
        .then(|| tag[1..].parse::<u8>().ok())
        .flatten()
        .filter(|lvl| (1..=6).contains(lvl))
}
