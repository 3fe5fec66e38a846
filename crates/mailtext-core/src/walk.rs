use std::panic::{self, AssertUnwindSafe};

use kuchiki::iter::NodeEdge;
use kuchiki::traits::*;
use kuchiki::{ElementData, NodeRef};

use crate::annotate;
use crate::config::ConvertOptions;
use crate::entities::{self, NumericPolicy};
use crate::error::ConvertError;
use crate::normalize::strip_sentinels;
use crate::types::{MarkupDocument, TagRole};

mod state;

use state::{LinkCollector, ListFrame, OutputBuffer, VisitorState};

pub(crate) const RULE: &str = "----------";
const BOLD: &str = "**";
const STRIKE: &str = "~~";

/// Convert a document by walking its parsed body once. Fails only when no
/// tree can be built, in which case the caller switches converters.
pub fn walk(document: &MarkupDocument, opts: &ConvertOptions) -> Result<String, ConvertError> {
    let body = parse_body(document.raw())?;
    let mut walker = Walker::new(opts);
    for edge in body.traverse() {
        match edge {
            NodeEdge::Start(node) => walker.enter(&node),
            NodeEdge::End(node) => walker.exit(&node),
        }
    }
    Ok(walker.finish())
}

/// Every `&` is escaped before parsing, so the tree builder keeps character
/// references literal and the walker decodes them with its own policy.
pub(crate) fn parse_body(raw: &str) -> Result<NodeRef, ConvertError> {
    let raw = strip_sentinels(raw).replace('&', "&amp;");
    let document = panic::catch_unwind(AssertUnwindSafe(|| kuchiki::parse_html().one(raw)))
        .map_err(|_| ConvertError::ParseUnavailable("tree builder panicked".into()))?;
    document
        .select_first("body")
        .map(|body| body.as_node().clone())
        .map_err(|_| ConvertError::ParseUnavailable("document has no body".into()))
}

fn heading_marks(level: u8) -> (&'static str, &'static str) {
    match level {
        1 => ("=== ", " ==="),
        2 => ("== ", " =="),
        3 => ("= ", " ="),
        _ => ("", ""),
    }
}

struct Walker<'o> {
    opts: &'o ConvertOptions,
    policy: NumericPolicy,
    state: VisitorState,
    /// Whether each open `b`/`s` element emitted its marker.
    emphasis: Vec<bool>,
    out: OutputBuffer,
}

impl<'o> Walker<'o> {
    fn new(opts: &'o ConvertOptions) -> Self {
        Self {
            opts,
            policy: opts.numeric_policy(),
            state: VisitorState::default(),
            emphasis: Vec::new(),
            out: OutputBuffer::new(opts.quote_first_line_only),
        }
    }

    fn enter(&mut self, node: &NodeRef) {
        if let Some(el) = node.as_element() {
            if self.state.skip_depth > 0 {
                self.state.skip_depth += 1;
                return;
            }
            let tag = el.name.local.to_lowercase();
            self.enter_element(TagRole::of(&tag), el);
        } else if let Some(text) = node.as_text() {
            if self.state.skip_depth == 0 {
                self.on_text(&text.borrow());
            }
        }
    }

    fn exit(&mut self, node: &NodeRef) {
        let Some(el) = node.as_element() else {
            return;
        };
        if self.state.skip_depth > 0 {
            self.state.skip_depth -= 1;
            return;
        }
        let tag = el.name.local.to_lowercase();
        self.exit_element(TagRole::of(&tag));
    }

    fn enter_element(&mut self, role: TagRole, el: &ElementData) {
        match role {
            TagRole::Block | TagRole::Paragraph => self.out.ensure_newline(),
            TagRole::Heading(level) => {
                self.out.ensure_newline();
                self.out.open(heading_marks(level).0);
            }
            TagRole::List { ordered } => {
                // an item opening straight into a sublist shows only the inner bullet
                if let Some(parent) = self.state.lists.last() {
                    self.out.discard(&parent.bullet);
                }
                self.out.ensure_newline();
                self.state.lists.push(ListFrame {
                    ordered,
                    counter: 0,
                    bullet: String::new(),
                });
            }
            TagRole::ListItem => {
                self.out.ensure_newline();
                let bullet = self.state.next_bullet();
                self.out.open(&bullet);
            }
            TagRole::Break => self.line_break(),
            TagRole::Rule => {
                self.out.ensure_newline();
                self.out.push_text(RULE);
                self.out.newline();
            }
            TagRole::Preformatted => {
                self.out.ensure_newline();
                if self.state.enter_pre() {
                    self.out.begin_preserved();
                }
            }
            TagRole::Code => self.state.enter_code(),
            TagRole::Quote => {
                self.out.ensure_newline();
                self.out.enter_quote();
            }
            TagRole::Row => {
                self.out.ensure_newline();
                self.state.rows.push(0);
            }
            TagRole::Cell => {
                let collecting = self.state.is_collecting_link_text();
                if let Some(cells) = self.state.rows.last_mut() {
                    if *cells > 0 && !collecting {
                        self.out.push_text("\t");
                    }
                    *cells += 1;
                }
            }
            TagRole::Anchor => self.start_link(el),
            TagRole::Image => self.image(el),
            TagRole::Bold => self.open_emphasis(BOLD),
            TagRole::Strike => self.open_emphasis(STRIKE),
            TagRole::Skip => self.state.skip_depth = 1,
            TagRole::Other => {}
        }
    }

    fn exit_element(&mut self, role: TagRole) {
        match role {
            TagRole::Paragraph => self.out.ensure_blank_line(),
            TagRole::Block => self.out.ensure_newline(),
            TagRole::Heading(level) => {
                let (open, close) = heading_marks(level);
                self.out.close(open, close);
                self.out.ensure_blank_line();
            }
            TagRole::List { .. } => {
                self.state.lists.pop();
                self.out.ensure_newline();
            }
            TagRole::ListItem => {
                let bullet = self.state.current_bullet();
                self.out.close(&bullet, "");
                self.out.ensure_newline();
            }
            TagRole::Preformatted => {
                if self.state.exit_pre() {
                    self.out.end_preserved();
                }
                self.out.ensure_newline();
            }
            TagRole::Code => self.state.exit_code(),
            TagRole::Quote => {
                self.out.exit_quote();
                self.out.ensure_newline();
            }
            TagRole::Row => {
                self.state.rows.pop();
                self.out.ensure_newline();
            }
            TagRole::Anchor => self.finish_link(),
            TagRole::Bold => self.close_emphasis(BOLD),
            TagRole::Strike => self.close_emphasis(STRIKE),
            _ => {}
        }
    }

    fn on_text(&mut self, raw: &str) {
        let decoded = entities::decode_with(raw, self.policy);
        if self.state.in_preformatted() {
            match self.state.link.as_mut() {
                Some(link) => link.text.push_str(&decoded),
                None => self.out.push_text(&decoded),
            }
            return;
        }
        let collapsed = collapse_whitespace(&decoded);
        if collapsed.is_empty() {
            return;
        }
        if let Some(link) = self.state.link.as_mut() {
            link.text.push_str(&collapsed);
            return;
        }
        let text = if self.out.ends_with_space_or_break() {
            collapsed.trim_start()
        } else {
            collapsed.as_str()
        };
        self.out.push_text(text);
    }

    fn line_break(&mut self) {
        match self.state.link.as_mut() {
            Some(link) => link.text.push(' '),
            None => self.out.newline(),
        }
    }

    fn start_link(&mut self, el: &ElementData) {
        let href = el
            .attributes
            .borrow()
            .get("href")
            .map(|href| entities::decode_with(href, self.policy));
        let Some(href) = href.filter(|h| annotate::is_followable(h)) else {
            return;
        };
        self.finish_link();
        self.state.link = Some(LinkCollector {
            href,
            text: String::new(),
        });
    }

    fn finish_link(&mut self) {
        let Some(LinkCollector { href, text }) = self.state.link.take() else {
            return;
        };
        let rendered = annotate::render_link(&href, &text, self.opts);
        if text.starts_with(char::is_whitespace) && !self.out.ends_with_space_or_break() {
            self.out.push_text(" ");
        }
        self.out.push_text(&rendered);
        if text.ends_with(char::is_whitespace) {
            self.out.push_text(" ");
        }
    }

    fn image(&mut self, el: &ElementData) {
        let attrs = el.attributes.borrow();
        if is_tracking_pixel(&attrs) {
            return;
        }
        let alt = attrs
            .get("alt")
            .or_else(|| attrs.get("title"))
            .map(|alt| entities::decode_with(alt, self.policy).trim().to_string())
            .filter(|alt| !alt.is_empty());
        if let Some(link) = self.state.link.as_mut() {
            if let Some(alt) = alt {
                if !link.text.is_empty() && !link.text.ends_with(' ') {
                    link.text.push(' ');
                }
                link.text.push_str(&alt);
            }
            return;
        }
        let rendered = annotate::render_image(alt.as_deref());
        if !self.out.ends_with_space_or_break() {
            self.out.push_text(" ");
        }
        self.out.push_text(&rendered);
    }

    fn open_emphasis(&mut self, marker: &str) {
        let allowed = self.state.allows_markers();
        if allowed {
            self.out.open(marker);
        }
        self.emphasis.push(allowed);
    }

    fn close_emphasis(&mut self, marker: &str) {
        if self.emphasis.pop() == Some(true) {
            self.out.close(marker, marker);
        }
    }

    fn finish(mut self) -> String {
        self.finish_link();
        if self.state.exit_pre() {
            self.out.end_preserved();
        }
        self.out.into_string()
    }
}

/// 1x1 images are read receipts, not content.
fn is_tracking_pixel(attrs: &kuchiki::Attributes) -> bool {
    fn dimension(value: Option<&str>) -> Option<u32> {
        let digits: String = value?.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
    matches!(
        (dimension(attrs.get("width")), dimension(attrs.get("height"))),
        (Some(w), Some(h)) if w <= 1 && h <= 1
    )
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests;
