use crate::normalize::{PRESERVE_END, PRESERVE_START};

pub(crate) const QUOTE_PREFIX: &str = "> ";

/// Anchor whose text is being gathered until its end tag.
pub(crate) struct LinkCollector {
    pub(crate) href: String,
    pub(crate) text: String,
}

pub(crate) struct ListFrame {
    pub(crate) ordered: bool,
    pub(crate) counter: usize,
    pub(crate) bullet: String,
}

/// Flags and stacks threaded through one traversal.
#[derive(Default)]
pub(crate) struct VisitorState {
    pre_depth: usize,
    code_depth: usize,
    pub(crate) link: Option<LinkCollector>,
    /// Open elements inside a skipped subtree, including its root.
    pub(crate) skip_depth: usize,
    pub(crate) lists: Vec<ListFrame>,
    /// Cells seen so far in each open row.
    pub(crate) rows: Vec<usize>,
}

impl VisitorState {
    pub(crate) fn in_preformatted(&self) -> bool {
        self.pre_depth > 0
    }

    pub(crate) fn in_inline_code(&self) -> bool {
        self.code_depth > 0
    }

    pub(crate) fn is_collecting_link_text(&self) -> bool {
        self.link.is_some()
    }

    /// Returns true when this is the outermost `pre`.
    pub(crate) fn enter_pre(&mut self) -> bool {
        self.pre_depth += 1;
        self.pre_depth == 1
    }

    /// Returns true when the outermost `pre` closed.
    pub(crate) fn exit_pre(&mut self) -> bool {
        let was_outermost = self.pre_depth == 1;
        self.pre_depth = self.pre_depth.saturating_sub(1);
        was_outermost
    }

    pub(crate) fn enter_code(&mut self) {
        self.code_depth += 1;
    }

    pub(crate) fn exit_code(&mut self) {
        self.code_depth = self.code_depth.saturating_sub(1);
    }

    /// Inline emphasis markers are only emitted in plain flowing text.
    pub(crate) fn allows_markers(&self) -> bool {
        !self.in_preformatted() && !self.in_inline_code() && !self.is_collecting_link_text()
    }

    pub(crate) fn next_bullet(&mut self) -> String {
        let Some(frame) = self.lists.last_mut() else {
            return "• ".to_string();
        };
        frame.counter += 1;
        frame.bullet = if frame.ordered {
            format!("{}. ", frame.counter)
        } else {
            "• ".to_string()
        };
        frame.bullet.clone()
    }

    pub(crate) fn current_bullet(&self) -> String {
        self.lists
            .last()
            .map(|frame| frame.bullet.clone())
            .unwrap_or_else(|| "• ".to_string())
    }
}

/// Text produced by the walk. Openers (heading marks, bullets, emphasis) wait
/// in `pending` until real content follows, so empty elements leave nothing
/// behind. Lines started inside a blockquote get the quote prefix.
pub(crate) struct OutputBuffer {
    text: String,
    pending: String,
    line_start: bool,
    newline_run: usize,
    last_is_space: bool,
    quote_depth: usize,
    first_line_only: bool,
    quote_line_pending: bool,
}

impl OutputBuffer {
    pub(crate) fn new(first_line_only: bool) -> Self {
        Self {
            text: String::new(),
            pending: String::new(),
            line_start: true,
            newline_run: 0,
            last_is_space: false,
            quote_depth: 0,
            first_line_only,
            quote_line_pending: false,
        }
    }

    /// True when a following space would be redundant. Queued openers don't
    /// count, so `a <b> b</b>` keeps the marker against its word.
    pub(crate) fn ends_with_space_or_break(&self) -> bool {
        self.line_start || self.last_is_space
    }

    pub(crate) fn push_text(&mut self, s: &str) {
        for ch in s.chars() {
            if ch != '\n' && !self.pending.is_empty() {
                let pending = std::mem::take(&mut self.pending);
                for p in pending.chars() {
                    self.push_char(p);
                }
            }
            self.push_char(ch);
        }
    }

    fn push_char(&mut self, ch: char) {
        if ch == '\n' {
            self.text.push('\n');
            self.line_start = true;
            self.newline_run += 1;
            self.last_is_space = false;
            return;
        }
        if self.line_start && self.quote_depth > 0 {
            let prefix = !self.first_line_only || self.quote_line_pending;
            if prefix {
                for _ in 0..self.quote_depth {
                    self.text.push_str(QUOTE_PREFIX);
                }
                self.quote_line_pending = false;
            }
        }
        self.text.push(ch);
        self.line_start = false;
        self.newline_run = 0;
        self.last_is_space = ch == ' ' || ch == '\t';
    }

    pub(crate) fn newline(&mut self) {
        self.push_char('\n');
    }

    pub(crate) fn ensure_newline(&mut self) {
        if !self.text.is_empty() && !self.line_start {
            self.push_char('\n');
        }
    }

    pub(crate) fn ensure_blank_line(&mut self) {
        if self.text.is_empty() {
            return;
        }
        self.ensure_newline();
        while self.newline_run < 2 {
            self.push_char('\n');
        }
    }

    /// Queue an opener that only appears if content follows it.
    pub(crate) fn open(&mut self, marker: &str) {
        self.pending.push_str(marker);
    }

    /// Drop a queued opener that never got content. Returns whether it was
    /// still queued.
    pub(crate) fn discard(&mut self, opener: &str) -> bool {
        if !self.pending.ends_with(opener) {
            return false;
        }
        let keep = self.pending.len() - opener.len();
        self.pending.truncate(keep);
        true
    }

    /// Drop the matching opener if nothing followed it, otherwise emit the
    /// closer.
    pub(crate) fn close(&mut self, opener: &str, closer: &str) {
        if !self.discard(opener) {
            self.push_text(closer);
        }
    }

    pub(crate) fn enter_quote(&mut self) {
        self.quote_depth += 1;
        self.quote_line_pending = true;
    }

    pub(crate) fn exit_quote(&mut self) {
        self.quote_depth = self.quote_depth.saturating_sub(1);
    }

    pub(crate) fn begin_preserved(&mut self) {
        self.text.push(PRESERVE_START);
    }

    pub(crate) fn end_preserved(&mut self) {
        self.text.push(PRESERVE_END);
    }

    pub(crate) fn into_string(self) -> String {
        self.text
    }
}
