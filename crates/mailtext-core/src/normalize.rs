use std::collections::HashSet;

use tracing::debug;

use crate::annotate::{IMAGE_LINK_PLACEHOLDER, IMAGE_PLACEHOLDER};
use crate::config::ConvertOptions;

mod markers;

pub(crate) use markers::repair_markers;

/// Brackets text from a `pre` element: kept verbatim, never deduplicated.
pub(crate) const PRESERVE_START: char = '\x02';
pub(crate) const PRESERVE_END: char = '\x03';

const ZERO_WIDTH: [char; 6] = [
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{200E}', '\u{200F}', '\u{FEFF}',
];

/// How much longer the lightly cleaned text must be before a degenerate full
/// cleanup is rejected.
const DEGENERATE_RATIO: usize = 4;

#[derive(Clone, Debug)]
struct Line {
    text: String,
    preserved: bool,
}

/// Final cleanup with default options.
pub fn normalize(text: &str) -> String {
    normalize_with(text, &ConvertOptions::default())
}

/// Final cleanup for arbitrary text. Preformatted markers are not honoured
/// here, so the result is a fixed point: `normalize(normalize(t)) ==
/// normalize(t)`.
pub fn normalize_with(text: &str, opts: &ConvertOptions) -> String {
    normalize_document(&strip_sentinels(text), opts)
}

/// Remove `pre` bracket characters that arrived as content, so only the
/// walker can open a preserved region.
pub(crate) fn strip_sentinels(text: &str) -> String {
    text.replace([PRESERVE_START, PRESERVE_END], "")
}

/// Cleanup for converter output, where `pre` regions are bracketed.
pub(crate) fn normalize_document(text: &str, opts: &ConvertOptions) -> String {
    let light = light_clean(split_lines(text));
    let full = full_clean(light.clone(), opts);
    let light_text = join(&light);
    let full_text = join(&full);
    if is_degenerate(&full_text, &light_text) {
        debug!(
            light = light_text.len(),
            full = full_text.len(),
            "cleanup reduced text to a placeholder, keeping lightly cleaned text"
        );
        return light_text;
    }
    full_text
}

fn split_lines(text: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut in_pre = false;
    let mut touched_pre = false;
    for ch in text.chars() {
        match ch {
            PRESERVE_START => {
                in_pre = true;
                touched_pre = true;
            }
            PRESERVE_END => in_pre = false,
            '\n' => {
                lines.push(Line {
                    text: std::mem::take(&mut current),
                    preserved: touched_pre,
                });
                touched_pre = in_pre;
            }
            _ => current.push(ch),
        }
    }
    lines.push(Line {
        text: current,
        preserved: touched_pre,
    });
    lines
}

/// Character cleanup, whitespace collapsing and blank-line limiting.
fn light_clean(lines: Vec<Line>) -> Vec<Line> {
    let lines = lines
        .into_iter()
        .flat_map(|line| {
            let text = clean_chars(&line.text);
            if line.preserved {
                vec![Line { text, ..line }]
            } else {
                // line and paragraph separators split like a newline
                text.split(['\u{2028}', '\u{2029}'])
                    .map(|part| Line {
                        text: collapse_line(part),
                        preserved: false,
                    })
                    .collect()
            }
        })
        .collect();
    limit_blank_lines(lines)
}

/// Marker repair and duplicate suppression on top of a light clean.
fn full_clean(lines: Vec<Line>, opts: &ConvertOptions) -> Vec<Line> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        if line.preserved {
            out.push(line);
            continue;
        }
        let text = collapse_line(&repair_markers(&line.text));
        if opts.dedupe_lines && !text.is_empty() && !seen.insert(text.clone()) {
            continue;
        }
        out.push(Line {
            text,
            preserved: false,
        });
    }
    limit_blank_lines(out)
}

fn clean_chars(s: &str) -> String {
    s.chars()
        .filter(|c| !ZERO_WIDTH.contains(c) && *c != '\r' && *c != '\u{00AD}')
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect()
}

/// Collapse horizontal whitespace and trim both ends. A run containing a
/// tab stays a tab so table cells remain separated.
fn collapse_line(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut run: Option<char> = None;
    for ch in s.chars() {
        if ch.is_whitespace() {
            run = match run {
                Some('\t') => Some('\t'),
                _ if ch == '\t' => Some('\t'),
                _ => Some(' '),
            };
            continue;
        }
        if let Some(ws) = run.take() {
            if !out.is_empty() {
                out.push(ws);
            }
        }
        out.push(ch);
    }
    out
}

/// At most one empty line in a row, none at either end.
fn limit_blank_lines(lines: Vec<Line>) -> Vec<Line> {
    let mut out: Vec<Line> = Vec::with_capacity(lines.len());
    for line in lines {
        let blank = !line.preserved && line.text.is_empty();
        if blank {
            let previous_blank = out.last().map_or(true, |prev| prev.text.is_empty());
            if previous_blank {
                continue;
            }
        }
        out.push(line);
    }
    while out
        .last()
        .is_some_and(|line| !line.preserved && line.text.is_empty())
    {
        out.pop();
    }
    out
}

fn join(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_degenerate(full: &str, light: &str) -> bool {
    let full = full.trim();
    let placeholder_only = full == IMAGE_PLACEHOLDER || full == IMAGE_LINK_PLACEHOLDER;
    placeholder_only && light.trim().len() >= full.len() * DEGENERATE_RATIO
}

/// Whitespace-only pass used by the pattern converter.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    join(&light_clean(split_lines(text)))
}

#[cfg(test)]
mod tests;
