const MARKERS: [&str; 2] = ["**", "~~"];

enum Token<'a> {
    Text(&'a str),
    Marker(&'static str),
}

fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;
    while i < line.len() {
        let marker = MARKERS.iter().find(|m| line[i..].starts_with(**m));
        match marker {
            Some(marker) => {
                if text_start < i {
                    tokens.push(Token::Text(&line[text_start..i]));
                }
                tokens.push(Token::Marker(*marker));
                i += marker.len();
                text_start = i;
            }
            None => {
                i += line[i..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }
    if text_start < line.len() {
        tokens.push(Token::Text(&line[text_start..]));
    }
    tokens
}

struct Open {
    index: usize,
    marker: &'static str,
    has_content: bool,
}

fn repair_once(line: &str) -> String {
    let tokens = tokenize(line);
    let mut keep = vec![true; tokens.len()];
    let mut stack: Vec<Open> = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        match token {
            Token::Text(text) => {
                if !text.trim().is_empty() {
                    for open in &mut stack {
                        open.has_content = true;
                    }
                }
            }
            Token::Marker(marker) => {
                let Some(pos) = stack.iter().rposition(|o| o.marker == *marker) else {
                    stack.push(Open {
                        index,
                        marker: *marker,
                        has_content: false,
                    });
                    continue;
                };
                // crossed pairs: whatever opened inside this one is dropped
                for inner in stack.drain(pos + 1..) {
                    keep[inner.index] = false;
                }
                if let Some(open) = stack.pop() {
                    if !open.has_content {
                        keep[open.index] = false;
                        keep[index] = false;
                    }
                }
            }
        }
    }
    for open in stack {
        keep[open.index] = false;
    }
    let mut out = String::with_capacity(line.len());
    for (token, kept) in tokens.iter().zip(keep) {
        if !kept {
            continue;
        }
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Marker(marker) => out.push_str(marker),
        }
    }
    out
}

/// Leave only well-nested `**`/`~~` pairs that wrap some content. Removing a
/// marker can glue stray asterisks into a new one, so repeat until stable.
pub(crate) fn repair_markers(line: &str) -> String {
    if !MARKERS.iter().any(|m| line.contains(*m)) {
        return line.to_string();
    }
    let mut current = line.to_string();
    loop {
        let next = repair_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
