use crate::config::ConvertOptions;

use super::{normalize, normalize_document, normalize_with, PRESERVE_END, PRESERVE_START};

fn preserved(s: &str) -> String {
    format!("{}{}{}", PRESERVE_START, s, PRESERVE_END)
}

#[test]
fn collapses_spaces_and_blank_runs() {
    let input = "  a  b \n\n\n\nc\u{200B}d  \r\n";
    assert_eq!(normalize(input), "a b\n\ncd");
}

#[test]
fn normalize_is_idempotent() {
    let samples = [
        "  a  b \n\n\n\nc\u{200B}d  \r\n",
        "x **** y\n\n**open\nSame\nSame",
        "\u{FEFF}head\u{00A0}\u{00A0}tail\u{2028}next",
        "a \t b\n\t\tc",
        "",
        "\n\n\n",
    ];
    for sample in samples {
        let once = normalize(sample);
        assert_eq!(normalize(&once), once, "input {:?}", sample);
    }
}

#[test]
fn suppresses_repeated_lines() {
    let out = normalize("Same line\nOther\nSame line\n\nSame line");
    assert_eq!(out.matches("Same line").count(), 1);
    assert_eq!(out, "Same line\nOther");
}

#[test]
fn keeps_repeated_lines_when_disabled() {
    let opts = ConvertOptions {
        dedupe_lines: false,
        ..ConvertOptions::default()
    };
    assert_eq!(normalize_with("x\nx", &opts), "x\nx");
}

#[test]
fn tab_runs_stay_tabs() {
    assert_eq!(normalize("a \t b\t\tc"), "a\tb\tc");
}

#[test]
fn nbsp_and_separators() {
    assert_eq!(normalize("a\u{00A0}\u{00A0}b"), "a b");
    assert_eq!(normalize("one\u{2029}two"), "one\ntwo");
    assert_eq!(normalize("soft\u{00AD}hyphen"), "softhyphen");
}

#[test]
fn repairs_markers_per_line() {
    assert_eq!(normalize("a **** b\n**open"), "a b\nopen");
}

#[test]
fn preserved_lines_are_verbatim() {
    let input = format!("{}\nx\nx", preserved("  code\n  code"));
    let out = normalize_document(&input, &ConvertOptions::default());
    assert_eq!(out, "  code\n  code\nx");
}

#[test]
fn preserved_markers_are_dropped_by_public_normalize() {
    assert_eq!(normalize(&preserved("  x  ")), "x");
}

#[test]
fn placeholder_only_result_falls_back_to_light_clean() {
    let input = vec!["[Image]"; 5].join("\n");
    let out = normalize(&input);
    assert_eq!(out, input);
}

#[test]
fn single_placeholder_is_kept() {
    assert_eq!(normalize(" [Image] "), "[Image]");
}
