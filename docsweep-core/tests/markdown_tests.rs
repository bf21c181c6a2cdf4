// Tests for Markdown conversion and plain-text rendering

use docsweep_core::markdown::{normalize_and_convert, plain_text};

// ============================================================================
// Generic Conversion Tests
// ============================================================================

#[test]
fn test_empty_fragment_converts_to_empty_string() {
    assert_eq!(normalize_and_convert(""), "");
    assert_eq!(normalize_and_convert("   \n"), "");
}

#[test]
fn test_headings_use_atx_style() {
    let markdown = normalize_and_convert("<h2>Setup</h2><p>Install the agent.</p>");
    assert!(markdown.contains("## Setup"), "{markdown}");
    assert!(markdown.contains("Install the agent."));
}

fn bullet(markdown: &str, item: &str) -> Option<char> {
    markdown
        .lines()
        .find(|line| line.trim_end().ends_with(item))
        .and_then(|line| line.trim_start().chars().next())
}

#[test]
fn test_bullets_use_hyphens() {
    let markdown = normalize_and_convert("<ul><li>one</li><li>two</li></ul>");
    assert_eq!(bullet(&markdown, "one"), Some('-'), "{markdown}");
    assert_eq!(bullet(&markdown, "two"), Some('-'));
    assert!(!markdown.contains('*'));
}

#[test]
fn test_links_are_kept() {
    let markdown = normalize_and_convert("<p>See <a href=\"https://vendor.example/docs/x\">docs</a></p>");
    assert!(markdown.contains("https://vendor.example/docs/x"));
}

// ============================================================================
// Table Normalization Tests
// ============================================================================

#[test]
fn test_spanned_table_becomes_simple_table() {
    let markdown = normalize_and_convert(
        "<p>Limits</p>\
         <table>\
           <tr><td rowspan=\"2\" colspan=\"2\">X</td><td>a</td></tr>\
           <tr><td>b</td></tr>\
         </table>",
    );

    assert!(markdown.contains("| X | X | a |"), "{markdown}");
    assert!(markdown.contains("| X | X | b |"));
    assert!(markdown.contains("| --- | --- | --- |"));
    assert!(!markdown.contains("rowspan"));
    assert!(!markdown.contains("colspan"));
}

#[test]
fn test_tables_keep_document_order() {
    let markdown = normalize_and_convert(
        "<h2>First</h2><table><tr><td>one</td></tr></table>\
         <h2>Second</h2><table><tr><td>two</td></tr></table>",
    );

    let first = markdown.find("| one |").unwrap();
    let second_heading = markdown.find("## Second").unwrap();
    let second = markdown.find("| two |").unwrap();
    assert!(first < second_heading && second_heading < second, "{markdown}");
}

#[test]
fn test_broken_table_does_not_abort_other_tables() {
    let markdown = normalize_and_convert(
        "<table></table>\
         <p>middle</p>\
         <table><tr><td>k</td><td>v</td></tr></table>",
    );

    assert!(markdown.contains("middle"));
    assert!(markdown.contains("| k | v |"), "{markdown}");
}

#[test]
fn test_empty_table_falls_back_to_original_markup() {
    let markdown = normalize_and_convert(
        "<p>before</p><table><tr><td></td><td></td></tr></table><p>after</p>",
    );

    assert!(markdown.contains("before"));
    assert!(markdown.contains("after"));
    assert!(!markdown.contains("DOCSWEEPTABLE"));
}

#[test]
fn test_table_inside_list_item_stays_in_the_item() {
    let markdown = normalize_and_convert(
        "<ul>\
           <li>Item<table><tr><td>a</td><td>b</td></tr></table></li>\
           <li><table><tr><td>c</td><td>d</td></tr></table></li>\
           <li>Next</li>\
         </ul>",
    );

    assert!(markdown.contains("    | a | b |\n    | --- | --- |"), "{markdown}");
    let second = markdown
        .lines()
        .find(|line| line.contains("| c | d |"))
        .unwrap();
    assert!(second.starts_with('-'), "{markdown}");
    assert!(markdown.contains("    | --- | --- |\n"));

    let item = markdown.find("Item").unwrap();
    let table = markdown.find("| a | b |").unwrap();
    let next = markdown.find("Next").unwrap();
    assert!(item < table && table < next);
    assert_eq!(bullet(&markdown, "Next"), Some('-'));
}

#[test]
fn test_placeholder_text_in_document_is_left_alone() {
    let markdown = normalize_and_convert(
        "<p>Literal DOCSWEEPTABLE0END marker</p>\
         <table><tr><td>k</td><td>v</td></tr></table>",
    );

    assert!(markdown.contains("Literal DOCSWEEPTABLE0END marker"), "{markdown}");
    assert_eq!(markdown.matches("| k | v |").count(), 1);
}

#[test]
fn test_table_cells_keep_line_breaks_as_spaces() {
    let markdown = normalize_and_convert(
        "<table><tr><th>a*b*</th><th>x</th></tr><tr><td>line1<br>line2</td><td>link</td></tr></table>",
    );

    assert!(markdown.contains("| a\\*b\\* | x |"), "{markdown}");
    assert!(markdown.contains("| line1 line2 | link |"));
}

#[test]
fn test_oversized_table_keeps_its_text() {
    let markdown = normalize_and_convert(
        "<table><tr><td rowspan=\"5000\" colspan=\"5000\">huge</td></tr></table>",
    );

    assert!(markdown.contains("huge"));
}

// ============================================================================
// Byte Order Mark Tests
// ============================================================================

#[test]
fn test_markdown_strips_byte_order_mark() {
    let markdown = normalize_and_convert("<p>\u{feff}Hello\u{feff} world</p>");
    assert!(!markdown.contains('\u{feff}'));
    assert!(markdown.contains("Hello world"));
}

#[test]
fn test_plain_text_strips_byte_order_mark() {
    let text = plain_text("<div>\u{feff}Alpha</div>");
    assert_eq!(text, "Alpha");
}

// ============================================================================
// Plain Text Tests
// ============================================================================

#[test]
fn test_plain_text_puts_each_text_node_on_its_own_line() {
    let text = plain_text("<p>Line one</p><p>  Line two </p><div>A<span>B</span></div>");
    assert_eq!(text, "Line one\nLine two\nA\nB");
}

#[test]
fn test_plain_text_drops_whitespace_only_nodes() {
    let text = plain_text("<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>");
    assert_eq!(text, "a\nb");
}

#[test]
fn test_plain_text_decodes_entities() {
    assert_eq!(plain_text("<p>1 &lt; 2 &amp;&amp; 3</p>"), "1 < 2 && 3");
}
