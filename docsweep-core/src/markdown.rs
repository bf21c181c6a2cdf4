use crate::html::{self, Rewrite};
use crate::tables;
use htmd::HtmlToMarkdown;
use htmd::options::{BulletListMarker, HeadingStyle, Options};
use scraper::{ElementRef, Html};
use tracing::{debug, warn};

const BYTE_ORDER_MARK: char = '\u{feff}';

const PLACEHOLDER_STEM: &str = "DOCSWEEPTABLE";

/// Swaps each simplifiable table for a placeholder paragraph and keeps its
/// pipe-table rendering aside, so the generic pass never sees merged cells.
struct TableNormalizer {
    prefix: String,
    tables: Vec<String>,
    seen: usize,
}

impl TableNormalizer {
    /// `prefix` must not occur anywhere in the source document.
    fn new(prefix: String) -> Self {
        Self {
            prefix,
            tables: Vec::new(),
            seen: 0,
        }
    }

    fn placeholder(&self, index: usize) -> String {
        format!("{}{}END", self.prefix, index)
    }
}

impl Rewrite for TableNormalizer {
    fn element(&mut self, element: ElementRef<'_>, out: &mut String) -> bool {
        if element.value().name() != "table" {
            return false;
        }
        self.seen += 1;
        let ordinal = self.seen;

        match tables::simplify(element) {
            Ok(Some(grid)) => {
                debug!(
                    "table {}: {}x{} grid ({} header)",
                    ordinal,
                    grid.rows().len(),
                    grid.width(),
                    if grid.has_header { "source" } else { "promoted" }
                );
                out.push_str("<p>");
                out.push_str(&self.placeholder(self.tables.len()));
                out.push_str("</p>");
                self.tables.push(grid.to_markdown());
                true
            }
            Ok(None) => {
                debug!("table {} is empty after cleanup, keeping original markup", ordinal);
                false
            }
            Err(e) => {
                warn!("table {} could not be normalized ({}), keeping original markup", ordinal, e);
                false
            }
        }
    }
}

/// Converts a content fragment to Markdown, resolving merged table cells first.
pub fn normalize_and_convert(fragment: &str) -> String {
    if fragment.trim().is_empty() {
        return String::new();
    }

    let (normalized, prefix, tables) = {
        let document = Html::parse_fragment(fragment);
        let prefix = placeholder_prefix(fragment, &document);
        let mut normalizer = TableNormalizer::new(prefix);
        let mut out = String::with_capacity(fragment.len());
        html::write_children(document.root_element(), &mut out, &mut normalizer);
        (out, normalizer.prefix, normalizer.tables)
    };

    let converter = HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Dash,
            ..Default::default()
        })
        .build();

    let markdown = match converter.convert(&normalized) {
        Ok(markdown) => markdown,
        Err(e) => {
            warn!("Markdown conversion failed ({}), falling back to plain text", e);
            return plain_text(fragment);
        }
    };

    tidy(&splice_tables(&markdown, &prefix, &tables))
}

/// A placeholder stem absent from both the markup and its decoded text.
fn placeholder_prefix(fragment: &str, document: &Html) -> String {
    let text: String = document.root_element().text().collect();
    let mut prefix = PLACEHOLDER_STEM.to_string();
    while fragment.contains(&prefix) || text.contains(&prefix) {
        prefix.push('X');
    }
    prefix
}

/// Puts each table where its placeholder landed, indented to the placeholder's
/// column so a table inside a list item stays in that item.
fn splice_tables(markdown: &str, prefix: &str, tables: &[String]) -> String {
    let mut out = String::with_capacity(markdown.len() + tables.iter().map(String::len).sum::<usize>());

    for line in markdown.lines() {
        let Some((start, end, table)) = find_placeholder(line, prefix)
            .and_then(|(start, end, index)| tables.get(index).map(|table| (start, end, table)))
        else {
            out.push_str(line);
            out.push('\n');
            continue;
        };

        let (before, after) = (&line[..start], &line[end..]);
        let (lead, indent) = if is_block_prefix(before) {
            (before.to_string(), " ".repeat(before.chars().count()))
        } else {
            // Placeholder shares a line with text; give the table its own block
            let ws = &before[..before.len() - before.trim_start().len()];
            out.push_str(before.trim_end());
            out.push_str("\n\n");
            (ws.to_string(), ws.to_string())
        };

        if lead.trim().is_empty() {
            out.push('\n');
        }
        for (row, table_line) in table.lines().enumerate() {
            out.push_str(if row == 0 { &lead } else { &indent });
            out.push_str(table_line);
            out.push('\n');
        }
        out.push('\n');
        if !after.trim().is_empty() {
            out.push_str(&indent);
            out.push_str(after.trim());
            out.push('\n');
        }
    }

    out
}

/// `(start, end, table index)` of the placeholder on `line`.
fn find_placeholder(line: &str, prefix: &str) -> Option<(usize, usize, usize)> {
    let start = line.find(prefix)?;
    let rest = &line[start + prefix.len()..];
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let index = rest[..digits].parse().ok()?;
    rest[digits..]
        .starts_with("END")
        .then_some((start, start + prefix.len() + digits + "END".len(), index))
}

/// Indentation, optionally followed by a list marker.
fn is_block_prefix(before: &str) -> bool {
    let marker = before.trim();
    if marker.is_empty() || matches!(marker, "-" | "*" | "+") {
        return true;
    }
    marker
        .strip_suffix(['.', ')'])
        .is_some_and(|number| !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()))
}

/// Text nodes of the fragment, trimmed, one per line.
pub fn plain_text(fragment: &str) -> String {
    let document = Html::parse_fragment(fragment);
    let lines: Vec<String> = document
        .root_element()
        .text()
        .map(|text| text.replace(BYTE_ORDER_MARK, ""))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    lines.join("\n")
}

/// Strips byte-order marks and collapses runs of blank lines left by table splicing.
fn tidy(markdown: &str) -> String {
    let cleaned = markdown.replace(BYTE_ORDER_MARK, "");
    let mut out = String::with_capacity(cleaned.len());
    let mut blank_run = 0;
    for line in cleaned.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run == 1 {
                out.push('\n');
            }
            continue;
        }
        blank_run = 0;
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
