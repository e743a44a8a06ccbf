// src/markup/report.rs
use super::tree::MarkupNode;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

const COMPANY_NAME_TAG: &str = "COMPANY-NAME";
const REPORT_TITLE_TAG: &str = "DOCUMENT-NAME";
const COMPANY_IDENTIFIER_ATTR: &str = "AREGCIK";
const TABLE_TAG: &str = "TABLE";
const ROW_TAG: &str = "TR";
const PARAGRAPH_TAG: &str = "P";
// TU and TE are already folded to TD by normalization; kept for raw trees.
const CELL_TAGS: &[&str] = &["TD", "TH", "TU", "TE"];

/// The compact, canonical form of a filing that downstream stages consume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalReport {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub company_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub report_title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub company_identifier: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Vec<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_paragraphs: Vec<String>,
}

impl CanonicalReport {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.key_paragraphs.is_empty()
    }

    /// Renders the report as markdown: title heading, issuer line, one pipe
    /// table per non-empty table, then the paragraphs as block quotes.
    ///
    /// The first non-empty row is the table header; later rows are padded
    /// or cut to its width. Rows without cells are not rendered.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let title = if self.report_title.is_empty() {
            "Untitled report"
        } else {
            self.report_title.as_str()
        };
        let _ = writeln!(out, "# {}\n", title);

        if !self.company_name.is_empty() {
            let _ = writeln!(out, "**Company:** {}", self.company_name);
        }
        if !self.company_identifier.is_empty() {
            let _ = writeln!(out, "**Identifier:** {}", self.company_identifier);
        }
        if !self.company_name.is_empty() || !self.company_identifier.is_empty() {
            out.push('\n');
        }

        let mut rendered = 0;
        for table in &self.tables {
            let mut rows = table.iter().filter(|row| !row.is_empty());
            let Some(header) = rows.next() else {
                continue;
            };
            rendered += 1;
            let width = header.len();
            let _ = writeln!(out, "## Table {}\n", rendered);
            push_row(&mut out, header, width);
            out.push('|');
            out.push_str(&" --- |".repeat(width));
            out.push('\n');
            for row in rows {
                push_row(&mut out, row, width);
            }
            out.push('\n');
        }

        if !self.key_paragraphs.is_empty() {
            out.push_str("## Key Paragraphs\n\n");
            for paragraph in &self.key_paragraphs {
                let _ = writeln!(out, "> {}\n", paragraph.replace('\n', " "));
            }
        }

        out.truncate(out.trim_end().len());
        out.push('\n');
        out
    }
}

fn push_row(out: &mut String, row: &[String], width: usize) {
    out.push('|');
    for col in 0..width {
        let cell = row.get(col).map(String::as_str).unwrap_or("");
        let _ = write!(out, " {} |", escape_cell(cell));
    }
    out.push('\n');
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

/// Walks a parsed tree and pulls out the canonical fields.
///
/// Title, issuer name and identifier come from the first matching node in
/// pre-order. Every table contributes one entry, every row inside it one
/// row (even when it has no cells), and every cell its own text followed by
/// the text of its direct children. Paragraphs are trimmed; empty ones are
/// dropped.
pub fn extract_report(root: &MarkupNode) -> CanonicalReport {
    let company = root.find_first(COMPANY_NAME_TAG);

    let tables = root
        .find_all(TABLE_TAG)
        .into_iter()
        .map(|table| {
            table
                .find_all(ROW_TAG)
                .into_iter()
                .map(|row| collect_cells(row).into_iter().map(cell_text).collect())
                .collect()
        })
        .collect();

    let key_paragraphs = root
        .find_all(PARAGRAPH_TAG)
        .into_iter()
        .map(|p| p.text.trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect();

    CanonicalReport {
        company_name: company.map(|n| n.text.trim().to_string()).unwrap_or_default(),
        report_title: root
            .find_first(REPORT_TITLE_TAG)
            .map(|n| n.text.trim().to_string())
            .unwrap_or_default(),
        company_identifier: company
            .and_then(|n| n.attr(COMPANY_IDENTIFIER_ATTR))
            .map(|v| v.trim().to_string())
            .unwrap_or_default(),
        tables,
        key_paragraphs,
    }
}

fn is_cell(node: &MarkupNode) -> bool {
    CELL_TAGS.iter().any(|tag| node.is(tag))
}

// Cells below the row in document order; a cell's own subtree is not searched.
fn collect_cells(row: &MarkupNode) -> Vec<&MarkupNode> {
    fn visit<'a>(node: &'a MarkupNode, cells: &mut Vec<&'a MarkupNode>) {
        for child in &node.children {
            if is_cell(child) {
                cells.push(child);
            } else {
                visit(child, cells);
            }
        }
    }
    let mut cells = Vec::new();
    visit(row, &mut cells);
    cells
}

fn cell_text(cell: &MarkupNode) -> String {
    let mut text = cell.text.trim().to_string();
    for child in &cell.children {
        text.push_str(child.text.trim());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::tree::parse_tree;

    #[test]
    fn test_header_fields_come_from_first_match() {
        let root = parse_tree(
            r#"<DOCUMENT><DOCUMENT-NAME>Quarterly Report</DOCUMENT-NAME>
            <COMPANY-NAME AREGCIK="00126380">Samsung Electronics</COMPANY-NAME>
            <COMPANY-NAME AREGCIK="999">Other</COMPANY-NAME></DOCUMENT>"#,
        )
        .unwrap();
        let report = extract_report(&root);
        assert_eq!(report.report_title, "Quarterly Report");
        assert_eq!(report.company_name, "Samsung Electronics");
        assert_eq!(report.company_identifier, "00126380");
    }

    #[test]
    fn test_cells_include_child_text_and_empty_rows_kept() {
        let root = parse_tree(
            "<TABLE><TR><TD><SPAN>Revenue</SPAN></TD><TD>1,000<SPAN>KRW</SPAN></TD></TR><TR></TR></TABLE>",
        )
        .unwrap();
        let report = extract_report(&root);
        assert_eq!(
            report.tables,
            vec![vec![vec!["Revenue".to_string(), "1,000KRW".to_string()], vec![]]]
        );
    }

    #[test]
    fn test_empty_cells_keep_column_position() {
        let root = parse_tree("<TABLE><TR><TH>A</TH><TD></TD><TD>C</TD></TR></TABLE>").unwrap();
        let report = extract_report(&root);
        assert_eq!(report.tables[0][0], vec!["A", "", "C"]);
    }

    #[test]
    fn test_blank_paragraphs_dropped() {
        let root = parse_tree("<BODY><P>  First  </P><P>   </P><P></P><P>Second</P></BODY>").unwrap();
        assert_eq!(extract_report(&root).key_paragraphs, vec!["First", "Second"]);
    }

    #[test]
    fn test_missing_fields_stay_empty_and_are_omitted() {
        let root = parse_tree("<DOCUMENT><BODY/></DOCUMENT>").unwrap();
        let report = extract_report(&root);
        assert_eq!(report, CanonicalReport::default());
        assert_eq!(serde_json::to_string(&report).unwrap(), "{}");
    }

    #[test]
    fn test_markdown_rendering() {
        let report = CanonicalReport {
            company_name: "ACME".into(),
            report_title: "Supply Contract".into(),
            company_identifier: "00000001".into(),
            tables: vec![
                vec![vec![]],
                vec![
                    vec!["Item".into(), "Value".into()],
                    vec!["Amount".into()],
                    vec!["Term".into(), "1 year".into(), "extra".into()],
                ],
            ],
            key_paragraphs: vec!["Signed a | contract.".into()],
        };
        let md = report.to_markdown();
        assert!(md.starts_with(
            "# Supply Contract\n\n**Company:** ACME\n**Identifier:** 00000001\n\n## Table 1\n\n"
        ));
        assert!(md.contains(
            "| Item | Value |\n| --- | --- |\n| Amount |  |\n| Term | 1 year |\n"
        ));
        assert!(!md.contains("Table 2"));
        assert!(md.ends_with("## Key Paragraphs\n\n> Signed a | contract.\n"));
    }
}
