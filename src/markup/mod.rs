// src/markup/mod.rs
pub mod dom;
pub mod normalize;
pub mod report;
pub mod tree;

pub use normalize::Normalized;
pub use report::CanonicalReport;

use crate::utils::error::ParseError;

/// Which extraction path turns raw markup into a [`CanonicalReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ParserBackend {
    /// Normalize, stream-tokenize into a tree, then walk the tree.
    #[default]
    Tree,
    /// Forgiving HTML parse queried with CSS selectors.
    Dom,
}

/// A parsed document plus the intermediate normalized markup, when the
/// backend produced one.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub report: CanonicalReport,
    pub normalized: Option<Normalized>,
}

/// Runs the full markup pipeline for one document.
pub fn parse_document(raw: &str, backend: ParserBackend) -> Result<ParsedDocument, ParseError> {
    match backend {
        ParserBackend::Tree => {
            let normalized = normalize::normalize(raw);
            let root = tree::parse_tree(&normalized.text)?;
            Ok(ParsedDocument {
                report: report::extract_report(&root),
                normalized: Some(normalized),
            })
        }
        ParserBackend::Dom => Ok(ParsedDocument {
            report: dom::extract_report(raw),
            normalized: None,
        }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_REPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<DOCUMENT xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<DOCUMENT-NAME ACODE="11013">분기보고서</DOCUMENT-NAME>
<FORMULA-VERSION ADATE="20240101">5.0</FORMULA-VERSION>
<COMPANY-NAME AREGCIK="00126380">삼성전자</COMPANY-NAME>
<BODY>
<SECTION-1>
<TITLE ATOC="Y">I. Overview</TITLE>
<TABLE BORDER="1">
<TBODY>
<TR><TH>Metric</TH><TH>Amount</TH></TR>
<TR><TD>Revenue</TD><TD>1000</TD></TR>
<TR><TD><SPAN>Profit</SPAN></TD><TD>500</TD></TR>
</TBODY>
</TABLE>
<P>Primary discussion.</P>
<P>     </P>
<P><FONT color="red">Secondary paragraph</FONT></P>
</SECTION-1>
</BODY>
</DOCUMENT>"#;

    fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_sample_round_trip_tree_backend() {
        let parsed = parse_document(SAMPLE_REPORT, ParserBackend::Tree).unwrap();
        let report = parsed.report;
        assert_eq!(
            report.tables,
            vec![strings(&[&["Metric", "Amount"], &["Revenue", "1000"], &["Profit", "500"]])]
        );
        assert_eq!(report.key_paragraphs, vec!["Primary discussion.", "Secondary paragraph"]);
        assert_eq!(report.report_title, "분기보고서");
        assert_eq!(report.company_name, "삼성전자");
        assert_eq!(report.company_identifier, "00126380");

        let normalized = parsed.normalized.unwrap();
        assert_eq!(normalized.stripped_tags, vec!["FONT".to_string()]);
    }

    #[test]
    fn test_sample_round_trip_dom_backend() {
        let parsed = parse_document(SAMPLE_REPORT, ParserBackend::Dom).unwrap();
        assert!(parsed.normalized.is_none());
        assert_eq!(
            parsed.report.tables,
            vec![strings(&[&["Metric", "Amount"], &["Revenue", "1000"], &["Profit", "500"]])]
        );
        assert_eq!(
            parsed.report.key_paragraphs,
            vec!["Primary discussion.", "Secondary paragraph"]
        );
    }

    #[test]
    fn test_legacy_cell_tags_parse_like_standard_cells() {
        let standard = "<TABLE><TR><TD>Sales</TD><TD>10</TD></TR><TR><TD>Cost</TD><TD>4</TD></TR></TABLE>";
        let legacy = "<TABLE><TR><TU>Sales</TU><TE>10</TE></TR><TR><te>Cost</te><tu>4</tu></TR></TABLE>";

        let a = parse_document(standard, ParserBackend::Tree).unwrap().report;
        let b = parse_document(legacy, ParserBackend::Tree).unwrap().report;
        assert_eq!(a, b);
        assert_eq!(a.tables, vec![strings(&[&["Sales", "10"], &["Cost", "4"]])]);
    }

    #[test]
    fn test_document_without_markup_is_malformed() {
        let err = parse_document("plain text, no tags", ParserBackend::Tree).unwrap_err();
        assert!(matches!(err, ParseError::MalformedDocument(_)));
        assert!(parse_document("plain text, no tags", ParserBackend::Dom).is_ok());
    }
}
