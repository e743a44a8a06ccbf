// src/markup/dom.rs

// --- Imports ---
use super::normalize::fold_cell_synonyms;
use super::report::CanonicalReport;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

// --- CSS Selectors (Lazy Static) ---
// html5ever lowercases element and attribute names, so selectors are lowercase.
static DOCUMENT_NAME_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("document-name").expect("Failed to compile DOCUMENT_NAME_SELECTOR")
});

static COMPANY_NAME_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("company-name").expect("Failed to compile COMPANY_NAME_SELECTOR")
});

static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table").expect("Failed to compile TABLE_SELECTOR")
});

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Failed to compile ROW_SELECTOR")
});

static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("td, th").expect("Failed to compile CELL_SELECTOR")
});

static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p").expect("Failed to compile PARAGRAPH_SELECTOR")
});

const COMPANY_IDENTIFIER_ATTR: &str = "aregcik";

/// Extraction through a forgiving HTML parser and CSS selectors.
///
/// Unlike the tree backend this one cannot fail: html5ever repairs any
/// input into some document. Cell and paragraph text is the full trimmed
/// text content of the element, so inline wrappers of any depth are kept.
pub fn extract_report(raw: &str) -> CanonicalReport {
    let folded = fold_cell_synonyms(raw);
    let document = Html::parse_document(&folded);

    let first_text = |selector: &Selector| {
        document
            .select(selector)
            .next()
            .map(|el| element_text(&el))
            .unwrap_or_default()
    };

    let company_identifier = document
        .select(&COMPANY_NAME_SELECTOR)
        .next()
        .and_then(|el| el.value().attr(COMPANY_IDENTIFIER_ATTR))
        .map(|v| v.trim().to_string())
        .unwrap_or_default();

    let tables = document
        .select(&TABLE_SELECTOR)
        .map(|table| {
            table
                .select(&ROW_SELECTOR)
                .map(|row| row.select(&CELL_SELECTOR).map(|cell| element_text(&cell)).collect())
                .collect()
        })
        .collect();

    let key_paragraphs = document
        .select(&PARAGRAPH_SELECTOR)
        .map(|p| element_text(&p))
        .filter(|text| !text.is_empty())
        .collect();

    let report = CanonicalReport {
        company_name: first_text(&COMPANY_NAME_SELECTOR),
        report_title: first_text(&DOCUMENT_NAME_SELECTOR),
        company_identifier,
        tables,
        key_paragraphs,
    };
    tracing::debug!(
        "DOM backend extracted {} tables and {} paragraphs",
        report.tables.len(),
        report.key_paragraphs.len()
    );
    report
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dom_extraction_matches_report_shape() {
        let raw = r#"<DOCUMENT>
            <DOCUMENT-NAME>Single Sales and Supply Contract</DOCUMENT-NAME>
            <COMPANY-NAME AREGCIK="00164779">SK hynix</COMPANY-NAME>
            <BODY>
              <TABLE><TBODY>
                <TR><TH>Item</TH><TH>Value</TH></TR>
                <TR><TU>Amount</TU><TE><SPAN>1,000</SPAN></TE></TR>
              </TBODY></TABLE>
              <P>  Contract signed.  </P>
              <P>   </P>
            </BODY></DOCUMENT>"#;

        let report = extract_report(raw);
        assert_eq!(report.report_title, "Single Sales and Supply Contract");
        assert_eq!(report.company_name, "SK hynix");
        assert_eq!(report.company_identifier, "00164779");
        assert_eq!(
            report.tables,
            vec![vec![vec!["Item", "Value"], vec!["Amount", "1,000"]]]
                .into_iter()
                .map(|t| t.into_iter().map(|r| r.into_iter().map(String::from).collect()).collect())
                .collect::<Vec<Vec<Vec<String>>>>()
        );
        assert_eq!(report.key_paragraphs, vec!["Contract signed."]);
    }

    #[test]
    fn test_dom_backend_tolerates_garbage() {
        let report = extract_report("<<not markup at all & <P");
        assert!(report.tables.is_empty());
        assert!(report.report_title.is_empty());
    }
}
