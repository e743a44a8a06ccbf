// src/dart/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Application status DART returns on success, even inside HTTP 200 bodies.
pub const STATUS_OK: &str = "000";
/// Application status for "no such document" on the document endpoint.
pub const STATUS_NO_DOCUMENT: &str = "014";
/// Upper bound the list endpoint enforces on `page_count`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// One row of the disclosure list endpoint (`list.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureListEntry {
    #[serde(rename = "rcept_no")]
    pub receipt_no: String,
    pub corp_code: String,
    pub corp_name: String,
    #[serde(rename = "report_nm")]
    pub title: String,
    #[serde(rename = "rcept_dt")]
    pub received_date: String,
    #[serde(rename = "flr_nm", default)]
    pub filer_name: String,
    #[serde(rename = "rm", default)]
    pub remark: String,
}

/// Envelope of one list page. Error responses carry only status and message.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub page_no: u32,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub total_count: u32,
    #[serde(default)]
    pub total_page: u32,
    #[serde(default)]
    pub list: Vec<DisclosureListEntry>,
}

/// Filter for one disclosure list run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Eight digit issuer code; `None` lists every issuer.
    pub corp_code: Option<String>,
    pub begin: NaiveDate,
    pub end: NaiveDate,
    pub page_size: u32,
}

impl ListQuery {
    pub fn new(begin: NaiveDate, end: NaiveDate) -> Self {
        Self {
            corp_code: None,
            begin,
            end,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// The last `days` days up to and including `today`.
    pub fn recent(today: NaiveDate, days: i64) -> Self {
        Self::new(today - chrono::Duration::days(days), today)
    }

    pub fn with_corp_code(mut self, corp_code: impl Into<String>) -> Self {
        let code = corp_code.into();
        self.corp_code = if code.trim().is_empty() { None } else { Some(code) };
        self
    }
}

/// One `<list>` record of the issuer directory (`CORPCODE.xml`), every
/// field trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpCodeRecord {
    pub corp_code: String,
    pub corp_name: String,
    pub corp_eng_name: String,
    pub stock_code: String,
    pub modify_date: String,
}

impl CorpCodeRecord {
    /// Issuers with a stock code trade on an exchange.
    pub fn is_listed(&self) -> bool {
        !self.stock_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_decodes_error_envelope() {
        let resp: ListResponse =
            serde_json::from_str(r#"{"status":"013","message":"조회된 데이타가 없습니다."}"#).unwrap();
        assert_eq!(resp.status, "013");
        assert!(resp.list.is_empty());
        assert_eq!(resp.total_page, 0);
    }

    #[test]
    fn test_list_entry_field_names() {
        let entry: DisclosureListEntry = serde_json::from_str(
            r#"{"rcept_no":"20250331000001","corp_code":"00123456","corp_name":"테스트",
                "report_nm":"분기보고서 (2025.03)","rcept_dt":"20250331","flr_nm":"테스트","rm":"유"}"#,
        )
        .unwrap();
        assert_eq!(entry.receipt_no, "20250331000001");
        assert_eq!(entry.title, "분기보고서 (2025.03)");
        assert_eq!(entry.remark, "유");
    }

    #[test]
    fn test_recent_query_window() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let query = ListQuery::recent(today, 5).with_corp_code("  ");
        assert_eq!(query.begin, NaiveDate::from_ymd_opt(2025, 2, 26).unwrap());
        assert_eq!(query.end, today);
        assert_eq!(query.corp_code, None);
        assert_eq!(query.page_size, MAX_PAGE_SIZE);
    }
}
