// src/dart/client.rs
use crate::dart::archive;
use crate::dart::models::{
    CorpCodeRecord, DisclosureListEntry, ListQuery, ListResponse, MAX_PAGE_SIZE, STATUS_NO_DOCUMENT,
    STATUS_OK,
};
use crate::utils::error::DartError;
use reqwest::header;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://opendart.fss.or.kr/api";
const USER_AGENT: &str = concat!("dart_ingest/", env!("CARGO_PKG_VERSION"));
const DATE_FORMAT: &str = "%Y%m%d";

/// Creates a reqwest client configured for DART interaction.
/// A timeout surfaces as a transport error; retries are left to the next run.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Client for the Open DART list, document and directory endpoints.
#[derive(Debug, Clone)]
pub struct DartClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl DartClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Fetches every page of the disclosure list for `query`, sequentially.
    ///
    /// Any page reporting a non-success status aborts the whole fetch; a
    /// partial list is never returned.
    pub async fn fetch_disclosures(&self, query: &ListQuery) -> Result<Vec<DisclosureListEntry>, DartError> {
        let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);
        tracing::info!(
            "Fetching disclosure list {}..{} (corp: {}, page size {})",
            query.begin,
            query.end,
            query.corp_code.as_deref().unwrap_or("all"),
            page_size
        );

        let first = self.list_page(query, 1, page_size).await?;
        let total_pages = first.total_page;
        let mut entries = first.list;

        let mut page = 1;
        while page < total_pages {
            page += 1;
            tracing::debug!("Fetching disclosure list page {}/{}", page, total_pages);
            let next = self.list_page(query, page, page_size).await?;
            entries.extend(next.list);
        }

        tracing::info!("Fetched {} disclosures over {} page(s)", entries.len(), total_pages.max(1));
        Ok(entries)
    }

    async fn list_page(&self, query: &ListQuery, page_no: u32, page_size: u32) -> Result<ListResponse, DartError> {
        let url = format!("{}/list.json", self.base_url);
        let mut params: Vec<(&str, String)> = vec![
            ("crtfc_key", self.api_key.clone()),
            ("bgn_de", query.begin.format(DATE_FORMAT).to_string()),
            ("end_de", query.end.format(DATE_FORMAT).to_string()),
            ("page_no", page_no.to_string()),
            ("page_count", page_size.to_string()),
        ];
        if let Some(code) = &query.corp_code {
            params.push(("corp_code", code.clone()));
        }

        let response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!("HTTP error status {} from list endpoint", status);
            return Err(DartError::UpstreamHttp { status, body });
        }

        let page: ListResponse = serde_json::from_str(&body)
            .map_err(|e| DartError::Decode(format!("list page {}: {}", page_no, e)))?;

        if page.status != STATUS_OK {
            return Err(DartError::Upstream {
                status: page.status,
                message: page.message,
            });
        }
        tracing::debug!(
            "List page {}/{}: {} entries (page size {}, {} total)",
            page.page_no,
            page.total_page,
            page.list.len(),
            page.page_count,
            page.total_count
        );
        Ok(page)
    }

    /// Downloads one disclosure document and unpacks its archive envelope.
    ///
    /// An XML envelope with status 014 is [`DartError::DocumentNotFound`].
    /// An XML envelope with any other status is an upstream error. An XML
    /// body without a status is the document itself, delivered unpacked.
    pub async fn fetch_document(&self, receipt_no: &str) -> Result<Vec<u8>, DartError> {
        let url = format!("{}/document.xml", self.base_url);
        tracing::debug!("Downloading document {}", receipt_no);

        let response = self
            .http
            .get(&url)
            .query(&[("crtfc_key", self.api_key.as_str()), ("rcept_no", receipt_no)])
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        let body = response.bytes().await?;

        if !status.is_success() {
            tracing::error!("HTTP error status {} downloading {}", status, receipt_no);
            return Err(DartError::UpstreamHttp {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        if is_xml(&content_type) {
            let text = String::from_utf8_lossy(&body);
            return match envelope_status(&text) {
                Some((code, _)) if code == STATUS_NO_DOCUMENT => {
                    Err(DartError::DocumentNotFound(receipt_no.to_string()))
                }
                Some((code, message)) => Err(DartError::Upstream { status: code, message }),
                None => Ok(body.to_vec()),
            };
        }

        let document = archive::unpack_all(&body)?;
        tracing::debug!("Document {} unpacked to {} bytes", receipt_no, document.len());
        Ok(document)
    }

    /// Downloads and parses the full issuer directory.
    pub async fn fetch_companies(&self) -> Result<Vec<CorpCodeRecord>, DartError> {
        let url = format!("{}/corpCode.xml", self.base_url);
        tracing::info!("Downloading issuer directory");

        let response = self
            .http
            .get(&url)
            .query(&[("crtfc_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(DartError::UpstreamHttp {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        if is_xml(&content_type) {
            let text = String::from_utf8_lossy(&body);
            if let Some((code, message)) = envelope_status(&text) {
                return Err(DartError::Upstream { status: code, message });
            }
        }

        let descriptor = archive::unpack_all(&body)?;
        let text = String::from_utf8_lossy(&descriptor);
        let records = parse_corp_codes(&text)?;
        tracing::info!("Issuer directory holds {} records", records.len());
        Ok(records)
    }
}

fn is_xml(content_type: &str) -> bool {
    content_type.starts_with("application/xml") || content_type.starts_with("text/xml")
}

/// Reads `<status>` and `<message>` from a DART XML error envelope.
fn envelope_status(text: &str) -> Option<(String, String)> {
    let doc = roxmltree::Document::parse(text).ok()?;
    let child_text = |name: &str| {
        doc.descendants()
            .find(|n| n.has_tag_name(name))
            .and_then(|n| n.text())
            .map(|t| t.trim().to_string())
    };
    let status = child_text("status")?;
    Some((status, child_text("message").unwrap_or_default()))
}

/// Parses the `CORPCODE.xml` descriptor: `<result>` holding repeated
/// `<list>` records. Every field is trimmed; missing fields are empty.
pub fn parse_corp_codes(xml: &str) -> Result<Vec<CorpCodeRecord>, DartError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| DartError::Decode(format!("issuer directory: {}", e)))?;

    let records = doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("list"))
        .map(|node| {
            let field = |name: &str| {
                node.children()
                    .find(|c| c.has_tag_name(name))
                    .and_then(|c| c.text())
                    .unwrap_or("")
                    .trim()
                    .to_string()
            };
            CorpCodeRecord {
                corp_code: field("corp_code"),
                corp_name: field("corp_name"),
                corp_eng_name: field("corp_eng_name"),
                stock_code: field("stock_code"),
                modify_date: field("modify_date"),
            }
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dart::archive::build_zip;
    use chrono::NaiveDate;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const API_KEY: &str = "test-dart-api-key";

    fn client(server: &MockServer) -> DartClient {
        DartClient::new(reqwest::Client::new(), server.uri(), API_KEY)
    }

    fn query() -> ListQuery {
        ListQuery::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        )
    }

    fn list_page(page_no: u32, total_page: u32, receipt_no: &str) -> serde_json::Value {
        serde_json::json!({
            "status": "000",
            "message": "정상",
            "page_no": page_no,
            "page_count": 1,
            "total_count": total_page,
            "total_page": total_page,
            "list": [{
                "rcept_no": receipt_no,
                "corp_code": "00123456",
                "corp_name": "테스트",
                "report_nm": "분기보고서 (2025.03)",
                "rcept_dt": "20250331",
                "flr_nm": "테스트",
                "rm": ""
            }]
        })
    }

    #[tokio::test]
    async fn test_pagination_accumulates_pages_in_order() {
        let server = MockServer::start().await;
        for (page, receipt) in [("1", "20250331000001"), ("2", "20250331000002")] {
            Mock::given(method("GET"))
                .and(path("/list.json"))
                .and(query_param("crtfc_key", API_KEY))
                .and(query_param("bgn_de", "20250101"))
                .and(query_param("end_de", "20250301"))
                .and(query_param("page_count", "100"))
                .and(query_param("page_no", page))
                .respond_with(ResponseTemplate::new(200).set_body_json(list_page(
                    page.parse().unwrap(),
                    2,
                    receipt,
                )))
                .expect(1)
                .mount(&server)
                .await;
        }

        let entries = client(&server).fetch_disclosures(&query()).await.unwrap();
        let receipts: Vec<&str> = entries.iter().map(|e| e.receipt_no.as_str()).collect();
        assert_eq!(receipts, vec!["20250331000001", "20250331000002"]);
    }

    #[tokio::test]
    async fn test_empty_single_page_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "000", "message": "정상", "page_no": 1, "page_count": 100,
                "total_count": 0, "total_page": 1, "list": []
            })))
            .mount(&server)
            .await;

        let entries = client(&server).fetch_disclosures(&query()).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_corp_code_filter_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list.json"))
            .and(query_param("corp_code", "00126380"))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_page(1, 1, "20250331000009")))
            .expect(1)
            .mount(&server)
            .await;

        let entries = client(&server)
            .fetch_disclosures(&query().with_corp_code("00126380"))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_on_first_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "020", "message": "요청 제한을 초과하였습니다."
            })))
            .mount(&server)
            .await;

        let err = client(&server).fetch_disclosures(&query()).await.unwrap_err();
        assert!(matches!(err, DartError::Upstream { ref status, .. } if status == "020"));
    }

    #[tokio::test]
    async fn test_failure_mid_pagination_discards_partial_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list.json"))
            .and(query_param("page_no", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_page(1, 3, "20250331000001")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/list.json"))
            .and(query_param("page_no", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "800", "message": "시스템 점검"
            })))
            .mount(&server)
            .await;

        let result = client(&server).fetch_disclosures(&query()).await;
        assert!(matches!(result, Err(DartError::Upstream { .. })));
    }

    #[tokio::test]
    async fn test_document_not_found_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/document.xml"))
            .and(query_param("rcept_no", "20250101000404"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?><result><status>014</status><message>파일이 존재하지 않습니다.</message></result>",
                "application/xml;charset=UTF-8",
            ))
            .mount(&server)
            .await;

        let err = client(&server).fetch_document("20250101000404").await.unwrap_err();
        assert!(matches!(err, DartError::DocumentNotFound(ref r) if r == "20250101000404"));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_other_xml_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/document.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<result><status>010</status><message>등록되지 않은 키입니다.</message></result>",
                "text/xml",
            ))
            .mount(&server)
            .await;

        let err = client(&server).fetch_document("20250101000001").await.unwrap_err();
        assert!(matches!(err, DartError::Upstream { ref status, .. } if status == "010"));
    }

    #[tokio::test]
    async fn test_document_archive_unpacked() {
        let server = MockServer::start().await;
        let zip = build_zip(&[("20250101000001.xml", "<DOCUMENT>본문</DOCUMENT>".as_bytes())]);
        Mock::given(method("GET"))
            .and(path("/document.xml"))
            .and(query_param("crtfc_key", API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_raw(zip, "application/x-msdownload"))
            .mount(&server)
            .await;

        let body = client(&server).fetch_document("20250101000001").await.unwrap();
        assert_eq!(String::from_utf8(body).unwrap(), "<DOCUMENT>본문</DOCUMENT>");
    }

    #[tokio::test]
    async fn test_http_error_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/document.xml"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client(&server).fetch_document("20250101000001").await.unwrap_err();
        match err {
            DartError::UpstreamHttp { status, body } => {
                assert_eq!(status, reqwest::StatusCode::BAD_GATEWAY);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_companies_parses_descriptor() {
        let server = MockServer::start().await;
        let descriptor = r#"<?xml version="1.0" encoding="UTF-8"?>
<result>
  <list>
    <corp_code>00126380</corp_code>
    <corp_name> 삼성전자 </corp_name>
    <corp_eng_name>SAMSUNG ELECTRONICS CO,.LTD</corp_eng_name>
    <stock_code>005930</stock_code>
    <modify_date>20240102</modify_date>
  </list>
  <list>
    <corp_code>00434003</corp_code>
    <corp_name>다코</corp_name>
    <corp_eng_name>Daco &amp; Co</corp_eng_name>
    <stock_code> </stock_code>
    <modify_date>20170630</modify_date>
  </list>
</result>"#;
        let zip = build_zip(&[("CORPCODE.xml", descriptor.as_bytes())]);
        Mock::given(method("GET"))
            .and(path("/corpCode.xml"))
            .and(query_param("crtfc_key", API_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_raw(zip, "application/x-msdownload"))
            .mount(&server)
            .await;

        let records = client(&server).fetch_companies().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].corp_name, "삼성전자");
        assert!(records[0].is_listed());
        assert_eq!(records[1].corp_eng_name, "Daco & Co");
        assert_eq!(records[1].stock_code, "");
        assert!(!records[1].is_listed());
    }

    #[test]
    fn test_malformed_descriptor() {
        assert!(matches!(parse_corp_codes("<result><list>"), Err(DartError::Decode(_))));
    }
}
