// src/analysis/schema.rs
//! Report-type classification and the structured shapes the model is asked
//! to fill in. Every field defaults when absent or `null`, so a partial
//! answer still decodes; a value of the wrong JSON type does not.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Which extraction schema a disclosure gets, decided from its title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Quarterly, half-year and annual business reports.
    PeriodicReport,
    /// Single sales or supply contract disclosures.
    SupplyContract,
    /// Confirmation of securities issuance terms.
    IssuanceTerms,
    /// Anything else.
    General,
}

// Checked in order; the first keyword found in the title wins.
const CLASSIFICATION_KEYWORDS: &[(&str, ReportType)] = &[
    ("분기보고서", ReportType::PeriodicReport),
    ("반기보고서", ReportType::PeriodicReport),
    ("사업보고서", ReportType::PeriodicReport),
    ("공급계약", ReportType::SupplyContract),
    ("증권발행조건확정", ReportType::IssuanceTerms),
];

impl ReportType {
    /// Classifies a canonical report title. Unknown titles fall back to
    /// [`ReportType::General`] rather than being skipped.
    pub fn classify(title: &str) -> Self {
        CLASSIFICATION_KEYWORDS
            .iter()
            .find(|(keyword, _)| title.contains(keyword))
            .map(|(_, report_type)| *report_type)
            .unwrap_or(ReportType::General)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::PeriodicReport => "periodic_report",
            ReportType::SupplyContract => "supply_contract",
            ReportType::IssuanceTerms => "issuance_terms",
            ReportType::General => "general",
        }
    }

    /// Field list appended to the system prompt.
    pub fn schema_prompt(&self) -> &'static str {
        match self {
            ReportType::PeriodicReport => PERIODIC_REPORT_SCHEMA,
            ReportType::SupplyContract => SUPPLY_CONTRACT_SCHEMA,
            ReportType::IssuanceTerms => ISSUANCE_TERMS_SCHEMA,
            ReportType::General => GENERAL_SCHEMA,
        }
    }

    /// Extra instructions appended to the user prompt, if any.
    pub fn instructions(&self) -> &'static str {
        match self {
            ReportType::PeriodicReport => PERIODIC_REPORT_INSTRUCTIONS,
            ReportType::SupplyContract => "",
            ReportType::IssuanceTerms => ISSUANCE_TERMS_INSTRUCTIONS,
            ReportType::General => GENERAL_INSTRUCTIONS,
        }
    }

    /// Decodes model output into the variant for this report type.
    /// `null` members are treated as absent and take their default.
    pub fn decode(&self, json: &str) -> Result<Extraction, serde_json::Error> {
        let mut value: Value = serde_json::from_str(json)?;
        strip_nulls(&mut value);
        if value.is_null() {
            value = Value::Object(Map::new());
        }
        Ok(match self {
            ReportType::PeriodicReport => Extraction::PeriodicReport(serde_json::from_value(value)?),
            ReportType::SupplyContract => Extraction::SupplyContract(serde_json::from_value(value)?),
            ReportType::IssuanceTerms => Extraction::IssuanceTerms(serde_json::from_value(value)?),
            ReportType::General => Extraction::General(serde_json::from_value(value)?),
        })
    }
}

// Drops `null` object members at any depth. Array elements are kept.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(members) => {
            members.retain(|_, member| !member.is_null());
            members.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured extraction. Serialized untagged: the stored JSON is the
/// schema object itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Extraction {
    PeriodicReport(Box<PeriodicReport>),
    SupplyContract(SupplyContract),
    IssuanceTerms(IssuanceTerms),
    General(GeneralReport),
}

impl Extraction {
    pub fn report_type(&self) -> ReportType {
        match self {
            Extraction::PeriodicReport(_) => ReportType::PeriodicReport,
            Extraction::SupplyContract(_) => ReportType::SupplyContract,
            Extraction::IssuanceTerms(_) => ReportType::IssuanceTerms,
            Extraction::General(_) => ReportType::General,
        }
    }

    /// The issuer name field of whichever schema this is.
    pub fn issuer_name(&self) -> &str {
        match self {
            Extraction::PeriodicReport(r) => &r.company_name,
            Extraction::SupplyContract(r) => &r.corp_name,
            Extraction::IssuanceTerms(r) => &r.issuer.name,
            Extraction::General(r) => &r.company_name,
        }
    }

    pub fn issuer_name_mut(&mut self) -> &mut String {
        match self {
            Extraction::PeriodicReport(r) => &mut r.company_name,
            Extraction::SupplyContract(r) => &mut r.corp_name,
            Extraction::IssuanceTerms(r) => &mut r.issuer.name,
            Extraction::General(r) => &mut r.company_name,
        }
    }
}

// --- Periodic report ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodicReport {
    pub company_name: String,
    pub period_start_date: String,
    pub period_end_date: String,
    pub submission_date: String,
    pub share_info: ShareInfo,
    #[serde(rename = "sales_breakdown_million_krw")]
    pub sales_breakdown: SalesBreakdown,
    #[serde(rename = "consolidated_financials_million_krw")]
    pub consolidated: Financials<BalanceSheet, IncomeStatement>,
    #[serde(rename = "separate_financials_million_krw")]
    pub separate: Financials<SeparateBalanceSheet, SeparateIncomeStatement>,
    #[serde(rename = "fx_exposure_million_krw")]
    pub fx_exposure: FxExposure,
    #[serde(rename = "fx_sensitivity_10pct_million_krw")]
    pub fx_sensitivity: FxSensitivity,
    #[serde(rename = "derivatives_valuation_effects_million_krw")]
    pub derivatives: DerivativeEffects,
    pub production_capacity: ProductionCapacity,
    pub rnd: RnD,
    pub market_share: MarketShare,
    pub capex: Capex,
    /// Keyed by period, e.g. `period_2025_H1`.
    #[serde(rename = "cash_flows_consolidated_million_krw")]
    pub cash_flows: BTreeMap<String, CashFlows>,
    pub credit_ratings: Vec<CreditRating>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareInfo {
    pub issued_common_shares: i64,
    pub par_value_krw: i64,
    pub capital_million_krw: i64,
    pub outstanding_common_shares: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesBreakdown {
    pub segment: String,
    pub export: i64,
    pub domestic: i64,
    pub total: i64,
}

/// Statements keyed by period: balance sheets by `period_YYYY_MM_DD`,
/// income statements by `period_YYYY` or `period_YYYY_H1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Financials<B, I> {
    pub balance_sheet: BTreeMap<String, B>,
    pub income_statement: BTreeMap<String, I>,
}

impl<B, I> Default for Financials<B, I> {
    fn default() -> Self {
        Self {
            balance_sheet: BTreeMap::new(),
            income_statement: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceSheet {
    pub total_assets: i64,
    pub total_liabilities: i64,
    pub total_equity: i64,
    pub equity_attributable_to_owners: i64,
    pub non_controlling_interests: i64,
    pub capital: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeStatement {
    pub sales: i64,
    pub operating_income: i64,
    pub net_income: i64,
    pub owners_net_income: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparateBalanceSheet {
    pub total_assets: i64,
    pub total_liabilities: i64,
    pub total_equity: i64,
    pub capital: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparateIncomeStatement {
    pub sales: i64,
    pub operating_income: i64,
    pub net_income: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxExposure {
    pub current_period_end: FxPosition,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxPosition {
    pub assets: CurrencyAmounts<i64>,
    pub liabilities: CurrencyAmounts<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyAmounts<T: Default> {
    #[serde(rename = "USD")]
    pub usd: T,
    #[serde(rename = "EUR")]
    pub eur: T,
    #[serde(rename = "JPY")]
    pub jpy: T,
    #[serde(rename = "CNY_etc")]
    pub cny_etc: T,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxSensitivity {
    pub current_period_end: CurrencyAmounts<UpDown>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpDown {
    pub profit_loss_if_up: i64,
    pub profit_loss_if_down: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivativeEffects {
    pub forward_fx_loss: i64,
    pub cross_currency_swap_loss: i64,
    pub total_loss: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionCapacity {
    pub current_half_year: ProductionPeriod,
    pub prior_year: Utilization,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionPeriod {
    pub capacity_million_krw: i64,
    pub production_million_krw: i64,
    pub utilization_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Utilization {
    pub utilization_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RnD {
    /// Keyed by period, e.g. `period_2025_H1_total`.
    pub expenses_million_krw: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketShare {
    pub product: String,
    /// `period_*_percent` keys.
    #[serde(flatten)]
    pub by_period: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capex {
    pub amount_hundred_million_krw: i64,
    pub period: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashFlows {
    pub operating: i64,
    pub investing: i64,
    pub financing: i64,
    pub ending_cash: i64,
    pub beginning_cash: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditRating {
    pub date: String,
    pub agency: String,
    pub subject: String,
    pub rating: String,
}

// --- Supply contract ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyContract {
    pub doc_id: String,
    pub corp_name: String,
    pub report_title: String,
    pub event_code: String,
    pub amendment: ContractAmendment,
    pub contract: ContractTerms,
    pub score: ImpactScore,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractAmendment {
    pub reason: String,
    pub prev_amount_krw: i64,
    pub new_amount_krw: i64,
    pub prev_ratio_to_sales: f64,
    pub new_ratio_to_sales: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractTerms {
    pub name: String,
    pub counterparty: String,
    pub amount_krw: i64,
    pub company_recent_sales_krw: i64,
    pub counterparty_recent_sales_krw: i64,
    pub country: String,
    pub term_from: String,
    pub term_to: String,
    pub progress_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactScore {
    pub direction: String,
    pub magnitude: f64,
    pub confidence: f64,
    pub horizons: Vec<String>,
    pub rationale_short: String,
}

// --- Securities issuance terms ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuanceTerms {
    pub doc_id: String,
    pub doc_type: String,
    pub issuer: Issuer,
    pub dates: IssuanceDates,
    pub tranches: Vec<Tranche>,
    pub totals: TrancheTotals,
    pub reason_of_correction: String,
    pub spread_after_bp: f64,
    pub impact_score: ImpactBreakdown,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issuer {
    pub name: String,
    pub areg_cik: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuanceDates {
    pub first_filed: String,
    pub correction_announced: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tranche {
    pub name: String,
    /// `senior`, `subordinated`, or absent when the filing does not say.
    pub seniority: Option<String>,
    pub amount_krw: i64,
    pub coupon_before_pct: f64,
    pub coupon_after_pct: f64,
    pub coupon_delta_bp: f64,
    pub annual_interest_delta_krw: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrancheTotals {
    pub amount_krw: i64,
    pub wac_before_pct: f64,
    pub wac_after_pct: f64,
    pub wac_delta_bp: f64,
    pub annual_interest_delta_krw: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactBreakdown {
    pub equity_impact_0to5: f64,
    pub credit_impact_0to5: f64,
    pub liquidity_impact_0to5: f64,
}

// --- General ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralReport {
    pub company_name: String,
    pub date: String,
    #[serde(rename = "type")]
    pub report_type: String,
    pub summary: String,
}

// --- Prompts ---

pub const SYSTEM_PROMPT: &str = "\
You extract figures and facts from Korean DART disclosure filings into a fixed JSON schema.
Use only values stated in the document; do not estimate or infer.
Respond with exactly one valid JSON object and nothing else.";

const PERIODIC_REPORT_SCHEMA: &str = r#"Schema:
{
  company_name: string, period_start_date: "YYYY-MM-DD", period_end_date: "YYYY-MM-DD", submission_date: "YYYY-MM-DD",
  share_info: {issued_common_shares: int, par_value_krw: int, capital_million_krw: int, outstanding_common_shares: int},
  sales_breakdown_million_krw: {segment: string, export: int, domestic: int, total: int},
  consolidated_financials_million_krw: {
    balance_sheet: {"period_YYYY_MM_DD": {total_assets, total_liabilities, total_equity, equity_attributable_to_owners, non_controlling_interests, capital}},
    income_statement: {"period_YYYY" | "period_YYYY_H1": {sales, operating_income, net_income, owners_net_income}}
  },
  separate_financials_million_krw: {
    balance_sheet: {"period_YYYY_MM_DD": {total_assets, total_liabilities, total_equity, capital}},
    income_statement: {"period_YYYY" | "period_YYYY_H1": {sales, operating_income, net_income}}
  },
  fx_exposure_million_krw: {current_period_end: {assets: {USD, EUR, JPY, CNY_etc}, liabilities: {USD, EUR, JPY, CNY_etc}}},
  fx_sensitivity_10pct_million_krw: {current_period_end: {USD|EUR|JPY|CNY_etc: {profit_loss_if_up, profit_loss_if_down}}},
  derivatives_valuation_effects_million_krw: {forward_fx_loss, cross_currency_swap_loss, total_loss},
  production_capacity: {current_half_year: {capacity_million_krw, production_million_krw, utilization_percent: float}, prior_year: {utilization_percent: float}},
  rnd: {expenses_million_krw: {"period_YYYY_H1_total" | "period_YYYY_total": int}},
  market_share: {product: string, "period_YYYY_percent" | "period_YYYY_H1_percent": float},
  capex: {amount_hundred_million_krw: int, period: string},
  cash_flows_consolidated_million_krw: {"period_YYYY_H1" | "period_YYYY": {operating, investing, financing, ending_cash, beginning_cash}},
  credit_ratings: [{date, agency, subject, rating}]
}
Units: amounts are integers in millions of KRW except capex, which is in hundreds of millions of KRW.
Percentages are floats with at most two decimals. Fields not stated in the document are 0 or "" (never null).
credit_ratings is [] when there is no rating information."#;

const PERIODIC_REPORT_INSTRUCTIONS: &str = "\
- Take company name, reporting period and submission date from the cover.
- Keep consolidated and separate statements apart and extract every period the document shows.
- Split FX exposure by assets/liabilities and by currency.
- Use the figures as printed; do not compute ratios or totals.";

const SUPPLY_CONTRACT_SCHEMA: &str = r#"Schema:
{
  doc_id, corp_name, report_title, event_code: "SUPPLY",
  amendment: {reason, prev_amount_krw: int, new_amount_krw: int, prev_ratio_to_sales: float, new_ratio_to_sales: float},
  contract: {name, counterparty, amount_krw: int, company_recent_sales_krw: int, counterparty_recent_sales_krw: int, country, term_from: "YYYY-MM-DD", term_to: "YYYY-MM-DD", progress_pct: float},
  score: {direction: "up" | "down", magnitude: 0-100, confidence: 0.0-1.0, horizons: [string], rationale_short: string}
}
Units: amounts are integer KRW; percentages have at most four decimals."#;

const ISSUANCE_TERMS_SCHEMA: &str = r#"Schema:
{
  doc_id, doc_type, issuer: {name, areg_cik}, dates: {first_filed, correction_announced},
  tranches: [{name, seniority, amount_krw: int, coupon_before_pct, coupon_after_pct, coupon_delta_bp, annual_interest_delta_krw: int}],
  totals: {amount_krw: int, wac_before_pct, wac_after_pct, wac_delta_bp, annual_interest_delta_krw: int},
  reason_of_correction, spread_after_bp,
  impact_score: {equity_impact_0to5, credit_impact_0to5, liquidity_impact_0to5},
  notes: string
}
Units: amounts are integer KRW; percentages have at most four decimals.
Basis points are (after - before) * 10000. Annual interest delta is amount_krw * (coupon_after - coupon_before)."#;

const ISSUANCE_TERMS_INSTRUCTIONS: &str = "\
- Read each tranche's coupon before and after correction from the issuance terms table.
- Read each tranche's amount from the offering amount section.
- Set seniority only when senior/subordinated is stated; otherwise null.
- impact_score: equity 0-1 for a coupon fixing correction; credit 1 below 25bp, 2 for 25-75bp, 3 above;
  liquidity 0.5 below 100 billion KRW raised, 1.0 otherwise.";

const GENERAL_SCHEMA: &str = r#"Schema:
{company_name: string, date: "YYYY-MM-DD", type: string, summary: string}"#;

const GENERAL_INSTRUCTIONS: &str = "\
- Take company name, date and document type from the top of the document.
- summary is a short plain-text summary of the disclosure.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_keywords() {
        assert_eq!(ReportType::classify("분기보고서 (2025.03)"), ReportType::PeriodicReport);
        assert_eq!(ReportType::classify("[기재정정]반기보고서 (2025.06)"), ReportType::PeriodicReport);
        assert_eq!(ReportType::classify("사업보고서 (2024.12)"), ReportType::PeriodicReport);
        assert_eq!(ReportType::classify("단일판매ㆍ공급계약체결"), ReportType::SupplyContract);
        assert_eq!(ReportType::classify("[발행조건확정]증권발행조건확정"), ReportType::IssuanceTerms);
        assert_eq!(ReportType::classify("임원ㆍ주요주주특정증권등소유상황보고서"), ReportType::General);
        assert_eq!(ReportType::classify(""), ReportType::General);
    }

    #[test]
    fn test_partial_output_decodes_with_defaults() {
        let extraction = ReportType::PeriodicReport
            .decode(r#"{"company_name":"삼성전자","consolidated_financials_million_krw":{"income_statement":{"period_2024":{"sales":300870903,"operating_income":32725961}}}}"#)
            .unwrap();
        let Extraction::PeriodicReport(report) = extraction else {
            panic!("wrong variant");
        };
        assert_eq!(report.company_name, "삼성전자");
        assert_eq!(report.consolidated.income_statement["period_2024"].sales, 300870903);
        assert!(report.credit_ratings.is_empty());
        assert_eq!(report.capex, Capex::default());
    }

    #[test]
    fn test_wrong_type_is_a_decode_error() {
        assert!(ReportType::General.decode(r#"{"company_name": 42}"#).is_err());
        assert!(ReportType::General.decode("not json").is_err());
    }

    #[test]
    fn test_null_members_take_defaults() {
        let general = ReportType::General
            .decode(r#"{"company_name":null,"date":"2025-01-02","type":null,"summary":"s"}"#)
            .unwrap();
        assert_eq!(general.issuer_name(), "");
        let Extraction::General(general) = general else {
            panic!("wrong variant");
        };
        assert_eq!(general.date, "2025-01-02");
        assert_eq!(general.report_type, "");

        let periodic = ReportType::PeriodicReport
            .decode(r#"{"company_name":"삼성전자","share_info":{"issued_common_shares":null,"par_value_krw":100},"market_share":{"product":"DRAM","period_2024_percent":null},"capex":null}"#)
            .unwrap();
        let Extraction::PeriodicReport(report) = periodic else {
            panic!("wrong variant");
        };
        assert_eq!(report.share_info.issued_common_shares, 0);
        assert_eq!(report.share_info.par_value_krw, 100);
        assert!(report.market_share.by_period.is_empty());
        assert_eq!(report.capex, Capex::default());

        assert_eq!(ReportType::General.decode("null").unwrap().issuer_name(), "");
    }

    #[test]
    fn test_untagged_serialization_is_the_schema_object() {
        let extraction = ReportType::General
            .decode(r#"{"company_name":"ACME","date":"2025-01-02","type":"notice","summary":"s"}"#)
            .unwrap();
        let value = serde_json::to_value(&extraction).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"company_name":"ACME","date":"2025-01-02","type":"notice","summary":"s"})
        );
    }

    #[test]
    fn test_issuer_name_per_variant() {
        let mut supply = ReportType::SupplyContract.decode(r#"{"corp_name":""}"#).unwrap();
        assert_eq!(supply.issuer_name(), "");
        supply.issuer_name_mut().push_str("SK hynix");
        assert_eq!(supply.issuer_name(), "SK hynix");

        let terms = ReportType::IssuanceTerms
            .decode(r#"{"issuer":{"name":"KB","areg_cik":"1"},"tranches":[{"name":"1-1","seniority":null}]}"#)
            .unwrap();
        assert_eq!(terms.issuer_name(), "KB");
        assert_eq!(terms.report_type(), ReportType::IssuanceTerms);
    }

    #[test]
    fn test_market_share_periods_flatten() {
        let share: MarketShare = serde_json::from_str(
            r#"{"product":"DRAM","period_2024_percent":41.5,"period_2023_percent":39.9}"#,
        )
        .unwrap();
        assert_eq!(share.product, "DRAM");
        assert_eq!(share.by_period.get("period_2024_percent"), Some(&41.5));
    }
}
