// crates/partition-hub-dispatch/src/corporate.rs
// ============================================================================
// Module: Corporate Banking Service
// Description: Customer loan queries over the corporate banking dataset.
// Purpose: Serve loan, bank aggregate, and industry exposure operations.
// Dependencies: serde, serde_json, crate::{arguments, service, table}
// ============================================================================

//! ## Overview
//! Operations:
//! - `query_customer_loans(bank_name?, customer_name?, industry?)`: loans
//!   matching every supplied filter.
//! - `get_bank_aggregate_data(bank_name)`: portfolio totals of matching banks.
//! - `get_industry_exposure(industry)`: matching loan exposure grouped by bank;
//!   banks with no exposure are omitted.
//!
//! Untagged requests resolve through [`CorporateBankingService::table`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::arguments::Arguments;
use crate::arguments::ParamSpec;
use crate::arguments::matches_filter;
use crate::errors::DispatchError;
use crate::errors::ServiceLoadError;
use crate::service::DatasetLocation;
use crate::service::OperationSpec;
use crate::service::PartitionService;
use crate::service::load_dataset;
use crate::store::ObjectStore;
use crate::table::DecisionTable;
use crate::table::Predicate;
use crate::table::Rule;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default dataset key.
pub const CORPORATE_DATASET_KEY: &str = "data/customer_loans.json";
/// Line-of-business label.
pub const CORPORATE_LOB: &str = "Corporate Banking";
/// Loan query operation.
pub const QUERY_CUSTOMER_LOANS: &str = "query_customer_loans";
/// Bank aggregate operation.
pub const GET_BANK_AGGREGATE_DATA: &str = "get_bank_aggregate_data";
/// Industry exposure operation.
pub const GET_INDUSTRY_EXPOSURE: &str = "get_industry_exposure";

/// Bank filter key.
const BANK_NAME: &str = "bank_name";
/// Customer filter key.
const CUSTOMER_NAME: &str = "customer_name";
/// Industry filter key.
const INDUSTRY: &str = "industry";

/// Declared operations.
const OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        name: QUERY_CUSTOMER_LOANS,
        params: &[
            ParamSpec::text(BANK_NAME),
            ParamSpec::text(CUSTOMER_NAME),
            ParamSpec::text(INDUSTRY),
        ],
    },
    OperationSpec {
        name: GET_BANK_AGGREGATE_DATA,
        params: &[ParamSpec::required_text(BANK_NAME)],
    },
    OperationSpec {
        name: GET_INDUSTRY_EXPOSURE,
        params: &[ParamSpec::required_text(INDUSTRY)],
    },
];

// ============================================================================
// SECTION: Dataset
// ============================================================================

/// Corporate banking dataset document.
#[derive(Debug, Clone, Deserialize)]
pub struct CorporateDataset {
    /// Owning account identifier.
    pub account_id: String,
    /// Banks and their customer loans.
    #[serde(default)]
    pub banks: Vec<CorporateBank>,
}

/// One bank's loan book.
#[derive(Debug, Clone, Deserialize)]
pub struct CorporateBank {
    /// Bank name.
    pub bank_name: String,
    /// Total C&I loans in billions.
    pub total_ci_loans_billions: f64,
    /// Number of customers.
    pub total_customers: u64,
    /// Total exposure in millions.
    pub total_exposure_millions: f64,
    /// Customer loans.
    #[serde(default)]
    pub customer_loans: Vec<CustomerLoan>,
}

/// One customer loan.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerLoan {
    /// Customer name.
    pub customer_name: String,
    /// Customer industry.
    pub industry: String,
    /// Loan amount in millions.
    pub loan_amount_millions: f64,
    /// Credit rating.
    pub credit_rating: String,
    /// Loan type.
    pub loan_type: String,
    /// Ticker symbol.
    #[serde(default)]
    pub ticker: Option<String>,
    /// Relationship length in years.
    #[serde(default)]
    pub relationship_years: Option<u32>,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Corporate banking partition service.
#[derive(Debug, Clone)]
pub struct CorporateBankingService {
    /// Read-only dataset.
    dataset: CorporateDataset,
    /// Decision table for untagged requests.
    table: DecisionTable,
}

impl CorporateBankingService {
    /// Wraps an already-parsed dataset.
    #[must_use]
    pub fn new(dataset: CorporateDataset) -> Self {
        Self {
            dataset,
            table: Self::table(),
        }
    }

    /// Loads the dataset from the store.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceLoadError`] when the dataset cannot be read or parsed.
    pub async fn load(
        store: &dyn ObjectStore,
        location: &DatasetLocation,
    ) -> Result<Self, ServiceLoadError> {
        Ok(Self::new(load_dataset(store, location).await?))
    }

    /// Decision list for untagged requests.
    ///
    /// A customer filter, or an industry combined with a bank filter, selects
    /// the loan query before the single-key summary rules are considered.
    #[must_use]
    pub fn table() -> DecisionTable {
        DecisionTable::new(
            [BANK_NAME, CUSTOMER_NAME, INDUSTRY],
            vec![
                Rule::new("empty", Predicate::EmptyBag, QUERY_CUSTOMER_LOANS),
                Rule::new(
                    "customer_or_industry_with_filter",
                    Predicate::Any(vec![
                        Predicate::Has(CUSTOMER_NAME),
                        Predicate::All(vec![Predicate::Has(INDUSTRY), Predicate::Has(BANK_NAME)]),
                    ]),
                    QUERY_CUSTOMER_LOANS,
                ),
                Rule::new("bank_only", Predicate::Exactly(&[BANK_NAME]), GET_BANK_AGGREGATE_DATA),
                Rule::new("industry_only", Predicate::Exactly(&[INDUSTRY]), GET_INDUSTRY_EXPOSURE),
                Rule::new("fallback", Predicate::Always, QUERY_CUSTOMER_LOANS),
            ],
        )
    }

    /// Loans matching every supplied filter.
    fn query_customer_loans(&self, arguments: &Arguments<'_>) -> Result<Value, DispatchError> {
        let bank_name = arguments.text(BANK_NAME)?;
        let customer_name = arguments.text(CUSTOMER_NAME)?;
        let industry = arguments.text(INDUSTRY)?;
        let results: Vec<Value> = self
            .dataset
            .banks
            .iter()
            .filter(|bank| matches_filter(&bank.bank_name, bank_name))
            .flat_map(|bank| {
                bank.customer_loans
                    .iter()
                    .filter(|loan| {
                        matches_filter(&loan.customer_name, customer_name)
                            && matches_filter(&loan.industry, industry)
                    })
                    .map(|loan| {
                        json!({
                            "bank": bank.bank_name,
                            "customer": loan.customer_name,
                            "industry": loan.industry,
                            "loan_amount_millions": loan.loan_amount_millions,
                            "credit_rating": loan.credit_rating,
                            "loan_type": loan.loan_type,
                        })
                    })
            })
            .collect();
        Ok(json!({
            "lob": CORPORATE_LOB,
            "account_id": self.dataset.account_id,
            "total_results": results.len(),
            "results": results,
        }))
    }

    /// Portfolio totals of every bank matching the filter.
    fn get_bank_aggregate_data(&self, arguments: &Arguments<'_>) -> Result<Value, DispatchError> {
        let bank_name = arguments.required_text(BANK_NAME)?;
        let results: Vec<Value> = self
            .dataset
            .banks
            .iter()
            .filter(|bank| matches_filter(&bank.bank_name, Some(bank_name)))
            .map(|bank| {
                json!({
                    "bank_name": bank.bank_name,
                    "total_ci_loans_billions": bank.total_ci_loans_billions,
                    "total_customers": bank.total_customers,
                    "total_exposure_millions": bank.total_exposure_millions,
                })
            })
            .collect();
        Ok(json!({
            "lob": CORPORATE_LOB,
            "account_id": self.dataset.account_id,
            "total_results": results.len(),
            "results": results,
        }))
    }

    /// Matching loan exposure grouped by owning bank.
    fn get_industry_exposure(&self, arguments: &Arguments<'_>) -> Result<Value, DispatchError> {
        let industry = arguments.required_text(INDUSTRY)?;
        let mut exposure_by_bank = BTreeMap::new();
        let mut total_exposure = 0.0_f64;
        for bank in &self.dataset.banks {
            let matching: Vec<&CustomerLoan> = bank
                .customer_loans
                .iter()
                .filter(|loan| matches_filter(&loan.industry, Some(industry)))
                .collect();
            let exposure: f64 = matching.iter().map(|loan| loan.loan_amount_millions).sum();
            if exposure > 0.0 {
                total_exposure += exposure;
                let customers: Vec<&str> =
                    matching.iter().map(|loan| loan.customer_name.as_str()).collect();
                exposure_by_bank.insert(
                    bank.bank_name.clone(),
                    json!({"exposure_millions": exposure, "customers": customers}),
                );
            }
        }
        Ok(json!({
            "lob": CORPORATE_LOB,
            "industry": industry,
            "exposure_by_bank": exposure_by_bank,
            "total_exposure_millions": total_exposure,
        }))
    }
}

impl PartitionService for CorporateBankingService {
    fn lob(&self) -> &str {
        CORPORATE_LOB
    }

    fn operations(&self) -> &'static [OperationSpec] {
        OPERATIONS
    }

    fn decision_table(&self) -> &DecisionTable {
        &self.table
    }

    fn execute(&self, operation: &str, arguments: &Arguments<'_>) -> Result<Value, DispatchError> {
        match operation {
            QUERY_CUSTOMER_LOANS => self.query_customer_loans(arguments),
            GET_BANK_AGGREGATE_DATA => self.get_bank_aggregate_data(arguments),
            GET_INDUSTRY_EXPOSURE => self.get_industry_exposure(arguments),
            other => Err(DispatchError::NoMatchingOperation {
                operation: Some(other.to_string()),
            }),
        }
    }
}
