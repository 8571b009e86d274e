// crates/partition-hub-dispatch/src/treasury.rs
// ============================================================================
// Module: Treasury & Risk Service
// Description: Risk model queries and expected-loss math over the risk dataset.
// Purpose: Serve risk model, market data, and expected loss operations.
// Dependencies: serde, serde_json, crate::{arguments, service, table}
// ============================================================================

//! ## Overview
//! Operations:
//! - `query_risk_models(bank_name?, industry?)`
//! - `get_market_data()`: explicit requests only; no key shape selects it.
//! - `calculate_expected_loss(industry, exposure_millions)`: averages PD, LGD
//!   and EL over every matching model; expected loss is
//!   `exposure * average EL / 100`. Reported figures are rounded to two
//!   decimals.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Map;
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
use crate::service::round2;
use crate::store::ObjectStore;
use crate::table::DecisionTable;
use crate::table::Predicate;
use crate::table::Rule;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default dataset key.
pub const TREASURY_DATASET_KEY: &str = "data/risk_models.json";
/// Line-of-business label.
pub const TREASURY_LOB: &str = "Treasury & Risk";
/// Risk model query operation.
pub const QUERY_RISK_MODELS: &str = "query_risk_models";
/// Market data operation.
pub const GET_MARKET_DATA: &str = "get_market_data";
/// Expected loss operation.
pub const CALCULATE_EXPECTED_LOSS: &str = "calculate_expected_loss";
/// Note attached to market data payloads.
pub const MARKET_DATA_NOTE: &str = "Sample market data; use live rate sources in production";

/// Bank filter key.
const BANK_NAME: &str = "bank_name";
/// Industry filter key.
const INDUSTRY: &str = "industry";
/// Exposure amount key.
const EXPOSURE_MILLIONS: &str = "exposure_millions";

/// Declared operations.
const OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        name: QUERY_RISK_MODELS,
        params: &[ParamSpec::text(BANK_NAME), ParamSpec::text(INDUSTRY)],
    },
    OperationSpec {
        name: GET_MARKET_DATA,
        params: &[],
    },
    OperationSpec {
        name: CALCULATE_EXPECTED_LOSS,
        params: &[ParamSpec::required_text(INDUSTRY), ParamSpec::required_amount(EXPOSURE_MILLIONS)],
    },
];

// ============================================================================
// SECTION: Dataset
// ============================================================================

/// Treasury & risk dataset document.
#[derive(Debug, Clone, Deserialize)]
pub struct TreasuryDataset {
    /// Owning account identifier.
    pub account_id: String,
    /// Market data snapshot, passed through unchanged.
    #[serde(default)]
    pub market_data: Map<String, Value>,
    /// Banks and their risk models.
    #[serde(default)]
    pub banks: Vec<RiskBank>,
}

/// One bank's risk models.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskBank {
    /// Bank name.
    pub bank_name: String,
    /// Per-industry models.
    #[serde(default)]
    pub risk_models: Vec<RiskModel>,
}

/// One industry risk model.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskModel {
    /// Industry covered.
    pub industry: String,
    /// Probability of default (percent).
    pub probability_of_default_pct: f64,
    /// Loss given default (percent).
    pub loss_given_default_pct: f64,
    /// Expected loss (percent).
    pub expected_loss_pct: f64,
    /// Equivalent agency rating.
    pub rating_equivalent: String,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Treasury & risk partition service.
#[derive(Debug, Clone)]
pub struct TreasuryRiskService {
    /// Read-only dataset.
    dataset: TreasuryDataset,
    /// Decision table for untagged requests.
    table: DecisionTable,
}

impl TreasuryRiskService {
    /// Wraps an already-parsed dataset.
    #[must_use]
    pub fn new(dataset: TreasuryDataset) -> Self {
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

    /// Decision list for untagged requests. An exposure amount without an
    /// industry falls through to the filterable listing.
    #[must_use]
    pub fn table() -> DecisionTable {
        DecisionTable::new(
            [BANK_NAME, INDUSTRY, EXPOSURE_MILLIONS],
            vec![
                Rule::new("empty", Predicate::EmptyBag, QUERY_RISK_MODELS),
                Rule::new(
                    "industry_with_exposure",
                    Predicate::All(vec![Predicate::Has(INDUSTRY), Predicate::Has(EXPOSURE_MILLIONS)]),
                    CALCULATE_EXPECTED_LOSS,
                ),
                Rule::new(
                    "bank_or_industry",
                    Predicate::Any(vec![Predicate::Has(BANK_NAME), Predicate::Has(INDUSTRY)]),
                    QUERY_RISK_MODELS,
                ),
                Rule::new("fallback", Predicate::Always, QUERY_RISK_MODELS),
            ],
        )
    }

    /// Models matching every supplied filter.
    fn query_risk_models(&self, arguments: &Arguments<'_>) -> Result<Value, DispatchError> {
        let bank_name = arguments.text(BANK_NAME)?;
        let industry = arguments.text(INDUSTRY)?;
        let results: Vec<Value> = self
            .dataset
            .banks
            .iter()
            .filter(|bank| matches_filter(&bank.bank_name, bank_name))
            .flat_map(|bank| {
                bank.risk_models.iter().filter(|model| matches_filter(&model.industry, industry)).map(
                    |model| {
                        json!({
                            "bank": bank.bank_name,
                            "industry": model.industry,
                            "probability_of_default_pct": model.probability_of_default_pct,
                            "loss_given_default_pct": model.loss_given_default_pct,
                            "expected_loss_pct": model.expected_loss_pct,
                            "rating_equivalent": model.rating_equivalent,
                        })
                    },
                )
            })
            .collect();
        Ok(json!({
            "lob": TREASURY_LOB,
            "account_id": self.dataset.account_id,
            "total_results": results.len(),
            "results": results,
        }))
    }

    /// Market data snapshot.
    fn get_market_data(&self) -> Value {
        json!({
            "lob": TREASURY_LOB,
            "market_data": self.dataset.market_data,
            "note": MARKET_DATA_NOTE,
        })
    }

    /// Expected loss for an exposure, averaged over matching models.
    fn calculate_expected_loss(&self, arguments: &Arguments<'_>) -> Result<Value, DispatchError> {
        let industry = arguments.required_text(INDUSTRY)?;
        let exposure = arguments.required_amount(EXPOSURE_MILLIONS)?;
        let models: Vec<&RiskModel> = self
            .dataset
            .banks
            .iter()
            .flat_map(|bank| bank.risk_models.iter())
            .filter(|model| matches_filter(&model.industry, Some(industry)))
            .collect();
        if models.is_empty() {
            return Err(DispatchError::invalid(
                INDUSTRY,
                format!("no risk models found for industry {industry}"),
            ));
        }
        let count = f64::from(u32::try_from(models.len()).unwrap_or(u32::MAX));
        let average = |field: fn(&RiskModel) -> f64| models.iter().map(|model| field(model)).sum::<f64>() / count;
        let average_pd = average(|model| model.probability_of_default_pct);
        let average_lgd = average(|model| model.loss_given_default_pct);
        let average_el = average(|model| model.expected_loss_pct);
        Ok(json!({
            "lob": TREASURY_LOB,
            "industry": industry,
            "exposure_millions": exposure,
            "average_pd_pct": round2(average_pd),
            "average_lgd_pct": round2(average_lgd),
            "average_el_pct": round2(average_el),
            "expected_loss_millions": round2(exposure * average_el / 100.0),
            "models_used": models.len(),
        }))
    }
}

impl PartitionService for TreasuryRiskService {
    fn lob(&self) -> &str {
        TREASURY_LOB
    }

    fn operations(&self) -> &'static [OperationSpec] {
        OPERATIONS
    }

    fn decision_table(&self) -> &DecisionTable {
        &self.table
    }

    fn execute(&self, operation: &str, arguments: &Arguments<'_>) -> Result<Value, DispatchError> {
        match operation {
            QUERY_RISK_MODELS => self.query_risk_models(arguments),
            GET_MARKET_DATA => Ok(self.get_market_data()),
            CALCULATE_EXPECTED_LOSS => self.calculate_expected_loss(arguments),
            other => Err(DispatchError::NoMatchingOperation {
                operation: Some(other.to_string()),
            }),
        }
    }
}
