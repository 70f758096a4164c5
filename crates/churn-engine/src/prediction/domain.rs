use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Decision boundary shared by every scorer: scores at or above it are churn.
pub const CHURN_THRESHOLD: f64 = 0.5;

/// Rejected enumeration value, carrying the message shown to API callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} must be one of: {allowed}")]
pub struct InvalidChoice {
    pub field: &'static str,
    pub allowed: &'static str,
}

/// Customer contract term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Contract {
    #[serde(rename = "Month-to-month")]
    MonthToMonth,
    #[serde(rename = "One year")]
    OneYear,
    #[serde(rename = "Two year")]
    TwoYear,
}

impl Contract {
    pub const ALL: [Contract; 3] = [Contract::MonthToMonth, Contract::OneYear, Contract::TwoYear];

    pub const fn label(self) -> &'static str {
        match self {
            Contract::MonthToMonth => "Month-to-month",
            Contract::OneYear => "One year",
            Contract::TwoYear => "Two year",
        }
    }
}

impl FromStr for Contract {
    type Err = InvalidChoice;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Contract::ALL
            .into_iter()
            .find(|contract| contract.label() == value)
            .ok_or(InvalidChoice {
                field: "contract",
                allowed: "Month-to-month, One year, Two year",
            })
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Internet product the customer subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InternetService {
    #[serde(rename = "DSL")]
    Dsl,
    #[serde(rename = "Fiber optic")]
    FiberOptic,
    #[serde(rename = "None")]
    NoService,
}

impl InternetService {
    pub const ALL: [InternetService; 3] = [
        InternetService::Dsl,
        InternetService::FiberOptic,
        InternetService::NoService,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            InternetService::Dsl => "DSL",
            InternetService::FiberOptic => "Fiber optic",
            InternetService::NoService => "None",
        }
    }
}

impl FromStr for InternetService {
    type Err = InvalidChoice;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        InternetService::ALL
            .into_iter()
            .find(|service| service.label() == value)
            .ok_or(InvalidChoice {
                field: "internetService",
                allowed: "DSL, Fiber optic, None",
            })
    }
}

impl fmt::Display for InternetService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validated customer attributes. Only produced by the validation gate in
/// [`super::validation`], so every instance satisfies the documented ranges.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRecord {
    pub(super) age: u8,
    pub(super) tenure: u8,
    pub(super) monthly_charges: f64,
    pub(super) contract: Contract,
    pub(super) internet_service: InternetService,
    pub(super) payment_delay: u8,
}

impl FeatureRecord {
    pub fn age(&self) -> u8 {
        self.age
    }

    /// Months as a customer.
    pub fn tenure(&self) -> u8 {
        self.tenure
    }

    pub fn monthly_charges(&self) -> f64 {
        self.monthly_charges
    }

    pub fn contract(&self) -> Contract {
        self.contract
    }

    pub fn internet_service(&self) -> InternetService {
        self.internet_service
    }

    /// Days the latest payment is overdue.
    pub fn payment_delay(&self) -> u8 {
        self.payment_delay
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChurnLabel {
    #[serde(rename = "CHURN")]
    Churn,
    #[serde(rename = "NO_CHURN")]
    NoChurn,
}

impl ChurnLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= CHURN_THRESHOLD {
            ChurnLabel::Churn
        } else {
            ChurnLabel::NoChurn
        }
    }

    pub const fn votes(self) -> u32 {
        match self {
            ChurnLabel::Churn => 1,
            ChurnLabel::NoChurn => 0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ChurnLabel::Churn => "CHURN",
            ChurnLabel::NoChurn => "NO_CHURN",
        }
    }
}

impl fmt::Display for ChurnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One contributing signal behind a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationItem {
    pub feature: String,
    pub reason: String,
}

impl ExplanationItem {
    pub fn new(feature: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            reason: reason.into(),
        }
    }
}

/// Scorer output, serialized as the public `/api/predict` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub label: ChurnLabel,
    pub score: f64,
    pub votes: u32,
    pub explanation: Vec<ExplanationItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl PredictionResult {
    /// Votes are always derived from the label.
    pub fn new(
        label: ChurnLabel,
        score: f64,
        explanation: Vec<ExplanationItem>,
        model_version: Option<String>,
    ) -> Self {
        Self {
            label,
            score,
            votes: label.votes(),
            explanation,
            model_version,
        }
    }
}
