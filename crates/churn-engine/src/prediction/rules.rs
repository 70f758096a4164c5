use super::domain::{
    ChurnLabel, Contract, ExplanationItem, FeatureRecord, InternetService, PredictionResult,
};

const PAYMENT_DELAY_WEIGHT: f64 = 0.5;
const PAYMENT_DELAY_SCALE_DAYS: f64 = 60.0;
const MONTH_TO_MONTH_WEIGHT: f64 = 0.2;
const FIBER_OPTIC_WEIGHT: f64 = 0.1;
const TENURE_WEIGHT: f64 = 0.2;
const TENURE_SCALE_MONTHS: f64 = 120.0;
/// Tenures below this many months are called out in the explanation.
const SHORT_TENURE_MONTHS: u8 = 24;

/// Deterministic in-process scorer. Pure and total over validated records.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleScorer;

impl RuleScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, record: &FeatureRecord) -> PredictionResult {
        let mut explanation = Vec::new();

        let payment_delay = record.payment_delay();
        let delay_component =
            f64::from(payment_delay) / PAYMENT_DELAY_SCALE_DAYS * PAYMENT_DELAY_WEIGHT;
        if payment_delay > 0 {
            explanation.push(ExplanationItem::new(
                "paymentDelay",
                format!("Payment delayed by {payment_delay} days"),
            ));
        }

        let contract_component = if record.contract() == Contract::MonthToMonth {
            explanation.push(ExplanationItem::new(
                "contract",
                "Month-to-month contract increases churn risk",
            ));
            MONTH_TO_MONTH_WEIGHT
        } else {
            0.0
        };

        let internet_component = if record.internet_service() == InternetService::FiberOptic {
            explanation.push(ExplanationItem::new(
                "internetService",
                "Fiber optic customers churn more often",
            ));
            FIBER_OPTIC_WEIGHT
        } else {
            0.0
        };

        let tenure = record.tenure();
        let tenure_component = (1.0 - f64::from(tenure) / TENURE_SCALE_MONTHS) * TENURE_WEIGHT;
        if tenure < SHORT_TENURE_MONTHS {
            explanation.push(ExplanationItem::new(
                "tenure",
                format!("Short tenure ({tenure} months) signals weak retention"),
            ));
        }

        let score = (delay_component + contract_component + internet_component + tenure_component)
            .clamp(0.0, 1.0);

        PredictionResult::new(ChurnLabel::from_score(score), score, explanation, None)
    }
}
