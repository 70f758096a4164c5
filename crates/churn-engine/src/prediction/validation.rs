use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::domain::{Contract, FeatureRecord, InternetService};

pub const MAX_AGE: i64 = 120;
pub const MAX_TENURE_MONTHS: i64 = 120;
pub const MAX_MONTHLY_CHARGES: f64 = 1000.0;
pub const MAX_PAYMENT_DELAY_DAYS: i64 = 60;

/// Wire shape of a prediction request. Every field is optional here so that missing values are
/// reported alongside out-of-range ones instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub age: Option<i64>,
    pub tenure: Option<i64>,
    pub monthly_charges: Option<f64>,
    pub contract: Option<String>,
    pub internet_service: Option<String>,
    pub payment_delay: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// Every constraint a request broke, in record field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field,
            message: message.into(),
        });
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.violations.iter().map(|violation| violation.field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

fn bounded_int(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<i64>,
    max: i64,
) -> Option<u8> {
    match value {
        None => {
            errors.push(field, format!("{field} is required"));
            None
        }
        Some(value) if value < 0 => {
            errors.push(field, format!("{field} must be >= 0"));
            None
        }
        Some(value) if value > max => {
            errors.push(field, format!("{field} must be <= {max}"));
            None
        }
        Some(value) => u8::try_from(value).ok(),
    }
}

fn bounded_charges(errors: &mut ValidationErrors, value: Option<f64>) -> Option<f64> {
    const FIELD: &str = "monthlyCharges";
    match value {
        None => {
            errors.push(FIELD, format!("{FIELD} is required"));
            None
        }
        Some(value) if !value.is_finite() => {
            errors.push(FIELD, format!("{FIELD} must be a finite number"));
            None
        }
        Some(value) if value < 0.0 => {
            errors.push(FIELD, format!("{FIELD} must be >= 0"));
            None
        }
        Some(value) if value > MAX_MONTHLY_CHARGES => {
            errors.push(FIELD, format!("{FIELD} must be <= {MAX_MONTHLY_CHARGES}"));
            None
        }
        Some(value) => Some(value),
    }
}

fn choice<T>(errors: &mut ValidationErrors, field: &'static str, value: Option<&str>) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match value {
        None => {
            errors.push(field, format!("{field} is required"));
            None
        }
        Some(raw) => match raw.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                errors.push(field, err.to_string());
                None
            }
        },
    }
}

fn integer_field(
    errors: &mut ValidationErrors,
    body: &Map<String, Value>,
    field: &'static str,
) -> Option<i64> {
    match body.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::Number(number)) => {
            // Whole floats such as 30.0 count as integers.
            let whole = number.as_i64().or_else(|| {
                number
                    .as_f64()
                    .filter(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64)
                    .map(|value| value as i64)
            });
            if whole.is_none() {
                errors.push(field, format!("{field} must be an integer"));
            }
            whole
        }
        Some(_) => {
            errors.push(field, format!("{field} must be an integer"));
            None
        }
    }
}

fn number_field(
    errors: &mut ValidationErrors,
    body: &Map<String, Value>,
    field: &'static str,
) -> Option<f64> {
    match body.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::Number(number)) => number.as_f64(),
        Some(_) => {
            errors.push(field, format!("{field} must be a number"));
            None
        }
    }
}

fn text_field(
    errors: &mut ValidationErrors,
    body: &Map<String, Value>,
    field: &'static str,
) -> Option<String> {
    match body.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            errors.push(field, format!("{field} must be a string"));
            None
        }
    }
}

/// Reads the wire shape out of an arbitrary JSON body, reporting mistyped fields in the same
/// `field: message` form as range violations. Unknown keys are ignored.
impl TryFrom<Value> for PredictRequest {
    type Error = ValidationErrors;

    fn try_from(body: Value) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::default();
        let Value::Object(body) = body else {
            errors.push("body", "request body must be a JSON object");
            return Err(errors);
        };

        let request = PredictRequest {
            age: integer_field(&mut errors, &body, "age"),
            tenure: integer_field(&mut errors, &body, "tenure"),
            monthly_charges: number_field(&mut errors, &body, "monthlyCharges"),
            contract: text_field(&mut errors, &body, "contract"),
            internet_service: text_field(&mut errors, &body, "internetService"),
            payment_delay: integer_field(&mut errors, &body, "paymentDelay"),
        };

        if errors.is_empty() {
            Ok(request)
        } else {
            Err(errors)
        }
    }
}

impl TryFrom<PredictRequest> for FeatureRecord {
    type Error = ValidationErrors;

    fn try_from(request: PredictRequest) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::default();

        let age = bounded_int(&mut errors, "age", request.age, MAX_AGE);
        let tenure = bounded_int(&mut errors, "tenure", request.tenure, MAX_TENURE_MONTHS);
        let monthly_charges = bounded_charges(&mut errors, request.monthly_charges);
        let contract = choice::<Contract>(&mut errors, "contract", request.contract.as_deref());
        let internet_service = choice::<InternetService>(
            &mut errors,
            "internetService",
            request.internet_service.as_deref(),
        );
        let payment_delay = bounded_int(
            &mut errors,
            "paymentDelay",
            request.payment_delay,
            MAX_PAYMENT_DELAY_DAYS,
        );

        match (
            age,
            tenure,
            monthly_charges,
            contract,
            internet_service,
            payment_delay,
        ) {
            (
                Some(age),
                Some(tenure),
                Some(monthly_charges),
                Some(contract),
                Some(internet_service),
                Some(payment_delay),
            ) if errors.is_empty() => Ok(FeatureRecord {
                age,
                tenure,
                monthly_charges,
                contract,
                internet_service,
                payment_delay,
            }),
            _ => Err(errors),
        }
    }
}

impl FeatureRecord {
    /// Typed constructor for callers that already hold parsed enumerations.
    pub fn new(
        age: u32,
        tenure: u32,
        monthly_charges: f64,
        contract: Contract,
        internet_service: InternetService,
        payment_delay: u32,
    ) -> Result<Self, ValidationErrors> {
        FeatureRecord::try_from(PredictRequest {
            age: Some(i64::from(age)),
            tenure: Some(i64::from(tenure)),
            monthly_charges: Some(monthly_charges),
            contract: Some(contract.label().to_string()),
            internet_service: Some(internet_service.label().to_string()),
            payment_delay: Some(i64::from(payment_delay)),
        })
    }
}
