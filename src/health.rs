//! Health score calculation
//!
//! Validates the self-reported physiological form and maps it to an additive,
//! rule-based risk score on the 0-3 scale. Validation always precedes scoring;
//! a rejected form produces no partial result.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ValidationError;
use crate::fusion::round2;
use crate::types::{HealthInput, HealthResult, Sex};

/// Upper bound of the health score
pub const MAX_HEALTH_SCORE: f64 = 3.0;

/// Inclusive validation ranges
pub const SYSTOLIC_RANGE: (i64, i64) = (70, 200);
pub const DIASTOLIC_RANGE: (i64, i64) = (40, 130);
pub const HEART_RATE_RANGE: (i64, i64) = (40, 150);
pub const BLOOD_SUGAR_RANGE: (i64, i64) = (50, 400);
pub const AGE_RANGE: (i64, i64) = (18, 100);

/// Health form as submitted: every numeric field may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthForm {
    pub systolic: Option<i64>,
    pub diastolic: Option<i64>,
    pub heart_rate: Option<i64>,
    pub blood_sugar: Option<i64>,
    pub age: Option<i64>,
    #[serde(default)]
    pub sex: Sex,
}

impl HealthForm {
    /// Check presence and ranges; the whole form is rejected on the first failure
    pub fn validate(&self) -> Result<HealthInput, ValidationError> {
        let systolic = checked("systolic", self.systolic, SYSTOLIC_RANGE)?;
        let diastolic = checked("diastolic", self.diastolic, DIASTOLIC_RANGE)?;
        let heart_rate = checked("heart_rate", self.heart_rate, HEART_RATE_RANGE)?;
        let blood_sugar = checked("blood_sugar", self.blood_sugar, BLOOD_SUGAR_RANGE)?;
        let age = checked("age", self.age, AGE_RANGE)?;

        Ok(HealthInput {
            systolic,
            diastolic,
            heart_rate,
            blood_sugar,
            age,
            sex: self.sex,
        })
    }

    /// Validate then score
    pub fn submit(&self) -> Result<HealthResult, ValidationError> {
        let input = self.validate().map_err(|e| {
            warn!(error = %e, "health form rejected");
            e
        })?;
        score(input)
    }
}

impl From<HealthInput> for HealthForm {
    fn from(input: HealthInput) -> Self {
        Self {
            systolic: Some(input.systolic.into()),
            diastolic: Some(input.diastolic.into()),
            heart_rate: Some(input.heart_rate.into()),
            blood_sugar: Some(input.blood_sugar.into()),
            age: Some(input.age.into()),
            sex: input.sex,
        }
    }
}

fn checked(
    field: &'static str,
    value: Option<i64>,
    (min, max): (i64, i64),
) -> Result<u16, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField(field))?;
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    // Ranges are well inside u16
    Ok(value as u16)
}

/// Validate an input and attach its score
pub fn score(input: HealthInput) -> Result<HealthResult, ValidationError> {
    HealthForm::from(input).validate()?;

    let health_score = health_score(&input);
    info!(health_score, "health metrics scored");

    Ok(HealthResult {
        input,
        health_score,
        submitted_at: Utc::now(),
    })
}

/// Additive risk score, capped at 3 and rounded to 2 decimals.
///
/// Contributions are independent and summed:
/// ```text
/// blood pressure  +1   systolic > 140 or diastolic > 90
///                 +0.5 systolic > 160 or diastolic > 100
/// heart rate      +0.5 heart rate > 100 or < 60
///                 +0.5 heart rate > 110
/// blood sugar     +1   sugar > 140 or < 70
///                 +0.5 sugar > 180
/// age             +0.5 age > 60
/// ```
pub fn health_score(input: &HealthInput) -> f64 {
    let mut score = 0.0;

    if input.systolic > 140 || input.diastolic > 90 {
        score += 1.0;
    }
    if input.systolic > 160 || input.diastolic > 100 {
        score += 0.5;
    }

    if input.heart_rate > 100 || input.heart_rate < 60 {
        score += 0.5;
    }
    if input.heart_rate > 110 {
        score += 0.5;
    }

    if input.blood_sugar > 140 || input.blood_sugar < 70 {
        score += 1.0;
    }
    if input.blood_sugar > 180 {
        score += 0.5;
    }

    if input.age > 60 {
        score += 0.5;
    }

    round2(score).min(MAX_HEALTH_SCORE)
}
