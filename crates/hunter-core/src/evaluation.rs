//! Body evaluations and hunter re-evaluation.
//!
//! Form input is validated before anything is written; a rejected form
//! produces no partial record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::storage::{Database, EvaluationRecord};

/// Parse a positive, finite measurement.
pub fn parse_measurement(field: &str, raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing(field.to_string()));
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(ValidationError::NotNumeric {
            field: field.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub height_cm: f64,
    pub weight_kg: f64,
}

impl Measurement {
    /// # Errors
    /// Either field empty or not a positive number.
    pub fn parse(height: &str, weight: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            height_cm: parse_measurement("height", height)?,
            weight_kg: parse_measurement("weight", weight)?,
        })
    }
}

pub fn submit_evaluation(
    db: &Database,
    owner_id: &str,
    height: &str,
    weight: &str,
    now: DateTime<Utc>,
) -> Result<EvaluationRecord> {
    let measurement = Measurement::parse(height, weight)?;
    let record = db.record_evaluation(owner_id, &measurement, now)?;
    tracing::info!(evaluation_id = %record.id, "evaluation recorded");
    Ok(record)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitnessLevel {
    Low,
    Moderate,
    High,
}

impl FitnessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FitnessLevel::Low => "Low",
            FitnessLevel::Moderate => "Moderate",
            FitnessLevel::High => "High",
        }
    }

    pub fn rank(self) -> &'static str {
        match self {
            FitnessLevel::Low => "E-rank",
            FitnessLevel::Moderate => "C-rank",
            FitnessLevel::High => "A-rank",
        }
    }
}

impl std::str::FromStr for FitnessLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(FitnessLevel::Low),
            "moderate" => Ok(FitnessLevel::Moderate),
            "high" => Ok(FitnessLevel::High),
            "" => Err(ValidationError::Missing("level".into())),
            other => Err(ValidationError::InvalidValue {
                field: "level".into(),
                message: format!("'{other}' is not one of Low, Moderate, High"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReEvaluation {
    pub strength_level: FitnessLevel,
    pub endurance_level: FitnessLevel,
    pub completed_at: DateTime<Utc>,
}

/// # Errors
/// Both levels are required and must name a known level.
pub fn submit_reevaluation(
    db: &Database,
    owner_id: &str,
    strength: &str,
    endurance: &str,
    now: DateTime<Utc>,
) -> Result<ReEvaluation> {
    if strength.trim().is_empty() || endurance.trim().is_empty() {
        return Err(ValidationError::Missing("strength and endurance levels".into()).into());
    }
    let reevaluation = ReEvaluation {
        strength_level: strength.parse()?,
        endurance_level: endurance.parse()?,
        completed_at: now,
    };
    db.save_reevaluation(owner_id, &reevaluation)?;
    Ok(reevaluation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Profile;

    fn db_with_user() -> Database {
        let db = Database::open_memory().unwrap();
        let profile = Profile {
            email: "yoo@hunters.kr".into(),
            name: "Yoo".into(),
            age: 30,
            height_cm: 165.0,
            weight_kg: 55.0,
            activity: "high".into(),
        };
        db.insert_user("u", &profile, "s", "d", Utc::now()).unwrap();
        db
    }

    #[test]
    fn measurement_requires_positive_numbers() {
        assert_eq!(parse_measurement("height", " 172.5 "), Ok(172.5));
        assert_eq!(
            parse_measurement("height", ""),
            Err(ValidationError::Missing("height".into()))
        );
        assert!(parse_measurement("weight", "abc").is_err());
        assert!(parse_measurement("weight", "NaN").is_err());
        assert!(parse_measurement("weight", "-4").is_err());
    }

    #[test]
    fn invalid_form_writes_nothing() {
        let db = db_with_user();
        assert!(submit_evaluation(&db, "u", "170", "heavy", Utc::now()).is_err());
        assert!(db.evaluations("u").unwrap().is_empty());

        submit_evaluation(&db, "u", "170", "60", Utc::now()).unwrap();
        assert_eq!(db.evaluations("u").unwrap().len(), 1);
    }

    #[test]
    fn reevaluation_needs_both_levels() {
        let db = db_with_user();
        assert!(submit_reevaluation(&db, "u", "", "High", Utc::now()).is_err());
        assert!(submit_reevaluation(&db, "u", "Legendary", "High", Utc::now()).is_err());

        let re = submit_reevaluation(&db, "u", "moderate", "High", Utc::now()).unwrap();
        assert_eq!(re.strength_level, FitnessLevel::Moderate);
        assert_eq!(re.endurance_level.rank(), "A-rank");
    }
}
