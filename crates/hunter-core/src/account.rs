//! Local account registry: registration, login and the greeting line.
//!
//! Passwords are stored as a salted SHA-256 digest.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{AccountError, Result, ValidationError};
use crate::evaluation::parse_measurement;
use crate::session::Session;
use crate::storage::Database;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Validated profile data stored on the user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,
    pub name: String,
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity: String,
}

/// Raw registration form input.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub age: String,
    pub height: String,
    pub weight: String,
    pub activity: String,
}

impl Registration {
    /// # Errors
    /// Short password, any empty field, or non-numeric age/height/weight.
    pub fn validate(&self) -> Result<Profile> {
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            }
            .into());
        }
        let fields = [
            &self.email,
            &self.name,
            &self.age,
            &self.height,
            &self.weight,
            &self.activity,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(AccountError::IncompleteProfile.into());
        }

        let age = self
            .age
            .trim()
            .parse::<u32>()
            .map_err(|_| ValidationError::NotNumeric {
                field: "age".into(),
                value: self.age.clone(),
            })?;

        Ok(Profile {
            email: self.email.trim().to_ascii_lowercase(),
            name: self.name.trim().to_string(),
            age,
            height_cm: parse_measurement("height", &self.height)?,
            weight_kg: parse_measurement("weight", &self.weight)?,
            activity: self.activity.trim().to_string(),
        })
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Create the account and sign the session in.
///
/// # Errors
/// Validation failures, or [`AccountError::EmailInUse`].
pub fn register(
    db: &Database,
    session: &mut Session,
    form: &Registration,
    now: DateTime<Utc>,
) -> Result<String> {
    let profile = form.validate()?;
    let id = Uuid::new_v4().to_string();
    let salt = Uuid::new_v4().simple().to_string();

    if !db.insert_user(&id, &profile, &salt, &digest(&salt, &form.password), now)? {
        return Err(AccountError::EmailInUse.into());
    }
    tracing::info!(user_id = %id, "registered");
    session.sign_in(id.clone(), now.date_naive());
    Ok(id)
}

/// # Errors
/// [`AccountError::InvalidCredentials`] for an unknown email or a wrong password.
pub fn login(
    db: &Database,
    session: &mut Session,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let email = email.trim().to_ascii_lowercase();
    let Some((id, salt, stored)) = db.credentials(&email)? else {
        return Err(AccountError::InvalidCredentials.into());
    };
    if digest(&salt, password) != stored {
        tracing::warn!("rejected login attempt");
        return Err(AccountError::InvalidCredentials.into());
    }
    session.sign_in(id.clone(), now.date_naive());
    Ok(id)
}

pub fn logout(session: &mut Session) {
    session.sign_out();
}

/// Time-of-day greeting. `hour` is 0..=23.
pub fn greeting(name: Option<&str>, email: Option<&str>, hour: u32) -> String {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(capitalize)
        .or_else(|| {
            email
                .and_then(|e| e.split('@').next())
                .filter(|local| !local.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Anonymous".to_string());

    if hour < 12 {
        format!("Good morning, Hunter {name}, start your quest today!")
    } else if hour < 17 {
        format!("Good afternoon, Hunter {name}, start your quest!")
    } else {
        format!("Good evening, Hunter {name}, start your quest!")
    }
}

/// Greeting for the given instant.
pub fn greeting_at(name: Option<&str>, email: Option<&str>, at: DateTime<Utc>) -> String {
    greeting(name, email, at.hour())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
