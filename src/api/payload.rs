// api/payload.rs - request bodies and their validation
//
// Every field is optional at the serde level so that a missing field is
// reported as a validation error naming the field, not as a parse failure.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

use crate::api::date::parse_date;
use crate::database::models::{LedgerChanges, NewLedgerEntry};
use crate::error::ApiError;

const REQUIRED: &str = "This field is required";
const BAD_DATE: &str = "Invalid date format. Use YYYY-MM-DD";
const TOO_LONG: &str = "Must be at most 255 characters";
const AMOUNT_TOO_LARGE: &str = "Must be between -99999999.99 and 99999999.99";

/// Text columns are VARCHAR(255)
const MAX_TEXT_LEN: usize = 255;

/// Amounts are stored as DECIMAL(10,2)
fn amount_in_range(amount: Decimal) -> bool {
    amount.abs() < Decimal::new(100_000_000, 0)
}

/// Round half away from zero, as NUMERIC(10,2) does on insert
fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Amounts must arrive as JSON numbers. `Decimal`'s own `Deserialize`
/// also takes strings.
mod json_number {
    use rust_decimal::Decimal;
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
        match Option::<f64>::deserialize(deserializer)? {
            Some(v) => Decimal::try_from(v).map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Decode a JSON request body
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_json(format!("Invalid request body: {}", e)))
}

/// Collects per-field problems and turns them into one validation error.
#[derive(Debug, Default)]
struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    fn add(&mut self, field: &str, problem: &str) {
        self.0.insert(field.to_string(), problem.to_string());
    }

    fn require_text(&mut self, field: &str, value: Option<String>) -> String {
        match value {
            Some(v) if v.trim().is_empty() => {
                self.add(field, REQUIRED);
                String::new()
            }
            Some(v) if v.chars().count() > MAX_TEXT_LEN => {
                self.add(field, TOO_LONG);
                String::new()
            }
            Some(v) => v,
            None => {
                self.add(field, REQUIRED);
                String::new()
            }
        }
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            return Ok(());
        }
        let message = if self.0.values().all(|p| p == REQUIRED) {
            "Missing required fields"
        } else {
            "Invalid field format"
        };
        Err(ApiError::validation_error(message, Some(self.0)))
    }
}

/// Credentials with the password still in plain text
#[derive(Debug, Clone, PartialEq)]
pub struct UserInput {
    pub username: String,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserPayload {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CreateUserPayload {
    pub fn validate(self) -> Result<UserInput, ApiError> {
        let mut errors = FieldErrors::default();
        let username = errors.require_text("username", self.username);
        let password = match self.password {
            Some(p) if !p.is_empty() => Some(p),
            _ => {
                errors.add("password", REQUIRED);
                None
            }
        };
        errors.finish()?;
        Ok(UserInput { username, password })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserPayload {
    pub username: Option<String>,
    /// Empty or absent keeps the current password
    pub password: Option<String>,
}

impl UpdateUserPayload {
    pub fn validate(self) -> Result<UserInput, ApiError> {
        let mut errors = FieldErrors::default();
        let username = errors.require_text("username", self.username);
        errors.finish()?;
        Ok(UserInput {
            username,
            password: self.password.filter(|p| !p.is_empty()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateLedgerPayload {
    pub user_id: Option<i32>,
    pub category: Option<String>,
    /// JSON numbers only; a quoted amount is a decode error
    #[serde(default, deserialize_with = "json_number::deserialize")]
    pub amount: Option<Decimal>,
    pub date: Option<String>,
}

impl CreateLedgerPayload {
    pub fn validate(self) -> Result<NewLedgerEntry, ApiError> {
        let mut errors = FieldErrors::default();
        let user_id = match self.user_id {
            Some(id) if id > 0 => id,
            Some(_) => {
                errors.add("user_id", "Must be a positive integer");
                0
            }
            None => {
                errors.add("user_id", REQUIRED);
                0
            }
        };
        let fields = LedgerFields::check(&mut errors, self.category, self.amount, self.date);
        errors.finish()?;
        let (category, amount, date) = fields.ok_or_else(|| ApiError::validation_error("Invalid field format", None))?;
        Ok(NewLedgerEntry {
            user_id,
            category,
            amount,
            date,
        })
    }
}

/// Full replacement of an entry; any `user_id` in the body is ignored
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLedgerPayload {
    pub category: Option<String>,
    /// JSON numbers only; a quoted amount is a decode error
    #[serde(default, deserialize_with = "json_number::deserialize")]
    pub amount: Option<Decimal>,
    pub date: Option<String>,
}

impl UpdateLedgerPayload {
    pub fn validate(self) -> Result<LedgerChanges, ApiError> {
        let mut errors = FieldErrors::default();
        let fields = LedgerFields::check(&mut errors, self.category, self.amount, self.date);
        errors.finish()?;
        let (category, amount, date) = fields.ok_or_else(|| ApiError::validation_error("Invalid field format", None))?;
        Ok(LedgerChanges { category, amount, date })
    }
}

struct LedgerFields;

impl LedgerFields {
    /// Shared checks for category, amount and date. Yields the parsed values
    /// only when all three are usable.
    fn check(
        errors: &mut FieldErrors,
        category: Option<String>,
        amount: Option<Decimal>,
        date: Option<String>,
    ) -> Option<(String, Decimal, chrono::NaiveDate)> {
        let category = errors.require_text("category", category);
        let amount = match amount {
            Some(a) => {
                let cents = to_cents(a);
                if amount_in_range(cents) {
                    Some(cents)
                } else {
                    errors.add("amount", AMOUNT_TOO_LARGE);
                    None
                }
            }
            None => {
                errors.add("amount", REQUIRED);
                None
            }
        };
        let date = match date.as_deref() {
            None | Some("") => {
                errors.add("date", REQUIRED);
                None
            }
            Some(raw) => match parse_date(raw) {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.add("date", BAD_DATE);
                    None
                }
            },
        };
        Some((category, amount?, date?))
    }
}
