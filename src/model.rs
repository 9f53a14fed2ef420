use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{de, Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::vin::Vin;

pub const MIN_MODEL_YEAR: i32 = 1886;
pub const MAX_MODEL_YEAR: i32 = 2100;

/// Field name to every reason it was rejected.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// A stored vehicle row.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: i64,
    pub vin: String,
    #[serde(rename = "manuName")]
    pub manufacturer_name: String,
    pub description: Option<String>,
    pub horse_power: i32,
    pub model_name: String,
    pub model_year: i32,
    pub purchase_price: f64,
    pub fuel_type: String,
}

impl Vehicle {
    pub fn from_input(id: i64, input: VehicleInput) -> Self {
        Self {
            id,
            vin: input.vin.into_inner(),
            manufacturer_name: input.manufacturer_name,
            description: input.description,
            horse_power: input.horse_power,
            model_name: input.model_name,
            model_year: input.model_year,
            purchase_price: input.purchase_price,
            fuel_type: input.fuel_type,
        }
    }

    /// Replaces every mutable field. `id` and `vin` are left untouched.
    pub fn apply(&mut self, input: VehicleInput) {
        self.manufacturer_name = input.manufacturer_name;
        self.description = input.description;
        self.horse_power = input.horse_power;
        self.model_name = input.model_name;
        self.model_year = input.model_year;
        self.purchase_price = input.purchase_price;
        self.fuel_type = input.fuel_type;
    }
}

/// Request body for create and update. Every field is optional here so a
/// missing value is reported per field instead of rejecting the whole body.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct VehiclePayload {
    pub vin: Option<String>,
    #[serde(rename = "manuName")]
    #[validate(required(message = "field is required"), custom = "not_blank")]
    pub manufacturer_name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "horsePower", default, deserialize_with = "whole_number")]
    #[validate(
        required(message = "field is required"),
        range(min = 0, message = "must be greater than or equal to 0")
    )]
    pub horse_power: Option<i32>,
    #[serde(rename = "modelName")]
    #[validate(required(message = "field is required"), custom = "not_blank")]
    pub model_name: Option<String>,
    #[serde(rename = "modelYear", default, deserialize_with = "whole_number")]
    #[validate(required(message = "field is required"), custom = "model_year_in_range")]
    pub model_year: Option<i32>,
    #[serde(rename = "purchasePrice")]
    #[validate(
        required(message = "field is required"),
        range(min = 0.0, message = "must be greater than or equal to 0")
    )]
    pub purchase_price: Option<f64>,
    #[serde(rename = "fuelType")]
    #[validate(required(message = "field is required"), custom = "not_blank")]
    pub fuel_type: Option<String>,
}

/// Validated, trimmed field set ready for the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleInput {
    pub vin: Vin,
    pub manufacturer_name: String,
    pub description: Option<String>,
    pub horse_power: i32,
    pub model_name: String,
    pub model_year: i32,
    pub purchase_price: f64,
    pub fuel_type: String,
}

impl VehiclePayload {
    /// Runs every non-VIN field check and reports all violations together.
    pub fn into_input(self, vin: Vin) -> Result<VehicleInput, FieldErrors> {
        self.validate().map_err(|errors| collect_field_errors(&errors))?;

        let (
            Some(manufacturer_name),
            Some(horse_power),
            Some(model_name),
            Some(model_year),
            Some(purchase_price),
            Some(fuel_type),
        ) = (
            self.manufacturer_name,
            self.horse_power,
            self.model_name,
            self.model_year,
            self.purchase_price,
            self.fuel_type,
        )
        else {
            unreachable!("validate() enforces every required field");
        };

        Ok(VehicleInput {
            vin,
            manufacturer_name: manufacturer_name.trim().to_string(),
            description: self.description,
            horse_power,
            model_name: model_name.trim().to_string(),
            model_year,
            purchase_price,
            fuel_type: fuel_type.trim().to_string(),
        })
    }
}

/// Accepts JSON integers and floats with no fractional part, like `150.0`.
fn whole_number<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let whole = match number.as_i64() {
        Some(value) => Some(value),
        None => number
            .as_f64()
            .filter(|value| value.fract() == 0.0)
            .map(|value| value as i64),
    };

    whole
        .and_then(|value| i32::try_from(value).ok())
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("expected a whole number, got {number}")))
}

fn model_year_in_range(year: i32) -> Result<(), ValidationError> {
    if !(MIN_MODEL_YEAR..=MAX_MODEL_YEAR).contains(&year) {
        let mut error = ValidationError::new("range");
        error.message = Some(Cow::from(format!(
            "must be between {MIN_MODEL_YEAR} and {MAX_MODEL_YEAR}"
        )));
        return Err(error);
    }
    Ok(())
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::from("must not be blank"));
        return Err(error);
    }
    Ok(())
}

fn collect_field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, reasons)| {
            let reasons = reasons
                .iter()
                .map(|reason| match &reason.message {
                    Some(message) => message.to_string(),
                    None => reason.code.to_string(),
                })
                .collect();
            (field.to_string(), reasons)
        })
        .collect()
}
