//! Fish records, write model and payload validation.
//!
//! # Responsibility
//! - Define the persisted `Fish` record and the `FishData` write model.
//! - Represent loosely typed input (`FishPayload`) at the boundary.
//! - Validate payloads field by field into human-readable messages.
//!
//! # Invariants
//! - `name`, `description` and `habitat` are 1..=500 UTF-16 code units long.
//! - Validation never fails and has no side effects; it returns data.
//! - Errors are reported per field in declaration order
//!   (name, description, habitat), at most one per field.

use crate::model::species::SpeciesKey;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned surrogate key of a fish row.
pub type FishId = i64;

/// Minimum length of every fish text field, in UTF-16 code units.
pub const FISH_TEXT_MIN_CHARS: usize = 1;
/// Maximum length of every fish text field, in UTF-16 code units.
pub const FISH_TEXT_MAX_CHARS: usize = 500;

/// Persisted fish row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fish {
    pub id: FishId,
    /// Surrogate key of the owning species.
    pub species_id: SpeciesKey,
    pub name: String,
    pub description: String,
    pub habitat: String,
}

/// Typed write model for create and full-replace update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FishData {
    pub name: String,
    pub description: String,
    pub habitat: String,
}

impl FishData {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        habitat: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            habitat: habitat.into(),
        }
    }

    /// Checks length invariants of all three fields.
    ///
    /// # Errors
    /// Returns every violated field, in field order.
    pub fn validate(&self) -> Result<(), FishValidationError> {
        let errors: Vec<FishFieldError> = FishField::ALL
            .into_iter()
            .filter_map(|field| check_text(field, self.text(field)))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FishValidationError { errors })
        }
    }

    fn text(&self, field: FishField) -> &str {
        match field {
            FishField::Name => &self.name,
            FishField::Description => &self.description,
            FishField::Habitat => &self.habitat,
        }
    }
}

/// Required fish fields, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FishField {
    Name,
    Description,
    Habitat,
}

impl FishField {
    pub const ALL: [FishField; 3] = [Self::Name, Self::Description, Self::Habitat];

    /// Field key as used in form and JSON input.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Habitat => "habitat",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "name" => Some(Self::Name),
            "description" => Some(Self::Description),
            "habitat" => Some(Self::Habitat),
            _ => None,
        }
    }
}

impl Display for FishField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value of a loosely typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Present but not text; carries the kind that was supplied.
    NonText(&'static str),
}

/// Boundary form of fish input where any field may be absent or mistyped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FishPayload {
    pub name: Option<FieldValue>,
    pub description: Option<FieldValue>,
    pub habitat: Option<FieldValue>,
}

impl FishPayload {
    /// Builds a payload from a decoded JSON document.
    ///
    /// Non-object documents yield an empty payload (every field missing).
    /// Unknown keys are ignored.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut payload = Self::default();
        let Some(object) = value.as_object() else {
            return payload;
        };

        for field in FishField::ALL {
            if let Some(raw) = object.get(field.as_str()) {
                *payload.slot_mut(field) = Some(json_field_value(raw));
            }
        }
        payload
    }

    /// Builds a payload from decoded form pairs. Later keys win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut payload = Self::default();
        for (key, value) in pairs {
            if let Some(field) = FishField::from_key(key.as_ref()) {
                *payload.slot_mut(field) = Some(FieldValue::Text(value.into()));
            }
        }
        payload
    }

    /// Returns the value supplied for `field`, if any.
    pub fn get(&self, field: FishField) -> Option<&FieldValue> {
        match field {
            FishField::Name => self.name.as_ref(),
            FishField::Description => self.description.as_ref(),
            FishField::Habitat => self.habitat.as_ref(),
        }
    }

    /// Returns the text supplied for `field`, or `None` when absent or mistyped.
    pub fn text(&self, field: FishField) -> Option<&str> {
        match self.get(field) {
            Some(FieldValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Structured validation result, one entry per failing field.
    pub fn field_errors(&self) -> Vec<FishFieldError> {
        FishField::ALL
            .into_iter()
            .filter_map(|field| match self.get(field) {
                None => Some(FishFieldError::new(field, FishFieldErrorKind::Missing)),
                Some(FieldValue::NonText(_)) => {
                    Some(FishFieldError::new(field, FishFieldErrorKind::WrongType))
                }
                Some(FieldValue::Text(value)) => check_text(field, value),
            })
            .collect()
    }

    /// Converts into the typed write model when every field is valid.
    ///
    /// # Errors
    /// Returns the same field errors as [`FishPayload::field_errors`].
    pub fn into_fish_data(self) -> Result<FishData, FishValidationError> {
        match (self.name, self.description, self.habitat) {
            (
                Some(FieldValue::Text(name)),
                Some(FieldValue::Text(description)),
                Some(FieldValue::Text(habitat)),
            ) => {
                let data = FishData {
                    name,
                    description,
                    habitat,
                };
                data.validate()?;
                Ok(data)
            }
            (name, description, habitat) => {
                let partial = Self {
                    name,
                    description,
                    habitat,
                };
                Err(FishValidationError {
                    errors: partial.field_errors(),
                })
            }
        }
    }

    fn slot_mut(&mut self, field: FishField) -> &mut Option<FieldValue> {
        match field {
            FishField::Name => &mut self.name,
            FishField::Description => &mut self.description,
            FishField::Habitat => &mut self.habitat,
        }
    }
}

impl From<FishData> for FishPayload {
    fn from(value: FishData) -> Self {
        Self {
            name: Some(FieldValue::Text(value.name)),
            description: Some(FieldValue::Text(value.description)),
            habitat: Some(FieldValue::Text(value.habitat)),
        }
    }
}

/// Validates a fish payload and returns human-readable messages.
///
/// Empty result means the payload is valid. Up to three messages, one per
/// failing field, in field order.
pub fn validate_fish_data(payload: &FishPayload) -> Vec<String> {
    payload
        .field_errors()
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Why a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FishFieldErrorKind {
    Missing,
    WrongType,
    LengthOutOfRange,
}

/// Field-level validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FishFieldError {
    pub field: FishField,
    pub kind: FishFieldErrorKind,
}

impl FishFieldError {
    pub fn new(field: FishField, kind: FishFieldErrorKind) -> Self {
        Self { field, kind }
    }
}

impl Display for FishFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FishFieldErrorKind::Missing => write!(f, "missing field '{}'", self.field),
            FishFieldErrorKind::WrongType => write!(f, "field '{}' must be text", self.field),
            FishFieldErrorKind::LengthOutOfRange => write!(
                f,
                "field '{}' length must be {}-{} characters",
                self.field, FISH_TEXT_MIN_CHARS, FISH_TEXT_MAX_CHARS
            ),
        }
    }
}

/// Non-empty list of field errors raised on fish write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FishValidationError {
    errors: Vec<FishFieldError>,
}

impl FishValidationError {
    pub fn errors(&self) -> &[FishFieldError] {
        &self.errors
    }

    /// Messages in field order, as returned by [`validate_fish_data`].
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

impl Display for FishValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid fish data: {}", self.messages().join("; "))
    }
}

impl Error for FishValidationError {}

/// Length in UTF-16 code units, so stored rows stay readable by the web app.
pub(crate) fn text_length(value: &str) -> usize {
    value.encode_utf16().count()
}

fn check_text(field: FishField, value: &str) -> Option<FishFieldError> {
    let length = text_length(value);
    if (FISH_TEXT_MIN_CHARS..=FISH_TEXT_MAX_CHARS).contains(&length) {
        None
    } else {
        Some(FishFieldError::new(
            field,
            FishFieldErrorKind::LengthOutOfRange,
        ))
    }
}

fn json_field_value(value: &serde_json::Value) -> FieldValue {
    match value {
        serde_json::Value::String(text) => FieldValue::Text(text.clone()),
        serde_json::Value::Null => FieldValue::NonText("null"),
        serde_json::Value::Bool(_) => FieldValue::NonText("boolean"),
        serde_json::Value::Number(_) => FieldValue::NonText("number"),
        serde_json::Value::Array(_) => FieldValue::NonText("array"),
        serde_json::Value::Object(_) => FieldValue::NonText("object"),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        validate_fish_data, FieldValue, FishData, FishField, FishFieldErrorKind, FishPayload,
    };
    use serde_json::json;

    #[test]
    fn valid_payload_has_no_errors() {
        let payload = FishPayload::from_json(&json!({
            "name": "Chinook",
            "description": "Large",
            "habitat": "Pacific",
        }));
        assert!(validate_fish_data(&payload).is_empty());
    }

    #[test]
    fn boundary_lengths_are_accepted() {
        let data = FishData::new("a", "x".repeat(500), "ż".repeat(500));
        assert!(data.validate().is_ok());
    }

    #[test]
    fn too_long_field_is_rejected() {
        let data = FishData::new("ok", "x".repeat(501), "ok");
        let err = data.validate().unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].field, FishField::Description);
        assert_eq!(err.errors()[0].kind, FishFieldErrorKind::LengthOutOfRange);
    }

    #[test]
    fn empty_name_yields_single_length_error() {
        let payload = FishPayload::from(FishData::new("", "ok", "ok"));
        let errors = validate_fish_data(&payload);
        assert_eq!(errors, vec!["field 'name' length must be 1-500 characters"]);
    }

    #[test]
    fn errors_follow_field_order_and_cover_every_kind() {
        let payload = FishPayload::from_json(&json!({
            "habitat": "",
            "description": 42,
        }));
        let errors = payload.field_errors();
        let kinds: Vec<_> = errors.iter().map(|err| (err.field, err.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (FishField::Name, FishFieldErrorKind::Missing),
                (FishField::Description, FishFieldErrorKind::WrongType),
                (FishField::Habitat, FishFieldErrorKind::LengthOutOfRange),
            ]
        );
        assert_eq!(
            validate_fish_data(&payload),
            vec![
                "missing field 'name'",
                "field 'description' must be text",
                "field 'habitat' length must be 1-500 characters",
            ]
        );
    }

    #[test]
    fn null_counts_as_wrong_type_not_missing() {
        let payload = FishPayload::from_json(&json!({
            "name": null,
            "description": "ok",
            "habitat": "ok",
        }));
        assert_eq!(payload.name, Some(FieldValue::NonText("null")));
        assert_eq!(validate_fish_data(&payload), vec!["field 'name' must be text"]);
    }

    #[test]
    fn non_object_json_reports_all_fields_missing() {
        let payload = FishPayload::from_json(&json!(["name"]));
        assert_eq!(validate_fish_data(&payload).len(), 3);
    }

    #[test]
    fn from_pairs_ignores_unknown_keys_and_keeps_last_value() {
        let payload = FishPayload::from_pairs([
            ("name", "first"),
            ("color", "silver"),
            ("name", "Chinook"),
            ("habitat", "Pacific"),
        ]);
        assert_eq!(payload.text(FishField::Name), Some("Chinook"));
        assert_eq!(payload.description, None);
        assert_eq!(
            validate_fish_data(&payload),
            vec!["missing field 'description'"]
        );
    }

    #[test]
    fn validation_is_deterministic() {
        let payload = FishPayload::from_pairs([("name", "")]);
        assert_eq!(validate_fish_data(&payload), validate_fish_data(&payload));
    }

    #[test]
    fn into_fish_data_returns_typed_model_for_valid_input() {
        let payload = FishPayload::from_pairs([
            ("name", "Chinook"),
            ("description", "Large"),
            ("habitat", "Pacific"),
        ]);
        let data = payload.into_fish_data().unwrap();
        assert_eq!(data, FishData::new("Chinook", "Large", "Pacific"));
    }

    #[test]
    fn into_fish_data_reports_field_errors() {
        let err = FishPayload::default().into_fish_data().unwrap_err();
        assert_eq!(err.messages().len(), 3);
        assert!(err.to_string().starts_with("invalid fish data: missing field 'name'"));
    }

    #[test]
    fn length_counts_utf16_code_units() {
        assert!(FishData::new("🐟".repeat(250), "b", "c").validate().is_ok());
        let err = FishData::new("🐟".repeat(251), "b", "c")
            .validate()
            .unwrap_err();
        assert_eq!(err.errors()[0].field, FishField::Name);
        assert_eq!(err.errors()[0].kind, FishFieldErrorKind::LengthOutOfRange);

        assert!(FishData::new("ą".repeat(500), "b", "c").validate().is_ok());
    }
}
