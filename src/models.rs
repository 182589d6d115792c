use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Records read from the suggestions API ---

/// Suggestion
///
/// A pending product submission awaiting moderation, as returned by
/// `GET {api}/suggestions/{id}`. This service only reads it; approval and
/// rejection are requested from the API, never applied locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Suggestion {
    pub id: String,
    pub author: Author,
    pub price: f64,
    // Barcode symbology, e.g. "EAN_13".
    pub format: String,
    // Barcode value.
    pub code: String,
    // Storage paths of the submitted photographs, in display order.
    #[serde(default)]
    pub photos: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Author {
    pub full_name: String,
}

impl Suggestion {
    /// Page title: "{author}: {format}-{code}".
    pub fn title(&self) -> String {
        format!("{}: {}-{}", self.author.full_name, self.format, self.code)
    }
}

// --- Approval form (input) ---

/// ApprovalForm
///
/// The product form exactly as the browser submits it. Every field is text;
/// `to_request` performs the numeric coercion. Missing fields read as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ApprovalForm {
    pub name: String,
    pub price: String,
    // One ingredient per line.
    pub ingredients_list: String,
    pub barcode_format: String,
    pub barcode: String,
    pub manufacturing_location: String,
    pub packaging_location: String,
    pub transport_weight: String,
    pub company_rating: String,
    pub packaging_rating: String,
    pub overall_rating: String,
}

impl ApprovalForm {
    /// to_request
    ///
    /// Coerces the numeric fields and assembles the approval payload for the
    /// suggestion `id`. Any field that does not parse is reported under its own
    /// name and no payload is produced.
    pub fn to_request(&self, id: &str) -> Result<ApprovalRequest, FieldErrors> {
        let mut errors = FieldErrors::default();

        let price = parse_decimal("price", &self.price, &mut errors);
        let transport_weight = parse_decimal("transportWeight", &self.transport_weight, &mut errors);
        let company_rating = parse_whole("companyRating", &self.company_rating, &mut errors);
        let packaging_rating = parse_whole("packagingRating", &self.packaging_rating, &mut errors);
        let overall_rating = parse_whole("overallRating", &self.overall_rating, &mut errors);

        match (price, transport_weight, company_rating, packaging_rating, overall_rating) {
            (
                Some(price),
                Some(transport_weight),
                Some(company_rating),
                Some(packaging_rating),
                Some(overall_rating),
            ) => Ok(ApprovalRequest {
                id: id.to_string(),
                name: self.name.trim().to_string(),
                price,
                barcode_format: self.barcode_format.trim().to_string(),
                barcode: self.barcode.trim().to_string(),
                ingredients_list: self.ingredients(),
                manufacturing_location: non_empty(&self.manufacturing_location),
                packaging_location: non_empty(&self.packaging_location),
                transport_weight,
                company_rating,
                packaging_rating,
                overall_rating,
            }),
            _ => Err(errors),
        }
    }

    pub fn ingredients(&self) -> Vec<String> {
        self.ingredients_list
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn parse_decimal(field: &str, raw: &str, errors: &mut FieldErrors) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            errors.insert(field, "Must be a number");
            None
        }
    }
}

fn parse_whole(field: &str, raw: &str, errors: &mut FieldErrors) -> Option<i32> {
    match raw.trim().parse::<i32>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.insert(field, "Must be a whole number");
            None
        }
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// --- Wire payloads for the moderation endpoints ---

/// ApprovalRequest
///
/// Body of `POST {api}/suggestions/approve`. Numeric fields are already typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ApprovalRequest {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub barcode_format: String,
    pub barcode: String,
    pub ingredients_list: Vec<String>,
    pub manufacturing_location: Option<String>,
    pub packaging_location: Option<String>,
    pub transport_weight: f64,
    pub company_rating: i32,
    pub packaging_rating: i32,
    pub overall_rating: i32,
}

/// RejectRequest
///
/// Body of `POST {api}/suggestions/delete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RejectRequest {
    pub id: String,
}

// --- Error state shown on the page ---

/// FieldErrors
///
/// Field name to validation message (`null` when the field is fine). This is
/// the only failure body the moderation endpoints are trusted to return; any
/// other shape is turned into a `form`-level message before it reaches a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FieldErrors(pub BTreeMap<String, Option<String>>);

/// Key for messages that do not belong to a single input.
pub const FORM_ERROR_KEY: &str = "form";

impl FieldErrors {
    /// State before any action was attempted.
    pub fn initial() -> Self {
        let mut errors = Self::default();
        errors.0.insert("name".to_string(), None);
        errors
    }

    pub fn general(message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.insert(FORM_ERROR_KEY, message);
        errors
    }

    /// parse
    ///
    /// Accepts only a JSON object whose values are strings or null.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<BTreeMap<String, Option<String>>>(body)
            .ok()
            .map(Self)
    }

    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), Some(message.into()));
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|message| message.as_deref())
    }

    /// Messages whose key is not one of `placed`, in key order.
    pub fn unplaced(&self, placed: &[&str]) -> Vec<String> {
        self.0
            .iter()
            .filter(|(field, _)| !placed.contains(&field.as_str()))
            .filter_map(|(field, message)| {
                message.as_ref().map(|message| {
                    if field == FORM_ERROR_KEY {
                        message.clone()
                    } else {
                        format!("{field}: {message}")
                    }
                })
            })
            .collect()
    }

    pub fn has_messages(&self) -> bool {
        self.0.values().any(Option::is_some)
    }
}

// --- Gallery output ---

/// DownloadUrl
///
/// A time-limited, publicly fetchable link to one stored photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DownloadUrl {
    pub url: String,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
}

/// ImageUrlsResponse
///
/// Output of `GET /suggestions/{id}/images`, ordered like `Suggestion::photos`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageUrlsResponse {
    pub urls: Vec<DownloadUrl>,
}
