// JSON response mapping for suggestion (autocomplete) requests

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSuggestion {
    #[serde(default)]
    label: Value,
    #[serde(default)]
    block: Value,
    #[serde(default)]
    frequency: Value,
    #[serde(default)]
    image_url: Value,
    #[serde(default)]
    price: Value,
    #[serde(default)]
    identifier: Value,
    #[serde(default)]
    base_price: Value,
    #[serde(default)]
    base_price_unit: Value,
    #[serde(default)]
    url: Value,
    #[serde(default)]
    ordernumber: Value,
}

// Best-effort coercions. Absent keys arrive as `Value::Null`.
fn opt_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "" }.to_string()),
        other => Some(other.to_string()),
    }
}

fn string(value: &Value) -> String {
    opt_string(value).unwrap_or_default()
}

// An explicit zero stays `Some(0.0)`; only absent, null or non-numeric
// values become `None`.
fn opt_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Suggestion {
    label: String,
    block: String,
    frequency: String,
    image_url: Option<String>,
    price: Option<f64>,
    identifier: Option<String>,
    base_price: Option<f64>,
    base_price_unit: Option<String>,
    url: Option<String>,
    ordernumber: Option<String>,
}

impl From<RawSuggestion> for Suggestion {
    fn from(raw: RawSuggestion) -> Self {
        Self {
            label: string(&raw.label),
            block: string(&raw.block),
            frequency: string(&raw.frequency),
            image_url: opt_string(&raw.image_url),
            price: opt_number(&raw.price),
            identifier: opt_string(&raw.identifier),
            base_price: opt_number(&raw.base_price),
            base_price_unit: opt_string(&raw.base_price_unit),
            url: opt_string(&raw.url),
            ordernumber: opt_string(&raw.ordernumber),
        }
    }
}

impl Suggestion {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Suggestion block, e.g. `suggest`, `product`, `cat` or `vendor`.
    pub fn block(&self) -> &str {
        &self.block
    }

    pub fn frequency(&self) -> &str {
        &self.frequency
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn base_price(&self) -> Option<f64> {
        self.base_price
    }

    pub fn base_price_unit(&self) -> Option<&str> {
        self.base_price_unit.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn ordernumber(&self) -> Option<&str> {
        self.ordernumber.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonResponse {
    suggestions: Vec<Suggestion>,
}

impl JsonResponse {
    pub fn parse(json: &str) -> Result<Self> {
        let raw: Vec<RawSuggestion> =
            serde_json::from_str(json).map_err(|e| ApiError::JsonParse(e.to_string()))?;
        Ok(Self {
            suggestions: raw.into_iter().map(Suggestion::from).collect(),
        })
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

pub const DEMO_RESPONSE_SUGGEST_JSON: &str = include_str!("../samples/demo_response_suggest.json");
