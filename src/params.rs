// Per-request parameter store.
//
// Parameters keep the order in which they were first set; that order is
// the order they appear in the query string.

use crate::{
    definitions::{Endpoint, QueryParameter},
    error::{ApiError, LookupError, Result},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    // Multi-valued params in bracket notation: each entry is the suffix
    // appended to the param name (e.g. `[cat][]`) and its value.
    Entries(Vec<(String, String)>),
}

impl ParamValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(text) => Some(text),
            ParamValue::Entries(_) => None,
        }
    }

    fn encode(&self, name: &str, pairs: &mut Vec<(String, String)>) {
        match self {
            ParamValue::Text(text) => pairs.push((name.to_string(), text.clone())),
            ParamValue::Entries(entries) => {
                for (suffix, value) in entries {
                    pairs.push((format!("{name}{suffix}"), value.clone()));
                }
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    params: Vec<(QueryParameter, ParamValue)>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Replaces an existing value in place, so the original position is kept.
    pub fn set(&mut self, name: QueryParameter, value: impl Into<ParamValue>) {
        let value = value.into();
        match self.params.iter_mut().find(|(param, _)| *param == name) {
            Some((_, existing)) => *existing = value,
            None => self.params.push((name, value)),
        }
    }

    // Appends one entry to a multi-valued param. A text value previously
    // stored under the same name is replaced.
    pub fn push_entry(&mut self, name: QueryParameter, suffix: String, value: String) {
        match self.params.iter_mut().find(|(param, _)| *param == name) {
            Some((_, ParamValue::Entries(entries))) => entries.push((suffix, value)),
            Some((_, existing)) => *existing = ParamValue::Entries(vec![(suffix, value)]),
            None => self
                .params
                .push((name, ParamValue::Entries(vec![(suffix, value)]))),
        }
    }

    pub fn remove(&mut self, name: QueryParameter) -> Option<ParamValue> {
        let index = self.params.iter().position(|(param, _)| *param == name)?;
        Some(self.params.remove(index).1)
    }

    pub fn get(&self, name: &str) -> Result<&ParamValue> {
        QueryParameter::from_name(name)
            .and_then(|param| self.lookup(param))
            .ok_or_else(|| LookupError::Param.into())
    }

    pub fn lookup(&self, name: QueryParameter) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(param, _)| *param == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: QueryParameter) -> bool {
        self.lookup(name).is_some()
    }

    pub fn all(&self) -> Vec<(&'static str, &ParamValue)> {
        self.params
            .iter()
            .map(|(param, value)| (param.as_str(), value))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn check_required(&self, endpoint: Endpoint) -> Result<()> {
        match endpoint
            .required_params()
            .iter()
            .find(|param| !self.contains(**param))
        {
            Some(missing) => Err(ApiError::MissingParameter(missing.as_str())),
            None => Ok(()),
        }
    }

    // Flattens every param into query pairs, in insertion order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.params.len());
        for (param, value) in &self.params {
            value.encode(param.as_str(), &mut pairs);
        }
        pairs
    }
}
