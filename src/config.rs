// Client configuration and its validator.
//
// Raw configuration arrives as a JSON object (so it can be loaded from a
// config file) plus an optional HTTP client handle. Every recognized key is
// checked against a static rule table; unknown keys are ignored and
// missing optional keys fall back to the defaults below.

use std::{sync::Arc, time::Duration};

use reqwest::Url;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    definitions::Endpoint,
    error::{ApiError, LookupError, Result},
    http::{HttpClient, ReqwestClient},
};

pub const SHOPKEY: &str = "shopkey";
pub const HTTP_CLIENT: &str = "httpClient";
pub const API_URL: &str = "apiUrl";
pub const REQUEST_TIMEOUT: &str = "requestTimeout";
pub const ALIVETEST_TIMEOUT: &str = "alivetestTimeout";

pub const DEFAULT_API_URL: &str = "https://service.findologic.com/ps/%s/%s";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 3.0;
pub const DEFAULT_ALIVETEST_TIMEOUT_SECS: f64 = 1.0;

type Rule = fn(&Value) -> bool;

// The HTTP client key has no entry: any `HttpClient` trait object has the
// required capability, which the type system already guarantees.
const RULES: &[(&str, Rule)] = &[
    (SHOPKEY, is_shopkey),
    (API_URL, is_api_url),
    (REQUEST_TIMEOUT, is_timeout),
    (ALIVETEST_TIMEOUT, is_timeout),
];

const REQUIRED: &[&str] = &[SHOPKEY];

fn is_shopkey(value: &Value) -> bool {
    value.as_str().map_or(false, |key| {
        key.len() == 32
            && key
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    })
}

// Two `%s` placeholders (shopkey, endpoint path) and a parseable URL once
// they are filled.
fn is_api_url(value: &Value) -> bool {
    value.as_str().map_or(false, |url| {
        url.matches("%s").count() == 2 && Url::parse(&url.replace("%s", "x")).is_ok()
    })
}

// Zero is accepted and means no timeout.
fn is_timeout(value: &Value) -> bool {
    value.as_f64().map_or(false, |secs| {
        secs >= 0.0 && Duration::try_from_secs_f64(secs).is_ok()
    })
}

pub struct ConfigValidator;

impl ConfigValidator {
    /// Checks every recognized key present in `values` and that all
    /// required keys are set. Does not modify the input.
    pub fn validate(values: &Map<String, Value>) -> Result<()> {
        if let Some(missing) = REQUIRED.iter().find(|key| !values.contains_key(**key)) {
            debug!(field = missing, "required config value missing");
            return Err(ApiError::config(missing));
        }

        for (field, rule) in RULES {
            if let Some(value) = values.get(*field) {
                if !rule(value) {
                    debug!(field, "config value rejected");
                    return Err(ApiError::config(field));
                }
            }
        }

        Ok(())
    }
}

/// A typed view of one configuration value, returned by [`Config::get_by_key`].
#[derive(Debug, Clone)]
pub enum ConfigValue<'a> {
    Text(&'a str),
    Timeout(Duration),
    HttpClient(&'a Arc<dyn HttpClient>),
}

#[derive(Debug, Clone)]
pub struct Config {
    shopkey: String,
    api_url: String,
    request_timeout: Duration,
    alivetest_timeout: Duration,
    http_client: Arc<dyn HttpClient>,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn from_map(
        values: &Map<String, Value>,
        http_client: Option<Arc<dyn HttpClient>>,
    ) -> Result<Self> {
        ConfigValidator::validate(values)?;

        let shopkey = values
            .get(SHOPKEY)
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::config(SHOPKEY))?
            .to_string();
        let api_url = values
            .get(API_URL)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_API_URL)
            .to_string();
        let request_timeout = timeout(values, REQUEST_TIMEOUT, DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let alivetest_timeout =
            timeout(values, ALIVETEST_TIMEOUT, DEFAULT_ALIVETEST_TIMEOUT_SECS)?;
        let http_client: Arc<dyn HttpClient> = match http_client {
            Some(client) => client,
            None => Arc::new(ReqwestClient::new().map_err(|e| {
                debug!(error = %e, "default http client unavailable");
                ApiError::config(HTTP_CLIENT)
            })?),
        };

        Ok(Self {
            shopkey,
            api_url,
            request_timeout,
            alivetest_timeout,
            http_client,
        })
    }

    /// Builds a config from a JSON object such as
    /// `{"shopkey": "80AB18D4BE2654A78244106AD315DC2C", "requestTimeout": 5}`.
    pub fn from_json(json: &str, http_client: Option<Arc<dyn HttpClient>>) -> Result<Self> {
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(values)) => Self::from_map(&values, http_client),
            _ => Err(ApiError::config("<document>")),
        }
    }

    pub fn get_by_key(&self, key: &str) -> Result<ConfigValue<'_>> {
        let value = match key {
            SHOPKEY => ConfigValue::Text(&self.shopkey),
            API_URL => ConfigValue::Text(&self.api_url),
            REQUEST_TIMEOUT => ConfigValue::Timeout(self.request_timeout),
            ALIVETEST_TIMEOUT => ConfigValue::Timeout(self.alivetest_timeout),
            HTTP_CLIENT => ConfigValue::HttpClient(&self.http_client),
            _ => return Err(LookupError::ConfigValue.into()),
        };
        Ok(value)
    }

    pub fn shopkey(&self) -> &str {
        &self.shopkey
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn alivetest_timeout(&self) -> Duration {
        self.alivetest_timeout
    }

    pub fn http_client(&self) -> &Arc<dyn HttpClient> {
        &self.http_client
    }

    // Fills the two placeholders of the URL template with the shopkey and
    // the endpoint path, in that order.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        self.api_url
            .replacen("%s", &self.shopkey, 1)
            .replacen("%s", endpoint.path(), 1)
    }
}

fn timeout(values: &Map<String, Value>, key: &str, default_secs: f64) -> Result<Duration> {
    let secs = values
        .get(key)
        .and_then(Value::as_f64)
        .unwrap_or(default_secs);
    Duration::try_from_secs_f64(secs).map_err(|_| ApiError::config(key))
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    values: Map<String, Value>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl ConfigBuilder {
    pub fn shopkey(mut self, shopkey: &str) -> Self {
        self.values.insert(SHOPKEY.to_string(), Value::from(shopkey));
        self
    }

    pub fn api_url(mut self, api_url: &str) -> Self {
        self.values.insert(API_URL.to_string(), Value::from(api_url));
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.values
            .insert(REQUEST_TIMEOUT.to_string(), Value::from(timeout.as_secs_f64()));
        self
    }

    pub fn alivetest_timeout(mut self, timeout: Duration) -> Self {
        self.values.insert(
            ALIVETEST_TIMEOUT.to_string(),
            Value::from(timeout.as_secs_f64()),
        );
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<Config> {
        Config::from_map(&self.values, self.http_client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_http::MockHttpClient;
    use serde_json::json;

    const VALID_SHOPKEY: &str = "80AB18D4BE2654A78244106AD315DC2C";

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    fn assert_invalid(values: Value) {
        let err = Config::from_map(&map(values), None).unwrap_err();
        assert!(matches!(err, ApiError::Config { .. }));
        assert_eq!(err.to_string(), "Invalid FindologicApi config.");
    }

    #[test]
    fn test_valid_shopkeys_are_accepted() {
        for key in [VALID_SHOPKEY, "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "0123456789ABCDEF0123456789ABCDEF"] {
            assert!(Config::from_map(&map(json!({ "shopkey": key })), None).is_ok());
        }
    }

    #[test]
    fn test_invalid_shopkeys_are_rejected() {
        for key in [
            "INVALIDAF",
            "80AB18D4BE2654R78244106AD315DC2C",
            "80ab18d4be2654a78244106ad315dc2c",
            "80AB18D4BE2654A7 8244106AD315DC2C",
            "AAAAAA.AAAAAAÄAAAAAAAAAAAAAAAAA_",
        ] {
            assert_invalid(json!({ "shopkey": key }));
        }
        assert_invalid(json!({ "shopkey": 42 }));
    }

    #[test]
    fn test_missing_shopkey_is_rejected() {
        let err = Config::from_map(&Map::new(), None).unwrap_err();
        match err {
            ApiError::Config { field } => assert_eq!(field, SHOPKEY),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_invalid_typed_values_are_rejected() {
        assert_invalid(json!({ "shopkey": VALID_SHOPKEY, "apiUrl": {} }));
        assert_invalid(json!({ "shopkey": VALID_SHOPKEY, "apiUrl": 46 }));
        assert_invalid(json!({ "shopkey": VALID_SHOPKEY, "apiUrl": "https://x.io/%s" }));
        assert_invalid(json!({ "shopkey": VALID_SHOPKEY, "apiUrl": "blubbergurken/%s/%s" }));
        assert_invalid(json!({ "shopkey": VALID_SHOPKEY, "alivetestTimeout": {} }));
        assert_invalid(json!({ "shopkey": VALID_SHOPKEY, "alivetestTimeout": "A timeout of 50 years pls!" }));
        assert_invalid(json!({ "shopkey": VALID_SHOPKEY, "requestTimeout": {} }));
        assert_invalid(json!({ "shopkey": VALID_SHOPKEY, "requestTimeout": "A timeout of 90 quadrillion yrs pls!" }));
        assert_invalid(json!({ "shopkey": VALID_SHOPKEY, "requestTimeout": -1 }));
    }

    #[test]
    fn test_defaults_are_applied_and_unknown_keys_ignored() {
        let config =
            Config::from_map(&map(json!({ "shopkey": VALID_SHOPKEY, "flavour": "cucumber" })), None)
                .unwrap();
        assert_eq!(config.api_url(), DEFAULT_API_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.alivetest_timeout(), Duration::from_secs(1));
        assert!(config.get_by_key("flavour").is_err());
    }

    #[test]
    fn test_zero_timeouts_are_accepted() {
        let mock = MockHttpClient::new();
        mock.respond_always(200, "alive");
        let client: Arc<dyn HttpClient> = Arc::new(mock.clone());
        let config = Config::from_map(
            &map(json!({
                "shopkey": VALID_SHOPKEY,
                "requestTimeout": 0,
                "alivetestTimeout": 0.0
            })),
            Some(client),
        )
        .unwrap();
        assert_eq!(config.request_timeout(), Duration::ZERO);
        assert_eq!(config.alivetest_timeout(), Duration::ZERO);

        // handed to the transport unchanged; `ReqwestClient` treats it as unlimited
        let url = config.endpoint_url(Endpoint::Alivetest);
        config
            .http_client()
            .request(&crate::http::HttpRequest::get(url, config.alivetest_timeout()))
            .unwrap();
        assert_eq!(mock.requests()[0].timeout, Duration::ZERO);
    }

    #[test]
    fn test_default_http_client_is_set() {
        let config = Config::from_map(&map(json!({ "shopkey": VALID_SHOPKEY })), None).unwrap();
        let client = config.get_by_key(HTTP_CLIENT).unwrap();
        assert!(matches!(client, ConfigValue::HttpClient(_)));
        assert!(format!("{client:?}").contains("ReqwestClient"));
    }

    #[test]
    fn test_unknown_key_lookup_fails() {
        let config = Config::builder().shopkey(VALID_SHOPKEY).build().unwrap();
        let err = config.get_by_key("thisKeyDoesNotExist").unwrap_err();
        assert_eq!(err.to_string(), "Unknown or unset configuration value.");
        assert!(matches!(err, ApiError::Lookup(LookupError::ConfigValue)));
    }

    #[test]
    fn test_builder_uses_the_same_rules() {
        let config = Config::builder()
            .shopkey(VALID_SHOPKEY)
            .api_url("https://blubbergurken.io/%s/%s")
            .request_timeout(Duration::from_millis(1500))
            .alivetest_timeout(Duration::from_millis(500))
            .http_client(Arc::new(MockHttpClient::new()))
            .build()
            .unwrap();
        assert_eq!(config.request_timeout(), Duration::from_millis(1500));
        assert_eq!(config.alivetest_timeout(), Duration::from_millis(500));
        assert!(matches!(
            config.get_by_key(SHOPKEY).unwrap(),
            ConfigValue::Text(VALID_SHOPKEY)
        ));

        assert!(Config::builder().shopkey("nope").build().is_err());
    }

    #[test]
    fn test_endpoint_url_fills_template() {
        let config = Config::builder()
            .shopkey(VALID_SHOPKEY)
            .api_url("https://blubbergurken.io/%s/%s")
            .build()
            .unwrap();
        assert_eq!(
            config.endpoint_url(Endpoint::Navigation),
            format!("https://blubbergurken.io/{VALID_SHOPKEY}/selector.php")
        );
    }

    #[test]
    fn test_from_json_document() {
        let config = Config::from_json(
            r#"{"shopkey": "80AB18D4BE2654A78244106AD315DC2C", "requestTimeout": 5}"#,
            Some(Arc::new(MockHttpClient::new())),
        )
        .unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(5));

        assert!(Config::from_json("[1, 2]", None).is_err());
        assert!(Config::from_json("not json", None).is_err());
    }
}
