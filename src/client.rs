// FINDOLOGIC API client: parameter setters and the request dispatcher.
//
// Every search or navigation request is a two-step protocol: an alivetest
// against `alivetest.php` must answer `alive` with status 200 before the
// real request is sent. Suggestion requests skip the alivetest. Requests
// are blocking and sequential; no request is ever retried.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use reqwest::Url;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    config::{Config, ConfigValue, API_URL},
    definitions::{Endpoint, QueryParameter},
    error::{ApiError, Result},
    http::{HttpClient, HttpRequest, HttpResponse},
    json_response::JsonResponse,
    params::{ParamValue, ParameterStore},
    xml_response::XmlResponse,
};

const ALIVE: &str = "alive";

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Alive,
    Xml(XmlResponse),
    Json(JsonResponse),
}

#[derive(Debug)]
pub struct FindologicApi {
    config: Config,
    params: ParameterStore,
    response_time: Option<Duration>,
}

impl FindologicApi {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            params: ParameterStore::new(),
            response_time: None,
        }
    }

    /// Validates `values` and builds a client. Without `http_client` a
    /// default reqwest client is used.
    pub fn from_map(
        values: &Map<String, Value>,
        http_client: Option<Arc<dyn HttpClient>>,
    ) -> Result<Self> {
        Config::from_map(values, http_client).map(Self::new)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn get_config_by_key(&self, key: &str) -> Result<ConfigValue<'_>> {
        self.config.get_by_key(key)
    }

    pub fn get_param(&self, name: &str) -> Result<&ParamValue> {
        self.params.get(name)
    }

    pub fn get_all_params(&self) -> Vec<(&'static str, &ParamValue)> {
        self.params.all()
    }

    pub fn set_param(&mut self, name: QueryParameter, value: impl Into<ParamValue>) -> &mut Self {
        self.params.set(name, value);
        self
    }

    pub fn set_shopurl(&mut self, shopurl: &str) -> &mut Self {
        self.set_param(QueryParameter::ShopUrl, shopurl)
    }

    pub fn set_userip(&mut self, userip: &str) -> &mut Self {
        self.set_param(QueryParameter::UserIp, userip)
    }

    pub fn set_referer(&mut self, referer: &str) -> &mut Self {
        self.set_param(QueryParameter::Referer, referer)
    }

    pub fn set_revision(&mut self, revision: &str) -> &mut Self {
        self.set_param(QueryParameter::Revision, revision)
    }

    pub fn set_query(&mut self, query: &str) -> &mut Self {
        self.set_param(QueryParameter::Query, query)
    }

    /// Sort order, e.g. `salesfrequency dynamic DESC` or `price ASC`.
    pub fn set_order(&mut self, order: &str) -> &mut Self {
        self.set_param(QueryParameter::Order, order)
    }

    pub fn set_count(&mut self, count: u32) -> &mut Self {
        self.set_param(QueryParameter::Count, count.to_string())
    }

    pub fn set_first(&mut self, first: u32) -> &mut Self {
        self.set_param(QueryParameter::First, first.to_string())
    }

    pub fn set_identifier(&mut self, identifier: &str) -> &mut Self {
        self.set_param(QueryParameter::Identifier, identifier)
    }

    pub fn set_group(&mut self, group: &str) -> &mut Self {
        self.set_param(QueryParameter::Group, group)
    }

    pub fn set_force_original_query(&mut self, force: bool) -> &mut Self {
        if force {
            self.params.set(QueryParameter::ForceOriginalQuery, "1");
        } else {
            self.params.remove(QueryParameter::ForceOriginalQuery);
        }
        self
    }

    // attrib[<filter>][]=<value>
    pub fn add_attribute(&mut self, filter: &str, value: &str) -> &mut Self {
        self.params.push_entry(
            QueryParameter::Attrib,
            format!("[{filter}][]"),
            value.to_string(),
        );
        self
    }

    // selected[<filter>][]=<value>
    pub fn add_selected(&mut self, filter: &str, value: &str) -> &mut Self {
        self.params.push_entry(
            QueryParameter::Selected,
            format!("[{filter}][]"),
            value.to_string(),
        );
        self
    }

    // pushAttrib[<filter>][<value>]=<factor>
    pub fn add_push_attribute(&mut self, filter: &str, value: &str, factor: f64) -> &mut Self {
        self.params.push_entry(
            QueryParameter::PushAttrib,
            format!("[{filter}][{value}]"),
            factor.to_string(),
        );
        self
    }

    pub fn add_property(&mut self, property: &str) -> &mut Self {
        self.params
            .push_entry(QueryParameter::Properties, "[]".to_string(), property.to_string());
        self
    }

    pub fn add_output_attribute(&mut self, filter: &str) -> &mut Self {
        self.params
            .push_entry(QueryParameter::OutputAttrib, "[]".to_string(), filter.to_string());
        self
    }

    /// Duration of the last main request. Alivetests are not included.
    pub fn response_time(&self) -> Option<Duration> {
        self.response_time
    }

    pub fn send(&mut self, endpoint: Endpoint) -> Result<Response> {
        match endpoint {
            Endpoint::Alivetest => self.alivetest().map(|_| Response::Alive),
            Endpoint::Search => self.send_search_request().map(Response::Xml),
            Endpoint::Navigation => self.send_navigation_request().map(Response::Xml),
            Endpoint::Suggestion => self.send_suggestion_request().map(Response::Json),
        }
    }

    pub fn send_search_request(&mut self) -> Result<XmlResponse> {
        let response = self.dispatch(Endpoint::Search)?;
        XmlResponse::parse(&response.body)
    }

    pub fn send_navigation_request(&mut self) -> Result<XmlResponse> {
        let response = self.dispatch(Endpoint::Navigation)?;
        XmlResponse::parse(&response.body)
    }

    pub fn send_suggestion_request(&mut self) -> Result<JsonResponse> {
        let response = self.dispatch(Endpoint::Suggestion)?;
        JsonResponse::parse(&response.body)
    }

    /// Checks that the service is reachable and healthy. Carries only the
    /// shopkey, so no request params need to be set.
    pub fn alivetest(&self) -> Result<()> {
        let url = self.build_url(Endpoint::Alivetest, Vec::new())?;
        let request = HttpRequest::get(url, self.config.alivetest_timeout());

        let response = self
            .config
            .http_client()
            .request(&request)
            .map_err(|e| {
                warn!(error = %e, "alivetest transport failure");
                ApiError::ServiceNotAlive(e.to_string())
            })?;

        if response.body != ALIVE {
            warn!(
                status = response.status,
                body = %response.body,
                "alivetest returned unexpected body"
            );
            return Err(ApiError::ServiceNotAlive(response.body));
        }
        if response.status != 200 {
            warn!(status = response.status, "alivetest returned unexpected status");
            return Err(unexpected_status(response.status));
        }

        Ok(())
    }

    fn dispatch(&mut self, endpoint: Endpoint) -> Result<HttpResponse> {
        self.params.check_required(endpoint)?;

        if endpoint.requires_alivetest() {
            self.alivetest()?;
        }

        let url = self.build_url(endpoint, self.params.query_pairs())?;
        let request = HttpRequest::get(url, self.config.request_timeout());
        debug!(%endpoint, url = %request.url, "sending request");

        let started = Instant::now();
        let result = self.config.http_client().request(&request);
        let elapsed = started.elapsed();
        self.response_time = Some(elapsed);
        debug!(%endpoint, elapsed_ms = elapsed.as_millis() as u64, "request finished");

        let response = result.map_err(|e| {
            warn!(%endpoint, error = %e, "request transport failure");
            ApiError::ServiceNotAlive(e.to_string())
        })?;

        if response.status != 200 {
            warn!(%endpoint, status = response.status, "request returned unexpected status");
            return Err(unexpected_status(response.status));
        }

        Ok(response)
    }

    // The shopkey always comes first; it is taken from the config, never
    // from the param store.
    fn build_url(&self, endpoint: Endpoint, pairs: Vec<(String, String)>) -> Result<String> {
        let mut url = Url::parse(&self.config.endpoint_url(endpoint))
            .map_err(|_| ApiError::config(API_URL))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair(QueryParameter::ServiceId.as_str(), self.config.shopkey());
            for (name, value) in pairs
                .iter()
                .filter(|(name, _)| name != QueryParameter::ServiceId.as_str())
            {
                query.append_pair(name, value);
            }
        }

        Ok(url.into())
    }
}

fn unexpected_status(status: u16) -> ApiError {
    ApiError::ServiceNotAlive(format!("Unexpected status code {status}."))
}
