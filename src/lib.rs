// Client library for the FINDOLOGIC search, navigation and suggestion service

pub mod client;
pub mod config;
pub mod definitions;
pub mod error;
pub mod http;
pub mod json_response;
pub mod mock_http;
pub mod params;
pub mod xml_response;

// Re-export key types for convenience
pub use client::{FindologicApi, Response};
pub use config::{Config, ConfigBuilder, ConfigValidator, ConfigValue};
pub use definitions::{Endpoint, QueryParameter};
pub use error::{ApiError, LookupError, Result};
pub use http::{HttpClient, HttpRequest, HttpResponse, ReqwestClient, TransportError};
pub use json_response::{JsonResponse, Suggestion};
pub use mock_http::MockHttpClient;
pub use params::{ParamValue, ParameterStore};
pub use xml_response::{Attributes, Filter, Item, Promotion, XmlResponse};
