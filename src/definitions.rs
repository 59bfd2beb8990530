// Fixed vocabulary of the FINDOLOGIC service: endpoints and query parameters

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Alivetest,
    Search,
    Navigation,
    Suggestion,
}

impl Endpoint {
    pub const ALL: [Endpoint; 4] = [
        Endpoint::Alivetest,
        Endpoint::Search,
        Endpoint::Navigation,
        Endpoint::Suggestion,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Alivetest => "alivetest.php",
            Endpoint::Search => "index.php",
            Endpoint::Navigation => "selector.php",
            Endpoint::Suggestion => "autocomplete.php",
        }
    }

    // Suggestions are autocomplete calls and skip the alivetest round trip.
    pub fn requires_alivetest(self) -> bool {
        matches!(self, Endpoint::Search | Endpoint::Navigation)
    }

    pub fn required_params(self) -> &'static [QueryParameter] {
        match self {
            Endpoint::Alivetest => &[],
            Endpoint::Search | Endpoint::Navigation | Endpoint::Suggestion => &REQUIRED_PARAMS,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// Checked in this order; the first unset one is reported.
const REQUIRED_PARAMS: [QueryParameter; 4] = [
    QueryParameter::ShopUrl,
    QueryParameter::UserIp,
    QueryParameter::Referer,
    QueryParameter::Revision,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryParameter {
    ServiceId,
    ShopUrl,
    UserIp,
    Referer,
    Revision,
    Query,
    Attrib,
    Order,
    Properties,
    PushAttrib,
    Count,
    First,
    Identifier,
    Group,
    ForceOriginalQuery,
    OutputAttrib,
    Selected,
}

impl QueryParameter {
    pub const ALL: [QueryParameter; 17] = [
        QueryParameter::ServiceId,
        QueryParameter::ShopUrl,
        QueryParameter::UserIp,
        QueryParameter::Referer,
        QueryParameter::Revision,
        QueryParameter::Query,
        QueryParameter::Attrib,
        QueryParameter::Order,
        QueryParameter::Properties,
        QueryParameter::PushAttrib,
        QueryParameter::Count,
        QueryParameter::First,
        QueryParameter::Identifier,
        QueryParameter::Group,
        QueryParameter::ForceOriginalQuery,
        QueryParameter::OutputAttrib,
        QueryParameter::Selected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueryParameter::ServiceId => "shopkey",
            QueryParameter::ShopUrl => "shopurl",
            QueryParameter::UserIp => "userip",
            QueryParameter::Referer => "referer",
            QueryParameter::Revision => "revision",
            QueryParameter::Query => "query",
            QueryParameter::Attrib => "attrib",
            QueryParameter::Order => "order",
            QueryParameter::Properties => "properties",
            QueryParameter::PushAttrib => "pushAttrib",
            QueryParameter::Count => "count",
            QueryParameter::First => "first",
            QueryParameter::Identifier => "identifier",
            QueryParameter::Group => "group",
            QueryParameter::ForceOriginalQuery => "forceOriginalQuery",
            QueryParameter::OutputAttrib => "outputAttrib",
            QueryParameter::Selected => "selected",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|param| param.as_str() == name)
    }
}

impl fmt::Display for QueryParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_endpoints_are_available() {
        let paths: Vec<&str> = Endpoint::ALL.iter().map(|e| e.path()).collect();
        assert_eq!(
            paths,
            vec!["alivetest.php", "index.php", "selector.php", "autocomplete.php"]
        );
    }

    #[test]
    fn test_only_search_and_navigation_need_alivetest() {
        assert!(Endpoint::Search.requires_alivetest());
        assert!(Endpoint::Navigation.requires_alivetest());
        assert!(!Endpoint::Suggestion.requires_alivetest());
        assert!(!Endpoint::Alivetest.requires_alivetest());
    }

    #[test]
    fn test_required_params_order() {
        let names: Vec<&str> = Endpoint::Search
            .required_params()
            .iter()
            .map(|p| p.as_str())
            .collect();
        assert_eq!(names, vec!["shopurl", "userip", "referer", "revision"]);
        assert!(Endpoint::Alivetest.required_params().is_empty());
    }

    #[test]
    fn test_param_names_round_trip() {
        for param in QueryParameter::ALL {
            assert_eq!(QueryParameter::from_name(param.as_str()), Some(param));
        }
        assert_eq!(QueryParameter::from_name("geilerParam"), None);
    }
}
