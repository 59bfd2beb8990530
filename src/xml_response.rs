// XML response mapping for search and navigation requests.
//
// The payload is first read into a small element tree with the quick-xml
// event reader, then mapped into typed records. Absent elements never fail
// the parse: they map to empty strings, zero, `None` or empty lists.

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

use crate::error::{ApiError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart) -> Result<Self> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ApiError::XmlParse(e.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|e| ApiError::XmlParse(e.to_string()))?;
            attributes.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Default::default()
        })
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn text(&self) -> &str {
        self.text.trim()
    }

    fn child_text(&self, name: &str) -> String {
        self.child(name).map(|c| c.text().to_string()).unwrap_or_default()
    }

    // `None` when the element is absent or empty.
    fn child_text_opt(&self, name: &str) -> Option<String> {
        self.child(name)
            .map(|c| c.text())
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }

    // Attribute first, then a child element of the same name.
    fn attr_or_child(&self, name: &str) -> String {
        self.attr(name)
            .map(str::to_string)
            .unwrap_or_else(|| self.child_text(name))
    }
}

pub(crate) fn parse_tree(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Err(e) => {
                return Err(ApiError::XmlParse(format!(
                    "at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            Ok(Event::Start(e)) => stack.push(Element::from_start(&e)?),
            Ok(Event::Empty(e)) => {
                let element = Element::from_start(&e)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ApiError::XmlParse("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(t)) => {
                if let Some(current) = stack.last_mut() {
                    let text = t.unescape().map_err(|e| ApiError::XmlParse(e.to_string()))?;
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ApiError::XmlParse(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| ApiError::XmlParse("document has no root element".to_string()))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

// Lenient scalar coercion: text that does not parse maps to zero.
fn to_u32(text: &str) -> u32 {
    let text = text.trim();
    text.parse::<u32>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().map(|f| f as u32))
        .unwrap_or(0)
}

fn to_f64(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(0.0)
}

fn to_bool(text: &str) -> bool {
    matches!(text.trim(), "1" | "true")
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Servers {
    pub frontend: String,
    pub backend: String,
}

impl Servers {
    fn from_element(element: &Element) -> Self {
        Self {
            frontend: element.child_text("frontend"),
            backend: element.child_text("backend"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Limit {
    pub first: u32,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryString {
    pub value: String,
    // e.g. "corrected" or "improved" when the service rewrote the query
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OriginalQuery {
    pub value: String,
    pub allow_override: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub limit: Limit,
    pub query_string: QueryString,
    pub did_you_mean_query: Option<String>,
    pub original_query: Option<OriginalQuery>,
}

impl Query {
    fn from_element(element: &Element) -> Self {
        let limit = element
            .child("limit")
            .map(|l| Limit {
                first: to_u32(l.attr("first").unwrap_or_default()),
                count: to_u32(l.attr("count").unwrap_or_default()),
            })
            .unwrap_or_default();
        let query_string = element
            .child("queryString")
            .map(|q| QueryString {
                value: q.text().to_string(),
                kind: q.attr("type").map(str::to_string),
            })
            .unwrap_or_default();
        let original_query = element.child("originalQuery").map(|q| OriginalQuery {
            value: q.text().to_string(),
            allow_override: to_bool(q.attr("allow-override").unwrap_or_default()),
        });

        Self {
            limit,
            query_string,
            did_you_mean_query: element.child_text_opt("didYouMeanQuery"),
            original_query,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandingPage {
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Promotion {
    pub image: String,
    pub link: String,
}

impl Promotion {
    fn from_element(element: &Element) -> Self {
        Self {
            image: element.attr_or_child("image"),
            link: element.attr_or_child("link"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Product {
    pub id: String,
    pub relevance: f64,
    pub direct: bool,
    pub properties: Vec<(String, String)>,
}

impl Product {
    fn from_element(element: &Element) -> Self {
        let properties = element
            .child("properties")
            .map(|props| {
                props
                    .children_named("property")
                    .map(|p| {
                        (
                            p.attr("name").unwrap_or_default().to_string(),
                            p.text().to_string(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: element.attr_or_child("id"),
            relevance: to_f64(&element.attr_or_child("relevance")),
            direct: to_bool(&element.attr_or_child("direct")),
            properties,
        }
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    fn from_element(element: &Element) -> Self {
        Self {
            min: to_f64(&element.child_text("min")),
            max: to_f64(&element.child_text("max")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pub selected_range: Option<Range>,
    pub total_range: Option<Range>,
    pub step_size: f64,
    pub unit: String,
}

impl Attributes {
    fn from_element(element: &Element) -> Self {
        Self {
            selected_range: element.child("selectedRange").map(Range::from_element),
            total_range: element.child("totalRange").map(Range::from_element),
            step_size: to_f64(&element.child_text("stepSize")),
            unit: element.child_text("unit"),
        }
    }
}

// Items of one <items> element. Items are keyed by name: a later item
// with the same name replaces the earlier one in place. `amount` counts
// every <item> element, duplicates included.
#[derive(Debug, Clone, Default, PartialEq)]
struct ItemSet {
    items: Vec<Item>,
    amount: usize,
}

impl ItemSet {
    fn from_parent(parent: &Element) -> Self {
        let mut set = ItemSet::default();
        let Some(items) = parent.child("items") else {
            return set;
        };

        for element in items.children_named("item") {
            let item = Item::from_element(element);
            match set.items.iter_mut().find(|i| i.name == item.name) {
                Some(existing) => *existing = item,
                None => set.items.push(item),
            }
            set.amount += 1;
        }
        set
    }

    fn get(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    name: String,
    display: String,
    weight: f64,
    frequency: u32,
    image: Option<String>,
    color: Option<String>,
    parameters: Option<Range>,
    children: ItemSet,
}

impl Item {
    fn from_element(element: &Element) -> Self {
        Self {
            name: element.child_text("name"),
            display: element.child_text("display"),
            weight: to_f64(&element.child_text("weight")),
            frequency: to_u32(&element.child_text("frequency")),
            image: element.child_text_opt("image"),
            color: element.child_text_opt("color"),
            parameters: element.child("parameters").map(Range::from_element),
            children: ItemSet::from_parent(element),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    // Price range bounds of a range-slider item.
    pub fn parameters(&self) -> Option<Range> {
        self.parameters
    }

    pub fn items(&self) -> &[Item] {
        &self.children.items
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.children.get(name)
    }

    pub fn item_amount(&self) -> usize {
        self.children.amount
    }

    pub fn has_items(&self) -> bool {
        self.children.amount > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    name: String,
    display: String,
    select: String,
    selected_items: u32,
    kind: String,
    attributes: Option<Attributes>,
    items: ItemSet,
}

impl Filter {
    fn from_element(element: &Element) -> Self {
        Self {
            name: element.child_text("name"),
            display: element.child_text("display"),
            select: element.child_text("select"),
            selected_items: to_u32(&element.child_text("selectedItems")),
            kind: element.child_text("type"),
            attributes: element.child("attributes").map(Attributes::from_element),
            items: ItemSet::from_parent(element),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn select(&self) -> &str {
        &self.select
    }

    pub fn selected_items(&self) -> u32 {
        self.selected_items
    }

    /// Filter widget type, e.g. `select`, `range-slider`, `color`, `image`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        self.attributes.as_ref()
    }

    pub fn items(&self) -> &[Item] {
        &self.items.items
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.items.get(name)
    }

    pub fn item_amount(&self) -> usize {
        self.items.amount
    }

    pub fn has_items(&self) -> bool {
        self.items.amount > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlResponse {
    pub servers: Servers,
    pub query: Query,
    pub landing_page: Option<LandingPage>,
    pub promotion: Option<Promotion>,
    pub result_count: u32,
    pub products: Vec<Product>,
    pub filters: Vec<Filter>,
}

impl XmlResponse {
    /// Maps a search or navigation payload. Fails only when the payload is
    /// not well-formed XML.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = parse_tree(xml)?;
        Ok(Self::from_root(&root))
    }

    fn from_root(root: &Element) -> Self {
        let products = root
            .child("products")
            .map(|p| p.children_named("product").map(Product::from_element).collect())
            .unwrap_or_default();
        let filters = root
            .child("filters")
            .map(|f| f.children_named("filter").map(Filter::from_element).collect())
            .unwrap_or_default();

        Self {
            servers: root.child("servers").map(Servers::from_element).unwrap_or_default(),
            query: root.child("query").map(Query::from_element).unwrap_or_default(),
            landing_page: root.child("landingPage").map(|l| LandingPage {
                link: l.attr_or_child("link"),
            }),
            promotion: root.child("promotion").map(Promotion::from_element),
            result_count: root
                .child("results")
                .map(|r| to_u32(&r.child_text("count")))
                .unwrap_or(0),
            products,
            filters,
        }
    }

    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.name == name)
    }

    pub fn has_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    pub fn has_landing_page(&self) -> bool {
        self.landing_page.is_some()
    }
}

pub const DEMO_RESPONSE_XML: &str = include_str!("../samples/demo_response.xml");
