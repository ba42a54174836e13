#![deny(missing_docs)]

//! # Document Model
//!
//! Typed OpenAPI 3.x nodes covering everything the resolver walks. Keys the
//! model does not name are preserved in `extra` maps so a document survives a
//! load/save cycle with its vendor extensions and unrelated sections intact.

use crate::error::{AppError, AppResult};
use crate::oas::normalization::{normalize_boolean_schemas, normalize_schema_node};
use crate::oas::schema::Schema;
use indexmap::IndexMap;
use serde::de::{DeserializeOwned, Error as DeError};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Either a `$ref` pointer or an inline value.
///
/// An object carrying a string `$ref` is a reference unless its kind says
/// otherwise (see [`Loadable::is_reference`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// A `$ref` pointer.
    Ref(Reference),
    /// An inline value.
    T(T),
}

impl<T> RefOr<T> {
    /// Creates a reference node.
    pub fn new_ref(location: impl Into<String>) -> Self {
        RefOr::Ref(Reference::new(location))
    }

    /// Returns the `$ref` string when this node is a reference.
    pub fn ref_location(&self) -> Option<&str> {
        match self {
            RefOr::Ref(reference) => Some(reference.ref_location.as_str()),
            RefOr::T(_) => None,
        }
    }

    /// Returns the inline value, if any.
    pub fn as_inline(&self) -> Option<&T> {
        match self {
            RefOr::Ref(_) => None,
            RefOr::T(value) => Some(value),
        }
    }

    /// Returns the inline value mutably, if any.
    pub fn as_inline_mut(&mut self) -> Option<&mut T> {
        match self {
            RefOr::Ref(_) => None,
            RefOr::T(value) => Some(value),
        }
    }
}

impl<'de, T: Loadable> Deserialize<'de> for RefOr<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let is_reference = value.as_object().is_some_and(T::is_reference);
        if is_reference {
            Reference::deserialize(value)
                .map(RefOr::Ref)
                .map_err(DeError::custom)
        } else {
            T::deserialize(value).map(RefOr::T).map_err(DeError::custom)
        }
    }
}

/// A Reference Object.
///
/// Sibling keys other than `summary` and `description` (extensions,
/// `nullable`, 3.1 schema keywords) are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Target location, internal (`#/...`), relative path or URL.
    #[serde(rename = "$ref")]
    pub ref_location: String,
    /// Optional summary override (OAS 3.1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Optional description override (OAS 3.1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Other sibling keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Reference {
    /// Creates a bare reference.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            ref_location: location.into(),
            summary: None,
            description: None,
            extra: IndexMap::new(),
        }
    }
}

/// The nine registries of the Components Object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentType {
    /// `components/schemas`
    Schemas,
    /// `components/responses`
    Responses,
    /// `components/parameters`
    Parameters,
    /// `components/examples`
    Examples,
    /// `components/requestBodies`
    RequestBodies,
    /// `components/headers`
    Headers,
    /// `components/securitySchemes`
    SecuritySchemes,
    /// `components/links`
    Links,
    /// `components/callbacks`
    Callbacks,
}

impl ComponentType {
    /// Every registry, in document order.
    pub const ALL: [ComponentType; 9] = [
        ComponentType::Schemas,
        ComponentType::Responses,
        ComponentType::Parameters,
        ComponentType::Examples,
        ComponentType::RequestBodies,
        ComponentType::Headers,
        ComponentType::SecuritySchemes,
        ComponentType::Links,
        ComponentType::Callbacks,
    ];

    /// The key of this registry inside `components`.
    pub fn section(self) -> &'static str {
        match self {
            ComponentType::Schemas => "schemas",
            ComponentType::Responses => "responses",
            ComponentType::Parameters => "parameters",
            ComponentType::Examples => "examples",
            ComponentType::RequestBodies => "requestBodies",
            ComponentType::Headers => "headers",
            ComponentType::SecuritySchemes => "securitySchemes",
            ComponentType::Links => "links",
            ComponentType::Callbacks => "callbacks",
        }
    }
}

/// A map whose `x-` keys are vendor extensions rather than entries.
///
/// Used for the Paths, Responses and Callback objects.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensibleMap<T> {
    /// Entries keyed by path template, status code or runtime expression.
    pub items: IndexMap<String, T>,
    /// Specification extensions (`x-...`).
    pub extensions: IndexMap<String, Value>,
}

impl<T> Default for ExtensibleMap<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
            extensions: IndexMap::new(),
        }
    }
}

impl<T> ExtensibleMap<T> {
    /// Returns true when neither entries nor extensions are present.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.extensions.is_empty()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ExtensibleMap<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut items = IndexMap::new();
        let mut extensions = IndexMap::new();

        for (key, value) in raw {
            if key.starts_with("x-") {
                extensions.insert(key, value);
                continue;
            }
            let item = serde_json::from_value::<T>(value)
                .map_err(|e| DeError::custom(format!("Failed to parse entry '{}': {}", key, e)))?;
            items.insert(key, item);
        }

        Ok(Self { items, extensions })
    }
}

impl<T: Serialize> Serialize for ExtensibleMap<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.items.len() + self.extensions.len()))?;
        for (key, value) in &self.items {
            map.serialize_entry(key, value)?;
        }
        for (key, value) in &self.extensions {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// The Paths Object.
pub type Paths = ExtensibleMap<PathItem>;

/// The Responses Object of an operation.
pub type Responses = ExtensibleMap<RefOr<Response>>;

/// Root OpenAPI document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpenApi {
    /// Version string (`3.0.3`, `3.1.0`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,
    /// Info Object, kept opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
    /// Path items keyed by template.
    #[serde(default, skip_serializing_if = "ExtensibleMap::is_empty")]
    pub paths: Paths,
    /// Reusable components.
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
    /// Everything else (`servers`, `tags`, `security`, `x-...`).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl OpenApi {
    /// Parses a YAML (or JSON) document, normalizing boolean schemas first.
    pub fn from_yaml_str(text: &str) -> AppResult<Self> {
        let value: Value = serde_yaml::from_str(text)
            .map_err(|e| AppError::Parse(format!("Invalid OpenAPI document: {}", e)))?;
        Self::from_json_value(value)
    }

    /// Deserializes an already parsed document.
    pub fn from_json_value(mut value: Value) -> AppResult<Self> {
        normalize_boolean_schemas(&mut value);
        serde_json::from_value(value)
            .map_err(|e| AppError::Parse(format!("Invalid OpenAPI document: {}", e)))
    }

    /// Renders the document as YAML.
    pub fn to_yaml_string(&self) -> AppResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| AppError::General(format!("Failed to serialize document: {}", e)))
    }

    /// Renders the document as pretty-printed JSON.
    pub fn to_json_string(&self) -> AppResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AppError::General(format!("Failed to serialize document: {}", e)))
    }
}

/// Components Object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Schema registry.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, RefOr<Schema>>,
    /// Response registry.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, RefOr<Response>>,
    /// Parameter registry.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, RefOr<Parameter>>,
    /// Example registry.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, RefOr<Example>>,
    /// Request body registry.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub request_bodies: IndexMap<String, RefOr<RequestBody>>,
    /// Header registry.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, RefOr<Header>>,
    /// Security scheme registry.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, RefOr<SecurityScheme>>,
    /// Link registry.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, RefOr<Link>>,
    /// Callback registry.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub callbacks: IndexMap<String, RefOr<Callback>>,
    /// Other keys (`pathItems`, `x-...`).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Components {
    /// True when every registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.responses.is_empty()
            && self.parameters.is_empty()
            && self.examples.is_empty()
            && self.request_bodies.is_empty()
            && self.headers.is_empty()
            && self.security_schemes.is_empty()
            && self.links.is_empty()
            && self.callbacks.is_empty()
            && self.extra.is_empty()
    }
}

/// A Path Item Object. May itself carry a `$ref` to a path item elsewhere.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathItem {
    /// Pointer to a path item defined elsewhere.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// GET operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// PUT operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// POST operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// DELETE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// OPTIONS operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// PATCH operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// TRACE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    /// Parameters shared by every operation of this path.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RefOr<Parameter>>,
    /// Other keys (`servers`, `x-...`).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl PathItem {
    /// Iterates over the operations that are present.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> + '_ {
        [
            &self.get,
            &self.put,
            &self.post,
            &self.delete,
            &self.options,
            &self.head,
            &self.patch,
            &self.trace,
        ]
        .into_iter()
        .filter_map(|op| op.as_ref())
    }

    /// Iterates mutably over the operations that are present.
    pub fn operations_mut(&mut self) -> impl Iterator<Item = &mut Operation> + '_ {
        [
            &mut self.get,
            &mut self.put,
            &mut self.post,
            &mut self.delete,
            &mut self.options,
            &mut self.head,
            &mut self.patch,
            &mut self.trace,
        ]
        .into_iter()
        .filter_map(|op| op.as_mut())
    }
}

/// An Operation Object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operation id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Operation-level parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RefOr<Parameter>>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RefOr<RequestBody>>,
    /// Responses keyed by status code.
    #[serde(default, skip_serializing_if = "ExtensibleMap::is_empty")]
    pub responses: Responses,
    /// Callbacks keyed by name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub callbacks: IndexMap<String, RefOr<Callback>>,
    /// Other keys (`security`, `deprecated`, `x-...`).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    /// Query string.
    Query,
    /// Header.
    Header,
    /// Path template segment.
    Path,
    /// Cookie.
    Cookie,
}

/// A Parameter Object. Identity is the `(in, name)` pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Location.
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ParameterIn>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter is mandatory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,
    /// Single example value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Named examples.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, RefOr<Example>>,
    /// Content map (alternative to `schema`).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
    /// Other keys (`style`, `explode`, `deprecated`, `x-...`).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Parameter {
    /// True when both parameters share the same `(in, name)` identity.
    pub fn same_identity(&self, other: &Parameter) -> bool {
        self.location == other.location && self.name == other.name
    }
}

/// A Header Object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Header {
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the header is mandatory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,
    /// Single example value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Named examples.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, RefOr<Example>>,
    /// Content map.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
    /// Other keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A Media Type Object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,
    /// Single example value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Named examples.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, RefOr<Example>>,
    /// Other keys (`encoding`, `x-...`).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A Request Body Object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestBody {
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Content keyed by media type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
    /// Whether the body is mandatory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Other keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A Response Object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Headers keyed by name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, RefOr<Header>>,
    /// Content keyed by media type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
    /// Links keyed by name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, RefOr<Link>>,
    /// Other keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// An Example Object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    /// Summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Embedded value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// URL of an out-of-document value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_value: Option<String>,
    /// Other keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A Link Object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Relative or absolute operation reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_ref: Option<String>,
    /// Operation id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Parameter expressions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Value>,
    /// Request body expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Headers carried by the link.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, RefOr<Header>>,
    /// Other keys (`server`, `x-...`).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A Security Scheme Object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    /// Scheme type (`apiKey`, `http`, `oauth2`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub scheme_type: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Key name for `apiKey`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Key location for `apiKey`.
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// HTTP scheme for `http`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Bearer format hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    /// OAuth2 flows, kept opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flows: Option<Value>,
    /// OpenID Connect discovery URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_id_connect_url: Option<String>,
    /// Other keys.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A Callback Object: runtime expressions mapped to path items.
///
/// A callback holding only a `$ref` is represented by `RefOr::Ref` at the use
/// site. A `$ref` next to expression entries is kept in `reference` and the
/// entries stay in `expressions`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Callback {
    /// The `$ref` sentinel when it appears next to expression entries.
    pub reference: Option<String>,
    /// Path items keyed by runtime expression, plus extensions.
    pub expressions: ExtensibleMap<PathItem>,
}

impl<'de> Deserialize<'de> for Callback {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        let reference = match raw.shift_remove("$ref") {
            Some(Value::String(location)) => Some(location),
            Some(other) => {
                return Err(DeError::custom(format!(
                    "Callback '$ref' must be a string, got {}",
                    other
                )))
            }
            None => None,
        };
        let expressions = serde_json::from_value(Value::Object(raw.into_iter().collect()))
            .map_err(DeError::custom)?;
        Ok(Self {
            reference,
            expressions,
        })
    }
}

impl Serialize for Callback {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let expressions = &self.expressions;
        let len = expressions.items.len() + expressions.extensions.len();
        let mut map = serializer.serialize_map(Some(len + usize::from(self.reference.is_some())))?;
        if let Some(reference) = &self.reference {
            map.serialize_entry("$ref", reference)?;
        }
        for (key, value) in &expressions.items {
            map.serialize_entry(key, value)?;
        }
        for (key, value) in &expressions.extensions {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A value that can be the target of a fragment load.
pub trait Loadable: DeserializeOwned {
    /// Rewrites the raw fragment before it is deserialized.
    fn prepare(_value: &mut Value) {}

    /// Whether an object node of this kind is a Reference Object.
    fn is_reference(node: &Map<String, Value>) -> bool {
        node.get("$ref").is_some_and(Value::is_string)
    }
}

/// A value stored in one of the nine component registries.
pub trait Component: Loadable + Clone + PartialEq + Serialize {
    /// The registry holding values of this kind.
    const TYPE: ComponentType;

    /// Returns the registry for this kind.
    fn registry(components: &Components) -> &IndexMap<String, RefOr<Self>>;

    /// Returns the registry for this kind mutably.
    fn registry_mut(components: &mut Components) -> &mut IndexMap<String, RefOr<Self>>;
}

macro_rules! component {
    ($ty:ty, $kind:ident, $field:ident) => {
        impl Component for $ty {
            const TYPE: ComponentType = ComponentType::$kind;

            fn registry(components: &Components) -> &IndexMap<String, RefOr<Self>> {
                &components.$field
            }

            fn registry_mut(components: &mut Components) -> &mut IndexMap<String, RefOr<Self>> {
                &mut components.$field
            }
        }
    };
}

component!(Schema, Schemas, schemas);
component!(Response, Responses, responses);
component!(Parameter, Parameters, parameters);
component!(Example, Examples, examples);
component!(RequestBody, RequestBodies, request_bodies);
component!(Header, Headers, headers);
component!(SecurityScheme, SecuritySchemes, security_schemes);
component!(Link, Links, links);
component!(Callback, Callbacks, callbacks);

impl Loadable for Schema {
    fn prepare(value: &mut Value) {
        normalize_schema_node(value);
    }
}

impl Loadable for Response {
    fn prepare(value: &mut Value) {
        normalize_boolean_schemas(value);
    }
}

impl Loadable for Parameter {
    fn prepare(value: &mut Value) {
        normalize_boolean_schemas(value);
    }
}

impl Loadable for RequestBody {
    fn prepare(value: &mut Value) {
        normalize_boolean_schemas(value);
    }
}

impl Loadable for Header {
    fn prepare(value: &mut Value) {
        normalize_boolean_schemas(value);
    }
}

impl Loadable for Callback {
    fn prepare(value: &mut Value) {
        normalize_boolean_schemas(value);
    }

    /// Only a `$ref` with no expression entries beside it.
    fn is_reference(node: &Map<String, Value>) -> bool {
        node.get("$ref").is_some_and(Value::is_string)
            && node
                .keys()
                .all(|key| key == "$ref" || key.starts_with("x-"))
    }
}

impl Loadable for PathItem {
    fn prepare(value: &mut Value) {
        normalize_boolean_schemas(value);
    }
}

impl Loadable for Example {}
impl Loadable for SecurityScheme {}
impl Loadable for Link {}
