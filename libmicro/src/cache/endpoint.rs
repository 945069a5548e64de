//! Declarative endpoint definitions
//!
//! An [`ApiDefinition`] is the static description of one cache client: where
//! it mounts, which base URL it talks to, which tag kinds it knows and what
//! each endpoint requests, provides, invalidates and dispatches on
//! completion.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use super::tag::Tag;
use super::transport::Method;
use crate::error::CompositionError;
use crate::store::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Query,
    Mutation,
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointKind::Query => write!(f, "query"),
            EndpointKind::Mutation => write!(f, "mutation"),
        }
    }
}

/// Request an endpoint builds from its arguments
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    /// Relative to the API's base URL
    pub path: String,
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Patch,
            path: path.into(),
            body: Some(body),
        }
    }
}

type RequestBuilder = Box<dyn Fn(&Value) -> RequestSpec + Send + Sync>;
type TagBuilder = Box<dyn Fn(&Value, Option<&Value>) -> Vec<Tag> + Send + Sync>;
type FulfilledHook = Box<dyn Fn(&Value, &Value) -> Vec<Action> + Send + Sync>;
type RejectedHook = Box<dyn Fn(&Value, &str) -> Vec<Action> + Send + Sync>;

pub struct EndpointDefinition {
    name: String,
    kind: EndpointKind,
    request: RequestBuilder,
    /// Argument fields that must be present and non-empty
    required: Vec<String>,
    provides: Vec<Tag>,
    invalidates: Vec<Tag>,
    /// Extra tags derived from the arguments and, for queries, the result
    dynamic_tags: Option<TagBuilder>,
    on_fulfilled: Option<FulfilledHook>,
    on_rejected: Option<RejectedHook>,
}

impl EndpointDefinition {
    /// A read endpoint
    ///
    /// # Arguments
    ///
    /// * `name` - Endpoint name, unique within its API
    /// * `request` - Builds the request from the call's arguments
    ///
    /// # Examples
    ///
    /// ```
    /// use libmicro::cache::{EndpointDefinition, RequestSpec};
    ///
    /// let get_tickets = EndpointDefinition::query("getTickets", |_| RequestSpec::get("tickets"))
    ///     .provides(&["Ticket"]);
    /// assert_eq!(get_tickets.name(), "getTickets");
    /// ```
    pub fn query(
        name: impl Into<String>,
        request: impl Fn(&Value) -> RequestSpec + Send + Sync + 'static,
    ) -> Self {
        Self::new(name.into(), EndpointKind::Query, Box::new(request))
    }

    /// A write endpoint; see [`EndpointDefinition::query`]
    pub fn mutation(
        name: impl Into<String>,
        request: impl Fn(&Value) -> RequestSpec + Send + Sync + 'static,
    ) -> Self {
        Self::new(name.into(), EndpointKind::Mutation, Box::new(request))
    }

    fn new(name: String, kind: EndpointKind, request: RequestBuilder) -> Self {
        Self {
            name,
            kind,
            request,
            required: Vec::new(),
            provides: Vec::new(),
            invalidates: Vec::new(),
            dynamic_tags: None,
            on_fulfilled: None,
            on_rejected: None,
        }
    }

    /// Argument fields a call must carry; calls without them are refused
    /// before any request is sent
    pub fn requires(mut self, fields: &[&str]) -> Self {
        self.required.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn provides(mut self, tags: &[&str]) -> Self {
        self.provides.extend(tags.iter().copied().map(Tag::from));
        self
    }

    pub fn invalidates(mut self, tags: &[&str]) -> Self {
        self.invalidates.extend(tags.iter().copied().map(Tag::from));
        self
    }

    /// Tags computed per request, e.g. `Ticket:{id}`
    pub fn tags_with(
        mut self,
        f: impl Fn(&Value, Option<&Value>) -> Vec<Tag> + Send + Sync + 'static,
    ) -> Self {
        self.dynamic_tags = Some(Box::new(f));
        self
    }

    /// Actions to dispatch once the exchange succeeds, given args and payload
    pub fn on_fulfilled(
        mut self,
        f: impl Fn(&Value, &Value) -> Vec<Action> + Send + Sync + 'static,
    ) -> Self {
        self.on_fulfilled = Some(Box::new(f));
        self
    }

    /// Actions to dispatch once the exchange fails, given args and error text
    pub fn on_rejected(
        mut self,
        f: impl Fn(&Value, &str) -> Vec<Action> + Send + Sync + 'static,
    ) -> Self {
        self.on_rejected = Some(Box::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn request(&self, args: &Value) -> RequestSpec {
        (self.request)(args)
    }

    /// Check `args` against [`EndpointDefinition::requires`]
    pub fn check_args(&self, args: &Value) -> std::result::Result<(), String> {
        let missing: Vec<&str> = self
            .required
            .iter()
            .filter(|field| match args.get(field.as_str()) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(_) => false,
            })
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("Endpoint '{}' requires {}", self.name, missing.join(", ")))
        }
    }

    /// Tags a query result provides
    pub fn provided_tags(&self, args: &Value, data: &Value) -> Vec<Tag> {
        self.resolve(&self.provides, args, Some(data))
    }

    /// Tags a successful mutation invalidates
    pub fn invalidated_tags(&self, args: &Value, data: &Value) -> Vec<Tag> {
        self.resolve(&self.invalidates, args, Some(data))
    }

    fn resolve(&self, fixed: &[Tag], args: &Value, data: Option<&Value>) -> Vec<Tag> {
        let mut tags = fixed.to_vec();
        if let Some(dynamic) = &self.dynamic_tags {
            for tag in dynamic(args, data) {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
        tags
    }

    pub fn fulfilled_actions(&self, args: &Value, data: &Value) -> Vec<Action> {
        self.on_fulfilled.as_ref().map(|f| f(args, data)).unwrap_or_default()
    }

    pub fn rejected_actions(&self, args: &Value, error: &str) -> Vec<Action> {
        self.on_rejected.as_ref().map(|f| f(args, error)).unwrap_or_default()
    }

    fn declared_tags(&self) -> impl Iterator<Item = &Tag> {
        self.provides.iter().chain(self.invalidates.iter())
    }
}

impl std::fmt::Debug for EndpointDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("provides", &self.provides)
            .field("invalidates", &self.invalidates)
            .finish()
    }
}

/// Static description of one cache client
#[derive(Debug)]
pub struct ApiDefinition {
    reducer_path: String,
    base_url: String,
    tag_types: BTreeSet<String>,
    endpoints: Vec<Arc<EndpointDefinition>>,
}

impl ApiDefinition {
    pub fn new(reducer_path: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            reducer_path: reducer_path.into(),
            base_url: base_url.into(),
            tag_types: BTreeSet::new(),
            endpoints: Vec::new(),
        }
    }

    pub fn tag_types(mut self, kinds: &[&str]) -> Self {
        self.tag_types.extend(kinds.iter().map(|k| k.to_string()));
        self
    }

    pub fn endpoint(mut self, endpoint: EndpointDefinition) -> Self {
        self.endpoints.push(Arc::new(endpoint));
        self
    }

    pub fn reducer_path(&self) -> &str {
        &self.reducer_path
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn find(&self, name: &str) -> Option<Arc<EndpointDefinition>> {
        self.endpoints.iter().find(|e| e.name == name).cloned()
    }

    pub fn endpoint_names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|e| e.name.as_str())
    }

    /// Checked by the composers before a store is built
    pub fn validate(&self) -> std::result::Result<(), CompositionError> {
        if self.endpoints.is_empty() {
            return Err(CompositionError::MissingExport {
                module: self.reducer_path.clone(),
                export: "endpoints".to_string(),
            });
        }

        for endpoint in &self.endpoints {
            let undeclared = endpoint.declared_tags().find(|t| !self.tag_types.contains(&t.kind));
            if let Some(tag) = undeclared {
                return Err(CompositionError::UndeclaredTag {
                    api: self.reducer_path.clone(),
                    endpoint: endpoint.name.clone(),
                    tag: tag.kind.clone(),
                });
            }
        }

        Ok(())
    }
}
