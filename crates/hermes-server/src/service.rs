//! Service implementations.
//!
//! A [`ServiceImpl`] maps contract method names to async functions. Each
//! function receives a [`Call`] holding the decoded arguments and returns
//! the method's value as JSON.
//!
//! # Example
//!
//! ```rust
//! use hermes_server::{Call, ServiceImpl};
//! use serde_json::json;
//!
//! let service = ServiceImpl::new()
//!     .method("getName", |call: Call| async move {
//!         let id: i64 = call.arg("id")?;
//!         Ok(json!(format!("user {id}")))
//!     })
//!     .method("setName", |_call: Call| async move { Ok(json!(null)) });
//!
//! assert!(service.has_method("getName"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hermes_core::{HermesError, HermesResult, MethodId, RequestId};
use hermes_extract::{Arguments, ExtractionContext};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Boxed future returned by a method implementation.
pub type MethodFuture = Pin<Box<dyn Future<Output = HermesResult<Value>> + Send>>;

/// A type-erased method implementation.
pub type MethodFn = Arc<dyn Fn(Call) -> MethodFuture + Send + Sync>;

/// A computed-parameter resolver.
pub type Resolver = Arc<dyn Fn(&ExtractionContext) -> HermesResult<Value> + Send + Sync>;

/// Implementations for one contract, nested contracts included.
#[derive(Default, Clone)]
pub struct ServiceImpl {
    methods: HashMap<String, MethodFn>,
    resolvers: HashMap<String, Resolver>,
    nested: HashMap<String, ServiceImpl>,
}

impl ServiceImpl {
    /// Creates an empty implementation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Implements the method `name`.
    pub fn method<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Call) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HermesResult<Value>> + Send + 'static,
    {
        let f = Arc::new(f);
        let erased: MethodFn = Arc::new(move |call: Call| {
            let f = Arc::clone(&f);
            Box::pin(async move { f(call).await }) as MethodFuture
        });
        self.methods.insert(name.into(), erased);
        self
    }

    /// Registers the resolver for every computed parameter named `param`.
    pub fn resolver<F>(mut self, param: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ExtractionContext) -> HermesResult<Value> + Send + Sync + 'static,
    {
        self.resolvers.insert(param.into(), Arc::new(f));
        self
    }

    /// Implements the contract mounted by the nesting method `name`.
    pub fn nested(mut self, name: impl Into<String>, implementation: ServiceImpl) -> Self {
        self.nested.insert(name.into(), implementation);
        self
    }

    /// True when `name` is implemented.
    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub(crate) fn method_fn(&self, name: &str) -> Option<&MethodFn> {
        self.methods.get(name)
    }

    pub(crate) fn resolver_fn(&self, param: &str) -> Option<&Resolver> {
        self.resolvers.get(param)
    }

    pub(crate) fn nested_impl(&self, name: &str) -> Option<&ServiceImpl> {
        self.nested.get(name)
    }

    pub(crate) fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub(crate) fn nested_names(&self) -> impl Iterator<Item = &str> {
        self.nested.keys().map(String::as_str)
    }
}

impl fmt::Debug for ServiceImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.method_names().collect();
        methods.sort_unstable();
        let mut resolvers: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        resolvers.sort_unstable();
        f.debug_struct("ServiceImpl")
            .field("methods", &methods)
            .field("resolvers", &resolvers)
            .field("nested", &self.nested)
            .finish()
    }
}

/// Response header values written by an implementation.
///
/// Shared between the dispatcher and the running call, so values set
/// before a failure are still sent.
#[derive(Debug, Clone, Default)]
pub struct OutputSlots(Arc<Mutex<IndexMap<String, Value>>>);

impl OutputSlots {
    /// Sets the value for the output parameter `name`.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.0.lock().insert(name.into(), value);
    }

    /// Returns a copy of the value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.lock().get(name).cloned()
    }
}

/// One invocation of a method implementation.
#[derive(Debug, Clone)]
pub struct Call {
    method: MethodId,
    context: Arc<ExtractionContext>,
    args: Arguments,
    outputs: OutputSlots,
}

impl Call {
    /// Creates a call.
    #[must_use]
    pub fn new(
        method: MethodId,
        context: Arc<ExtractionContext>,
        args: Arguments,
        outputs: OutputSlots,
    ) -> Self {
        Self {
            method,
            context,
            args,
            outputs,
        }
    }

    /// Returns the method being invoked.
    #[must_use]
    pub fn method(&self) -> &MethodId {
        &self.method
    }

    /// Returns the request this call was decoded from.
    #[must_use]
    pub fn context(&self) -> &ExtractionContext {
        &self.context
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        self.context.request_id()
    }

    /// Returns the decoded JSON value of the parameter `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Returns every decoded argument.
    #[must_use]
    pub fn args(&self) -> &Arguments {
        &self.args
    }

    /// Deserializes the parameter `name` into `T`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the parameter is absent or does not fit
    /// `T`.
    pub fn arg<T: DeserializeOwned>(&self, name: &str) -> HermesResult<T> {
        let value = self
            .args
            .get(name)
            .ok_or_else(|| HermesError::validation(format!("missing argument `{name}`")))?;
        serde_json::from_value(value.clone())
            .map_err(|e| HermesError::validation(format!("argument `{name}`: {e}")))
    }

    /// Sets the output header parameter `name`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if `value` cannot be serialized.
    pub fn set_output<T: Serialize>(&self, name: &str, value: T) -> HermesResult<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| HermesError::internal_with_source("cannot encode output header", e))?;
        self.outputs.set(name, value);
        Ok(())
    }

    /// Returns the current value of the output parameter `name`.
    ///
    /// Bidirectional parameters start out holding the received value.
    #[must_use]
    pub fn output(&self, name: &str) -> Option<Value> {
        self.outputs.get(name)
    }
}

/// Serializes a return value.
///
/// # Errors
///
/// Returns an internal error if `value` cannot be serialized.
pub fn reply<T: Serialize>(value: T) -> HermesResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| HermesError::internal_with_source("cannot encode return value", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hermes_router::Params;
    use http::{HeaderMap, Method, Uri};
    use serde_json::json;

    fn call_with(args: Arguments) -> Call {
        let ctx = ExtractionContext::new(
            Method::GET,
            Uri::from_static("/"),
            HeaderMap::new(),
            Bytes::new(),
            Params::new(),
        );
        Call::new(
            MethodId::new("T", "m"),
            Arc::new(ctx),
            args,
            OutputSlots::default(),
        )
    }

    #[test]
    fn test_typed_args() {
        let mut args = Arguments::new();
        args.insert("id", json!(7));
        args.insert("tags", json!(["a", "b"]));
        let call = call_with(args);

        assert_eq!(call.arg::<i64>("id").unwrap(), 7);
        assert_eq!(call.arg::<Vec<String>>("tags").unwrap(), vec!["a", "b"]);
        assert!(call.arg::<String>("id").is_err());
        assert!(call.arg::<i64>("missing").is_err());
    }

    #[test]
    fn test_outputs_are_shared() {
        let call = call_with(Arguments::new());
        let slots = call.outputs.clone();
        call.set_output("etag", "v2").unwrap();
        assert_eq!(slots.get("etag"), Some(json!("v2")));
        assert_eq!(call.output("etag"), Some(json!("v2")));
    }

    #[tokio::test]
    async fn test_erased_method() {
        let service = ServiceImpl::new().method("double", |call: Call| async move {
            let n: i64 = call.arg("n")?;
            reply(n * 2)
        });
        let mut args = Arguments::new();
        args.insert("n", json!(21));
        let f = service.method_fn("double").unwrap();
        assert_eq!(f(call_with(args)).await.unwrap(), json!(42));
        assert!(service.method_fn("triple").is_none());
    }

    #[test]
    fn test_debug_lists_names() {
        let service = ServiceImpl::new()
            .method("b", |_call: Call| async { Ok(Value::Null) })
            .method("a", |_call: Call| async { Ok(Value::Null) })
            .resolver("user", |_ctx: &ExtractionContext| Ok(Value::Null));
        let text = format!("{service:?}");
        assert!(text.contains(r#"methods: ["a", "b"]"#));
        assert!(text.contains(r#"resolvers: ["user"]"#));
    }
}
