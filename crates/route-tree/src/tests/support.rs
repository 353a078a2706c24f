//! Shared helpers for scenario tests.

use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

use crate::{ActionFn, Params, RouteContext, RouteError, RouteResult, from_fn};

/// What an action saw when it was invoked.
#[derive(Debug, Clone)]
pub struct Call {
    pub base_url: String,
    pub path: String,
    pub params: Params,
    pub ctx_params: Params,
    pub fields: serde_json::Map<String, Value>,
    pub error: Option<RouteError>,
    pub pattern: Option<String>,
}

/// Records every invocation of the actions it builds.
#[derive(Clone, Default)]
pub struct Spy {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Spy {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, ctx: &RouteContext, params: &Params) {
        self.calls.lock().unwrap().push(Call {
            base_url: ctx.base_url.clone(),
            path: ctx.path.clone(),
            params: params.clone(),
            ctx_params: ctx.params.clone(),
            fields: ctx.fields.clone(),
            error: ctx.error.clone(),
            pattern: ctx.route().map(|r| r.pattern.to_string()),
        });
    }

    /// An action that records its call and resolves `result`.
    pub fn returning(&self, result: Option<Value>) -> ActionFn {
        let spy = self.clone();
        from_fn(move |ctx: RouteContext, params: Params| {
            spy.record(&ctx, &params);
            let result = result.clone();
            async move { Ok(result) }
        })
    }

    /// An action that records its call and fails with `error`.
    pub fn failing(&self, error: RouteError) -> ActionFn {
        let spy = self.clone();
        from_fn(move |ctx: RouteContext, params: Params| {
            spy.record(&ctx, &params);
            let error = error.clone();
            async move { Err::<Option<Value>, _>(error) }
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// An action resolving a fixed string.
pub fn text(value: &'static str) -> ActionFn {
    from_fn(move |_ctx: RouteContext, _params: Params| async move { Ok(Some(json!(value))) })
}

/// An action that awaits `next` and formats the inner result with `wrap`.
pub fn wrapping(wrap: fn(Option<Value>) -> String) -> ActionFn {
    from_fn(move |ctx: RouteContext, _params: Params| async move {
        let inner = ctx.next().await?;
        Ok(Some(json!(wrap(inner))))
    })
}

/// String content of a JSON value, or an empty string.
pub fn as_text(value: &Option<Value>) -> String {
    value
        .as_ref()
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Unwrap a result that must have produced a value.
pub fn produced(result: RouteResult<Option<Value>>) -> Value {
    result.unwrap().expect("dispatch produced no value")
}
