//! Dispatch state machine
//!
//! One [`Shared`] exists per dispatch. It owns the [`RouteWalker`] and the
//! flags that settle the dispatch, behind a `std::sync::Mutex` that is only
//! ever held between awaits.
//!
//! Cursor ownership follows the action call stack: each running action has
//! an id on the `active` stack, and only the id on top may advance the
//! walker. This admits nested chaining (`a` awaits `next`, which runs `b`,
//! which awaits `next`) and rejects overlapping or stale calls.

use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

use crate::context::{Cursor, RouteContext};
use crate::error::{RouteError, RouteResult};
use crate::logging::{DispatchId, log_dispatch_failed, log_dispatch_settled};
use crate::matcher::Params;
use crate::node::{ActionFn, RouteNode};
use crate::walker::{MatchRecord, RouteWalker};

/// Id of the top-level context driving the dispatch.
const ROOT_ID: u64 = 0;

struct DispatchState<T> {
    walker: RouteWalker<T>,
    /// Ids of running invocations, innermost last
    active: Vec<u64>,
    next_id: u64,
    ended: Option<T>,
    done: bool,
}

impl<T> DispatchState<T> {
    fn enter(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.active.push(id);
        id
    }
}

/// State shared by every context of one dispatch.
pub(crate) struct Shared<T> {
    state: Mutex<DispatchState<T>>,
    error_route: Option<Arc<RouteNode<T>>>,
    request_path: String,
    fields: Map<String, Value>,
    pub(crate) dispatch_id: DispatchId,
}

/// Pops an invocation id off the active stack when dropped.
struct ActiveGuard<T> {
    shared: Arc<Shared<T>>,
    id: u64,
}

impl<T> Drop for ActiveGuard<T> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        if let Some(pos) = state.active.iter().rposition(|&id| id == self.id) {
            state.active.remove(pos);
        }
    }
}

/// A matched action ready to run.
pub(crate) struct Invocation<T> {
    action: ActionFn<T>,
    ctx: RouteContext<T>,
    params: Params,
    guard: ActiveGuard<T>,
}

enum Step<T> {
    Continue,
    Settle(Option<T>),
}

impl<T> Shared<T> {
    pub(crate) fn new(
        walker: RouteWalker<T>,
        error_route: Option<Arc<RouteNode<T>>>,
        request_path: String,
        fields: Map<String, Value>,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(DispatchState {
                walker,
                active: Vec::new(),
                next_id: ROOT_ID + 1,
                ended: None,
                done: false,
            }),
            error_route,
            request_path,
            fields,
            dispatch_id: DispatchId::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, DispatchState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn end(&self, value: T) {
        let mut state = self.lock();
        trace!(dispatch_id = %self.dispatch_id.short(), "Dispatch ended explicitly");
        state.ended = Some(value);
        state.done = true;
    }

    /// Context for the request itself, outside any matched node.
    fn top_level_context(self: &Arc<Self>, id: u64) -> RouteContext<T> {
        RouteContext {
            request_path: self.request_path.clone(),
            base_url: String::new(),
            path: self.request_path.clone(),
            params: Params::new(),
            fields: self.fields.clone(),
            error: None,
            route: None,
            cursor: Cursor {
                shared: Arc::clone(self),
                id,
            },
        }
    }

    /// Request fields, then the node's fields, then the match itself.
    fn context_for(self: &Arc<Self>, id: u64, record: &MatchRecord<T>) -> RouteContext<T> {
        let mut fields = self.fields.clone();
        fields.extend(
            record
                .route
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        RouteContext {
            request_path: self.request_path.clone(),
            base_url: record.base_url.clone(),
            path: record.path.clone(),
            params: record.params.clone(),
            fields,
            error: None,
            route: Some(Arc::clone(&record.route)),
            cursor: Cursor {
                shared: Arc::clone(self),
                id,
            },
        }
    }

    /// Pull one match on behalf of invocation `caller`.
    pub(crate) fn advance(self: &Arc<Self>, caller: u64) -> RouteResult<Option<Invocation<T>>> {
        let mut state = self.lock();
        if state.active.last() != Some(&caller) {
            debug!(
                dispatch_id = %self.dispatch_id.short(),
                caller = caller,
                active = ?state.active,
                "Rejected next() from a context that does not hold the cursor"
            );
            return Err(RouteError::cursor_busy());
        }
        if state.done {
            return Ok(None);
        }

        let Some(record) = state.walker.next_match()? else {
            return Ok(None);
        };
        trace!(
            pattern = %record.route.pattern,
            base_url = %record.base_url,
            path = %record.path,
            "Route matched"
        );

        let Some(action) = record.route.action.clone() else {
            trace!(pattern = %record.route.pattern, "Skipping route without action");
            return Ok(None);
        };

        let id = state.enter();
        drop(state);

        Ok(Some(Invocation {
            action,
            ctx: self.context_for(id, &record),
            params: record.params,
            guard: ActiveGuard {
                shared: Arc::clone(self),
                id,
            },
        }))
    }

    /// Run `ctx` under a fresh invocation id.
    async fn invoke(
        self: &Arc<Self>,
        action: &ActionFn<T>,
        mut ctx: RouteContext<T>,
        params: Params,
    ) -> RouteResult<Option<T>> {
        let id = self.lock().enter();
        let _guard = ActiveGuard {
            shared: Arc::clone(self),
            id,
        };
        ctx.cursor.id = id;
        action.call(ctx, params).await
    }

    async fn invoke_error_route(
        self: &Arc<Self>,
        ctx: RouteContext<T>,
        params: Params,
    ) -> RouteResult<Option<T>> {
        match self.error_route.as_ref().and_then(|route| route.action.clone()) {
            Some(action) => self.invoke(&action, ctx, params).await,
            None => Ok(None),
        }
    }
}

impl<T: Send + 'static> Shared<T> {
    /// Run a matched action, handing a failure to the error route if any.
    pub(crate) async fn run(self: &Arc<Self>, invocation: Invocation<T>) -> RouteResult<Option<T>> {
        let Invocation {
            action,
            ctx,
            params,
            guard,
        } = invocation;

        let result = action.call(ctx.clone(), params.clone()).await;
        drop(guard);

        let mut error = match result {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        if self.error_route.is_none() {
            return Err(error);
        }

        error.status.get_or_insert(500);
        self.lock().done = true;
        debug!(
            dispatch_id = %self.dispatch_id.short(),
            code = %error.code,
            status = ?error.status,
            path = %ctx.path,
            "Action failed, running error route"
        );

        let mut ctx = ctx;
        ctx.error = Some(error);
        self.invoke_error_route(ctx, params).await
    }

    /// Drive the walker until a value is produced or traversal settles.
    pub(crate) async fn drive(self: Arc<Self>) -> RouteResult<Option<T>> {
        let outcome = self.settle().await;
        match &outcome {
            Ok((result, not_found)) => {
                log_dispatch_settled(&self.dispatch_id, result.is_some(), *not_found)
            }
            Err(error) => log_dispatch_failed(&self.dispatch_id, error),
        }
        outcome.map(|(result, _)| result)
    }

    /// Run the loop and the not-found fallback; also reports whether the
    /// fallback ran.
    async fn settle(self: &Arc<Self>) -> RouteResult<(Option<T>, bool)> {
        let root = self.top_level_context(ROOT_ID);
        self.lock().active.push(ROOT_ID);
        let root_guard = ActiveGuard {
            shared: Arc::clone(self),
            id: ROOT_ID,
        };

        let mut result = loop {
            if let Some(value) = root.next().await? {
                break Some(value);
            }
            let step = {
                let mut state = self.lock();
                if state.done {
                    Step::Settle(state.ended.take())
                } else if state.walker.is_exhausted() {
                    Step::Settle(None)
                } else {
                    Step::Continue
                }
            };
            if let Step::Settle(value) = step {
                break value;
            }
        };
        drop(root_guard);

        let not_found = result.is_none() && self.error_route.is_some();
        if not_found {
            debug!(
                dispatch_id = %self.dispatch_id.short(),
                path = %self.request_path,
                "No route produced a value, running error route"
            );
            let mut ctx = self.top_level_context(ROOT_ID);
            ctx.error = Some(RouteError::not_found(&self.request_path));
            result = self.invoke_error_route(ctx, Params::new()).await?;
        }

        Ok((result, not_found))
    }
}
