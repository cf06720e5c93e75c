//! RPC middleware chain.
//!
//! Every outbound call passes through an [`RpcChain`], a fixed, ordered
//! list of [`CallMiddleware`] stages that run side effects when a call
//! fails and always re-raise the original error. Stages never swallow:
//! callers see exactly the error the transport produced, after the
//! chain's effects (session invalidation, redirects, notifications)
//! have run at most once.
//!
//! Unary calls dispatch through [`RpcChain::unary`]. Server-streaming
//! calls wrap their stream with [`RpcChain::server_streaming`]: values
//! pass through untouched, the first error item runs the stages exactly
//! once, is yielded, and ends the stream. Effects never run per-value
//! and never twice.
//!
//! The production stage order is [`RpcChain::standard`]: auth first,
//! then error notification. The notification stage's default ignore set
//! contains UNAUTHENTICATED precisely because the auth stage owns that
//! surface.

mod auth;
mod context;
mod notify;

pub use auth::AuthMiddleware;
pub use context::CallContext;
pub use notify::ErrorNotificationMiddleware;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::Stream;
use futures_util::future::BoxFuture;
use pin_project_lite::pin_project;

use crate::session::SessionState;
use crate::telemetry;
use crate::traits::{EventStream, Navigator, Notifier};
use crate::{Error, Result};

/// One stage of the chain. Stages observe failures and perform side
/// effects; the chain itself re-raises the error afterwards.
#[async_trait]
pub trait CallMiddleware: Send + Sync {
    async fn on_error(&self, error: &Error, ctx: &CallContext);
}

/// Ordered middleware stages shared by every store.
///
/// Cheap to clone; clones dispatch through the same stages.
#[derive(Clone)]
pub struct RpcChain {
    stages: Arc<[Arc<dyn CallMiddleware>]>,
}

impl RpcChain {
    /// Build a chain from explicit stages, dispatched in order.
    pub fn new(stages: Vec<Arc<dyn CallMiddleware>>) -> Self {
        Self {
            stages: stages.into(),
        }
    }

    /// The production pipeline: [`AuthMiddleware`] then
    /// [`ErrorNotificationMiddleware`].
    pub fn standard(
        session: Arc<SessionState>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::new(vec![
            Arc::new(AuthMiddleware::new(session, notifier.clone(), navigator)),
            Arc::new(ErrorNotificationMiddleware::new(notifier)),
        ])
    }

    /// Await a unary call, dispatching the stages on failure before
    /// re-raising the original error.
    pub async fn unary<T, F>(&self, ctx: &CallContext, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match call.await {
            Ok(value) => Ok(value),
            Err(error) => {
                self.dispatch(&error, ctx).await;
                Err(error)
            }
        }
    }

    /// Wrap a server-streaming response. Values pass through; the first
    /// error item dispatches the stages exactly once, is yielded, and
    /// terminates the stream.
    pub fn server_streaming<T, S>(&self, ctx: &CallContext, stream: S) -> EventStream<T>
    where
        T: 'static,
        S: Stream<Item = Result<T>> + Send + 'static,
    {
        Box::pin(Guarded {
            inner: stream,
            chain: self.clone(),
            ctx: ctx.clone(),
            effects: None,
            done: false,
        })
    }

    async fn dispatch(&self, error: &Error, ctx: &CallContext) {
        let code = match error.code() {
            Some(code) => code.name(),
            None => "local",
        };
        metrics::counter!(telemetry::RPC_ERRORS_TOTAL,
            "method" => ctx.method().to_owned(),
            "code" => code,
        )
        .increment(1);
        for stage in self.stages.iter() {
            stage.on_error(error, ctx).await;
        }
    }
}

pin_project! {
    /// Stream adapter that runs the chain's effects on the first error.
    struct Guarded<S> {
        #[pin]
        inner: S,
        chain: RpcChain,
        ctx: CallContext,
        // In-flight effect dispatch; resolves to the error to yield.
        effects: Option<BoxFuture<'static, Error>>,
        done: bool,
    }
}

impl<T, S> Stream for Guarded<S>
where
    S: Stream<Item = Result<T>> + Send + 'static,
{
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            if *this.done {
                return Poll::Ready(None);
            }
            if let Some(effects) = this.effects.as_mut() {
                let error = match effects.as_mut().poll(cx) {
                    Poll::Ready(error) => error,
                    Poll::Pending => return Poll::Pending,
                };
                *this.effects = None;
                *this.done = true;
                return Poll::Ready(Some(Err(error)));
            }
            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(value))) => return Poll::Ready(Some(Ok(value))),
                Poll::Ready(Some(Err(error))) => {
                    let chain = this.chain.clone();
                    let ctx = this.ctx.clone();
                    *this.effects = Some(Box::pin(async move {
                        chain.dispatch(&error, &ctx).await;
                        error
                    }));
                    // Loop to poll the dispatch immediately.
                }
                Poll::Ready(None) => {
                    *this.done = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
