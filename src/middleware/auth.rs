use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::middleware::context::{CallContext, LOGIN_METHOD};
use crate::middleware::CallMiddleware;
use crate::session::SessionState;
use crate::traits::{Navigator, Notifier};
use crate::types::{Notification, Route};
use crate::{Code, Error};

/// Reacts to authentication and authorization failures.
///
/// UNAUTHENTICATED marks the shared [`SessionState`] as rejected so the
/// owning shell can force a re-login, and warns the user once per error
/// when a session actually existed. PERMISSION_DENIED redirects to the
/// forbidden page. Everything else is left to later stages.
pub struct AuthMiddleware {
    session: Arc<SessionState>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl AuthMiddleware {
    pub fn new(
        session: Arc<SessionState>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            notifier,
            navigator,
        }
    }
}

#[async_trait]
impl CallMiddleware for AuthMiddleware {
    async fn on_error(&self, error: &Error, ctx: &CallContext) {
        if ctx.is_silent() {
            return;
        }
        let Some(code) = error.code() else {
            return;
        };
        if ctx.ignored_codes().contains(&code) {
            return;
        }
        match code {
            // A rejected login attempt is a normal outcome, not an
            // expired session.
            Code::Unauthenticated if ctx.method_name() != LOGIN_METHOD => {
                warn!(method = ctx.method(), "session rejected by server");
                let was_logged_in = self.session.is_logged_in();
                self.session.mark_unauthenticated();
                if was_logged_in {
                    self.notifier.push(Notification::warn(
                        "Sign-in expired",
                        "Your session is no longer valid. Please sign in again.",
                    ));
                }
            }
            Code::PermissionDenied => {
                warn!(method = ctx.method(), "permission denied, redirecting");
                self.navigator.navigate_to(Route::Forbidden);
            }
            _ => {}
        }
    }
}
