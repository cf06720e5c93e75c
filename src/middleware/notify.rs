use std::sync::Arc;

use async_trait::async_trait;

use crate::middleware::context::CallContext;
use crate::middleware::CallMiddleware;
use crate::traits::Notifier;
use crate::types::Notification;
use crate::{Code, Error};

/// Codes suppressed when the caller does not supply its own ignore set.
///
/// NOT_FOUND is routinely probed for and handled inline by stores;
/// UNAUTHENTICATED already surfaces through [`AuthMiddleware`].
///
/// [`AuthMiddleware`]: crate::middleware::AuthMiddleware
const DEFAULT_IGNORED: [Code; 2] = [Code::NotFound, Code::Unauthenticated];

/// Turns surviving call failures into CRITICAL user notifications.
pub struct ErrorNotificationMiddleware {
    notifier: Arc<dyn Notifier>,
}

impl ErrorNotificationMiddleware {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl CallMiddleware for ErrorNotificationMiddleware {
    async fn on_error(&self, error: &Error, ctx: &CallContext) {
        if ctx.is_silent() {
            return;
        }
        let notification = match error {
            Error::Rpc { code, message } => {
                let ignored = match ctx.ignored_codes() {
                    [] => &DEFAULT_IGNORED[..],
                    explicit => explicit,
                };
                if ignored.contains(code) {
                    return;
                }
                Notification::critical(format!("Code {}: {}", *code as i32, code), message.clone())
            }
            other => {
                Notification::critical(format!("Error: {}", ctx.method()), other.to_string())
            }
        };
        self.notifier.push(notification);
    }
}
