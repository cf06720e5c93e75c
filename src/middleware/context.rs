//! Per-call metadata read by every middleware stage.

use crate::error::Code;

/// Method name that must never trigger the forced-logout path. A login
/// call failing with UNAUTHENTICATED is a wrong password, not an
/// expired session.
pub(crate) const LOGIN_METHOD: &str = "Login";

/// Immutable per-call options attached where the call is issued.
///
/// ```rust
/// # use muninn::middleware::CallContext;
/// # use muninn::Code;
/// let ctx = CallContext::new("DocumentService/GetDocument")
///     .silent(true)
///     .ignore(Code::NotFound);
/// ```
#[derive(Debug, Clone)]
pub struct CallContext {
    method: String,
    silent: bool,
    ignored_codes: Vec<Code>,
}

impl CallContext {
    /// Create a context for a method path, `"Service/Method"`.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            silent: false,
            ignored_codes: Vec::new(),
        }
    }

    /// Suppress user-facing effects (notifications, redirects) for this
    /// call. The error still propagates to the caller.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Add a status code the middleware stages should not handle.
    pub fn ignore(mut self, code: Code) -> Self {
        self.ignored_codes.push(code);
        self
    }

    /// Full method path as given.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The bare method name, after the last `/`.
    pub fn method_name(&self) -> &str {
        match self.method.rsplit_once('/') {
            Some((_, name)) => name,
            None => &self.method,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Codes the caller asked the stages to skip. Each stage applies its
    /// own default when this is empty.
    pub fn ignored_codes(&self) -> &[Code] {
        &self.ignored_codes
    }
}
