use crate::session::SessionSnapshot;

pub const LOGIN_PATH: &str = "/login";

/// Outcome of checking a guarded route against the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Verification still running; render nothing and decide nothing.
    Pending,
    Authorized,
    /// Send the user to `to`, remembering the path they asked for.
    Redirect {
        to: String,
        from: String,
    },
}

pub struct RouteGuard;

impl RouteGuard {
    pub fn evaluate(session: &SessionSnapshot, requested: &str) -> Access {
        if session.verifying {
            return Access::Pending;
        }
        if session.is_authenticated() {
            Access::Authorized
        } else {
            Access::Redirect {
                to: LOGIN_PATH.to_string(),
                from: requested.to_string(),
            }
        }
    }
}
