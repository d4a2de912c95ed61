use log::debug;

use crate::guard::{ Access, RouteGuard };
use crate::session::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Chat,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Chat => "/chat",
        }
    }

    pub fn is_guarded(&self) -> bool {
        matches!(self, Route::Chat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Page(Route),
    Redirect(&'static str),
}

/// Route table: `/` goes to the chat, unknown paths fall back to login.
pub fn resolve(path: &str) -> Resolved {
    let trimmed = path.trim();
    let normalized = if trimmed.len() > 1 { trimmed.trim_end_matches('/') } else { trimmed };
    match normalized {
        "/login" => Resolved::Page(Route::Login),
        "/register" => Resolved::Page(Route::Register),
        "/chat" => Resolved::Page(Route::Chat),
        "/" | "" => Resolved::Redirect("/chat"),
        _ => Resolved::Redirect("/login"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Show(Route),
    /// Session verification has not finished; nothing can be shown yet.
    Pending,
}

#[derive(Debug, Default)]
pub struct Router {
    return_to: Option<String>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigate(&mut self, path: &str, session: &SessionSnapshot) -> Navigation {
        let route = match resolve(path) {
            Resolved::Page(route) => route,
            Resolved::Redirect(to) => {
                debug!("{} redirects to {}", path, to);
                return self.navigate(to, session);
            }
        };

        if !route.is_guarded() {
            return Navigation::Show(route);
        }

        match RouteGuard::evaluate(session, route.path()) {
            Access::Pending => Navigation::Pending,
            Access::Authorized => Navigation::Show(route),
            Access::Redirect { to, from } => {
                debug!("{} requires a session, redirecting to {}", from, to);
                self.return_to = Some(from);
                self.navigate(&to, session)
            }
        }
    }

    /// Destination after a successful sign-in: the guarded path that bounced the user, or the chat.
    pub fn after_login(&mut self) -> String {
        self.return_to.take().unwrap_or_else(|| Route::Chat.path().to_string())
    }

    pub fn return_to(&self) -> Option<&str> {
        self.return_to.as_deref()
    }
}
