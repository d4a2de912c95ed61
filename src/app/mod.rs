pub mod render;

use log::{ debug, info };
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{ AsyncBufRead, AsyncBufReadExt, Lines };

use crate::api::{ ApiError, Backend };
use crate::conversation::{ ConversationController, TurnOutcome };
use crate::router::{ Navigation, Route, Router };
use crate::session::SessionStore;

const REGISTERED_NOTICE: &str = "Registration successful! Redirecting to login...";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("console IO error: {0}")] Io(#[from] std::io::Error),
    #[error(transparent)] Api(#[from] ApiError),
}

/// Line-oriented console front end: login, register and chat pages behind the router.
pub struct App<R, W> {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
    router: Router,
    chat: ConversationController,
    input: Lines<R>,
    out: W,
    notice: Option<String>,
    rendered: usize,
}

impl<R, W> App<R, W> where R: AsyncBufRead + Unpin, W: Write {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionStore>, input: R, out: W) -> Self {
        let chat = ConversationController::new(backend.clone(), session.clone());
        Self {
            backend,
            session,
            router: Router::new(),
            chat,
            input: input.lines(),
            out,
            notice: None,
            rendered: 0,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub async fn run(&mut self, start: &str) -> Result<(), AppError> {
        self.session.initialize(self.backend.as_ref()).await;

        let mut path = start.to_string();
        loop {
            let next = match self.router.navigate(&path, &self.session.snapshot()) {
                Navigation::Pending => {
                    self.session.initialize(self.backend.as_ref()).await;
                    continue;
                }
                Navigation::Show(Route::Login) => self.login_page().await?,
                Navigation::Show(Route::Register) => self.register_page().await?,
                Navigation::Show(Route::Chat) => self.chat_page().await?,
            };
            match next {
                Some(p) => {
                    debug!("Navigating to {}", p);
                    path = p;
                }
                None => break,
            }
        }
        writeln!(self.out, "Bye.")?;
        self.out.flush()?;
        Ok(())
    }

    async fn prompt(&mut self, label: &str) -> Result<Option<String>, AppError> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;
        Ok(self.input.next_line().await?)
    }

    fn show_notice(&mut self) -> Result<(), AppError> {
        if let Some(notice) = self.notice.take() {
            writeln!(self.out, "{}", render::notice_line(&notice))?;
        }
        Ok(())
    }

    async fn login_page(&mut self) -> Result<Option<String>, AppError> {
        writeln!(self.out, "{}", render::header("Sign In"))?;
        self.show_notice()?;
        writeln!(self.out, "Type :register to create an account or :quit to exit.")?;

        loop {
            let Some(username) = self.prompt("Username: ").await? else {
                return Ok(None);
            };
            match username.trim() {
                ":quit" => return Ok(None),
                ":register" => return Ok(Some(Route::Register.path().to_string())),
                _ => {}
            }
            let Some(password) = self.prompt("Password: ").await? else {
                return Ok(None);
            };

            match self.session.sign_in(self.backend.as_ref(), &username, &password).await {
                Ok(profile) => {
                    writeln!(self.out, "Welcome, {}!", profile.username)?;
                    return Ok(Some(self.router.after_login()));
                }
                Err(e) => {
                    writeln!(self.out, "{}", render::error_line(&e.user_message()))?;
                }
            }
        }
    }

    async fn register_page(&mut self) -> Result<Option<String>, AppError> {
        writeln!(self.out, "{}", render::header("Sign Up"))?;
        self.show_notice()?;
        writeln!(self.out, "Type :login to go back or :quit to exit.")?;

        loop {
            let Some(username) = self.prompt("Username: ").await? else {
                return Ok(None);
            };
            match username.trim() {
                ":quit" => return Ok(None),
                ":login" => return Ok(Some(Route::Login.path().to_string())),
                _ => {}
            }
            let Some(email) = self.prompt("Email (optional): ").await? else {
                return Ok(None);
            };
            let Some(password) = self.prompt("Password: ").await? else {
                return Ok(None);
            };

            let email = Some(email.as_str()).filter(|e| !e.trim().is_empty());
            match self.session.register(self.backend.as_ref(), &username, &password, email).await {
                Ok(()) => {
                    self.notice = Some(REGISTERED_NOTICE.to_string());
                    return Ok(Some(Route::Login.path().to_string()));
                }
                Err(e) => {
                    writeln!(self.out, "{}", render::error_line(&e.user_message()))?;
                }
            }
        }
    }

    async fn chat_page(&mut self) -> Result<Option<String>, AppError> {
        self.chat.sync_identity();
        self.rendered = 0;

        writeln!(self.out, "{}", render::header("AI Chat Assistant"))?;
        if let Some(username) = self.session.snapshot().username() {
            writeln!(self.out, "Logged in as: {}", username)?;
        }
        self.show_notice()?;
        writeln!(self.out, "Type :logout to sign out or :quit to exit.")?;
        self.render_log()?;

        loop {
            let Some(line) = self.prompt("> ").await? else {
                return Ok(None);
            };
            match line.trim() {
                ":quit" => return Ok(None),
                ":logout" => {
                    if let Err(e) = self.chat.logout() {
                        writeln!(self.out, "{}", render::error_line(&e.user_message()))?;
                    }
                    return Ok(Some(Route::Login.path().to_string()));
                }
                _ => {}
            }

            self.chat.set_input(line);
            let Some(effect) = self.chat.start_turn() else {
                continue;
            };
            self.render_log()?;
            writeln!(self.out, "{}", render::THINKING)?;
            self.out.flush()?;

            match self.chat.complete(effect).await {
                TurnOutcome::SessionExpired { message } => {
                    info!("Session ended by backend");
                    self.notice = Some(format!("Your session has ended: {}", message));
                    return Ok(Some(Route::Chat.path().to_string()));
                }
                TurnOutcome::Failed => {
                    self.render_log()?;
                    if let Some(error) = &self.chat.state().error {
                        writeln!(self.out, "{}", render::error_line(error))?;
                    }
                }
                TurnOutcome::Replied | TurnOutcome::Ignored => self.render_log()?,
            }
        }
    }

    /// Prints log entries up to the scroll anchor that have not been shown yet.
    fn render_log(&mut self) -> Result<(), AppError> {
        let state = self.chat.state();
        let end = state.scroll_anchor.map(|i| i + 1).unwrap_or(0);
        if end < self.rendered {
            self.rendered = 0;
        }
        for msg in &state.messages[self.rendered..end] {
            writeln!(self.out, "{}", render::message(msg))?;
        }
        self.rendered = end;
        self.out.flush()?;
        Ok(())
    }
}
