use crate::Registry;
use crate::error::SessionError;
use crate::models::identity::Identity;
use crate::net::broadcast::broadcast;
use crate::net::output::OutputHandle;
use crate::net::protocol::{Action, Request, Response};
use crate::state::session::{ConnState, Session};
use std::sync::Arc;

mod delete;
mod get;
mod insert;
mod login;
mod register;
mod update;

pub type CommandResult = Result<(), SessionError>;

/// Command context passed to command handlers
pub struct CmdCtx {
    /// Output of this connection
    pub output: OutputHandle,
    /// Global service registry
    pub registry: Arc<Registry>,
    /// Connection session
    pub sess: Session,
}

impl CmdCtx {
    pub fn new(registry: Arc<Registry>, output: OutputHandle, sess: Session) -> Self {
        Self { output, registry, sess }
    }

    /// Identity of an authenticated session.
    pub fn identity(&self) -> Result<Identity, SessionError> {
        self.sess
            .identity()
            .cloned()
            .ok_or(SessionError::Validation("invalid action"))
    }

    /// Sends a response to this connection only.
    pub async fn reply(&self, resp: Response) {
        if let Err(e) = self.output.send(&resp).await {
            tracing::debug!(error = %e, "reply dropped");
        }
    }

    /// Sends a response to every connection of this session's identity.
    pub async fn broadcast(&self, resp: Response) -> Result<usize, SessionError> {
        let identity = self.identity()?;
        Ok(broadcast(&self.registry.sessions, &identity, &resp).await)
    }

    /// Marks the session authenticated and joins the session registry.
    pub(crate) fn enter(&mut self, identity: Identity) {
        if !self.sess.authenticate(identity.clone()) {
            return;
        }
        tracing::Span::current().record("identity", identity.as_str());
        self.registry.sessions.join(&identity, self.output.clone());
        let connections = self.registry.sessions.connection_count(&identity);
        tracing::info!(%identity, connections, "authenticated");
    }

    /// Enters the closed state and leaves the session registry.
    pub(crate) fn leave(&mut self) {
        if let Some(identity) = self.sess.close() {
            self.registry.sessions.leave(&identity, &self.output);
            let still_online = self.registry.sessions.is_online(&identity);
            tracing::debug!(%identity, still_online, "left session registry");
        }
    }
}

/// Runs one decoded request against the session. Errors are returned for the
/// caller to report; the session itself stays usable.
pub async fn process_request(ctx: &mut CmdCtx, req: &Request) -> CommandResult {
    match (ctx.sess.state(), req.action) {
        (ConnState::Unauthenticated, Action::Register) => register::register(ctx, req).await,
        (ConnState::Unauthenticated, Action::Login) => login::login(ctx, req).await,
        (ConnState::Authenticated, Action::Get) => get::get(ctx, req).await,
        (ConnState::Authenticated, Action::Insert) => insert::insert(ctx, req).await,
        (ConnState::Authenticated, Action::Update) => update::update(ctx, req).await,
        (ConnState::Authenticated, Action::Delete) => delete::delete(ctx, req).await,
        _ => Err(SessionError::Validation("invalid action")),
    }
}

/// Runs a request and turns any failure into an error response on this
/// connection.
pub async fn handle_request(ctx: &mut CmdCtx, req: &Request) {
    let err = match process_request(ctx, req).await {
        Ok(()) => {
            if req.action.is_mutation() {
                tracing::debug!(action = %req.action, msg_id = req.id, "mutation applied");
            }
            return;
        }
        Err(err) => err,
    };

    match &err {
        SessionError::Internal(detail) => {
            tracing::error!(action = %req.action, msg_id = req.id, error = %detail, "request failed");
        }
        other => {
            tracing::debug!(action = %req.action, msg_id = req.id, error = %other, "request rejected");
        }
    }

    ctx.reply(Response::error(req.id, req.action, err.client_message())).await;
}
