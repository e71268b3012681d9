use crate::commands::{CmdCtx, CommandResult};
use crate::error::SessionError;
use crate::net::protocol::{Action, Request, Response};

/// The broadcast, which also reaches the sender, is the only answer to a
/// successful insert.
pub async fn insert(ctx: &mut CmdCtx, req: &Request) -> CommandResult {
    let identity = ctx.identity()?;
    let item = req.item.as_ref().ok_or(SessionError::Validation("invalid item"))?;

    let stored = ctx.registry.services.item.insert(&identity, item).await?;
    tracing::debug!(item_id = stored.id, "item inserted");

    ctx.broadcast(Response::push(Action::Insert, vec![stored])).await?;
    Ok(())
}
