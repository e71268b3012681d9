use crate::commands::{CmdCtx, CommandResult};
use crate::error::SessionError;
use crate::models::item::Item;
use crate::net::protocol::{Action, Request, Response};

pub async fn delete(ctx: &mut CmdCtx, req: &Request) -> CommandResult {
    let identity = ctx.identity()?;
    let id = req
        .item
        .as_ref()
        .map(|item| item.id)
        .ok_or(SessionError::Validation("invalid item"))?;

    ctx.registry.services.item.delete(&identity, id).await?;

    // receivers only need the id to drop it locally
    ctx.broadcast(Response::push(Action::Delete, vec![Item::tombstone(id)])).await?;
    Ok(())
}
