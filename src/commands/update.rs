use crate::commands::{CmdCtx, CommandResult};
use crate::error::SessionError;
use crate::net::protocol::{Action, Request, Response};

pub async fn update(ctx: &mut CmdCtx, req: &Request) -> CommandResult {
    let identity = ctx.identity()?;
    let item = req.item.as_ref().ok_or(SessionError::Validation("invalid item"))?;

    ctx.registry.services.item.update(&identity, item).await?;

    ctx.broadcast(Response::push(Action::Update, vec![item.clone()])).await?;
    Ok(())
}
