use crate::commands::{CmdCtx, CommandResult};
use crate::net::protocol::{Request, Response};

pub async fn get(ctx: &mut CmdCtx, req: &Request) -> CommandResult {
    let identity = ctx.identity()?;
    let items = ctx.registry.services.item.list(&identity).await?;

    ctx.reply(Response::items(req, items)).await;
    Ok(())
}
