use crate::commands::{CmdCtx, CommandResult};
use crate::net::protocol::{Request, Response};

/// Creates the identity and logs the connection in under it. Unlike login,
/// no item snapshot is pushed: a fresh identity has none.
pub async fn register(ctx: &mut CmdCtx, req: &Request) -> CommandResult {
    let creds = req.user.clone().unwrap_or_default();

    let identity = ctx
        .registry
        .services
        .account
        .register(&creds.email, &creds.password)
        .await?;

    // Join first so the acknowledgement implies membership
    ctx.enter(identity);
    ctx.reply(Response::ok(req)).await;

    Ok(())
}
