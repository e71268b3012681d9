use crate::commands::{CmdCtx, CommandResult};
use crate::net::protocol::{Action, PUSH_MSG_ID, Request, Response};

pub async fn login(ctx: &mut CmdCtx, req: &Request) -> CommandResult {
    let creds = req.user.clone().unwrap_or_default();

    // Step 1: verify credentials
    let account = ctx
        .registry
        .services
        .account
        .login(&creds.email, &creds.password)
        .await?;

    // Step 2: join the registry, then acknowledge
    let identity = account.email;
    ctx.enter(identity.clone());
    ctx.reply(Response::ok(req)).await;

    // Step 3: one-time snapshot of everything this identity owns
    let push = match ctx.registry.services.item.list(&identity).await {
        Ok(items) => Response::push(Action::Get, items),
        Err(e) => {
            tracing::error!(error = %e, "cannot load items after login");
            Response::error(PUSH_MSG_ID, Action::Get, "internal server error")
        }
    };
    ctx.reply(push).await;

    Ok(())
}
