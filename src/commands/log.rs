use super::Context;
use crate::error::Result;
use crate::models::Reply;

/// `/log`: the most recent transaction log lines
pub async fn view_log(ctx: &Context<'_>, entries: Option<i64>) -> Result<Reply> {
    let lines = ctx.state.audit.recent_entries(entries.unwrap_or(0)).await;

    if lines.is_empty() {
        return Ok(Reply::ephemeral("The transaction log is empty."));
    }

    Ok(Reply::ephemeral(format!("```\n{}\n```", lines.join("\n"))).with_title("Recent Token Transactions"))
}
