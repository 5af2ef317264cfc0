use super::Context;
use crate::error::Result;
use crate::models::reply::tokens;
use crate::models::{ActionTag, LogEntry, Member, Reply};

/// How many matching log lines `/user_tokens history:true` shows
const HISTORY_LIMIT: usize = 10;

/// `/balance`: the caller's own balance
pub async fn balance(ctx: &Context<'_>) -> Result<Reply> {
    let state = ctx.state;
    let held = state.ledger.load().await.balance(&ctx.guild.id, &ctx.caller.id);

    state
        .audit
        .append(
            &ctx.guild.name,
            ActionTag::CheckPersonalBalance,
            None,
            Some(ctx.caller),
            None,
        )
        .await;

    Ok(Reply::ephemeral(format!("You currently have {}.", tokens(held))))
}

/// `/balances`: every holder of the guild
pub async fn balances(ctx: &Context<'_>) -> Result<Reply> {
    let state = ctx.state;
    let table = state.ledger.load().await;
    let holders = table.holders(&ctx.guild.id);

    if holders.is_empty() {
        return Ok(Reply::public("No one has any tokens at the moment.").with_title("Token Balances"));
    }

    let list = holders
        .iter()
        .map(|(user_id, held)| format!("<@{}>: {}", user_id, tokens(*held)))
        .collect::<Vec<_>>()
        .join("\n");
    let total: u64 = holders.iter().map(|(_, held)| u64::from(*held)).sum();

    state
        .audit
        .append(
            &ctx.guild.name,
            ActionTag::CheckBalances,
            None,
            Some(ctx.caller),
            None,
        )
        .await;

    Ok(Reply::public(format!("{} total tokens, {} holders", total, holders.len()))
        .with_title("Token Balances")
        .field("Token Holders", list))
}

/// `/check_user_balance`: one member's balance
pub async fn check_user_balance(ctx: &Context<'_>, member: &Member) -> Result<Reply> {
    let state = ctx.state;
    let held = state.ledger.load().await.balance(&ctx.guild.id, &member.id);

    state
        .audit
        .append(
            &ctx.guild.name,
            ActionTag::CheckUserBalance,
            Some(ctx.caller),
            Some(member),
            None,
        )
        .await;

    let status = if held > 0 { tokens(held) } else { "No tokens".to_string() };
    Ok(Reply::public(format!("{} currently has {}.", member.display(), tokens(held)))
        .with_title("Token Balance")
        .field("Status", status))
}

/// `/verify_balance`: whether two members both hold at least one token
pub async fn verify_balance(ctx: &Context<'_>, user1: &Member, user2: &Member) -> Result<Reply> {
    let state = ctx.state;
    let table = state.ledger.load().await;
    let first = table.balance(&ctx.guild.id, &user1.id);
    let second = table.balance(&ctx.guild.id, &user2.id);

    let verdict = match (first, second) {
        (a, b) if a >= 1 && b >= 1 => "Both players have enough tokens to proceed".to_string(),
        (0, 0) => format!(
            "{} and {} do not hold enough tokens to proceed",
            user1.display(),
            user2.display()
        ),
        (0, _) => format!("{} does not hold enough tokens to proceed", user1.display()),
        _ => format!("{} does not hold enough tokens to proceed", user2.display()),
    };

    state
        .audit
        .append_entry(
            LogEntry::now(&ctx.guild.name, ActionTag::VerifyBalance)
                .with_admin(ctx.caller)
                .with_member_text(format!("{} vs {}", user1.log_name(), user2.log_name())),
        )
        .await;

    Ok(Reply::public(verdict)
        .with_title("Token Verification")
        .field(
            "Token Balances",
            format!(
                "{} - {}\n{} - {}",
                user1.display(),
                tokens(first),
                user2.display(),
                tokens(second)
            ),
        ))
}

/// `/user_tokens`: a member's totals rebuilt from the transaction log
pub async fn user_tokens(ctx: &Context<'_>, member: &Member, history: bool) -> Result<Reply> {
    let state = ctx.state;
    let current = state.ledger.load().await.balance(&ctx.guild.id, &member.id);
    // Plain account name: the matcher also accepts `name#disc` lines
    let summary = state
        .audit
        .summarize(&ctx.guild.name, &member.id, Some(&member.name), current)
        .await;

    let mut reply = Reply::public(format!("User ID: {}", member.id))
        .with_title(format!("Token History: {}", member.display()))
        .field("Net Tokens Given", format!("{} tokens", summary.total_given))
        .field("Total Deposited", format!("{} tokens", summary.total_deposited))
        .field("Current Balance", format!("{} tokens", summary.current_balance));

    if let Some(rate) = summary.usage_rate() {
        reply = reply.field("Usage Rate", format!("{:.1}% deposited", rate));
    }

    let overview = if summary.total_given > 0 {
        let mut text = format!("Net tokens received: {} tokens\n", summary.total_given);
        if summary.total_deposited > 0 {
            text.push_str(&format!("Deposited {} tokens to bank\n", summary.total_deposited));
        }
        text.push_str(&format!("Currently holds {} tokens", summary.current_balance));
        text
    } else {
        "This user has no net tokens received.".to_string()
    };
    reply = reply.field("Summary", overview);

    if history {
        let lines = state.audit.entries_mentioning(&member.id, HISTORY_LIMIT).await;
        let value = if lines.is_empty() {
            "No transactions found.".to_string()
        } else {
            format!("```\n{}\n```", lines.join("\n"))
        };
        reply = reply.field("Recent Transactions", value);
    }

    state
        .audit
        .append(
            &ctx.guild.name,
            ActionTag::AdminCheckUserTokens,
            Some(ctx.caller),
            Some(member),
            None,
        )
        .await;

    Ok(reply)
}

/// `/stats`: aggregate figures for the guild
pub async fn stats(ctx: &Context<'_>) -> Result<Reply> {
    let table = ctx.state.ledger.load().await;
    let Some(stats) = table.guild_stats(&ctx.guild.id) else {
        return Ok(Reply::ephemeral("No token data available for this server."));
    };

    Ok(Reply::public(String::new())
        .with_title("Token Statistics")
        .field("Total Tokens", stats.total_tokens.to_string())
        .field("Unique Users", stats.unique_users.to_string())
        .field("Maximum Tokens", stats.max_tokens.to_string())
        .field("Average Tokens", format!("{:.2}", stats.average_tokens)))
}
