use super::Context;
use crate::constants::{ERR_AMOUNT_POSITIVE, ERR_DEPOSIT_POSITIVE, ERR_GIVE_RANGE, MAX_GIVE_PER_COMMAND};
use crate::error::{AppError, Result};
use crate::models::reply::tokens;
use crate::models::{ActionTag, LogEntry, Member, MemberRemoveEvent, Reply};
use crate::AppState;

const ERR_SAVE_FAILED: &str = "Failed to save token data. Check server logs for details.";

/// Amounts above u32::MAX can never be covered by a balance
fn clamp_amount(amount: i64) -> u32 {
    u32::try_from(amount).unwrap_or(u32::MAX)
}

/// `/give`: add 1-3 tokens to a member, up to the per-user maximum
pub async fn give(ctx: &Context<'_>, member: &Member, amount: i64) -> Result<Reply> {
    if !(1..=MAX_GIVE_PER_COMMAND).contains(&amount) {
        return Err(AppError::InvalidInput(ERR_GIVE_RANGE.to_string()));
    }
    let amount = clamp_amount(amount);
    let state = ctx.state;

    let balance = {
        let _guard = state.ledger.lock().await;
        let mut table = state.ledger.load().await;
        let balance = table.give(
            &ctx.guild.id,
            &member.id,
            amount,
            state.config.max_tokens_per_user,
        )?;
        if !state.ledger.save(&table).await {
            return Err(AppError::Persistence(ERR_SAVE_FAILED.to_string()));
        }
        balance
    };

    state
        .audit
        .append(
            &ctx.guild.name,
            ActionTag::GiveTokens,
            Some(ctx.caller),
            Some(member),
            Some(amount.to_string()),
        )
        .await;

    tracing::info!(
        "Gave {} token(s) to {} in {} (now {})",
        amount,
        member.id,
        ctx.guild.id,
        balance
    );

    Ok(Reply::public(format!(
        "Successfully gave {} to {}. They now have {}.",
        tokens(amount),
        member.mention(),
        tokens(balance)
    )))
}

/// `/remove`: take tokens away from a member
pub async fn remove(ctx: &Context<'_>, member: &Member, amount: i64) -> Result<Reply> {
    if amount <= 0 {
        return Err(AppError::InvalidInput(ERR_AMOUNT_POSITIVE.to_string()));
    }
    let amount = clamp_amount(amount);
    let state = ctx.state;

    let remaining = {
        let _guard = state.ledger.lock().await;
        let mut table = state.ledger.load().await;
        let remaining = table.remove(&ctx.guild.id, &member.id, amount)?;
        if !state.ledger.save(&table).await {
            return Err(AppError::Persistence(ERR_SAVE_FAILED.to_string()));
        }
        remaining
    };

    state
        .audit
        .append(
            &ctx.guild.name,
            ActionTag::RemoveTokens,
            Some(ctx.caller),
            Some(member),
            Some(amount.to_string()),
        )
        .await;

    Ok(Reply::public(format!(
        "Successfully removed {} from {}. They now have {} remaining.",
        tokens(amount),
        member.mention(),
        tokens(remaining)
    )))
}

/// `/deposit`: move the caller's own tokens into the bank
pub async fn deposit(ctx: &Context<'_>, amount: i64) -> Result<Reply> {
    if amount <= 0 {
        return Err(AppError::InvalidInput(ERR_DEPOSIT_POSITIVE.to_string()));
    }
    let amount = clamp_amount(amount);
    let state = ctx.state;

    let remaining = {
        let _guard = state.ledger.lock().await;
        let mut table = state.ledger.load().await;
        let remaining = table.deposit(&ctx.guild.id, &ctx.caller.id, amount)?;
        if !state.ledger.save(&table).await {
            return Err(AppError::Persistence(ERR_SAVE_FAILED.to_string()));
        }
        remaining
    };

    state
        .audit
        .append(
            &ctx.guild.name,
            ActionTag::DepositTokens,
            None,
            Some(ctx.caller),
            Some(amount.to_string()),
        )
        .await;

    Ok(Reply::public(format!(
        "{} has deposited {} into the bank. They now have {} remaining.",
        ctx.caller.mention(),
        tokens(amount),
        tokens(remaining)
    )))
}

/// `/reset_all_tokens`: clear every balance in the caller's guild
pub async fn reset_all(ctx: &Context<'_>) -> Result<Reply> {
    let state = ctx.state;

    let outcome = {
        let _guard = state.ledger.lock().await;
        let mut table = state.ledger.load().await;
        if table.holders(&ctx.guild.id).is_empty() {
            return Ok(Reply::ephemeral("No tokens to reset."));
        }
        let outcome = table.reset_guild(&ctx.guild.id);
        if !state.ledger.save(&table).await {
            return Err(AppError::Persistence(ERR_SAVE_FAILED.to_string()));
        }
        outcome
    };

    state
        .audit
        .append(
            &ctx.guild.name,
            ActionTag::ResetAllTokens,
            None,
            Some(ctx.caller),
            Some(outcome.total_removed.to_string()),
        )
        .await;

    tracing::warn!(
        "All tokens reset in {} by {}: {} tokens from {} users",
        ctx.guild.id,
        ctx.caller.id,
        outcome.total_removed,
        outcome.users_affected
    );

    Ok(Reply::ephemeral(format!(
        "All tokens have been reset.\nTotal tokens removed: {}\nNumber of users affected: {}",
        outcome.total_removed, outcome.users_affected
    )))
}

/// A member left the guild: drop their balance.
/// Returns how many tokens they held.
pub async fn member_left(state: &AppState, event: &MemberRemoveEvent) -> Result<u32> {
    let removed = {
        let _guard = state.ledger.lock().await;
        let mut table = state.ledger.load().await;
        let Some(removed) = table.remove_member(&event.guild.id, &event.member.id) else {
            return Ok(0);
        };
        if !state.ledger.save(&table).await {
            return Err(AppError::Persistence(ERR_SAVE_FAILED.to_string()));
        }
        removed
    };

    state
        .audit
        .append_entry(
            LogEntry::now(&event.guild.name, ActionTag::AutoRemoveLeftMember)
                .with_member(&event.member)
                .with_amount(removed),
        )
        .await;

    tracing::info!(
        "Automatically removed {} tokens from {} who left {}",
        removed,
        event.member.name,
        event.guild.name
    );

    Ok(removed)
}
