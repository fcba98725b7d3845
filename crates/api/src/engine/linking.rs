//! Guardian/minor link registry.

use serde::Serialize;
use sqlx::PgConnection;
use tourdesk_core::error::CoreError;
use tourdesk_core::link::{
    normalize_email, plan_link_request, LinkPlan, LinkRequestOutcome, LinkStatus,
};
use tourdesk_core::roles::Role;
use tourdesk_core::types::DbId;
use tourdesk_db::models::account::{Account, CreateAccount};
use tourdesk_db::models::link::{AccountLink, CreateLink};
use tourdesk_db::repositories::{AccountRepo, LinkRepo};
use tourdesk_events::Notification;

use crate::auth::jwt::{generate_invitation_token, token_fingerprint, InvitationClaims};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Most addresses accepted by one link request.
pub const MAX_LINK_EMAILS: usize = 10;

#[derive(Debug, Serialize)]
pub struct LinkRequestResult {
    pub email: String,
    pub outcome: LinkRequestOutcome,
    pub link: AccountLink,
}

/// Link `initiator` with the accounts registered under `emails`, or invite
/// addresses that have no account yet.
///
/// Every address is normalized and planned before anything is written, so a
/// bad address or a same-role account rejects the whole request. Addresses
/// are then handled in the order given; duplicates are handled once.
pub async fn request_links(
    state: &AppState,
    initiator: &Account,
    emails: &[String],
) -> AppResult<Vec<LinkRequestResult>> {
    let role = initiator.role()?;

    let mut normalized: Vec<String> = Vec::with_capacity(emails.len());
    for raw in emails {
        let email = normalize_email(raw)?;
        if !normalized.contains(&email) {
            normalized.push(email);
        }
    }
    if normalized.is_empty() {
        return Err(CoreError::Validation("Enter at least one email address".into()).into());
    }
    if normalized.len() > MAX_LINK_EMAILS {
        return Err(CoreError::Validation(format!(
            "At most {MAX_LINK_EMAILS} email addresses can be linked at once"
        ))
        .into());
    }

    let mut plans = Vec::with_capacity(normalized.len());
    for email in normalized {
        let counterpart = AccountRepo::find_by_email(&state.pool, &email).await?;
        let counterpart_key = counterpart
            .as_ref()
            .map(|a| a.role().map(|r| (a.id, r)))
            .transpose()?;
        let plan = plan_link_request(initiator.id, role, &email, counterpart_key)?;
        plans.push((email, plan));
    }

    let mut results = Vec::with_capacity(plans.len());
    for (email, plan) in plans {
        let result = match plan {
            LinkPlan::LinkExisting { counterpart_id } => {
                link_existing(state, initiator, role, email, counterpart_id).await?
            }
            LinkPlan::Invite => invite(state, initiator, role, email).await?,
        };
        results.push(result);
    }
    Ok(results)
}

/// Store a pending link to an existing account. A pair that is already
/// linked, including by a concurrent request, is reported as such and
/// nothing is written.
async fn link_existing(
    state: &AppState,
    initiator: &Account,
    role: Role,
    email: String,
    counterpart_id: DbId,
) -> AppResult<LinkRequestResult> {
    let (minor_id, guardian_id) = match role {
        Role::Guardian => (counterpart_id, initiator.id),
        _ => (initiator.id, counterpart_id),
    };
    let (minor_email, guardian_email) = match role {
        Role::Guardian => (email.clone(), initiator.email.clone()),
        _ => (initiator.email.clone(), email.clone()),
    };

    let created = LinkRepo::create_if_absent(
        &state.pool,
        &CreateLink {
            minor_id: Some(minor_id),
            guardian_id: Some(guardian_id),
            minor_email: Some(minor_email),
            guardian_email: Some(guardian_email),
            status: LinkStatus::Pending,
            initiated_by: initiator.id,
        },
    )
    .await?;

    let Some(link) = created else {
        let link = LinkRepo::find_pair(&state.pool, minor_id, guardian_id)
            .await?
            .ok_or_else(|| {
                AppError::InternalError("Link insert conflicted but no pair was found".into())
            })?;
        tracing::debug!(link_id = link.id, "Link request for an already linked pair");
        return Ok(LinkRequestResult {
            email,
            outcome: LinkRequestOutcome::AlreadyLinked,
            link,
        });
    };

    state
        .notifier
        .dispatch(Notification::link_request(&email, &initiator.name));

    tracing::info!(
        link_id = link.id,
        initiator_id = initiator.id,
        counterpart_id,
        "Link created, awaiting approval"
    );

    Ok(LinkRequestResult {
        email,
        outcome: LinkRequestOutcome::Linked,
        link,
    })
}

/// Invite an address with no account. An open invitation from the same
/// initiator is reused and sent again with a fresh token.
async fn invite(
    state: &AppState,
    initiator: &Account,
    role: Role,
    email: String,
) -> AppResult<LinkRequestResult> {
    let link = match LinkRepo::create_if_absent(&state.pool, &invitation_link(initiator, role, &email))
        .await?
    {
        Some(created) => created,
        None => LinkRepo::find_open_invitation(&state.pool, role, initiator.id, &email)
            .await?
            .ok_or_else(|| {
                AppError::InternalError("Invitation insert conflicted but none was found".into())
            })?,
    };

    send_invitation(state, initiator, role, &email)?;

    tracing::info!(
        link_id = link.id,
        initiator_id = initiator.id,
        "Invitation sent to unregistered counterpart"
    );

    Ok(LinkRequestResult {
        email,
        outcome: LinkRequestOutcome::Invited,
        link,
    })
}

/// A link with the initiator's side resolved and the other side waiting on
/// an email.
fn invitation_link(initiator: &Account, role: Role, email: &str) -> CreateLink {
    let (minor_id, guardian_id, minor_email, guardian_email) = match role {
        Role::Guardian => (None, Some(initiator.id), email, initiator.email.as_str()),
        _ => (Some(initiator.id), None, initiator.email.as_str(), email),
    };
    CreateLink {
        minor_id,
        guardian_id,
        minor_email: Some(minor_email.to_string()),
        guardian_email: Some(guardian_email.to_string()),
        status: LinkStatus::Pending,
        initiated_by: initiator.id,
    }
}

fn send_invitation(state: &AppState, initiator: &Account, role: Role, email: &str) -> AppResult<()> {
    let jwt = &state.config.jwt;
    let token = generate_invitation_token(initiator.id, role, email, jwt)
        .map_err(|e| AppError::InternalError(format!("Failed to sign invitation: {e}")))?;
    let accept_url = format!("{}/signup?invite={token}", state.config.public_base_url);

    tracing::debug!(token = %token_fingerprint(&token), "Invitation token issued");

    state.notifier.dispatch(Notification::link_invitation(
        email,
        &initiator.name,
        role,
        &accept_url,
        jwt.invitation_expiry_hours,
    ));
    Ok(())
}

/// Create an account and attach it to every link waiting on its email, in
/// one transaction. Either both happen or neither does.
///
/// When the account signed up through an invitation addressed to it, the
/// inviter's link is approved as well.
pub async fn register_account(
    state: &AppState,
    input: &CreateAccount,
    invitation: Option<&InvitationClaims>,
) -> AppResult<(Account, Vec<AccountLink>)> {
    let mut tx = state.pool.begin().await?;
    let account = AccountRepo::insert(&mut tx, input).await?;
    let links = resolve_pending_links(&mut tx, &account, invitation).await?;
    tx.commit().await?;

    if !links.is_empty() {
        tracing::info!(
            account_id = account.id,
            resolved = links.len(),
            "Resolved pending links for new account"
        );
    }
    Ok((account, links))
}

/// Resolve the new account's side on each waiting link.
pub async fn resolve_pending_links(
    conn: &mut PgConnection,
    account: &Account,
    invitation: Option<&InvitationClaims>,
) -> AppResult<Vec<AccountLink>> {
    let role = account.role()?;
    let approved_by = invitation
        .filter(|claims| claims.email == account.email)
        .map(|claims| claims.inviter_id);

    let mut resolved = Vec::new();
    for link in LinkRepo::lock_awaiting(&mut *conn, role, &account.email).await? {
        let mut record = link.to_record()?;
        if !record.resolve(role, &account.email, account.id) {
            continue;
        }
        if approved_by == Some(link.initiated_by) {
            record.status = LinkStatus::Approved;
        }
        resolved.push(LinkRepo::store_record(&mut *conn, &record).await?);
    }
    Ok(resolved)
}

/// Approve a pending link as its non-initiating party.
pub async fn approve_link(
    state: &AppState,
    link_id: DbId,
    approver_id: DbId,
) -> AppResult<AccountLink> {
    if let Some(link) = LinkRepo::approve(&state.pool, link_id, approver_id).await? {
        tracing::info!(link_id, approver_id, "Link approved");
        return Ok(link);
    }

    // Work out why nothing was updated.
    let link = LinkRepo::find_by_id(&state.pool, link_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "AccountLink",
            id: link_id,
        })?;
    let record = link.to_record()?;
    let is_party = [record.minor.account_id(), record.guardian.account_id()]
        .contains(&Some(approver_id));

    let err = if !is_party {
        CoreError::NotFound {
            entity: "AccountLink",
            id: link_id,
        }
    } else if record.status == LinkStatus::Approved {
        CoreError::Conflict("This link is already approved".into())
    } else {
        CoreError::Forbidden("Only the invited account can approve this link".into())
    };
    Err(err.into())
}
