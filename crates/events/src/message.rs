//! Notification messages.

use serde::Serialize;
use tourdesk_core::roles::Role;

/// A plain-text message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Short machine-readable kind, e.g. `"link.invitation"`.
    pub kind: &'static str,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Invite someone without an account to sign up and join a link.
    pub fn link_invitation(
        to: &str,
        inviter_name: &str,
        inviter_role: Role,
        accept_url: &str,
        ttl_hours: i64,
    ) -> Self {
        let relation = match inviter_role {
            Role::Guardian => "your parent or guardian",
            _ => "a student",
        };
        Self {
            kind: "link.invitation",
            to: to.to_string(),
            subject: format!("{inviter_name} invited you to link accounts"),
            body: format!(
                "{inviter_name} ({relation}) would like to link accounts with you so tour \
                 reservations can be managed together.\n\n\
                 Create your account using this link:\n{accept_url}\n\n\
                 The link expires in {ttl_hours} hours."
            ),
        }
    }

    /// Tell an existing account that a link is waiting for approval.
    pub fn link_request(to: &str, requester_name: &str) -> Self {
        Self {
            kind: "link.request",
            to: to.to_string(),
            subject: format!("{requester_name} wants to link accounts"),
            body: format!(
                "{requester_name} has asked to link accounts with you. Sign in and open \
                 your linked accounts to review the request."
            ),
        }
    }

    /// Summary of a reservation batch.
    pub fn reservation_receipt(
        to: &str,
        tour_title: &str,
        confirmed: &[String],
        waitlisted: &[String],
    ) -> Self {
        let mut body = format!("Your reservation request for \"{tour_title}\" was received.\n");
        if !confirmed.is_empty() {
            body.push_str(&format!("\nSeat confirmed: {}\n", confirmed.join(", ")));
        }
        if !waitlisted.is_empty() {
            body.push_str(&format!("\nWaitlisted: {}\n", waitlisted.join(", ")));
        }
        body.push_str("\nItems stay in your cart until you check out.");
        Self {
            kind: "reservation.receipt",
            to: to.to_string(),
            subject: format!("Reservation received: {tour_title}"),
            body,
        }
    }
}
