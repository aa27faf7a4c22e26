//! Read models folded from stored events.
//!
//! The fold applies the round's own accounting: a deposit raises both the
//! raised total and the outstanding total, a cancellation lowers both, a
//! claim lowers only the outstanding total and a sweep is tracked apart.

#[cfg(test)]
use std::collections::BTreeSet;

use serde::Serialize;
use tracing::warn;

use crate::events::{EventKind, EventRecord, RoundEvent};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvestorPosition {
    pub address: String,
    /// Sum of every deposit, including ones later cancelled.
    pub deposited: i128,
    pub cancelled: i128,
    /// Deposits converted by claims.
    pub claimed: i128,
    /// Issuance tokens received.
    pub issued: i128,
    /// Deposit currently held by the round.
    pub outstanding: i128,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    /// Latest status seen in a `status_changed` event, `None` before opening.
    pub status: Option<String>,
    pub total_raised: i128,
    pub outstanding: i128,
    pub withdrawn: i128,
    /// Distinct addresses that ever deposited.
    pub investors: usize,
    pub last_ledger: i64,
}

fn amount(value: Option<&str>) -> i128 {
    match value.map(str::parse::<i128>) {
        Some(Ok(n)) => n,
        Some(Err(_)) => {
            warn!("unparsable stored amount {value:?}");
            0
        }
        None => 0,
    }
}

/// Position of `address`, or `None` when it never touched the round.
pub fn investor_position(address: &str, events: &[EventRecord]) -> Option<InvestorPosition> {
    let mut position = InvestorPosition {
        address: address.to_string(),
        ..InvestorPosition::default()
    };
    let mut seen = false;

    for ev in events.iter().filter(|e| e.actor.as_deref() == Some(address)) {
        match ev.kind() {
            EventKind::InvestmentAdded => {
                let n = amount(ev.amount.as_deref());
                position.deposited += n;
                position.outstanding += n;
            }
            EventKind::InvestmentCancelled => {
                let n = amount(ev.amount.as_deref());
                position.cancelled += n;
                position.outstanding -= n;
            }
            EventKind::TokensClaimed => {
                let n = amount(ev.amount.as_deref());
                position.claimed += n;
                position.issued += amount(ev.issued.as_deref());
                position.outstanding -= n;
            }
            _ => continue,
        }
        seen = true;
    }

    seen.then_some(position)
}

impl RoundSummary {
    /// Fold one newly stored event into the totals.
    ///
    /// Investor counting needs the set of known depositors, so callers bump
    /// `investors` themselves.
    pub fn apply(&mut self, event: &RoundEvent) {
        self.last_ledger = self.last_ledger.max(event.ledger);
        let n = amount(event.amount.as_deref());
        match event.kind() {
            EventKind::InvestmentAdded => {
                self.total_raised += n;
                self.outstanding += n;
            }
            EventKind::InvestmentCancelled => {
                self.total_raised -= n;
                self.outstanding -= n;
            }
            EventKind::TokensClaimed => self.outstanding -= n,
            EventKind::FundsWithdrawn => self.withdrawn += n,
            EventKind::StatusChanged => {
                if let Some((_, to)) = event.detail.as_deref().and_then(|d| d.split_once("->")) {
                    self.status = Some(to.to_string());
                }
            }
            EventKind::ConfigUpdated | EventKind::AdminTransferred | EventKind::Unknown => {}
        }
    }
}

/// Summary of a whole history at once; the stored summary kept by
/// `db::insert_events` must always equal this.
#[cfg(test)]
pub fn round_summary(events: &[RoundEvent]) -> RoundSummary {
    let mut summary = RoundSummary::default();
    let mut investors = BTreeSet::new();

    for ev in events {
        summary.apply(ev);
        if let (EventKind::InvestmentAdded, Some(actor)) = (ev.kind(), &ev.actor) {
            investors.insert(actor.clone());
        }
    }

    summary.investors = investors.len();
    summary
}
