#![allow(dead_code)]

extern crate std;

use soroban_sdk::Address;

use crate::types::{Round, RoundStatus};
use crate::IssuanceRoundClient;

/// INV-1: the outstanding total equals the sum of every ledger entry.
///
/// `investors` must list every address that ever invested.
pub fn assert_ledger_matches_outstanding(client: &IssuanceRoundClient, investors: &[Address]) {
    let sum: i128 = investors.iter().map(|i| client.investment_of(i)).sum();
    assert_eq!(
        sum,
        client.outstanding(),
        "INV-1 violated: ledger sum {} != outstanding {}",
        sum,
        client.outstanding()
    );
    for investor in investors {
        assert!(
            client.investment_of(investor) >= 0,
            "INV-1 violated: negative ledger entry"
        );
    }
}

/// INV-2: totals are non-negative and ordered.
///
/// Claims only shrink `outstanding`, sweeps only grow `withdrawn`, so both
/// stay bounded by `total_raised`.
pub fn assert_totals_bounded(round: &Round) {
    assert!(round.outstanding >= 0, "INV-2 violated: negative outstanding");
    assert!(
        round.outstanding <= round.total_raised,
        "INV-2 violated: outstanding {} > total_raised {}",
        round.outstanding,
        round.total_raised
    );
    assert!(
        round.withdrawn >= 0 && round.withdrawn <= round.total_raised,
        "INV-2 violated: withdrawn {} outside [0, {}]",
        round.withdrawn,
        round.total_raised
    );
}

/// INV-3: only a live round has ever been swept.
pub fn assert_withdrawn_only_when_live(round: &Round) {
    if round.withdrawn > 0 {
        assert_eq!(
            round.status,
            RoundStatus::Live,
            "INV-3 violated: funds withdrawn while {:?}",
            round.status
        );
    }
}

/// INV-4: once past `Init`, the round has a usable price.
pub fn assert_price_configured(round: &Round) {
    if round.status != RoundStatus::Init {
        assert_ne!(round.issue_price, 0, "INV-4 violated: zero issue price");
    }
}

/// INV-5: a fully configured window is non-empty.
pub fn assert_window_ordered(round: &Round) {
    if round.opening_date != 0 && round.closing_date != 0 {
        assert!(
            round.opening_date < round.closing_date,
            "INV-5 violated: opening {} >= closing {}",
            round.opening_date,
            round.closing_date
        );
    }
}

/// INV-6: only forward transitions are allowed:
///   Init -> Open
///   Open -> Live | Failed
///   Live -> Failed
///   Failed -> (none)
pub fn assert_valid_status_transition(from: RoundStatus, to: RoundStatus) {
    assert!(
        from.can_transition_to(to),
        "INV-6 violated: invalid status transition from {:?} to {:?}",
        from,
        to
    );
}

/// INV-7: nothing is created or destroyed. Everything pulled from investors
/// is either still held, refunded, or swept.
pub fn assert_conservation(pulled: i128, held: i128, refunded: i128, swept: i128) {
    assert_eq!(
        pulled,
        held + refunded + swept,
        "INV-7 violated: pulled {} != held {} + refunded {} + swept {}",
        pulled,
        held,
        refunded,
        swept
    );
}

/// Run all stateless round invariants.
pub fn assert_round_invariants(round: &Round) {
    assert_totals_bounded(round);
    assert_withdrawn_only_when_live(round);
    assert_price_configured(round);
    assert_window_ordered(round);
}

#[test]
fn test_forward_transitions_only() {
    use RoundStatus::*;

    assert_valid_status_transition(Init, Open);
    assert_valid_status_transition(Open, Live);
    assert_valid_status_transition(Open, Failed);
    assert_valid_status_transition(Live, Failed);

    for (from, to) in [
        (Open, Init),
        (Live, Open),
        (Failed, Open),
        (Failed, Live),
        (Init, Live),
        (Init, Failed),
        (Failed, Failed),
    ] {
        assert!(!from.can_transition_to(to), "{:?} -> {:?}", from, to);
    }
}
