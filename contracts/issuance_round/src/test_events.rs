extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec, Address, IntoVal, TryIntoVal, Val, Vec,
};

use crate::events::{
    AdminTransferred, FundsWithdrawn, InvestmentAdded, InvestmentCancelled, StatusChanged,
    TokensClaimed,
};
use crate::test::{setup, Setup, UNIT};
use crate::RoundStatus;

/// Last event published by the round itself, skipping token contract events.
fn last_round_event(s: &Setup) -> (Vec<Val>, Val) {
    let event = s
        .env
        .events()
        .all()
        .iter()
        .filter(|e| e.0 == s.client.address)
        .last()
        .expect("No round events found");
    (event.1, event.2)
}

#[test]
fn test_investment_added_event() {
    let s = setup();
    s.fund(&s.investor1, 100 * UNIT);
    s.open_at_price(5);

    s.client.invest(&s.investor1, &(50 * UNIT));

    let (topics, data) = last_round_event(&s);
    let expected_topics = vec![
        &s.env,
        symbol_short!("invested").into_val(&s.env),
        s.investor1.into_val(&s.env),
    ];
    assert_eq!(topics, expected_topics);

    let event_data: InvestmentAdded = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        event_data,
        InvestmentAdded {
            investor: s.investor1.clone(),
            amount: 50 * UNIT,
        }
    );
}

#[test]
fn test_investment_cancelled_event_carries_cumulative_amount() {
    let s = setup();
    s.fund(&s.investor1, 100 * UNIT);
    s.open_at_price(5);
    s.client.invest(&s.investor1, &(50 * UNIT));
    s.client.invest(&s.investor1, &(10 * UNIT));

    s.client.cancel_investment(&s.investor1);

    let (topics, data) = last_round_event(&s);
    let expected_topics = vec![
        &s.env,
        symbol_short!("cancelled").into_val(&s.env),
        s.investor1.into_val(&s.env),
    ];
    assert_eq!(topics, expected_topics);

    let event_data: InvestmentCancelled = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        event_data,
        InvestmentCancelled {
            investor: s.investor1.clone(),
            amount: 60 * UNIT,
        }
    );
}

#[test]
fn test_tokens_claimed_event() {
    let s = setup();
    s.open_at_price(-5);
    s.invest_both();
    s.close_window();
    s.client.start_distribution(&s.admin);

    s.client.claim(&s.investor2);

    let (topics, data) = last_round_event(&s);
    let expected_topics = vec![
        &s.env,
        symbol_short!("claimed").into_val(&s.env),
        s.investor2.into_val(&s.env),
    ];
    assert_eq!(topics, expected_topics);

    let event_data: TokensClaimed = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        event_data,
        TokensClaimed {
            investor: s.investor2.clone(),
            invested: 10 * UNIT,
            issued: 50 * UNIT,
        }
    );
}

#[test]
fn test_status_changed_events() {
    let s = setup();
    s.client.set_issue_price(&s.admin, &5);

    s.client.open_issuance(&s.admin);
    let (topics, data) = last_round_event(&s);
    assert_eq!(topics, vec![&s.env, symbol_short!("status").into_val(&s.env)]);
    let event_data: StatusChanged = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        event_data,
        StatusChanged {
            from: RoundStatus::Init,
            to: RoundStatus::Open,
        }
    );

    s.client.cancel_all_investments(&s.admin);
    let (_, data) = last_round_event(&s);
    let event_data: StatusChanged = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        event_data,
        StatusChanged {
            from: RoundStatus::Open,
            to: RoundStatus::Failed,
        }
    );
}

#[test]
fn test_funds_withdrawn_event() {
    let s = setup();
    s.open_at_price(5);
    s.invest_both();
    s.close_window();
    s.client.start_distribution(&s.admin);

    s.client.withdraw(&s.admin, &s.wallet);

    let (topics, data) = last_round_event(&s);
    assert_eq!(
        topics,
        vec![&s.env, symbol_short!("withdrawn").into_val(&s.env)]
    );
    let event_data: FundsWithdrawn = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        event_data,
        FundsWithdrawn {
            destination: s.wallet.clone(),
            amount: 60 * UNIT,
        }
    );
}

#[test]
fn test_config_events() {
    let s = setup();

    s.client.set_issue_price(&s.admin, &-5);
    let (topics, data) = last_round_event(&s);
    assert_eq!(
        topics,
        vec![
            &s.env,
            symbol_short!("config").into_val(&s.env),
            symbol_short!("price").into_val(&s.env),
        ]
    );
    let value: i128 = data.try_into_val(&s.env).unwrap();
    assert_eq!(value, -5);

    s.client.set_closing_date(&s.admin, &2_000_000_000);
    let (topics, data) = last_round_event(&s);
    assert_eq!(
        topics,
        vec![
            &s.env,
            symbol_short!("config").into_val(&s.env),
            symbol_short!("closes").into_val(&s.env),
        ]
    );
    let value: u64 = data.try_into_val(&s.env).unwrap();
    assert_eq!(value, 2_000_000_000);
}

#[test]
fn test_admin_transferred_event() {
    let s = setup();
    let new_admin = Address::generate(&s.env);

    s.client.transfer_admin(&s.admin, &new_admin);

    let (topics, data) = last_round_event(&s);
    assert_eq!(
        topics,
        vec![&s.env, symbol_short!("admin_set").into_val(&s.env)]
    );
    let event_data: AdminTransferred = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        event_data,
        AdminTransferred {
            previous: s.admin.clone(),
            admin: new_admin,
        }
    );
}

#[test]
fn test_rejected_operation_publishes_nothing() {
    let s = setup();
    s.fund(&s.investor1, 100 * UNIT);
    s.open_at_price(5);

    assert!(s.client.try_invest(&s.investor1, &(UNIT + 1)).is_err());

    let rejected = s
        .env
        .events()
        .all()
        .iter()
        .filter(|e| e.0 == s.client.address)
        .filter_map(|e| TryIntoVal::<_, InvestmentAdded>::try_into_val(&e.2, &s.env).ok())
        .any(|added| added.amount == UNIT + 1);
    assert!(!rejected);
    assert_eq!(s.client.investment_of(&s.investor1), 0);
}
