// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod common;

use alloy_primitives::U256;
use anyhow::Result;
use common::Harness;
use lottery_chain::LotteryCall;
use lottery_protocol::{ProtocolError, Stage};
use lottery_test_helpers::{
    test_tracing, DEFAULT_PRIZE_AMOUNT, DEFAULT_TICKET_PRICE, SEPOLIA_CHAIN_ID,
};

async fn play_number(harness: &Harness, number: u8) -> Result<()> {
    let protocol = &harness.protocol;
    assert_eq!(
        protocol.connect_wallet().await?,
        Stage::AwaitingContractReady
    );
    assert_eq!(protocol.init_contract().await?, Stage::AwaitingSelection);
    assert_eq!(protocol.select_number(number)?, Stage::Encrypting);
    assert_eq!(protocol.encrypt_number().await?, Stage::Submitting);
    assert_eq!(protocol.submit_ticket().await?, Stage::RoundBound);
    assert_eq!(protocol.bind_round().await?, Stage::AwaitingDraw);
    assert_eq!(protocol.draw().await?, Stage::AwaitingComparison);
    assert_eq!(protocol.check_winner().await?, Stage::AwaitingDecryptTrigger);
    assert_eq!(protocol.fetch_round().await?, Stage::Decrypting);
    assert_eq!(protocol.decrypt_result().await?, Stage::ResultReady);
    assert_eq!(protocol.begin_settlement()?, Stage::Settling);
    assert_eq!(protocol.settle().await?, Stage::Completed);
    Ok(())
}

#[tokio::test]
async fn test_matching_number_wins_the_prize() -> Result<()> {
    let _log = test_tracing("info");
    let harness = Harness::new();
    harness.chain.set_winning_number(5);
    let start_balance = harness.chain.balance_of_player();

    play_number(&harness, 5).await?;

    let snapshot = harness.protocol.snapshot();
    let session = &snapshot.session;
    assert_eq!(session.chain_id, Some(SEPOLIA_CHAIN_ID));
    assert_eq!(session.account, Some(harness.chain.account()));
    assert_eq!(session.round_id, Some(U256::ZERO));
    assert_eq!(session.winning_number, Some(5));
    assert_eq!(session.is_winner, Some(true));
    assert!(snapshot.error().is_none());
    assert!(!snapshot.busy);

    let calls = harness.chain.calls();
    assert!(matches!(
        calls.first(),
        Some(LotteryCall::BuyTicket { value, .. }) if *value == U256::from(DEFAULT_TICKET_PRICE)
    ));
    assert_eq!(
        calls.last(),
        Some(&LotteryCall::SettleLottery {
            round_id: U256::ZERO,
            is_winner: true
        })
    );
    assert_eq!(
        harness.chain.balance_of_player(),
        start_balance - U256::from(DEFAULT_TICKET_PRICE) + U256::from(DEFAULT_PRIZE_AMOUNT)
    );
    Ok(())
}

#[tokio::test]
async fn test_other_number_settles_without_prize() -> Result<()> {
    let harness = Harness::new();
    harness.chain.set_winning_number(3);
    let start_balance = harness.chain.balance_of_player();

    play_number(&harness, 5).await?;

    let session = harness.protocol.snapshot().session;
    assert_eq!(session.winning_number, Some(3));
    assert_eq!(session.is_winner, Some(false));
    assert_eq!(
        harness.chain.calls().last(),
        Some(&LotteryCall::SettleLottery {
            round_id: U256::ZERO,
            is_winner: false
        })
    );
    assert_eq!(
        harness.chain.balance_of_player(),
        start_balance - U256::from(DEFAULT_TICKET_PRICE)
    );
    Ok(())
}

#[tokio::test]
async fn test_wrong_network_switches_then_reconnects_once() -> Result<()> {
    let harness = Harness::with(|chain| chain.with_wallet_on(1, false), |relayer| relayer);
    let protocol = &harness.protocol;

    assert_eq!(
        protocol.connect_wallet().await,
        Err(ProtocolError::WrongNetwork {
            expected: SEPOLIA_CHAIN_ID,
            actual: 1
        })
    );
    let snapshot = protocol.snapshot();
    assert_eq!(snapshot.stage(), Stage::AwaitingWallet);
    assert!(snapshot.session.network_switch_requested);
    assert!(snapshot.session.account.is_none());
    assert_eq!(harness.chain.connects(), 1);

    // The driver picks the switch action while a switch is requested
    assert_eq!(protocol.advance().await?, Stage::AwaitingContractReady);
    assert_eq!(harness.chain.switches(), 1);
    assert_eq!(harness.chain.connects(), 2);
    assert_eq!(harness.chain.wallet_chain(), SEPOLIA_CHAIN_ID);

    let session = protocol.snapshot().session;
    assert!(!session.network_switch_requested);
    assert_eq!(session.chain_id, Some(SEPOLIA_CHAIN_ID));
    assert!(session.error.is_none());
    Ok(())
}

#[tokio::test]
async fn test_switch_requires_a_wrong_network_first() -> Result<()> {
    let harness = Harness::new();
    assert!(matches!(
        harness.protocol.switch_network().await,
        Err(ProtocolError::InvalidStageTransition {
            action: "switch_network",
            actual: Stage::AwaitingWallet
        })
    ));
    assert_eq!(harness.chain.switches(), 0);
    assert_eq!(harness.chain.connects(), 0);
    Ok(())
}

#[tokio::test]
async fn test_reverted_purchase_rewinds_to_selection() -> Result<()> {
    let harness = Harness::new();
    harness.select(4).await?;
    harness.protocol.encrypt_number().await?;

    // A stale price quote makes the contract reject the payment
    harness
        .chain
        .quote_price(U256::from(DEFAULT_TICKET_PRICE - 1));
    let result = harness.protocol.submit_ticket().await;
    assert!(matches!(result, Err(ProtocolError::TransactionReverted(_))));

    let snapshot = harness.protocol.snapshot();
    assert_eq!(snapshot.stage(), Stage::AwaitingSelection);
    assert!(matches!(
        snapshot.error(),
        Some(ProtocolError::TransactionReverted(_))
    ));
    assert!(snapshot.session.round_id.is_none());
    assert!(snapshot.session.encrypted_input.is_none());
    assert!(!snapshot.busy);
    assert_eq!(harness.chain.round_count(), 0);

    // Retry with another number once the price is right
    harness.chain.quote_price(U256::from(DEFAULT_TICKET_PRICE));
    assert_eq!(harness.protocol.select_number(7)?, Stage::Encrypting);
    harness.protocol.encrypt_number().await?;
    assert_eq!(harness.protocol.submit_ticket().await?, Stage::RoundBound);
    assert_eq!(harness.chain.round_count(), 1);
    assert!(harness.protocol.snapshot().error().is_none());
    Ok(())
}

#[tokio::test]
async fn test_declined_purchase_rewinds_to_selection() -> Result<()> {
    let harness = Harness::new();
    harness.select(2).await?;
    harness.protocol.encrypt_number().await?;
    harness.chain.reject_next_transaction();

    assert_eq!(
        harness.protocol.submit_ticket().await,
        Err(ProtocolError::TransactionRejected)
    );
    assert_eq!(harness.protocol.stage(), Stage::AwaitingSelection);
    assert!(harness.chain.calls().is_empty());
    Ok(())
}
