// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod common;

use alloy_primitives::{Address, U256};
use anyhow::Result;
use common::Harness;
use lottery_protocol::{ProtocolError, Stage};
use strum::IntoEnumIterator;

#[tokio::test]
async fn test_every_number_in_range_can_be_submitted() -> Result<()> {
    for number in 1..=9u8 {
        let harness = Harness::new();
        harness.select(number).await?;
        assert_eq!(harness.protocol.encrypt_number().await?, Stage::Submitting);
        assert_eq!(harness.protocol.submit_ticket().await?, Stage::RoundBound);
        assert_eq!(harness.protocol.snapshot().session.chosen_number, number);
    }
    Ok(())
}

#[tokio::test]
async fn test_out_of_range_number_is_refused() -> Result<()> {
    let harness = Harness::new();
    harness.advance_to(Stage::AwaitingSelection).await?;

    for number in [0u8, 10, 255] {
        assert_eq!(
            harness.protocol.select_number(number),
            Err(ProtocolError::NumberOutOfRange {
                number,
                min: 1,
                max: 9
            })
        );
        assert_eq!(harness.protocol.stage(), Stage::AwaitingSelection);
    }
    assert_eq!(harness.relayer.encryptions(), 0);
    Ok(())
}

/// Call the action of `stage` on a session sitting somewhere else
async fn call_action(harness: &Harness, stage: Stage) -> Result<Stage, ProtocolError> {
    let protocol = &harness.protocol;
    match stage {
        Stage::AwaitingWallet => protocol.connect_wallet().await,
        Stage::AwaitingContractReady => protocol.init_contract().await,
        Stage::AwaitingSelection => protocol.select_number(3),
        Stage::Encrypting => protocol.encrypt_number().await,
        Stage::Submitting => protocol.submit_ticket().await,
        Stage::RoundBound => protocol.bind_round().await,
        Stage::AwaitingDraw => protocol.draw().await,
        Stage::AwaitingComparison => protocol.check_winner().await,
        Stage::AwaitingDecryptTrigger => protocol.fetch_round().await,
        Stage::Decrypting => protocol.decrypt_result().await,
        Stage::ResultReady => protocol.begin_settlement(),
        Stage::Settling => protocol.settle().await,
        Stage::Completed => protocol.reset(),
    }
}

#[tokio::test]
async fn test_wrong_action_leaves_session_untouched() -> Result<()> {
    let harness = Harness::new();
    harness.advance_to(Stage::AwaitingComparison).await?;
    let before = harness.protocol.snapshot().session;

    for stage in Stage::iter().filter(|s| *s != Stage::AwaitingComparison) {
        let result = call_action(&harness, stage).await;
        assert_eq!(
            result,
            Err(ProtocolError::InvalidStageTransition {
                action: stage.action(),
                actual: Stage::AwaitingComparison
            })
        );

        let snapshot = harness.protocol.snapshot();
        assert!(!snapshot.busy);
        assert_eq!(snapshot.stage(), before.stage);
        assert_eq!(snapshot.session.round_id, before.round_id);
        assert_eq!(snapshot.session.winning_number, before.winning_number);
        assert_eq!(snapshot.session.is_winner, before.is_winner);
        assert!(matches!(
            snapshot.error(),
            Some(ProtocolError::InvalidStageTransition { .. })
        ));
    }

    // The matching action still works and clears the recorded error
    assert_eq!(
        harness.protocol.check_winner().await?,
        Stage::AwaitingDecryptTrigger
    );
    assert!(harness.protocol.snapshot().error().is_none());
    Ok(())
}

#[tokio::test]
async fn test_round_id_is_stable_until_reset() -> Result<()> {
    let harness = Harness::new();
    harness.advance_to(Stage::AwaitingDraw).await?;
    let round_id = harness.protocol.snapshot().session.round_id;
    assert_eq!(round_id, Some(U256::ZERO));

    for stage in [
        Stage::AwaitingComparison,
        Stage::AwaitingDecryptTrigger,
        Stage::Decrypting,
        Stage::ResultReady,
        Stage::Settling,
        Stage::Completed,
    ] {
        harness.advance_to(stage).await?;
        assert_eq!(harness.protocol.snapshot().session.round_id, round_id);
    }

    harness.protocol.reset()?;
    assert!(harness.protocol.snapshot().session.round_id.is_none());

    // The next ticket gets the next round
    harness.advance_to(Stage::AwaitingDraw).await?;
    assert_eq!(
        harness.protocol.snapshot().session.round_id,
        Some(U256::from(1u64))
    );
    Ok(())
}

#[tokio::test]
async fn test_reset_is_idempotent() -> Result<()> {
    let harness = Harness::new();
    harness.select(6).await?;
    harness.advance_to(Stage::Completed).await?;

    assert_eq!(harness.protocol.reset()?, Stage::AwaitingSelection);
    let once = harness.protocol.snapshot().session;
    assert_eq!(harness.protocol.reset()?, Stage::AwaitingSelection);
    let twice = harness.protocol.snapshot().session;

    assert_eq!(once, twice);
    assert_eq!(once.chosen_number, 1);
    assert!(once.round_id.is_none());
    assert!(once.winning_number.is_none());
    assert!(once.is_winner.is_none());
    assert!(once.error.is_none());
    assert_eq!(once.account, Some(harness.chain.account()));
    assert!(once.contract.is_some());
    Ok(())
}

#[tokio::test]
async fn test_reset_is_refused_mid_round() -> Result<()> {
    let harness = Harness::new();
    harness.advance_to(Stage::AwaitingDraw).await?;
    assert!(matches!(
        harness.protocol.reset(),
        Err(ProtocolError::InvalidStageTransition {
            action: "reset",
            actual: Stage::AwaitingDraw
        })
    ));
    assert!(harness.protocol.snapshot().session.round_id.is_some());
    Ok(())
}

#[tokio::test]
async fn test_not_ready_then_both_fields_together() -> Result<()> {
    let harness = Harness::new();
    harness.advance_to(Stage::Decrypting).await?;

    // The winning number resolves but the outcome is still computing
    harness.relayer.set_pending_after(1, 1);
    assert_eq!(
        harness.protocol.decrypt_result().await,
        Err(ProtocolError::DecryptionNotReady)
    );
    let snapshot = harness.protocol.snapshot();
    assert_eq!(snapshot.stage(), Stage::Decrypting);
    assert!(snapshot.session.winning_number.is_none());
    assert!(snapshot.session.is_winner.is_none());
    assert_eq!(snapshot.error(), Some(&ProtocolError::DecryptionNotReady));
    assert!(!snapshot.busy);

    assert_eq!(harness.protocol.decrypt_result().await?, Stage::ResultReady);
    let session = harness.protocol.snapshot().session;
    assert!(session.winning_number.is_some());
    assert!(session.is_winner.is_some());
    assert!(session.error.is_none());

    // One signature served every attempt
    assert_eq!(harness.chain.signatures(), 1);
    assert_eq!(harness.relayer.decryptions(), 4);
    Ok(())
}

#[tokio::test]
async fn test_denied_decryption_holds_stage() -> Result<()> {
    let harness = Harness::new();
    harness.advance_to(Stage::Decrypting).await?;
    harness.relayer.deny_decryption();

    assert!(matches!(
        harness.protocol.decrypt_result().await,
        Err(ProtocolError::DecryptionDenied(_))
    ));
    assert_eq!(harness.protocol.stage(), Stage::Decrypting);
    Ok(())
}

#[tokio::test]
async fn test_resume_round_from_an_earlier_session() -> Result<()> {
    let first = Harness::new();
    first.chain.set_winning_number(1);
    first.advance_to(Stage::AwaitingComparison).await?;

    let second = Harness::attach(first.chain.clone(), first.relayer.clone());
    second.advance_to(Stage::AwaitingSelection).await?;
    assert_eq!(
        second.protocol.resume_round(U256::ZERO).await?,
        Stage::AwaitingComparison
    );
    assert_eq!(second.protocol.snapshot().session.round_id, Some(U256::ZERO));

    second.advance_to(Stage::Completed).await?;
    let session = second.protocol.snapshot().session;
    assert_eq!(session.winning_number, Some(1));
    assert_eq!(session.is_winner, Some(true));
    Ok(())
}

#[tokio::test]
async fn test_resume_refuses_foreign_and_settled_rounds() -> Result<()> {
    let harness = Harness::new();
    harness.advance_to(Stage::Completed).await?;
    harness.protocol.reset()?;

    assert!(matches!(
        harness.protocol.resume_round(U256::ZERO).await,
        Err(ProtocolError::RoundMismatch(_))
    ));
    assert_eq!(harness.protocol.stage(), Stage::AwaitingSelection);

    let foreign = harness.chain.push_foreign_round(Address::repeat_byte(7));
    assert!(matches!(
        harness.protocol.resume_round(foreign).await,
        Err(ProtocolError::RoundMismatch(_))
    ));
    assert!(harness.protocol.snapshot().session.round_id.is_none());
    Ok(())
}

#[tokio::test]
async fn test_failures_keep_the_session_retryable() -> Result<()> {
    let harness = Harness::with(|chain| chain, |relayer| relayer.unavailable());
    harness.protocol.connect_wallet().await?;
    assert!(matches!(
        harness.protocol.init_contract().await,
        Err(ProtocolError::SdkUnavailable(_))
    ));
    assert_eq!(harness.protocol.stage(), Stage::AwaitingContractReady);
    assert!(!harness.protocol.snapshot().busy);

    let harness = Harness::new();
    harness.advance_to(Stage::RoundBound).await?;
    harness.chain.fail_reads(1);
    assert!(matches!(
        harness.protocol.bind_round().await,
        Err(ProtocolError::NetworkError(_))
    ));
    assert_eq!(harness.protocol.stage(), Stage::RoundBound);
    assert!(harness.protocol.snapshot().session.round_id.is_none());
    assert_eq!(harness.protocol.bind_round().await?, Stage::AwaitingDraw);
    Ok(())
}

#[tokio::test]
async fn test_round_binding_skips_later_purchases() -> Result<()> {
    let harness = Harness::new();
    harness.select(5).await?;
    harness.advance_to(Stage::RoundBound).await?;
    let stranger = Address::repeat_byte(9);
    harness.chain.push_foreign_round(stranger);
    harness.chain.push_foreign_round(stranger);

    assert_eq!(harness.protocol.bind_round().await?, Stage::AwaitingDraw);
    assert_eq!(
        harness.protocol.snapshot().session.round_id,
        Some(U256::ZERO)
    );

    harness.advance_to(Stage::Completed).await?;
    let session = harness.protocol.snapshot().session;
    assert_eq!(session.is_winner, Some(true));
    assert!(harness.chain.round_record(0).is_some_and(|r| r.is_settled));
    assert!(harness.chain.round_record(1).is_some_and(|r| !r.is_settled));
    Ok(())
}

#[tokio::test]
async fn test_round_binding_gives_up_past_lookback() -> Result<()> {
    let harness = Harness::new();
    harness.advance_to(Stage::RoundBound).await?;
    for _ in 0..16 {
        harness.chain.push_foreign_round(Address::repeat_byte(9));
    }

    assert!(matches!(
        harness.protocol.bind_round().await,
        Err(ProtocolError::RoundMismatch(_))
    ));
    assert_eq!(harness.protocol.stage(), Stage::RoundBound);
    assert!(harness.protocol.snapshot().session.round_id.is_none());
    Ok(())
}

#[tokio::test]
async fn test_wallet_failures_stay_at_wallet() -> Result<()> {
    let harness = Harness::with(|chain| chain.without_wallet(), |relayer| relayer);
    assert!(matches!(
        harness.protocol.connect_wallet().await,
        Err(ProtocolError::WalletUnavailable(_))
    ));
    assert_eq!(harness.protocol.stage(), Stage::AwaitingWallet);

    let harness = Harness::with(|chain| chain.rejecting_connect(), |relayer| relayer);
    assert_eq!(
        harness.protocol.connect_wallet().await,
        Err(ProtocolError::UserRejected)
    );
    assert!(!harness.protocol.snapshot().session.network_switch_requested);
    Ok(())
}
