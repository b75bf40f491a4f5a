//! End-to-end election workflow tests for the ballot encryption core

use chrono::{Duration, Utc};
use securevote::{
    Error, Result,
    crypto::{BallotCipher, HashRegistry, TokenService, VotingToken},
    ledger::{BallotReceipt, BallotSubmission, LedgerAnchor, MemoryLedger, TokenRegistry},
    types::{ElectionConfig, TallyRecord},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

fn election() -> ElectionConfig {
    ElectionConfig {
        id: Uuid::new_v4(),
        title: "Board Election 2024".to_string(),
        description: "Annual board member election".to_string(),
        start_date: Utc::now() - Duration::hours(1),
        end_date: Utc::now() + Duration::hours(1),
        candidates: vec![
            "Candidate A".to_string(),
            "Candidate B".to_string(),
            "".to_string(),
        ],
    }
}

#[tokio::test]
async fn test_full_election_workflow() -> Result<()> {
    println!("🗳️  Testing full election workflow...");

    // Setup
    let election = election();
    election.validate()?;
    let candidates = election.active_candidates();
    assert_eq!(candidates, vec!["Candidate A", "Candidate B"]);

    let token_service = TokenService::for_testing();
    let issued = token_service.issue_batch(20)?;
    assert_eq!(issued.len(), 20);
    println!("✅ Issued {} voting tokens", issued.len());

    let ledger = Arc::new(MemoryLedger::new());
    let submission = BallotSubmission::new(BallotCipher::with_os_random(), ledger.clone());

    // Voters cast ballots: 12 for A, 8 for B
    let mut receipts: Vec<BallotReceipt> = Vec::new();
    for (i, row) in issued.iter().enumerate() {
        let choice = if i < 12 { candidates[0] } else { candidates[1] };
        let receipt = submission.cast(&row.token.to_hex(), choice).await?;
        receipts.push(receipt);
    }
    assert_eq!(ledger.len()?, 20);
    println!("✅ All ballots anchored");

    // Every token is now consumed
    for row in &issued {
        let token_hash = HashRegistry::token_hash(&row.token);
        assert!(ledger.is_used(&token_hash).await?);
    }

    // Every voter can find their ballot in the audit trail
    for receipt in &receipts {
        let record = submission
            .verify_receipt(&receipt.ballot_hash)
            .await?
            .expect("ballot should be anchored");
        assert_eq!(record.tx_ref, receipt.tx_ref);
        assert_eq!(record.token_hash, receipt.token_hash);
        assert!(HashRegistry::verify_ballot_hash(
            &receipt.encryption.ciphertext,
            &record.ballot_hash
        )?);
    }
    println!("✅ Receipts verified against audit trail");

    // Tally by decrypting with voter-held keys
    let cipher = BallotCipher::with_os_random();
    let mut counts: BTreeMap<String, u64> =
        candidates.iter().map(|c| (c.to_string(), 0)).collect();
    for receipt in &receipts {
        let choice = cipher.decrypt_result(&receipt.encryption)?;
        *counts.get_mut(&choice).expect("known candidate") += 1;
    }

    let tally = TallyRecord::from_counts(election.id, counts, Utc::now());
    assert_eq!(tally.total_votes, 20);
    assert_eq!(tally.candidates[0].votes, 12);
    assert_eq!(tally.candidates[0].percentage, 60.0);
    assert_eq!(tally.candidates[1].percentage, 40.0);

    let tally_hash = HashRegistry::tally_hash(&tally)?;
    assert!(HashRegistry::is_valid_hash_format(&tally_hash.to_string()));
    assert_eq!(HashRegistry::tally_hash(&tally.clone())?, tally_hash);
    println!("✅ Tally hash published: {}", tally_hash);

    Ok(())
}

#[tokio::test]
async fn test_double_voting_prevention() -> Result<()> {
    let ledger = Arc::new(MemoryLedger::new());
    let submission = BallotSubmission::new(BallotCipher::with_os_random(), ledger.clone());
    let token = TokenService::for_testing().generate_token()?;

    let first = submission.cast(&token.to_hex(), "Candidate A").await?;

    // Prepared before the first vote landed, submitted after
    let prepared = submission.prepare(&token.to_hex(), "Candidate B")?;
    assert_eq!(prepared.token_hash, first.token_hash);
    assert!(matches!(
        submission.submit(prepared).await,
        Err(Error::TokenAlreadyUsed)
    ));

    assert_eq!(ledger.len()?, 1);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_voters() -> Result<()> {
    let ledger = Arc::new(MemoryLedger::new());
    let submission = Arc::new(BallotSubmission::new(
        BallotCipher::with_os_random(),
        ledger.clone(),
    ));
    let tokens = TokenService::for_testing().generate_tokens(64)?;

    let mut handles = Vec::new();
    for token in tokens {
        let submission = submission.clone();
        handles.push(tokio::spawn(async move {
            submission.cast(&token.to_hex(), "Candidate A").await
        }));
    }

    for handle in handles {
        handle.await.expect("task panicked")?;
    }

    assert_eq!(ledger.len()?, 64);
    Ok(())
}

#[tokio::test]
async fn test_same_token_raced_from_many_tasks() -> Result<()> {
    let ledger = Arc::new(MemoryLedger::new());
    let submission = Arc::new(BallotSubmission::new(
        BallotCipher::with_os_random(),
        ledger.clone(),
    ));
    let token = TokenService::for_testing().generate_token()?.to_hex();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let submission = submission.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            submission.cast(&token, "Candidate A").await
        }));
    }

    let mut accepted = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => accepted += 1,
            Err(Error::TokenAlreadyUsed) => refused += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(refused, 9);
    assert_eq!(ledger.len()?, 1);
    Ok(())
}

#[tokio::test]
async fn test_transaction_lookup() -> Result<()> {
    let ledger = Arc::new(MemoryLedger::new());
    let submission = BallotSubmission::new(BallotCipher::with_os_random(), ledger.clone());
    let token = VotingToken::parse(&format!("0x{}", "5A".repeat(32)))?;

    let receipt = submission.cast(&token.to_hex(), "Candidate B").await?;
    let record = ledger
        .find_transaction(&receipt.tx_ref)
        .await?
        .expect("transaction should exist");

    assert_eq!(record.ballot_hash, receipt.ballot_hash);
    assert_eq!(record.token_hash, HashRegistry::token_hash(&token));
    Ok(())
}

#[test]
fn test_election_config_json_round_trip() {
    let election = election();
    let json = serde_json::to_string_pretty(&election).unwrap();
    let back: ElectionConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(back, election);
}
