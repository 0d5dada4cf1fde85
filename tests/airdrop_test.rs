//! Airdrop claim tests
//!
//! Exercises the fee split, the two cap-accounting variants, the one-shot
//! claim latch, and both referral eligibility rules against the in-memory
//! ledger.

mod fixtures;

use fixtures::*;
use launchpad_core::{
    hash_pair, leaf_for_address, Campaign, Error, Event, InMemoryLedger, KeccakProver,
    Ledger, RejectReason, B256, U256,
};

const NOW: u64 = 1_700_000_000;

fn flat_campaign(supply_cap: u64) -> (Campaign, InMemoryLedger) {
    let mut campaign = Campaign::flat_airdrop(
        CAMPAIGN_ADDR,
        OWNER,
        SALE_TOKEN,
        U256::from(supply_cap),
        U256::from(100u8),
        2,
        FEE_RECIPIENT,
        U256::from(10u8),
        2,
    )
    .unwrap();
    campaign.start_sale(OWNER).unwrap();
    let ledger = funded_ledger(&campaign, U256::from(1_000_000u32));
    (campaign, ledger)
}

#[test]
fn fee_split_with_net_only_cap_accounting() {
    let (mut campaign, mut ledger) = flat_campaign(1_000);
    let claimant = addr(1);

    let settlement = campaign.claim(&mut ledger, NOW, claimant, None).unwrap();

    assert_eq!(settlement.granted, U256::from(98u8));
    assert_eq!(
        ledger.balance_of(SALE_TOKEN, claimant).unwrap(),
        U256::from(98u8)
    );
    assert_eq!(
        ledger.balance_of(SALE_TOKEN, FEE_RECIPIENT).unwrap(),
        U256::from(2u8)
    );
    // the fee is charged from the gross amount but excluded from the cap
    assert_eq!(campaign.total_distributed(), U256::from(98u8));

    let events = campaign.drain_events();
    assert!(events.contains(&Event::FeePaid {
        recipient: FEE_RECIPIENT,
        amount: U256::from(2u8),
    }));
    assert!(events.contains(&Event::Claimed {
        claimant,
        net: U256::from(98u8),
        fee: U256::from(2u8),
    }));
}

#[test]
fn gross_cap_accounting_counts_the_fee() {
    let root = leaf_for_address(addr(9)); // single-leaf whitelist
    let mut campaign = Campaign::merkle_airdrop(
        CAMPAIGN_ADDR,
        OWNER,
        SALE_TOKEN,
        U256::from(1_000u16),
        U256::from(100u8),
        2,
        FEE_RECIPIENT,
        U256::from(10u8),
        root,
    )
    .unwrap();
    campaign.start_sale(OWNER).unwrap();
    let mut ledger = funded_ledger(&campaign, U256::from(1_000u16));

    campaign.claim(&mut ledger, NOW, addr(1), None).unwrap();

    // same 98/2 split, but the gross 100 counts against the cap
    assert_eq!(
        ledger.balance_of(SALE_TOKEN, addr(1)).unwrap(),
        U256::from(98u8)
    );
    assert_eq!(campaign.total_distributed(), U256::from(100u8));
}

#[test]
fn claim_latch_is_one_shot() {
    let (mut campaign, mut ledger) = flat_campaign(1_000);
    campaign.claim(&mut ledger, NOW, addr(1), None).unwrap();
    assert_eq!(
        campaign.claim(&mut ledger, NOW, addr(1), None).unwrap_err(),
        Error::AlreadyClaimed
    );
}

#[test]
fn supply_exhaustion_consumes_the_latch() {
    // 98 + 98 > 150, so the second claimant dies on the cap
    let (mut campaign, mut ledger) = flat_campaign(150);
    campaign.claim(&mut ledger, NOW, addr(1), None).unwrap();

    assert_eq!(
        campaign.claim(&mut ledger, NOW, addr(2), None).unwrap_err(),
        Error::SupplyExhausted
    );
    // no payout happened and totals are unchanged ...
    assert_eq!(ledger.balance_of(SALE_TOKEN, addr(2)).unwrap(), U256::ZERO);
    assert_eq!(campaign.total_distributed(), U256::from(98u8));
    // ... but the address has spent its one shot
    assert!(campaign.has_claimed(addr(2)));
    assert_eq!(
        campaign.claim(&mut ledger, NOW, addr(2), None).unwrap_err(),
        Error::AlreadyClaimed
    );
}

#[test]
fn insufficient_funds_does_not_consume_the_latch() {
    let mut campaign = Campaign::flat_airdrop(
        CAMPAIGN_ADDR,
        OWNER,
        SALE_TOKEN,
        U256::from(1_000u16),
        U256::from(100u8),
        2,
        FEE_RECIPIENT,
        U256::from(10u8),
        2,
    )
    .unwrap();
    campaign.start_sale(OWNER).unwrap();
    let mut ledger = funded_ledger(&campaign, U256::from(50u8));

    assert_eq!(
        campaign.claim(&mut ledger, NOW, addr(1), None).unwrap_err(),
        Error::InsufficientFunds
    );
    assert!(!campaign.has_claimed(addr(1)));

    // a top-up makes the same claim succeed
    ledger.mint(SALE_TOKEN, campaign.address(), U256::from(100u8));
    campaign.claim(&mut ledger, NOW, addr(1), None).unwrap();
    assert!(campaign.has_claimed(addr(1)));
}

#[test]
fn self_claimed_referral_rule() {
    let (mut campaign, mut ledger) = flat_campaign(1_000);
    let referrer = addr(1);

    // the referrer has to claim before it can refer anyone
    assert!(matches!(
        campaign
            .claim(&mut ledger, NOW, addr(2), Some(referrer))
            .unwrap_err(),
        Error::InvalidInput(_)
    ));
    assert!(!campaign.has_claimed(addr(2)));

    campaign.claim(&mut ledger, NOW, referrer, None).unwrap();
    let before = ledger.balance_of(SALE_TOKEN, referrer).unwrap();

    campaign
        .claim(&mut ledger, NOW, addr(2), Some(referrer))
        .unwrap();
    assert_eq!(
        ledger.balance_of(SALE_TOKEN, referrer).unwrap(),
        before + U256::from(10u8)
    );
    assert_eq!(campaign.referral_count_of(referrer), 1);
    // bonus counts against the cap alongside the net payout
    assert_eq!(campaign.total_distributed(), U256::from(98 + 98 + 10u32));

    // the referral cap is 2
    campaign
        .claim(&mut ledger, NOW, addr(3), Some(referrer))
        .unwrap();
    assert!(matches!(
        campaign
            .claim(&mut ledger, NOW, addr(4), Some(referrer))
            .unwrap_err(),
        Error::InvalidInput(_)
    ));

    // self-referral is rejected outright
    assert!(matches!(
        campaign
            .claim(&mut ledger, NOW, addr(5), Some(addr(5)))
            .unwrap_err(),
        Error::InvalidInput(_)
    ));
}

#[test]
fn zero_referrer_counts_as_none() {
    let (mut campaign, mut ledger) = flat_campaign(1_000);
    let settlement = campaign
        .claim(&mut ledger, NOW, addr(1), Some(launchpad_core::Address::ZERO))
        .unwrap();
    assert_eq!(settlement.transfers.len(), 2); // fee + net, no bonus
}

#[test]
fn merkle_referral_rule_takes_proofs() {
    let r1 = addr(0x11);
    let r2 = addr(0x12);
    let (l1, l2) = (leaf_for_address(r1), leaf_for_address(r2));
    let root = hash_pair(l1, l2);

    let mut campaign = Campaign::merkle_airdrop(
        CAMPAIGN_ADDR,
        OWNER,
        SALE_TOKEN,
        U256::from(10_000u16),
        U256::from(100u8),
        2,
        FEE_RECIPIENT,
        U256::from(10u8),
        root,
    )
    .unwrap();
    campaign.start_sale(OWNER).unwrap();
    let mut ledger = funded_ledger(&campaign, U256::from(10_000u16));
    let prover = KeccakProver;

    // a whitelisted referrer does not need to have claimed anything
    campaign
        .claim_with_proof(&mut ledger, &prover, NOW, addr(1), r1, &[l2])
        .unwrap();
    assert_eq!(
        ledger.balance_of(SALE_TOKEN, r1).unwrap(),
        U256::from(10u8)
    );

    // a bad proof aborts the claim without consuming the latch
    assert!(matches!(
        campaign
            .claim_with_proof(&mut ledger, &prover, NOW, addr(2), r2, &[l2])
            .unwrap_err(),
        Error::InvalidInput(_)
    ));
    assert!(!campaign.has_claimed(addr(2)));
    campaign
        .claim_with_proof(&mut ledger, &prover, NOW, addr(2), r2, &[l1])
        .unwrap();
}

#[test]
fn distribution_totals_match_per_claim_sums() {
    let (mut campaign, mut ledger) = flat_campaign(1_000);
    let mut expected = U256::ZERO;

    campaign.claim(&mut ledger, NOW, addr(1), None).unwrap();
    expected += U256::from(98u8);
    for n in 2u8..=5 {
        campaign
            .claim(&mut ledger, NOW, addr(n), Some(addr(1)))
            .ok();
        // referral cap is 2: claims 2 and 3 carry the bonus, 4 and 5 fail
        if n <= 3 {
            expected += U256::from(98 + 10u8);
        }
    }
    assert_eq!(campaign.total_distributed(), expected);
    assert!(campaign.total_distributed() <= campaign.supply_cap());

    // payouts plus fees never exceed what left the campaign account
    let paid_out: U256 = (1u8..=3)
        .map(|n| ledger.balance_of(SALE_TOKEN, addr(n)).unwrap())
        .fold(U256::ZERO, |acc, v| acc + v);
    let fees = ledger.balance_of(SALE_TOKEN, FEE_RECIPIENT).unwrap();
    assert_eq!(
        ledger.balance_of(SALE_TOKEN, campaign.address()).unwrap(),
        U256::from(1_000_000u32) - paid_out - fees
    );
}

#[test]
fn gate_pause_and_blacklist_reject_claims() {
    let mut campaign = Campaign::flat_airdrop(
        CAMPAIGN_ADDR,
        OWNER,
        SALE_TOKEN,
        U256::from(1_000u16),
        U256::from(100u8),
        2,
        FEE_RECIPIENT,
        U256::from(10u8),
        2,
    )
    .unwrap();
    let mut ledger = funded_ledger(&campaign, U256::from(1_000u16));

    // not started yet
    assert_eq!(
        campaign.claim(&mut ledger, NOW, addr(1), None).unwrap_err(),
        Error::Lifecycle(RejectReason::Inactive)
    );

    campaign.start_sale(OWNER).unwrap();
    campaign.pause(OWNER).unwrap();
    assert_eq!(
        campaign.claim(&mut ledger, NOW, addr(1), None).unwrap_err(),
        Error::Lifecycle(RejectReason::Inactive)
    );
    campaign.unpause(OWNER).unwrap();

    campaign.set_blacklisted(OWNER, addr(1), true).unwrap();
    assert_eq!(
        campaign.claim(&mut ledger, NOW, addr(1), None).unwrap_err(),
        Error::Blacklisted
    );
    campaign.set_blacklisted(OWNER, addr(1), false).unwrap();
    campaign.claim(&mut ledger, NOW, addr(1), None).unwrap();

    // stopping the sale closes the gate again
    campaign.stop_sale(OWNER).unwrap();
    assert_eq!(
        campaign.claim(&mut ledger, NOW, addr(2), None).unwrap_err(),
        Error::Lifecycle(RejectReason::Inactive)
    );
}

#[test]
fn events_serialize_for_off_chain_consumers() {
    let (mut campaign, mut ledger) = flat_campaign(1_000);
    campaign.claim(&mut ledger, NOW, addr(1), None).unwrap();
    let events = campaign.drain_events();
    let json = events.last().unwrap().to_json().unwrap();
    assert_eq!(json["event"], "claimed");
    assert!(json["claimant"].is_string());

    let root = B256::repeat_byte(0x77);
    campaign.set_blacklisted(OWNER, addr(9), true).unwrap();
    // root updates are rejected on campaigns that do not verify referrers
    assert!(campaign.set_merkle_root(OWNER, root).is_err());
}
