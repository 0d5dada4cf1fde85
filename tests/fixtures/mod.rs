//! Shared fixtures for the campaign integration tests
//!
//! Deterministic addresses and an in-memory ledger double so the accounting
//! paths can be exercised without a chain.

use launchpad_core::{Address, Campaign, InMemoryLedger, U256};

pub const CAMPAIGN_ADDR: Address = Address::repeat_byte(0xca);
pub const OWNER: Address = Address::repeat_byte(0x0a);
pub const SALE_TOKEN: Address = Address::repeat_byte(0xee);
#[allow(dead_code)]
pub const FEE_RECIPIENT: Address = Address::repeat_byte(0xfe);
#[allow(dead_code)]
pub const USD_TOKEN: Address = Address::repeat_byte(0xdd);

#[allow(dead_code)]
pub fn addr(n: u8) -> Address {
    Address::repeat_byte(n)
}

/// `n` whole 18-decimal units.
#[allow(dead_code)]
pub fn units(n: u64) -> U256 {
    U256::from(n) * U256::from(10u8).pow(U256::from(18u8))
}

/// `n` base units of a 6-decimal token.
#[allow(dead_code)]
pub fn usd(n: u64) -> U256 {
    U256::from(n) * U256::from(1_000_000u32)
}

/// Ledger with `inventory` sale tokens already sitting on the campaign.
#[allow(dead_code)]
pub fn funded_ledger(campaign: &Campaign, inventory: U256) -> InMemoryLedger {
    let mut ledger = InMemoryLedger::new();
    ledger.mint(SALE_TOKEN, campaign.address(), inventory);
    ledger
}
