/// Token ledger capability consumed by the distribution engine
///
/// The engine never talks to a chain directly; every balance read and every
/// transfer goes through this trait. Host adapters are responsible for
/// normalizing both ERC-20 return conventions (boolean-return and no-return)
/// into the `Result` contract below: a denial or a `false` return must map to
/// [`Error::ExternalCall`], which aborts the whole operation.
///
/// Native-coin legs follow host-chain value semantics: the value tendered
/// with a purchase is credited to the campaign account before the operation
/// runs, so the engine only ever issues outbound `send_native` calls
/// (refunds, withdrawals).
use crate::error::Error;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A payment or payout leg, either the chain's native coin or an ERC-20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Native,
    Token(Address),
}

pub trait Ledger {
    /// ERC-20 `balanceOf`
    fn balance_of(&self, token: Address, account: Address) -> Result<U256, Error>;

    /// ERC-20 `transfer` issued by `from` (the campaign account)
    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Error>;

    /// ERC-20 `transferFrom`, pulling `amount` out of `owner` into `to`
    fn transfer_from(
        &mut self,
        token: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Error>;

    /// Native-coin balance of `account`
    fn native_balance_of(&self, account: Address) -> Result<U256, Error>;

    /// Send native coin out of `from`
    fn send_native(&mut self, from: Address, to: Address, amount: U256) -> Result<(), Error>;
}

/// In-memory ledger double
///
/// Backs the integration tests and doc examples. Balances start at zero and
/// are seeded through [`InMemoryLedger::mint`] / [`InMemoryLedger::mint_native`].
/// An uncovered debit is reported as [`Error::ExternalCall`], the same way a
/// real token contract's denial would surface.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    token_balances: HashMap<(Address, Address), U256>,
    native_balances: HashMap<Address, U256>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `token` to `account`.
    pub fn mint(&mut self, token: Address, account: Address, amount: U256) {
        let entry = self.token_balances.entry((token, account)).or_default();
        *entry = entry.saturating_add(amount);
    }

    /// Credit `amount` of native coin to `account`.
    pub fn mint_native(&mut self, account: Address, amount: U256) {
        let entry = self.native_balances.entry(account).or_default();
        *entry = entry.saturating_add(amount);
    }

    fn debit_token(&mut self, token: Address, from: Address, amount: U256) -> Result<(), Error> {
        let balance = self.token_balances.entry((token, from)).or_default();
        if *balance < amount {
            return Err(Error::ExternalCall(format!(
                "token {token} balance of {from} cannot cover {amount}"
            )));
        }
        *balance -= amount;
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    fn balance_of(&self, token: Address, account: Address) -> Result<U256, Error> {
        Ok(self
            .token_balances
            .get(&(token, account))
            .copied()
            .unwrap_or_default())
    }

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Error> {
        self.debit_token(token, from, amount)?;
        let entry = self.token_balances.entry((token, to)).or_default();
        *entry = entry.saturating_add(amount);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        token: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Error> {
        self.transfer(token, owner, to, amount)
    }

    fn native_balance_of(&self, account: Address) -> Result<U256, Error> {
        Ok(self
            .native_balances
            .get(&account)
            .copied()
            .unwrap_or_default())
    }

    fn send_native(&mut self, from: Address, to: Address, amount: U256) -> Result<(), Error> {
        let balance = self.native_balances.entry(from).or_default();
        if *balance < amount {
            return Err(Error::ExternalCall(format!(
                "native balance of {from} cannot cover {amount}"
            )));
        }
        *balance -= amount;
        let entry = self.native_balances.entry(to).or_default();
        *entry = entry.saturating_add(amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncovered_debit_is_an_external_call_failure() {
        let token = Address::repeat_byte(0xaa);
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        let mut ledger = InMemoryLedger::new();
        ledger.mint(token, a, U256::from(5u8));

        let err = ledger.transfer(token, a, b, U256::from(6u8)).unwrap_err();
        assert!(matches!(err, Error::ExternalCall(_)));
        // nothing moved
        assert_eq!(ledger.balance_of(token, a).unwrap(), U256::from(5u8));
        assert_eq!(ledger.balance_of(token, b).unwrap(), U256::ZERO);
    }

    #[test]
    fn native_legs_move_value() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        let mut ledger = InMemoryLedger::new();
        ledger.mint_native(a, U256::from(10u8));
        ledger.send_native(a, b, U256::from(4u8)).unwrap();
        assert_eq!(ledger.native_balance_of(a).unwrap(), U256::from(6u8));
        assert_eq!(ledger.native_balance_of(b).unwrap(), U256::from(4u8));
    }
}
