use std::collections::{BTreeMap, BTreeSet};

use gala_api::prelude::*;
use log::debug;
use thiserror::Error;

use crate::store::{BankOps, BlockContext, StoreError};

#[derive(Error, Debug)]
pub enum BankError {
    #[error("Unknown module account: {0}")]
    UnknownModule(String),
    #[error("Module {module} lacks the {permission:?} permission")]
    MissingPermission { module: String, permission: Permission },
    #[error("Insufficient funds in {address}: need {needed}, have {available}")]
    InsufficientFunds {
        address: Address,
        needed: Coin,
        available: u128,
    },
    #[error("{0} is not allowed to receive funds")]
    BlockedRecipient(Address),
    #[error("Invalid coin: {0}")]
    InvalidCoin(#[from] ApiError),
    #[error("Balance overflow")]
    Overflow,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Permission {
    Minter,
    Burner,
}

/// Ledger operations the inflation distributor relies on. Every call either
/// applies in full or leaves the state untouched.
pub trait BankKeeper {
    fn mint_coins(&self, ctx: &mut BlockContext<'_>, module: &str, coin: &Coin) -> Result<(), BankError>;

    fn send_coins_from_module_to_module(
        &self,
        ctx: &mut BlockContext<'_>,
        sender: &str,
        recipient: &str,
        coin: &Coin,
    ) -> Result<(), BankError>;

    fn send_coins_from_module_to_account(
        &self,
        ctx: &mut BlockContext<'_>,
        sender: &str,
        recipient: &Address,
        coin: &Coin,
    ) -> Result<(), BankError>;
}

/// Bank backed by the `bank` column family with a fixed set of module
/// accounts.
#[derive(Clone, Debug)]
pub struct StoreBank {
    permissions: BTreeMap<String, BTreeSet<Permission>>,
    blocked: BTreeSet<Address>,
}

impl Default for StoreBank {
    fn default() -> Self {
        Self::new(vec![
            (INFLATION_MODULE, vec![Permission::Minter]),
            (FEE_COLLECTOR_MODULE, vec![]),
            (BONDED_POOL_MODULE, vec![Permission::Burner]),
            (NOT_BONDED_POOL_MODULE, vec![Permission::Burner]),
        ])
    }
}

impl StoreBank {
    pub fn new(module_accounts: Vec<(&str, Vec<Permission>)>) -> Self {
        let permissions: BTreeMap<String, BTreeSet<Permission>> = module_accounts
            .into_iter()
            .map(|(name, perms)| (name.to_string(), perms.into_iter().collect()))
            .collect();
        let blocked = permissions.keys().map(|name| Address::module(name)).collect();
        Self { permissions, blocked }
    }

    pub fn module_address(&self, module: &str) -> Result<Address, BankError> {
        if self.permissions.contains_key(module) {
            Ok(Address::module(module))
        } else {
            Err(BankError::UnknownModule(module.to_string()))
        }
    }

    pub fn module_accounts(&self) -> impl Iterator<Item = &str> {
        self.permissions.keys().map(String::as_str)
    }

    pub fn is_blocked(&self, address: &Address) -> bool {
        self.blocked.contains(address)
    }

    fn require(&self, module: &str, permission: Permission) -> Result<(), BankError> {
        let granted = self
            .permissions
            .get(module)
            .ok_or_else(|| BankError::UnknownModule(module.to_string()))?;
        if granted.contains(&permission) {
            Ok(())
        } else {
            Err(BankError::MissingPermission {
                module: module.to_string(),
                permission,
            })
        }
    }

    fn credit(ctx: &mut BlockContext<'_>, address: &Address, coin: &Coin) -> Result<(), BankError> {
        let balance = ctx.get_balance(address, &coin.denom)?;
        let updated = balance.checked_add(coin.amount).ok_or(BankError::Overflow)?;
        ctx.set_balance(address, &coin.denom, updated);
        Ok(())
    }

    fn transfer(
        ctx: &mut BlockContext<'_>,
        from: &Address,
        to: &Address,
        coin: &Coin,
    ) -> Result<(), BankError> {
        validate_denom(&coin.denom)?;
        if coin.amount == 0 || from == to {
            return Ok(());
        }

        let available = ctx.get_balance(from, &coin.denom)?;
        let remaining = available
            .checked_sub(coin.amount)
            .ok_or_else(|| BankError::InsufficientFunds {
                address: *from,
                needed: coin.clone(),
                available,
            })?;
        let received = ctx
            .get_balance(to, &coin.denom)?
            .checked_add(coin.amount)
            .ok_or(BankError::Overflow)?;

        ctx.set_balance(from, &coin.denom, remaining);
        ctx.set_balance(to, &coin.denom, received);
        debug!("transfer {coin} from {from} to {to}");
        Ok(())
    }

    /// Genesis balances; supply is derived from them.
    pub fn init_genesis(&self, ctx: &mut BlockContext<'_>, balances: &[GenesisBalance]) -> Result<(), BankError> {
        for entry in balances {
            for coin in &entry.coins {
                validate_denom(&coin.denom)?;
                Self::credit(ctx, &entry.address, coin)?;
                let supply = ctx
                    .get_supply(&coin.denom)?
                    .checked_add(coin.amount)
                    .ok_or(BankError::Overflow)?;
                ctx.set_supply(&coin.denom, supply);
            }
        }
        Ok(())
    }
}

impl BankKeeper for StoreBank {
    fn mint_coins(&self, ctx: &mut BlockContext<'_>, module: &str, coin: &Coin) -> Result<(), BankError> {
        self.require(module, Permission::Minter)?;
        validate_denom(&coin.denom)?;
        if coin.amount == 0 {
            return Ok(());
        }

        let supply = ctx
            .get_supply(&coin.denom)?
            .checked_add(coin.amount)
            .ok_or(BankError::Overflow)?;
        Self::credit(ctx, &Address::module(module), coin)?;
        ctx.set_supply(&coin.denom, supply);
        debug!("minted {coin} into {module}");
        Ok(())
    }

    fn send_coins_from_module_to_module(
        &self,
        ctx: &mut BlockContext<'_>,
        sender: &str,
        recipient: &str,
        coin: &Coin,
    ) -> Result<(), BankError> {
        let from = self.module_address(sender)?;
        let to = self.module_address(recipient)?;
        Self::transfer(ctx, &from, &to, coin)
    }

    fn send_coins_from_module_to_account(
        &self,
        ctx: &mut BlockContext<'_>,
        sender: &str,
        recipient: &Address,
        coin: &Coin,
    ) -> Result<(), BankError> {
        let from = self.module_address(sender)?;
        if self.is_blocked(recipient) {
            return Err(BankError::BlockedRecipient(*recipient));
        }
        Self::transfer(ctx, &from, recipient, coin)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GenesisBalance {
    pub address: Address,
    pub coins: Vec<Coin>,
}
