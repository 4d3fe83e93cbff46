use gala_api::prelude::*;
use log::{error, info, warn};

use crate::bank::BankKeeper;
use crate::metrics::{inc_inflation_epoch, inc_inflation_transfer_failures, set_inflation_last_minted, set_inflation_period};
use crate::store::{BlockContext, InflationOps};

/// One completed recipient payout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub recipient: String,
    pub coin: Coin,
}

/// A payout that was skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedTransfer {
    pub recipient: String,
    pub coin: Coin,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintReport {
    pub epoch_number: u64,
    pub epoch_provision: Dec,
    pub minted: Coin,
    pub transfers: Vec<Transfer>,
    pub failed: Vec<FailedTransfer>,
    pub period: u64,
    pub period_advanced: bool,
}

/// What a single epoch-start firing did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InflationOutcome {
    /// Another epoch identifier fired.
    Ignored,
    /// Inflation is disabled; the epoch was counted as skipped and the
    /// period still evaluated.
    Disabled,
    /// Inflation state could not be read; nothing changed.
    Aborted(String),
    /// Nothing was minted, the period was still evaluated.
    NotMinted { reason: String, period_advanced: bool },
    Minted(MintReport),
}

impl InflationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            InflationOutcome::Ignored => "ignored",
            InflationOutcome::Disabled => "disabled",
            InflationOutcome::Aborted(_) => "aborted",
            InflationOutcome::NotMinted { .. } => "not_minted",
            InflationOutcome::Minted(_) => "minted",
        }
    }
}

struct Snapshot {
    params: InflationParams,
    period: u64,
    epochs_per_period: u64,
    skipped_epochs: u64,
    provisions: Vec<DecCoin>,
}

/// Mints the per-epoch provision and splits it across the configured
/// shares.
#[derive(Clone, Debug)]
pub struct InflationKeeper<B> {
    bank: B,
}

impl<B: BankKeeper> InflationKeeper<B> {
    pub fn new(bank: B) -> Self {
        Self { bank }
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn on_epoch_start(&self, ctx: &mut BlockContext<'_>, identifier: &str, epoch_number: u64) -> InflationOutcome {
        let outcome = self.handle_epoch_start(ctx, identifier, epoch_number);
        inc_inflation_epoch(outcome.label());
        outcome
    }

    fn handle_epoch_start(&self, ctx: &mut BlockContext<'_>, identifier: &str, epoch_number: u64) -> InflationOutcome {
        match ctx.get_epoch_identifier() {
            Ok(Some(expected)) if expected == identifier => {}
            Ok(_) => return InflationOutcome::Ignored,
            Err(e) => return self.abort(ctx, epoch_number, format!("error reading epoch identifier: {e}")),
        }

        let snapshot = match Self::read_snapshot(ctx) {
            Ok(snapshot) => snapshot,
            Err(reason) => return self.abort(ctx, epoch_number, reason),
        };

        if !snapshot.params.enable_inflation {
            let skipped = snapshot.skipped_epochs.saturating_add(1);
            ctx.set_skipped_epochs(skipped);
            info!("inflation disabled, skipped epochs now {skipped}");
            ctx.emit(
                Event::new(EVENT_TYPE_INFLATION_SKIPPED)
                    .attr(ATTRIBUTE_EPOCH_NUMBER, epoch_number)
                    .attr(ATTRIBUTE_REASON, "disabled"),
            );
            Self::update_period(ctx, &snapshot, epoch_number);
            return InflationOutcome::Disabled;
        }

        let provision = match calculate_epoch_mint_provision(
            &snapshot.provisions,
            snapshot.period,
            snapshot.epochs_per_period,
        ) {
            Ok(provision) => provision,
            Err(e) => return self.abort(ctx, epoch_number, format!("error computing epoch provision: {e}")),
        };

        let minted = self.mint(ctx, &snapshot.params, provision);
        let (transfers, failed) = match &minted {
            Ok(coin) => self.distribute(ctx, coin),
            Err(_) => (Vec::new(), Vec::new()),
        };

        let (period, period_advanced) = Self::update_period(ctx, &snapshot, epoch_number);

        let minted_amount = minted.as_ref().map(|c| c.amount).unwrap_or_default();
        ctx.emit(
            Event::new(EVENT_TYPE_MINT)
                .attr(ATTRIBUTE_EPOCH_NUMBER, epoch_number)
                .attr(ATTRIBUTE_EPOCH_PROVISIONS, provision)
                .attr(ATTRIBUTE_AMOUNT, minted_amount)
                .attr(ATTRIBUTE_PERIOD, period),
        );

        match minted {
            Ok(minted) => {
                set_inflation_last_minted(minted.amount);
                InflationOutcome::Minted(MintReport {
                    epoch_number,
                    epoch_provision: provision,
                    minted,
                    transfers,
                    failed,
                    period,
                    period_advanced,
                })
            }
            Err(reason) => InflationOutcome::NotMinted { reason, period_advanced },
        }
    }

    /// Runs on every matching epoch, minted or not.
    fn update_period(ctx: &mut BlockContext<'_>, snapshot: &Snapshot, epoch_number: u64) -> (u64, bool) {
        let advanced = period_should_advance(epoch_number, snapshot.period, snapshot.epochs_per_period);
        let period = if advanced {
            let next = snapshot.period + 1;
            ctx.set_period(next);
            info!("inflation period advanced to {next} at epoch {epoch_number}");
            next
        } else {
            snapshot.period
        };
        set_inflation_period(period);
        (period, advanced)
    }

    fn read_snapshot(ctx: &BlockContext<'_>) -> Result<Snapshot, String> {
        let params = ctx
            .get_params()
            .map_err(|e| format!("error reading params: {e}"))?
            .unwrap_or_default();
        let period = ctx.get_period().map_err(|e| format!("error reading period: {e}"))?;
        let epochs_per_period = ctx
            .get_epochs_per_period()
            .map_err(|e| format!("error reading epochs per period: {e}"))?;
        let skipped_epochs = ctx
            .get_skipped_epochs()
            .map_err(|e| format!("error reading skipped epochs: {e}"))?;
        let provisions = ctx
            .get_period_mint_provisions()
            .map_err(|e| format!("error getting period mint provisions: {e}"))?;
        Ok(Snapshot {
            params,
            period,
            epochs_per_period,
            skipped_epochs,
            provisions,
        })
    }

    fn abort(&self, ctx: &mut BlockContext<'_>, epoch_number: u64, reason: String) -> InflationOutcome {
        error!("SKIPPING INFLATION: {reason}");
        ctx.emit(
            Event::new(EVENT_TYPE_INFLATION_SKIPPED)
                .attr(ATTRIBUTE_EPOCH_NUMBER, epoch_number)
                .attr(ATTRIBUTE_REASON, &reason),
        );
        InflationOutcome::Aborted(reason)
    }

    /// Returns the minted coin, or why nothing was minted.
    fn mint(&self, ctx: &mut BlockContext<'_>, params: &InflationParams, provision: Dec) -> Result<Coin, String> {
        if !provision.is_positive() {
            warn!("SKIPPING INFLATION: non-positive epoch mint provision {provision}");
            return Err(format!("non-positive epoch mint provision {provision}"));
        }

        let minted = Coin {
            denom: params.mint_denom.clone(),
            amount: provision.truncate_int().max(0) as u128,
        };
        if minted.is_zero() {
            warn!("SKIPPING INFLATION: epoch provision {provision} truncates to zero");
            return Err("minted amount is zero".to_string());
        }

        self.bank
            .mint_coins(ctx, INFLATION_MODULE, &minted)
            .map_err(|e| {
                error!("SKIPPING INFLATION: error minting coins {minted}: {e}");
                format!("error minting coins: {e}")
            })?;
        info!("minted {minted}");
        Ok(minted)
    }

    /// Every payout is attempted on its own; a failure is logged and skipped.
    fn distribute(&self, ctx: &mut BlockContext<'_>, minted: &Coin) -> (Vec<Transfer>, Vec<FailedTransfer>) {
        let mut transfers = Vec::new();
        let mut failed = Vec::new();

        let distribution = match ctx.get_inflation_distribution() {
            Ok(Some(distribution)) => distribution,
            Ok(None) => {
                error!("SKIPPING INFLATION: inflation distribution not found");
                return (transfers, failed);
            }
            Err(e) => {
                error!("SKIPPING INFLATION: error reading inflation distribution: {e}");
                return (transfers, failed);
            }
        };
        info!(
            "distribution: validators share {}, {} other shares",
            distribution.validators_share,
            distribution.other_shares.len()
        );

        let mut record = |recipient: &str, coin: Coin, result: Result<(), String>| match result {
            Ok(()) => transfers.push(Transfer { recipient: recipient.to_string(), coin }),
            Err(reason) => {
                error!("SKIPPING INFLATION TRANSFER to {recipient} of {coin}: {reason}");
                inc_inflation_transfer_failures();
                failed.push(FailedTransfer { recipient: recipient.to_string(), coin, reason });
            }
        };

        match get_proportion(minted, distribution.validators_share) {
            Ok(coin) if coin.is_zero() => {}
            Ok(coin) => {
                let result = self
                    .bank
                    .send_coins_from_module_to_module(ctx, INFLATION_MODULE, FEE_COLLECTOR_MODULE, &coin)
                    .map_err(|e| e.to_string());
                record(FEE_COLLECTOR_MODULE, coin, result);
            }
            Err(e) => record(FEE_COLLECTOR_MODULE, zero_of(minted), Err(e.to_string())),
        }

        for share in &distribution.other_shares {
            let coin = match get_proportion(minted, share.share) {
                Ok(coin) => coin,
                Err(e) => {
                    record(&share.name, zero_of(minted), Err(e.to_string()));
                    continue;
                }
            };
            if coin.is_zero() {
                info!("share {} rounds to zero", share.name);
                continue;
            }
            let result = share
                .address
                .parse::<Address>()
                .map_err(|e| e.to_string())
                .and_then(|address| {
                    self.bank
                        .send_coins_from_module_to_account(ctx, INFLATION_MODULE, &address, &coin)
                        .map_err(|e| e.to_string())
                });
            record(&share.name, coin, result);
        }

        (transfers, failed)
    }
}

fn zero_of(coin: &Coin) -> Coin {
    Coin {
        denom: coin.denom.clone(),
        amount: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::StoreBank;
    use crate::inflation::init_genesis;
    use crate::store::{BankOps, BlockHeader, ChainStore, ColumnFamily, InflationKeys, KvWrite, StoreError};
    use tempdir::TempDir;

    fn setup_store() -> Result<(ChainStore, TempDir), StoreError> {
        let temp_dir = TempDir::new("rocksdb_test").map_err(StoreError::IoError)?;
        let store = ChainStore::new(temp_dir.path())?;
        Ok((store, temp_dir))
    }

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    fn community() -> Address {
        "0x00000000000000000000000000000000000000c0".parse().unwrap()
    }

    /// 365_000 tokens per period, so 1000 per epoch.
    fn genesis() -> InflationGenesis {
        InflationGenesis {
            period_mint_provisions: vec![
                DecCoin::new(DEFAULT_DENOM, dec("365000")).unwrap(),
                DecCoin::new(DEFAULT_DENOM, dec("182500")).unwrap(),
            ],
            inflation_distribution: InflationDistribution {
                validators_share: dec("0.7"),
                other_shares: vec![InflationShare {
                    name: "community".to_string(),
                    address: community().to_string(),
                    share: dec("0.3"),
                }],
            },
            ..InflationGenesis::default()
        }
    }

    fn setup(genesis: &InflationGenesis) -> Result<(ChainStore, TempDir), StoreError> {
        let (store, temp_dir) = setup_store()?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(0, 0));
        init_genesis(&mut ctx, genesis)?;
        ctx.commit()?;
        Ok((store, temp_dir))
    }

    fn keeper() -> InflationKeeper<StoreBank> {
        InflationKeeper::new(StoreBank::default())
    }

    #[test]
    fn test_mint_and_split() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup(&genesis())?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(1, 0));

        let report = match keeper().on_epoch_start(&mut ctx, DAY_EPOCH_ID, 1) {
            InflationOutcome::Minted(report) => report,
            other => panic!("expected a mint, got {other:?}"),
        };
        assert_eq!(report.minted.amount, 1000);
        assert_eq!(report.transfers.len(), 2);
        assert!(report.failed.is_empty());
        assert!(!report.period_advanced);

        let fee_collector = Address::module(FEE_COLLECTOR_MODULE);
        assert_eq!(ctx.get_balance(&fee_collector, DEFAULT_DENOM)?, 700);
        assert_eq!(ctx.get_balance(&community(), DEFAULT_DENOM)?, 300);
        assert_eq!(ctx.get_supply(DEFAULT_DENOM)?, 1000);

        let event = ctx.events().last().unwrap();
        assert_eq!(event.kind, EVENT_TYPE_MINT);
        assert_eq!(event.get(ATTRIBUTE_EPOCH_NUMBER), Some("1"));
        assert_eq!(event.get(ATTRIBUTE_AMOUNT), Some("1000"));
        assert_eq!(event.get(ATTRIBUTE_EPOCH_PROVISIONS), Some("1000.000000000000000000"));
        Ok(())
    }

    #[test]
    fn test_other_identifiers_are_ignored() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup(&genesis())?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(1, 0));

        assert_eq!(keeper().on_epoch_start(&mut ctx, WEEK_EPOCH_ID, 1), InflationOutcome::Ignored);
        assert_eq!(ctx.pending_writes(), 0);
        assert!(ctx.events().is_empty());
        Ok(())
    }

    #[test]
    fn test_bad_share_address_does_not_block_the_rest() -> Result<(), StoreError> {
        let mut genesis = genesis();
        genesis.inflation_distribution.other_shares.insert(
            0,
            InflationShare {
                name: "broken".to_string(),
                address: "not-an-address".to_string(),
                share: dec("0.1"),
            },
        );
        genesis.inflation_distribution.validators_share = dec("0.6");
        let (store, _temp_dir) = setup(&genesis)?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(1, 0));

        let InflationOutcome::Minted(report) = keeper().on_epoch_start(&mut ctx, DAY_EPOCH_ID, 366) else {
            panic!("expected a mint");
        };
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].recipient, "broken");
        assert_eq!(ctx.get_balance(&community(), DEFAULT_DENOM)?, 300);
        assert_eq!(ctx.get_balance(&Address::module(FEE_COLLECTOR_MODULE), DEFAULT_DENOM)?, 600);
        // Undistributed dust stays with the inflation module.
        assert_eq!(ctx.get_balance(&Address::module(INFLATION_MODULE), DEFAULT_DENOM)?, 100);
        assert!(report.period_advanced);
        assert_eq!(ctx.get_period()?, 1);
        Ok(())
    }

    #[test]
    fn test_exhausted_schedule_still_advances_period() -> Result<(), StoreError> {
        let mut genesis = genesis();
        genesis.period = 2;
        let (store, _temp_dir) = setup(&genesis)?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(1, 0));

        let outcome = keeper().on_epoch_start(&mut ctx, DAY_EPOCH_ID, 3 * 365);
        assert!(matches!(outcome, InflationOutcome::NotMinted { period_advanced: true, .. }));
        assert_eq!(ctx.get_period()?, 3);
        assert_eq!(ctx.get_supply(DEFAULT_DENOM)?, 0);
        Ok(())
    }

    #[test]
    fn test_missing_provisions_abort_the_firing() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(0, 0));
        ctx.set_epoch_identifier(DAY_EPOCH_ID);
        ctx.set_epochs_per_period(1);

        let outcome = keeper().on_epoch_start(&mut ctx, DAY_EPOCH_ID, 10);
        assert!(matches!(outcome, InflationOutcome::Aborted(_)));
        assert_eq!(ctx.get_period()?, 0);
        Ok(())
    }

    #[test]
    fn test_missing_distribution_mints_without_payouts() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup(&genesis())?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(1, 0));
        ctx.delete(
            ColumnFamily::Inflation,
            InflationKeys::InflationDistribution.as_bytes().to_vec(),
        );

        let InflationOutcome::Minted(report) = keeper().on_epoch_start(&mut ctx, DAY_EPOCH_ID, 1) else {
            panic!("expected a mint");
        };
        assert!(report.transfers.is_empty());
        assert_eq!(ctx.get_balance(&Address::module(INFLATION_MODULE), DEFAULT_DENOM)?, 1000);
        Ok(())
    }

    #[test]
    fn test_disabled_inflation_counts_skipped_epochs() -> Result<(), StoreError> {
        let mut genesis = genesis();
        genesis.params.enable_inflation = false;
        let (store, _temp_dir) = setup(&genesis)?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(1, 0));

        assert_eq!(keeper().on_epoch_start(&mut ctx, DAY_EPOCH_ID, 1), InflationOutcome::Disabled);
        assert_eq!(keeper().on_epoch_start(&mut ctx, DAY_EPOCH_ID, 2), InflationOutcome::Disabled);
        assert_eq!(ctx.get_skipped_epochs()?, 2);
        assert_eq!(ctx.get_supply(DEFAULT_DENOM)?, 0);
        Ok(())
    }

    #[test]
    fn test_disabled_epochs_still_count_towards_the_period() -> Result<(), StoreError> {
        let mut genesis = genesis();
        genesis.params.enable_inflation = false;
        let (store, _temp_dir) = setup(&genesis)?;
        let mut ctx = BlockContext::new(&store, BlockHeader::new(1, 0));

        assert_eq!(keeper().on_epoch_start(&mut ctx, DAY_EPOCH_ID, 364), InflationOutcome::Disabled);
        assert_eq!(ctx.get_period()?, 0);
        assert_eq!(keeper().on_epoch_start(&mut ctx, DAY_EPOCH_ID, 365), InflationOutcome::Disabled);
        assert_eq!(ctx.get_period()?, 1);
        assert_eq!(ctx.get_skipped_epochs()?, 2);

        let mut params = genesis.params.clone();
        params.enable_inflation = true;
        ctx.set_params(&params)?;
        let report = match keeper().on_epoch_start(&mut ctx, DAY_EPOCH_ID, 366) {
            InflationOutcome::Minted(report) => report,
            other => panic!("expected a mint, got {other:?}"),
        };
        assert_eq!(report.period, 1);
        assert_eq!(report.minted.amount, 500);
        Ok(())
    }
}
