use std::sync::Arc;

use gala_api::prelude::*;
use log::info;

use crate::store::{BlockContext, EpochOps, StoreError};

/// Callbacks fired at epoch boundaries, in the same order on every replica.
pub trait EpochHooks: Send + Sync {
    fn after_epoch_end(&self, ctx: &mut BlockContext<'_>, identifier: &str, epoch_number: u64);

    fn before_epoch_start(&self, ctx: &mut BlockContext<'_>, identifier: &str, epoch_number: u64);
}

/// Drives every stored epoch from block time at the start of each block.
#[derive(Clone, Default)]
pub struct EpochsKeeper {
    hooks: Vec<Arc<dyn EpochHooks>>,
}

impl EpochsKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn EpochHooks>) -> Self {
        self.hooks.push(hooks);
        self
    }

    pub fn init_genesis(&self, ctx: &mut BlockContext<'_>, epochs: &[EpochInfo]) -> Result<(), StoreError> {
        for info in epochs {
            info.validate()?;
            ctx.set_epoch_info(info)?;
        }
        Ok(())
    }

    /// Each identifier moves at most one epoch per block.
    pub fn begin_block(&self, ctx: &mut BlockContext<'_>) -> Result<(), StoreError> {
        let height = ctx.height();
        let time = ctx.time();

        for mut info in ctx.get_all_epoch_infos()? {
            if info.should_start_initial(time) {
                info.start_initial_epoch(height);
            } else if info.should_end(time) {
                ctx.emit(
                    Event::new(EVENT_TYPE_EPOCH_END)
                        .attr(ATTRIBUTE_IDENTIFIER, &info.identifier)
                        .attr(ATTRIBUTE_EPOCH_NUMBER, info.current_epoch),
                );
                for hooks in &self.hooks {
                    hooks.after_epoch_end(ctx, &info.identifier, info.current_epoch);
                }
                info.end_epoch(height);
            } else {
                continue;
            }

            ctx.set_epoch_info(&info)?;
            info!(
                "epoch {} #{} started at height {height}",
                info.identifier, info.current_epoch
            );
            ctx.emit(
                Event::new(EVENT_TYPE_EPOCH_START)
                    .attr(ATTRIBUTE_IDENTIFIER, &info.identifier)
                    .attr(ATTRIBUTE_EPOCH_NUMBER, info.current_epoch)
                    .attr(ATTRIBUTE_START_TIME, info.current_epoch_start_time),
            );
            for hooks in &self.hooks {
                hooks.before_epoch_start(ctx, &info.identifier, info.current_epoch);
            }
        }
        Ok(())
    }
}
