use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ApiError;

/// Bookkeeping for one recurring epoch. Times are unix seconds taken from
/// block headers, so every replica sees the same values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochInfo {
    pub identifier: String,
    pub start_time: u64,
    /// Seconds per epoch.
    pub duration: u64,
    pub current_epoch: u64,
    pub current_epoch_start_time: u64,
    pub epoch_counting_started: bool,
    pub current_epoch_start_height: u64,
}

impl EpochInfo {
    pub fn new(identifier: impl Into<String>, start_time: u64, duration: u64) -> Self {
        Self {
            identifier: identifier.into(),
            start_time,
            duration,
            current_epoch: 0,
            current_epoch_start_time: start_time,
            epoch_counting_started: false,
            current_epoch_start_height: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        validate_epoch_identifier(&self.identifier)?;
        if self.duration == 0 {
            return Err(ApiError::InvalidEpochInfo(format!(
                "epoch {} has zero duration",
                self.identifier
            )));
        }
        if self.epoch_counting_started && self.current_epoch == 0 {
            return Err(ApiError::InvalidEpochInfo(format!(
                "epoch {} started counting at epoch zero",
                self.identifier
            )));
        }
        Ok(())
    }

    /// The first epoch starts at `start_time`, which may lie before the
    /// block that notices it.
    pub fn start_initial_epoch(&mut self, height: u64) {
        self.epoch_counting_started = true;
        self.current_epoch = 1;
        self.current_epoch_start_time = self.start_time;
        self.current_epoch_start_height = height;
    }

    pub fn end_epoch(&mut self, height: u64) {
        self.current_epoch += 1;
        self.current_epoch_start_time += self.duration;
        self.current_epoch_start_height = height;
    }

    pub fn should_start_initial(&self, block_time: u64) -> bool {
        !self.epoch_counting_started && self.start_time <= block_time
    }

    pub fn should_end(&self, block_time: u64) -> bool {
        self.epoch_counting_started
            && block_time > self.current_epoch_start_time.saturating_add(self.duration)
    }
}

pub fn validate_epoch_identifier(identifier: &str) -> Result<(), ApiError> {
    if identifier.trim().is_empty() {
        return Err(ApiError::InvalidEpochIdentifier(identifier.to_string()));
    }
    Ok(())
}

/// `day`, `week` and `hour` epochs, all starting at `genesis_time`.
pub fn default_epochs(genesis_time: u64) -> Vec<EpochInfo> {
    vec![
        EpochInfo::new(DAY_EPOCH_ID, genesis_time, DAY_SECONDS),
        EpochInfo::new(WEEK_EPOCH_ID, genesis_time, WEEK_SECONDS),
        EpochInfo::new(HOUR_EPOCH_ID, genesis_time, HOUR_SECONDS),
    ]
}
