use gala_api::epoch::EpochInfo;

use crate::store::*;

/// Epoch infos keyed by identifier.
pub trait EpochOps: KvRead + Sized {
    fn get_epoch_info(&self, identifier: &str) -> Result<Option<EpochInfo>, StoreError> {
        self.get_value(ColumnFamily::Epochs, identifier.as_bytes())
    }

    fn set_epoch_info(&mut self, info: &EpochInfo) -> Result<(), StoreError>
    where
        Self: KvWrite,
    {
        self.put_value(ColumnFamily::Epochs, info.identifier.as_bytes(), info)
    }

    /// Ordered by identifier.
    fn get_all_epoch_infos(&self) -> Result<Vec<EpochInfo>, StoreError> {
        self.prefix_scan(ColumnFamily::Epochs, &[])?
            .into_iter()
            .map(|(_, value)| decode(&value))
            .collect()
    }
}

impl<S: KvRead> EpochOps for S {}
