use gala_api::upgrade::{AppliedUpgrade, Plan, VersionMap};

use crate::store::*;

pub enum UpgradeKeys {
    Plan,
    Done,
    Version,
}

impl UpgradeKeys {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            UpgradeKeys::Plan => b"plan",
            UpgradeKeys::Done => b"done/",
            UpgradeKeys::Version => b"version/",
        }
    }

    fn with_suffix(&self, suffix: &str) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        key.extend_from_slice(suffix.as_bytes());
        key
    }
}

/// Scheduled plan, applied-upgrade records and the module version map.
pub trait UpgradeOps: KvRead + Sized {
    fn get_plan(&self) -> Result<Option<Plan>, StoreError> {
        self.get_value(ColumnFamily::Upgrade, UpgradeKeys::Plan.as_bytes())
    }

    fn set_plan(&mut self, plan: &Plan) -> Result<(), StoreError>
    where
        Self: KvWrite,
    {
        self.put_value(ColumnFamily::Upgrade, UpgradeKeys::Plan.as_bytes(), plan)
    }

    fn clear_plan(&mut self)
    where
        Self: KvWrite,
    {
        self.delete(ColumnFamily::Upgrade, UpgradeKeys::Plan.as_bytes().to_vec());
    }

    fn get_done(&self, name: &str) -> Result<Option<AppliedUpgrade>, StoreError> {
        self.get_value(ColumnFamily::Upgrade, &UpgradeKeys::Done.with_suffix(name))
    }

    /// Records a completed upgrade. An existing record is never replaced;
    /// returns whether the record was written.
    fn set_done(&mut self, name: &str, applied: &AppliedUpgrade) -> Result<bool, StoreError>
    where
        Self: KvWrite,
    {
        if self.get_done(name)?.is_some() {
            return Ok(false);
        }
        self.put_value(ColumnFamily::Upgrade, &UpgradeKeys::Done.with_suffix(name), applied)?;
        Ok(true)
    }

    fn get_all_done(&self) -> Result<Vec<(String, AppliedUpgrade)>, StoreError> {
        let prefix = UpgradeKeys::Done.as_bytes();
        self.prefix_scan(ColumnFamily::Upgrade, prefix)?
            .into_iter()
            .map(|(key, value)| {
                let name = String::from_utf8(key[prefix.len()..].to_vec())
                    .map_err(|_| StoreError::malformed(ColumnFamily::Upgrade, &key))?;
                Ok((name, decode(&value)?))
            })
            .collect()
    }

    fn get_module_version_map(&self) -> Result<VersionMap, StoreError> {
        let prefix = UpgradeKeys::Version.as_bytes();
        self.prefix_scan(ColumnFamily::Upgrade, prefix)?
            .into_iter()
            .map(|(key, value)| {
                let module = String::from_utf8(key[prefix.len()..].to_vec())
                    .map_err(|_| StoreError::malformed(ColumnFamily::Upgrade, &key))?;
                let raw: [u8; 8] = value
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::malformed(ColumnFamily::Upgrade, &key))?;
                Ok((module, u64::from_be_bytes(raw)))
            })
            .collect()
    }

    /// Replaces the stored version map; modules missing from `versions`
    /// are removed.
    fn set_module_version_map(&mut self, versions: &VersionMap) -> Result<(), StoreError>
    where
        Self: KvWrite,
    {
        for module in self.get_module_version_map()?.keys() {
            if !versions.contains_key(module) {
                self.delete(ColumnFamily::Upgrade, UpgradeKeys::Version.with_suffix(module));
            }
        }
        for (module, version) in versions {
            self.put_u64(ColumnFamily::Upgrade, &UpgradeKeys::Version.with_suffix(module), *version);
        }
        Ok(())
    }
}

impl<S: KvRead> UpgradeOps for S {}
