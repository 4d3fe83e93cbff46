use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use gala_api::upgrade::Plan;
use log::debug;

use crate::upgrade::UpgradeError;

pub const UPGRADE_INFO_FILE: &str = "upgrade-info.json";

/// The plan kept on disk next to the store. It outlives rollbacks of the
/// committed state and tells an operator which binary the chain needs.
#[derive(Clone, Debug)]
pub struct UpgradeInfoFile {
    path: PathBuf,
}

impl UpgradeInfoFile {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            path: data_dir.as_ref().join(UPGRADE_INFO_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when no plan was ever written.
    pub fn read(&self) -> Result<Option<Plan>, UpgradeError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Writes `plan` at `height`, replacing any previous file in one rename.
    pub fn dump(&self, height: u64, plan: &Plan) -> Result<(), UpgradeError> {
        let plan = Plan {
            height,
            ..plan.clone()
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&plan)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!("upgrade info {} written to {}", plan.name, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_dump_and_read() -> Result<(), UpgradeError> {
        let temp_dir = TempDir::new("upgrade_info")?;
        let file = UpgradeInfoFile::new(temp_dir.path().join("data"));
        assert_eq!(file.read()?, None);

        file.dump(42, &Plan::new("0.2.1", 7, "gov module migration"))?;
        assert_eq!(file.read()?, Some(Plan::new("0.2.1", 42, "gov module migration")));

        file.dump(50, &Plan::new("0.2.2", 50, ""))?;
        assert_eq!(file.read()?.map(|p| p.name), Some("0.2.2".to_string()));
        Ok(())
    }

    #[test]
    fn test_garbage_is_an_error() -> Result<(), UpgradeError> {
        let temp_dir = TempDir::new("upgrade_info")?;
        let file = UpgradeInfoFile::new(temp_dir.path());
        fs::write(file.path(), "{not json")?;
        assert!(matches!(file.read(), Err(UpgradeError::UpgradeInfoFormat(_))));
        Ok(())
    }
}
