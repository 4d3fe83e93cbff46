use std::collections::BTreeMap;

use gala_api::event::Event;
use gala_api::staking::ValidatorUpdate;

use super::{
    chain_store::{ChainStore, CommitInfo, WriteSet},
    error::StoreError,
    kv::{KvRead, KvWrite},
    layout::ColumnFamily,
};

/// Consensus-provided block header. `time` is unix seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub height: u64,
    pub time: u64,
}

impl BlockHeader {
    pub fn new(height: u64, time: u64) -> Self {
        Self { height, time }
    }
}

/// State-transition scope of a single block.
///
/// Reads fall through to the committed store unless this block already
/// wrote the key. Writes stay in memory until [`BlockContext::commit`];
/// dropping the context discards them.
pub struct BlockContext<'a> {
    store: &'a ChainStore,
    header: BlockHeader,
    pending: WriteSet,
    events: Vec<Event>,
    validator_updates: Vec<ValidatorUpdate>,
}

impl<'a> BlockContext<'a> {
    pub fn new(store: &'a ChainStore, header: BlockHeader) -> Self {
        Self {
            store,
            header,
            pending: BTreeMap::new(),
            events: Vec::new(),
            validator_updates: Vec::new(),
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn time(&self) -> u64 {
        self.header.time
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Later updates for the same validator replace earlier ones.
    pub fn add_validator_updates(&mut self, updates: Vec<ValidatorUpdate>) {
        for update in updates {
            self.validator_updates.retain(|u| u.operator != update.operator);
            self.validator_updates.push(update);
        }
    }

    pub fn validator_updates(&self) -> &[ValidatorUpdate] {
        &self.validator_updates
    }

    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Persists every write of this block in one batch.
    pub fn commit(self) -> Result<CommitInfo, StoreError> {
        self.store.commit(&self.header, &self.pending)
    }

    /// Like [`BlockContext::commit`], also handing back what the block
    /// produced for consensus and observers.
    pub fn commit_with_output(
        self,
    ) -> Result<(CommitInfo, Vec<Event>, Vec<ValidatorUpdate>), StoreError> {
        let info = self.store.commit(&self.header, &self.pending)?;
        Ok((info, self.events, self.validator_updates))
    }
}

impl KvRead for BlockContext<'_> {
    fn get(&self, cf: ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.pending.get(&(cf, key.to_vec())) {
            Some(value) => Ok(value.clone()),
            None => self.store.get(cf, key),
        }
    }

    fn prefix_scan(
        &self,
        cf: ColumnFamily,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.store.prefix_scan(cf, prefix)?.into_iter().collect();

        let overlay = self
            .pending
            .range((cf, prefix.to_vec())..)
            .take_while(|((pending_cf, key), _)| *pending_cf == cf && key.starts_with(prefix));
        for ((_, key), value) in overlay {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}

impl KvWrite for BlockContext<'_> {
    fn put(&mut self, cf: ColumnFamily, key: Vec<u8>, value: Vec<u8>) {
        self.pending.insert((cf, key), Some(value));
    }

    fn delete(&mut self, cf: ColumnFamily, key: Vec<u8>) {
        self.pending.insert((cf, key), None);
    }
}
