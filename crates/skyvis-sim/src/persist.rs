//! In-memory block sink.

use std::sync::{Arc, Mutex, MutexGuard};

use skyvis_core::{BlockIndex, PersistError, Persister, VisBlock, VisHeader};

#[derive(Debug, Default)]
struct Store {
    header: Option<VisHeader>,
    blocks: Vec<(BlockIndex, VisBlock)>,
    closed: bool,
}

/// Keeps every written block in memory.
///
/// Clones share one store, so a test or driver can keep a handle while
/// the simulator owns the persister.
#[derive(Clone, Debug, Default)]
pub struct MemoryPersister {
    store: Arc<Mutex<Store>>,
}

impl MemoryPersister {
    /// An empty, open sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of blocks written.
    pub fn len(&self) -> usize {
        self.lock().blocks.len()
    }

    /// `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.lock().blocks.is_empty()
    }

    /// Indices of the written blocks, in write order.
    pub fn indices(&self) -> Vec<BlockIndex> {
        self.lock().blocks.iter().map(|(i, _)| *i).collect()
    }

    /// A copy of the block written for `index`.
    pub fn block(&self, index: BlockIndex) -> Option<VisBlock> {
        self.lock()
            .blocks
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, b)| b.clone())
    }

    /// The header seen with the first write.
    pub fn header(&self) -> Option<VisHeader> {
        self.lock().header.clone()
    }

    /// Whether the sink has been finalised.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl Persister for MemoryPersister {
    fn write_block(
        &mut self,
        header: &VisHeader,
        block: &VisBlock,
        index: BlockIndex,
    ) -> Result<(), PersistError> {
        let mut store = self.lock();
        if store.closed {
            return Err(PersistError::Closed);
        }
        if !block.has_samples() {
            return Err(PersistError::WriteFailed {
                index,
                reason: "block carries no samples".to_string(),
            });
        }
        if store.header.is_none() {
            store.header = Some(header.clone());
        }
        store.blocks.push((index, block.clone()));
        Ok(())
    }

    fn finalise(&mut self) -> Result<(), PersistError> {
        self.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyvis_core::RunMode;
    use skyvis_test_utils::{test_block, test_header};

    #[test]
    fn handle_sees_writes_made_through_clone() {
        let handle = MemoryPersister::new();
        let mut sink = handle.clone();
        let header = test_header(2);
        for i in 0..2 {
            let block = test_block(&header, BlockIndex(i), RunMode::Full);
            sink.write_block(&header, &block, BlockIndex(i)).unwrap();
        }
        assert_eq!(handle.indices(), [BlockIndex(0), BlockIndex(1)]);
        assert_eq!(handle.header(), Some(header.clone()));
        assert_eq!(
            handle.block(BlockIndex(1)),
            Some(test_block(&header, BlockIndex(1), RunMode::Full))
        );
    }

    #[test]
    fn coords_only_block_is_refused() {
        let mut sink = MemoryPersister::new();
        let header = test_header(1);
        let block = test_block(&header, BlockIndex(0), RunMode::CoordsOnly);
        match sink.write_block(&header, &block, BlockIndex(0)) {
            Err(PersistError::WriteFailed { index, .. }) => assert_eq!(index, BlockIndex(0)),
            other => panic!("expected WriteFailed, got {other:?}"),
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn closed_sink_refuses_writes() {
        let mut sink = MemoryPersister::new();
        sink.finalise().unwrap();
        assert!(sink.is_closed());
        let header = test_header(1);
        let block = test_block(&header, BlockIndex(0), RunMode::Full);
        assert_eq!(
            sink.write_block(&header, &block, BlockIndex(0)),
            Err(PersistError::Closed)
        );
    }
}
