//! Per-block dispatch context handed to a [`BlockProcessor`](crate::BlockProcessor).
//!
//! [`BlockContext`] gives a processor the run header, the current mode,
//! gated access to the output sink, and the metrics of the running pass.

use std::time::Instant;

use skyvis_core::{BlockIndex, PersistError, Persister, RunMode, VisBlock, VisHeader};

use crate::metrics::PassMetrics;

/// Owns the optional persister and tracks what has been written.
pub struct OutputSink {
    persister: Option<Box<dyn Persister>>,
    blocks_written: usize,
    closed: bool,
}

impl OutputSink {
    /// Wrap an optional persister.
    pub fn new(persister: Option<Box<dyn Persister>>) -> Self {
        Self {
            persister,
            blocks_written: 0,
            closed: false,
        }
    }

    /// Whether a persister is attached.
    pub fn is_configured(&self) -> bool {
        self.persister.is_some()
    }

    /// Blocks successfully written so far.
    pub fn blocks_written(&self) -> usize {
        self.blocks_written
    }

    /// Write one block. Returns `Ok(false)` if no persister is attached.
    fn write(
        &mut self,
        header: &VisHeader,
        block: &VisBlock,
        index: BlockIndex,
    ) -> Result<bool, PersistError> {
        if self.closed {
            return Err(PersistError::Closed);
        }
        let Some(persister) = self.persister.as_mut() else {
            return Ok(false);
        };
        persister.write_block(header, block, index)?;
        self.blocks_written += 1;
        Ok(true)
    }

    /// Flush and close the persister. Idempotent.
    pub(crate) fn finalise(&mut self) -> Result<(), PersistError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.persister.as_mut() {
            Some(p) => p.finalise(),
            None => Ok(()),
        }
    }
}

/// Context for dispatching one block.
///
/// Constructed by the run lifecycle for each block and passed to
/// [`BlockProcessor::process_block`](crate::BlockProcessor::process_block).
pub struct BlockContext<'a> {
    header: &'a VisHeader,
    mode: RunMode,
    output: &'a mut OutputSink,
    metrics: &'a mut PassMetrics,
}

impl<'a> BlockContext<'a> {
    /// Assemble a context for one dispatch step.
    pub fn new(
        header: &'a VisHeader,
        mode: RunMode,
        output: &'a mut OutputSink,
        metrics: &'a mut PassMetrics,
    ) -> Self {
        Self {
            header,
            mode,
            output,
            metrics,
        }
    }

    /// The observation header shared by every consumer of the run.
    pub fn header(&self) -> &VisHeader {
        self.header
    }

    /// The mode of the executing pass.
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Whether [`write_block`](Self::write_block) would reach a persister.
    pub fn persistence_enabled(&self) -> bool {
        !self.mode.is_coords_only() && self.output.is_configured()
    }

    /// Write a block to the output sink.
    ///
    /// Coordinate-only blocks are never written: in
    /// [`RunMode::CoordsOnly`] this returns `Ok(false)` without touching
    /// the persister. Also returns `Ok(false)` if no persister is attached.
    pub fn write_block(&mut self, block: &VisBlock, index: BlockIndex) -> Result<bool, PersistError> {
        if self.mode.is_coords_only() {
            return Ok(false);
        }
        let start = Instant::now();
        let written = self.output.write(self.header, block, index)?;
        if written {
            self.metrics.blocks_persisted += 1;
            self.metrics.persist_us += start.elapsed().as_micros() as u64;
        }
        Ok(written)
    }

    /// Metrics of the running pass.
    pub fn metrics(&mut self) -> &mut PassMetrics {
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyvis_test_utils::{test_block, test_header, Event, EventLog, RecordingPersister};

    #[test]
    fn coords_mode_never_reaches_persister() {
        let log = EventLog::new();
        let header = test_header(3);
        let mut sink = OutputSink::new(Some(Box::new(RecordingPersister::new(log.clone()))));
        let mut metrics = PassMetrics::new(RunMode::CoordsOnly);
        let mut ctx = BlockContext::new(&header, RunMode::CoordsOnly, &mut sink, &mut metrics);
        assert!(!ctx.persistence_enabled());
        let block = test_block(&header, BlockIndex(0), RunMode::CoordsOnly);
        assert_eq!(ctx.write_block(&block, BlockIndex(0)), Ok(false));
        assert!(log.is_empty());
        assert_eq!(sink.blocks_written(), 0);
    }

    #[test]
    fn full_mode_writes_and_counts() {
        let log = EventLog::new();
        let header = test_header(3);
        let mut sink = OutputSink::new(Some(Box::new(RecordingPersister::new(log.clone()))));
        let mut metrics = PassMetrics::new(RunMode::Full);
        {
            let mut ctx = BlockContext::new(&header, RunMode::Full, &mut sink, &mut metrics);
            assert!(ctx.persistence_enabled());
            let block = test_block(&header, BlockIndex(1), RunMode::Full);
            assert_eq!(ctx.write_block(&block, BlockIndex(1)), Ok(true));
        }
        assert_eq!(metrics.blocks_persisted, 1);
        assert_eq!(sink.blocks_written(), 1);
        assert_eq!(log.events(), vec![Event::Persist { index: BlockIndex(1) }]);
    }

    #[test]
    fn missing_persister_is_not_an_error() {
        let header = test_header(2);
        let mut sink = OutputSink::new(None);
        let mut metrics = PassMetrics::new(RunMode::Full);
        let mut ctx = BlockContext::new(&header, RunMode::Full, &mut sink, &mut metrics);
        assert!(!ctx.persistence_enabled());
        let block = test_block(&header, BlockIndex(0), RunMode::Full);
        assert_eq!(ctx.write_block(&block, BlockIndex(0)), Ok(false));
    }

    #[test]
    fn closed_sink_rejects_writes() {
        let log = EventLog::new();
        let header = test_header(2);
        let mut sink = OutputSink::new(Some(Box::new(RecordingPersister::new(log.clone()))));
        sink.finalise().unwrap();
        sink.finalise().unwrap();
        assert_eq!(log.count(|e| matches!(e, Event::PersisterFinalise)), 1);
        let mut metrics = PassMetrics::new(RunMode::Full);
        let mut ctx = BlockContext::new(&header, RunMode::Full, &mut sink, &mut metrics);
        let block = test_block(&header, BlockIndex(0), RunMode::Full);
        assert_eq!(ctx.write_block(&block, BlockIndex(0)), Err(PersistError::Closed));
    }
}
