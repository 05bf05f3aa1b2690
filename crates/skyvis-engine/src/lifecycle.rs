//! The base run lifecycle: one generator, one optional output sink.
//!
//! [`SimulationRun`] knows how to sweep the generator over the block
//! sequence once, handing each block to a [`BlockProcessor`], and how to
//! close the output sink afterwards. It knows nothing about imagers;
//! [`ImagingSimulator`](crate::ImagingSimulator) wraps it and supplies
//! the processor.
//!
//! # Ordering
//!
//! Blocks are dispatched strictly in index order, and each dispatch
//! completes before the next begins, whether or not generation is
//! prefetched on a background thread.

use std::sync::Arc;
use std::time::Instant;

use skyvis_core::{
    BlockGenerator, BlockIndex, GenerateError, Persister, RunMode, VisBlock, VisHeader,
};
use tracing::info;

use crate::context::{BlockContext, OutputSink};
use crate::error::RunError;
use crate::metrics::PassMetrics;
use crate::pipeline::run_prefetched;
use crate::processor::BlockProcessor;

/// Ask the generator for block `index` and check it is the block asked for.
pub(crate) fn generate_checked(
    generator: &mut dyn BlockGenerator,
    index: BlockIndex,
    mode: RunMode,
) -> Result<VisBlock, GenerateError> {
    let block = generator.generate_block(index, mode)?;
    if block.index() != index {
        return Err(GenerateError::IndexMismatch {
            expected: index,
            actual: block.index(),
        });
    }
    Ok(block)
}

/// Hand one block to `processor`. The block is dropped on return.
fn dispatch(
    header: &VisHeader,
    mode: RunMode,
    output: &mut OutputSink,
    metrics: &mut PassMetrics,
    processor: &mut dyn BlockProcessor,
    block: VisBlock,
    index: BlockIndex,
) -> Result<(), RunError> {
    let mut ctx = BlockContext::new(header, mode, output, metrics);
    processor.process_block(&mut ctx, &block, index)?;
    metrics.blocks += 1;
    Ok(())
}

/// Generator plus output sink, driven one pass at a time.
pub struct SimulationRun {
    generator: Box<dyn BlockGenerator>,
    output: OutputSink,
    header: Arc<VisHeader>,
    mode: RunMode,
    prefetch_blocks: usize,
}

impl SimulationRun {
    /// Wrap a generator and an optional persister.
    ///
    /// The header is read from the generator once and shared for the
    /// lifetime of the run.
    pub fn new(
        generator: Box<dyn BlockGenerator>,
        persister: Option<Box<dyn Persister>>,
        prefetch_blocks: usize,
    ) -> Self {
        let header = generator.header();
        Self {
            generator,
            output: OutputSink::new(persister),
            header,
            mode: RunMode::Full,
            prefetch_blocks,
        }
    }

    /// The observation header.
    pub fn header(&self) -> &Arc<VisHeader> {
        &self.header
    }

    /// The current mode.
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Number of blocks one pass dispatches.
    pub fn num_blocks(&self) -> usize {
        self.header.num_blocks()
    }

    /// Blocks written to the output sink so far.
    pub fn blocks_persisted(&self) -> usize {
        self.output.blocks_written()
    }

    /// Set the mode and tell the generator.
    pub fn set_coords_only(&mut self, mode: RunMode) {
        self.mode = mode;
        self.generator.set_coords_only(mode);
    }

    /// Sweep the generator once over `0..num_blocks()` in the current
    /// mode, dispatching every block to `processor`.
    ///
    /// # Errors
    ///
    /// Returns the first generator, persister or processor failure.
    /// Blocks after the failing one are not dispatched.
    pub fn run_pass(&mut self, processor: &mut dyn BlockProcessor) -> Result<PassMetrics, RunError> {
        let start = Instant::now();
        let mode = self.mode;
        let num_blocks = self.num_blocks();
        let mut metrics = PassMetrics::new(mode);
        info!(%mode, blocks = num_blocks, prefetch = self.prefetch_blocks, "pass started");

        let header = &*self.header;
        let output = &mut self.output;
        if self.prefetch_blocks == 0 {
            for i in 0..num_blocks {
                let index = BlockIndex(i);
                let gen_start = Instant::now();
                let block = generate_checked(self.generator.as_mut(), index, mode).map_err(
                    |source| RunError::Generate {
                        pass: mode.pass(),
                        source,
                    },
                )?;
                metrics.generate_us += gen_start.elapsed().as_micros() as u64;
                dispatch(header, mode, output, &mut metrics, processor, block, index)?;
            }
        } else {
            let metrics = &mut metrics;
            run_prefetched(
                self.generator.as_mut(),
                num_blocks,
                mode,
                self.prefetch_blocks,
                |block, index, generate_us| {
                    metrics.generate_us += generate_us;
                    dispatch(header, mode, output, metrics, processor, block, index)
                },
            )?;
        }

        metrics.total_us = start.elapsed().as_micros() as u64;
        info!(
            %mode,
            blocks = metrics.blocks,
            persisted = metrics.blocks_persisted,
            elapsed_us = metrics.total_us,
            "pass finished"
        );
        Ok(metrics)
    }

    /// Dispatch a single block outside of a pass, in the current mode.
    pub fn dispatch_one(
        &mut self,
        processor: &mut dyn BlockProcessor,
        block: VisBlock,
        index: BlockIndex,
    ) -> Result<PassMetrics, RunError> {
        let mut metrics = PassMetrics::new(self.mode);
        dispatch(
            &self.header,
            self.mode,
            &mut self.output,
            &mut metrics,
            processor,
            block,
            index,
        )?;
        Ok(metrics)
    }

    /// Close the output sink.
    pub fn finalise(&mut self) -> Result<(), RunError> {
        self.output
            .finalise()
            .map_err(|source| RunError::Close { source })
    }
}

impl std::fmt::Debug for SimulationRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationRun")
            .field("num_blocks", &self.num_blocks())
            .field("mode", &self.mode)
            .field("persister", &self.output.is_configured())
            .field("prefetch_blocks", &self.prefetch_blocks)
            .finish()
    }
}
