//! The per-block dispatch hook and the default imager fan-out.
//!
//! [`BlockProcessor`] is the seam a run lifecycle calls once per block.
//! [`ImagerSet`] is the standard implementation: persist the block (full
//! pass only), then hand it to every imager in registration order.

use std::time::Instant;

use skyvis_core::{
    coords_pass_required, describe, BlockIndex, DescriptorList, Imager, RunMode, VisBlock,
};
use tracing::debug;

use crate::context::BlockContext;
use crate::error::RunError;

/// Dispatches one block produced by a pass.
///
/// Called for every block in increasing index order. The call must
/// complete all side effects for the block before returning; the next
/// block is not dispatched until it does.
pub trait BlockProcessor {
    /// Handle block `index`.
    fn process_block(
        &mut self,
        ctx: &mut BlockContext<'_>,
        block: &VisBlock,
        index: BlockIndex,
    ) -> Result<(), RunError>;
}

/// Registered imagers, in the fixed order they receive blocks.
#[derive(Default)]
pub struct ImagerSet {
    imagers: Vec<Box<dyn Imager>>,
}

impl ImagerSet {
    /// Take ownership of an ordered imager list.
    pub fn new(imagers: Vec<Box<dyn Imager>>) -> Self {
        Self { imagers }
    }

    /// Number of registered imagers.
    pub fn len(&self) -> usize {
        self.imagers.len()
    }

    /// `true` if no imager is registered.
    pub fn is_empty(&self) -> bool {
        self.imagers.is_empty()
    }

    /// The imagers, in registration order.
    pub fn as_slice(&self) -> &[Box<dyn Imager>] {
        &self.imagers
    }

    /// Classification of every imager.
    pub fn descriptors(&self) -> DescriptorList {
        describe(&self.imagers)
    }

    /// Whether any imager needs a coordinate-only pre-pass.
    pub fn needs_coords_first(&self) -> bool {
        coords_pass_required(&self.imagers)
    }

    /// Broadcast the mode to every imager.
    pub fn set_coords_only(&mut self, mode: RunMode) {
        for im in &mut self.imagers {
            im.set_coords_only(mode);
        }
    }

    /// Finalise every imager in registration order, stopping at the
    /// first failure. Imagers before the failing one stay finalised.
    pub fn finalise_all(&mut self) -> Result<(), RunError> {
        for im in &mut self.imagers {
            im.finalise().map_err(|source| RunError::Finalise {
                name: im.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Release the imagers.
    pub fn into_inner(self) -> Vec<Box<dyn Imager>> {
        self.imagers
    }
}

impl BlockProcessor for ImagerSet {
    fn process_block(
        &mut self,
        ctx: &mut BlockContext<'_>,
        block: &VisBlock,
        index: BlockIndex,
    ) -> Result<(), RunError> {
        let mode = ctx.mode();

        // Write before accumulate: a failed write means no imager sees the block.
        if !mode.is_coords_only() {
            ctx.write_block(block, index)
                .map_err(|source| RunError::Persist { index, source })?;
        }

        for im in &mut self.imagers {
            let start = Instant::now();
            im.update_from_block(mode, ctx.header(), block)
                .map_err(|source| RunError::Imager {
                    name: im.name().to_string(),
                    pass: mode.pass(),
                    index,
                    source,
                })?;
            ctx.metrics()
                .record_imager(im.name(), start.elapsed().as_micros() as u64);
        }
        debug!(%index, %mode, imagers = self.imagers.len(), "block dispatched");
        Ok(())
    }
}

impl std::fmt::Debug for ImagerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.imagers.iter().map(|im| im.name()))
            .finish()
    }
}
