//! Scripted collaborators for pipeline and engine testing.
//!
//! - [`ScriptedGenerator`]: emits [`test_block`]s, optionally failing or
//!   misnumbering one index.
//! - [`RecordingImager`]: records every update, optionally failing one.
//! - [`RecordingPersister`]: records every write, optionally failing one.

use std::sync::Arc;

use skyvis_core::{
    Algorithm, BlockGenerator, BlockIndex, GenerateError, Imager, ImagerError, PersistError,
    Persister, RunMode, VisBlock, VisHeader, Weighting,
};

use crate::{test_block, test_header, Event, EventLog};

/// Generator over [`test_header`] with one time sample per block.
pub struct ScriptedGenerator {
    header: Arc<VisHeader>,
    log: EventLog,
    fail_on: Option<(RunMode, BlockIndex)>,
    misnumber: Option<BlockIndex>,
}

impl ScriptedGenerator {
    pub fn new(num_blocks: usize, log: EventLog) -> Self {
        Self {
            header: Arc::new(test_header(num_blocks)),
            log,
            fail_on: None,
            misnumber: None,
        }
    }

    /// Fail with [`GenerateError::BlockFailed`] for `index` in `mode`.
    /// A failed call records no event.
    pub fn fail_on(mut self, mode: RunMode, index: BlockIndex) -> Self {
        self.fail_on = Some((mode, index));
        self
    }

    /// Return the block after `index` when asked for `index`.
    pub fn misnumber(mut self, index: BlockIndex) -> Self {
        self.misnumber = Some(index);
        self
    }
}

impl BlockGenerator for ScriptedGenerator {
    fn header(&self) -> Arc<VisHeader> {
        Arc::clone(&self.header)
    }

    fn set_coords_only(&mut self, mode: RunMode) {
        self.log.push(Event::SetMode {
            component: "generator".to_string(),
            mode,
        });
    }

    fn generate_block(
        &mut self,
        index: BlockIndex,
        mode: RunMode,
    ) -> Result<VisBlock, GenerateError> {
        if self.fail_on == Some((mode, index)) {
            return Err(GenerateError::BlockFailed {
                index,
                reason: "scripted failure".to_string(),
            });
        }
        let emitted = if self.misnumber == Some(index) {
            index.next()
        } else {
            index
        };
        self.log.push(Event::Generate { mode, index });
        Ok(test_block(&self.header, emitted, mode))
    }
}

/// Imager that records every call into an [`EventLog`].
pub struct RecordingImager {
    name: String,
    weighting: Weighting,
    algorithm: Algorithm,
    log: EventLog,
    fail_on: Option<(RunMode, BlockIndex)>,
    fail_finalise: bool,
}

impl RecordingImager {
    pub fn new(
        name: impl Into<String>,
        weighting: Weighting,
        algorithm: Algorithm,
        log: EventLog,
    ) -> Self {
        Self {
            name: name.into(),
            weighting,
            algorithm,
            log,
            fail_on: None,
            fail_finalise: false,
        }
    }

    /// Fail the update of block `index` in `mode`. A failed update records
    /// no event.
    pub fn fail_on(mut self, mode: RunMode, index: BlockIndex) -> Self {
        self.fail_on = Some((mode, index));
        self
    }

    /// Fail `finalise()`. A failed finalise records no event.
    pub fn fail_finalise(mut self) -> Self {
        self.fail_finalise = true;
        self
    }
}

impl Imager for RecordingImager {
    fn name(&self) -> &str {
        &self.name
    }

    fn weighting(&self) -> Weighting {
        self.weighting
    }

    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn set_coords_only(&mut self, mode: RunMode) {
        self.log.push(Event::SetMode {
            component: self.name.clone(),
            mode,
        });
    }

    fn update_from_block(
        &mut self,
        mode: RunMode,
        _header: &VisHeader,
        block: &VisBlock,
    ) -> Result<(), ImagerError> {
        let index = block.index();
        if self.fail_on == Some((mode, index)) {
            return Err(ImagerError::UpdateFailed {
                reason: format!("scripted failure at block {index}"),
            });
        }
        self.log.push(Event::Update {
            imager: self.name.clone(),
            mode,
            index,
        });
        Ok(())
    }

    fn finalise(&mut self) -> Result<(), ImagerError> {
        if self.fail_finalise {
            return Err(ImagerError::FinaliseFailed {
                reason: "scripted failure".to_string(),
            });
        }
        self.log.push(Event::Finalise {
            imager: self.name.clone(),
        });
        Ok(())
    }
}

/// Persister that records every write into an [`EventLog`].
pub struct RecordingPersister {
    log: EventLog,
    fail_on: Option<BlockIndex>,
}

impl RecordingPersister {
    pub fn new(log: EventLog) -> Self {
        Self { log, fail_on: None }
    }

    /// Fail the write of block `index`. A failed write records no event.
    pub fn fail_on(mut self, index: BlockIndex) -> Self {
        self.fail_on = Some(index);
        self
    }
}

impl Persister for RecordingPersister {
    fn write_block(
        &mut self,
        _header: &VisHeader,
        _block: &VisBlock,
        index: BlockIndex,
    ) -> Result<(), PersistError> {
        if self.fail_on == Some(index) {
            return Err(PersistError::WriteFailed {
                index,
                reason: "scripted failure".to_string(),
            });
        }
        self.log.push(Event::Persist { index });
        Ok(())
    }

    fn finalise(&mut self) -> Result<(), PersistError> {
        self.log.push(Event::PersisterFinalise);
        Ok(())
    }
}
