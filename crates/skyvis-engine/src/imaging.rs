//! The imaging simulator: simulate and image visibilities concurrently.
//!
//! [`ImagingSimulator`] wraps a [`SimulationRun`] and an [`ImagerSet`].
//! A run is:
//!
//! 1. Decide whether any imager needs coordinates first (uniform
//!    weighting or W-projection).
//! 2. If so, switch every component to [`RunMode::CoordsOnly`], sweep the
//!    generator once with persistence suppressed, and switch back.
//! 3. Sweep the generator again in [`RunMode::Full`], persisting each
//!    block before handing it to the imagers.
//! 4. Close the output sink, then finalise each imager in registration
//!    order.
//!
//! Any failure aborts the run and leaves the simulator in
//! [`RunState::Aborted`]. A pass failure finalises nothing.

use std::sync::Arc;
use std::time::Instant;

use skyvis_core::{BlockIndex, Imager, RunMode, VisBlock, VisHeader};
use tracing::{info, warn};

use crate::config::{ConfigError, SimulatorConfig};
use crate::error::RunError;
use crate::lifecycle::SimulationRun;
use crate::metrics::RunReport;
use crate::processor::ImagerSet;
use crate::state::{RunPhase, RunState};

// Compile-time assertion: ImagingSimulator can be moved to a worker thread.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<ImagingSimulator>();
    }
};

/// Runs a simulation and feeds every block to a set of imagers.
///
/// # Example
///
/// ```ignore
/// let config = SimulatorConfig::new(generator, vec![imager]).with_persister(sink);
/// let mut sim = ImagingSimulator::new(config)?;
/// let report = sim.run()?;
/// assert!(sim.state().is_finalised());
/// ```
pub struct ImagingSimulator {
    base: SimulationRun,
    imagers: ImagerSet,
    state: RunState,
    last_report: Option<RunReport>,
}

impl ImagingSimulator {
    /// Validate `config` and build a simulator ready to run.
    pub fn new(config: SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let SimulatorConfig {
            generator,
            imagers,
            persister,
            prefetch_blocks,
            ..
        } = config;
        Ok(Self {
            base: SimulationRun::new(generator, persister, prefetch_blocks),
            imagers: ImagerSet::new(imagers),
            state: RunState::Idle,
            last_report: None,
        })
    }

    /// Whether any registered imager needs a coordinate-only pre-pass.
    pub fn needs_coords_first(&self) -> bool {
        self.imagers.needs_coords_first()
    }

    /// Switch the generator and every imager to the same mode.
    pub fn set_coords_only(&mut self, coords_only: bool) {
        let mode = RunMode::from_coords_only(coords_only);
        self.base.set_coords_only(mode);
        self.imagers.set_coords_only(mode);
    }

    /// Dispatch one block in the current mode: persist it unless in
    /// coordinate-only mode, then hand it to every imager.
    ///
    /// Calling this on an idle simulator hands the run to the caller:
    /// the state becomes [`RunState::Running`] and [`run`](Self::run) is
    /// rejected from then on, so no block is persisted twice.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::InvalidState`] once the simulator is
    /// finalised or aborted. A dispatch failure aborts the simulator.
    pub fn process_block(&mut self, block: VisBlock, index: BlockIndex) -> Result<(), RunError> {
        if matches!(self.state, RunState::Finalised | RunState::Aborted(_)) {
            return Err(RunError::InvalidState { state: self.state });
        }
        let phase = if self.mode().is_coords_only() {
            RunPhase::CoordsPass
        } else {
            RunPhase::FullPass
        };
        self.state = RunState::Running(phase);
        let result = self
            .base
            .dispatch_one(&mut self.imagers, block, index)
            .map(|_| ());
        self.abort_on_err(result, phase)
    }

    /// Run the coordinate pass if needed, then the full pass, then
    /// finalise.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::InvalidState`] unless the simulator is idle.
    /// Any generator, persister or imager failure aborts the run and
    /// leaves the simulator in [`RunState::Aborted`]. See that variant
    /// for what is finalised when finalising itself fails.
    pub fn run(&mut self) -> Result<RunReport, RunError> {
        if self.state != RunState::Idle {
            return Err(RunError::InvalidState { state: self.state });
        }
        let start = Instant::now();
        let descriptors = self.imagers.descriptors();
        let needs_coords = self.needs_coords_first();
        info!(
            imagers = self.imagers.len(),
            blocks = self.base.num_blocks(),
            needs_coords,
            "imaging run started"
        );

        let coords_pass = if needs_coords {
            self.state = RunState::Running(RunPhase::CoordsPass);
            self.set_coords_only(true);
            let result = self.base.run_pass(&mut self.imagers);
            self.set_coords_only(false);
            Some(self.abort_on_err(result, RunPhase::CoordsPass)?)
        } else {
            None
        };

        self.state = RunState::Running(RunPhase::FullPass);
        let result = self.base.run_pass(&mut self.imagers);
        let full_pass = self.abort_on_err(result, RunPhase::FullPass)?;

        self.state = RunState::Running(RunPhase::Finalise);
        let finalise_start = Instant::now();
        let result = self.finalise();
        self.abort_on_err(result, RunPhase::Finalise)?;
        let finalise_us = finalise_start.elapsed().as_micros() as u64;

        self.state = RunState::Finalised;
        let report = RunReport {
            imagers: descriptors,
            coords_pass,
            full_pass,
            finalise_us,
            total_us: start.elapsed().as_micros() as u64,
        };
        info!(
            passes = report.passes(),
            persisted = report.blocks_persisted(),
            elapsed_us = report.total_us,
            "imaging run finalised"
        );
        self.last_report = Some(report.clone());
        Ok(report)
    }

    /// Close the output sink, then finalise every imager in order.
    fn finalise(&mut self) -> Result<(), RunError> {
        self.base.finalise()?;
        self.imagers.finalise_all()
    }

    fn abort_on_err<T>(&mut self, result: Result<T, RunError>, phase: RunPhase) -> Result<T, RunError> {
        if let Err(e) = &result {
            self.state = RunState::Aborted(phase);
            warn!(%phase, error = %e, "imaging run aborted");
        }
        result
    }

    /// Lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Current mode shared by every component.
    pub fn mode(&self) -> RunMode {
        self.base.mode()
    }

    /// The observation header.
    pub fn header(&self) -> &Arc<VisHeader> {
        self.base.header()
    }

    /// Registered imagers, in registration order.
    pub fn imagers(&self) -> &[Box<dyn Imager>] {
        self.imagers.as_slice()
    }

    /// Report of the last successful run.
    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    /// Release the imagers, e.g. to read their images.
    pub fn into_imagers(self) -> Vec<Box<dyn Imager>> {
        self.imagers.into_inner()
    }
}

impl std::fmt::Debug for ImagingSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagingSimulator")
            .field("base", &self.base)
            .field("imagers", &self.imagers)
            .field("state", &self.state)
            .finish()
    }
}
