//! Test utilities and scripted collaborators for skyvis development.
//!
//! Every collaborator records what it is asked to do into a shared
//! [`EventLog`], so tests can assert on the exact interleaving of
//! generation, persistence, imager updates and finalisation.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::{Arc, Mutex, MutexGuard};

use skyvis_core::{
    BlockIndex, PhaseCentre, Precision, RunMode, Sample, VisBlock, VisHeader,
};

pub use fixtures::{RecordingImager, RecordingPersister, ScriptedGenerator};

/// One observable action of a collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The generator produced a block.
    Generate { mode: RunMode, index: BlockIndex },
    /// The persister wrote a block.
    Persist { index: BlockIndex },
    /// The persister was closed.
    PersisterFinalise,
    /// An imager accumulated a block.
    Update {
        imager: String,
        mode: RunMode,
        index: BlockIndex,
    },
    /// A component was told to switch mode. `component` is `"generator"`
    /// or the imager's name.
    SetMode { component: String, mode: RunMode },
    /// An imager finalised.
    Finalise { imager: String },
}

/// Shared, ordered record of [`Event`]s.
///
/// Cloning shares the underlying log.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    inner: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.lock().push(event);
    }

    /// Snapshot of every event so far.
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of events matching `pred`.
    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.lock().iter().filter(|e| pred(e)).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        // A panicking test thread must not hide the log from the assertion.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A small observation with one time sample per block.
///
/// 3 stations (3 baselines), 2 channels, double precision.
pub fn test_header(num_blocks: usize) -> VisHeader {
    VisHeader {
        precision: Precision::Double,
        num_stations: 3,
        num_times_total: num_blocks,
        max_times_per_block: 1,
        num_channels: 2,
        freq_start_hz: 100.0e6,
        freq_inc_hz: 1.0e6,
        time_start_mjd_utc: 60_000.0,
        time_inc_sec: 10.0,
        phase_centre: PhaseCentre {
            ra_deg: 0.0,
            dec_deg: -30.0,
        },
    }
}

/// A well-formed block for `index` of `header`.
///
/// Coordinates are deterministic in the global time and baseline
/// indices. Samples are attached only in [`RunMode::Full`].
pub fn test_block(header: &VisHeader, index: BlockIndex, mode: RunMode) -> VisBlock {
    let times = header
        .block_times(index)
        .unwrap_or(index.0..index.0 + 1);
    let num_times = times.len();
    let num_baselines = header.num_baselines();
    let num_channels = header.num_channels;

    let mut uu = Vec::with_capacity(num_times * num_baselines);
    let mut vv = Vec::with_capacity(num_times * num_baselines);
    let mut ww = Vec::with_capacity(num_times * num_baselines);
    for t in times.clone() {
        for b in 0..num_baselines {
            uu.push(10.0 * (b + 1) as f64 + t as f64);
            vv.push(5.0 * (b + 1) as f64 - t as f64);
            ww.push(0.5 * b as f64);
        }
    }
    let samples = (!mode.is_coords_only()).then(|| {
        (0..num_times * num_channels * num_baselines)
            .map(|i| Sample::new(1.0, i as f64 * 0.01))
            .collect()
    });

    match VisBlock::new(
        index,
        times.start,
        num_times,
        num_channels,
        num_baselines,
        [uu, vv, ww],
        samples,
    ) {
        Ok(block) => block,
        Err(e) => panic!("test_block built a malformed block: {e}"),
    }
}
