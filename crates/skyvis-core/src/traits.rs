//! Collaborator traits driven by the engine.
//!
//! The engine owns one [`BlockGenerator`], an optional [`Persister`] and
//! an ordered list of [`Imager`]s. All three are object-safe and stored
//! as boxed trait objects.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::block::{VisBlock, VisHeader};
use crate::error::{GenerateError, ImagerError, PersistError};
use crate::id::BlockIndex;
use crate::imaging::{Algorithm, ImagerDescriptor, Weighting};
use crate::mode::RunMode;

/// Produces the ordered block sequence of an observation.
///
/// # Contract
///
/// - `header()` is fixed for the lifetime of the generator.
/// - `generate_block(i, mode)` is called for `i` in
///   `0..header().num_blocks()`, in order, once per pass. The returned
///   block must carry index `i`.
/// - In [`RunMode::CoordsOnly`] the block need only carry coordinates;
///   sample computation may be skipped.
pub trait BlockGenerator: Send {
    /// The observation this generator simulates.
    fn header(&self) -> Arc<VisHeader>;

    /// Notification that every component is switching mode.
    ///
    /// Default: no-op. The mode is also passed into every
    /// [`generate_block`](Self::generate_block) call.
    fn set_coords_only(&mut self, _mode: RunMode) {}

    /// Compute block `index`.
    fn generate_block(
        &mut self,
        index: BlockIndex,
        mode: RunMode,
    ) -> Result<VisBlock, GenerateError>;
}

/// Accumulates visibility blocks into an image.
///
/// # Object safety
///
/// This trait is object-safe; the engine stores imagers as
/// `Vec<Box<dyn Imager>>` in registration order.
pub trait Imager: Send {
    /// Human-readable name for error reporting and metrics.
    fn name(&self) -> &str;

    /// Declared weighting scheme. Read once before a run.
    fn weighting(&self) -> Weighting;

    /// Declared imaging algorithm. Read once before a run.
    fn algorithm(&self) -> Algorithm;

    /// Whether this imager needs a coordinate-only pre-pass.
    fn needs_coords_first(&self) -> bool {
        self.weighting().needs_coords() || self.algorithm().needs_coords()
    }

    /// Notification that every component is switching mode.
    ///
    /// Default: no-op.
    fn set_coords_only(&mut self, _mode: RunMode) {}

    /// Accumulate one block.
    ///
    /// In [`RunMode::CoordsOnly`] only coordinate statistics should be
    /// gathered; the block may carry no samples.
    fn update_from_block(
        &mut self,
        mode: RunMode,
        header: &VisHeader,
        block: &VisBlock,
    ) -> Result<(), ImagerError>;

    /// Produce the final image. Called at most once, after a successful
    /// full pass.
    fn finalise(&mut self) -> Result<(), ImagerError>;
}

/// Writes full-pass blocks to an output sink.
pub trait Persister: Send {
    /// Write one block.
    fn write_block(
        &mut self,
        header: &VisHeader,
        block: &VisBlock,
        index: BlockIndex,
    ) -> Result<(), PersistError>;

    /// Flush and close the sink.
    ///
    /// Default: no-op.
    fn finalise(&mut self) -> Result<(), PersistError> {
        Ok(())
    }
}

/// Classification of a whole imager set, in registration order.
pub type DescriptorList = SmallVec<[ImagerDescriptor; 4]>;

/// Snapshot the classification of every imager.
pub fn describe(imagers: &[Box<dyn Imager>]) -> DescriptorList {
    imagers
        .iter()
        .map(|im| ImagerDescriptor {
            name: im.name().to_string(),
            weighting: im.weighting(),
            algorithm: im.algorithm(),
        })
        .collect()
}

/// Whether any imager needs a coordinate-only pre-pass.
///
/// Pure OR over the set; inspection order does not matter and an empty
/// set never needs one.
pub fn coords_pass_required(imagers: &[Box<dyn Imager>]) -> bool {
    imagers.iter().any(|im| im.needs_coords_first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Fixed(Weighting, Algorithm);

    impl Imager for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn weighting(&self) -> Weighting {
            self.0
        }
        fn algorithm(&self) -> Algorithm {
            self.1
        }
        fn update_from_block(
            &mut self,
            _: RunMode,
            _: &VisHeader,
            _: &VisBlock,
        ) -> Result<(), ImagerError> {
            Ok(())
        }
        fn finalise(&mut self) -> Result<(), ImagerError> {
            Ok(())
        }
    }

    fn boxed(set: &[(Weighting, Algorithm)]) -> Vec<Box<dyn Imager>> {
        set.iter()
            .map(|&(w, a)| Box::new(Fixed(w, a)) as Box<dyn Imager>)
            .collect()
    }

    #[test]
    fn empty_set_needs_no_coords() {
        assert!(!coords_pass_required(&[]));
    }

    #[test]
    fn one_uniform_imager_is_enough() {
        let set = boxed(&[
            (Weighting::Natural, Algorithm::Fft),
            (Weighting::Uniform, Algorithm::Fft),
        ]);
        assert!(coords_pass_required(&set));
        let d = describe(&set);
        assert_eq!(d.len(), 2);
        assert!(!d[0].needs_coords_first());
        assert!(d[1].needs_coords_first());
    }

    fn weighting() -> impl Strategy<Value = Weighting> {
        prop_oneof![
            Just(Weighting::Natural),
            Just(Weighting::Radial),
            Just(Weighting::Uniform)
        ]
    }

    fn algorithm() -> impl Strategy<Value = Algorithm> {
        prop_oneof![
            Just(Algorithm::Fft),
            Just(Algorithm::WProjection),
            Just(Algorithm::Dft2d),
            Just(Algorithm::Dft3d),
            Just(Algorithm::None)
        ]
    }

    proptest! {
        #[test]
        fn decision_is_order_independent_or(
            set in prop::collection::vec((weighting(), algorithm()), 0..8)
        ) {
            let expected = set
                .iter()
                .any(|&(w, a)| w == Weighting::Uniform || a == Algorithm::WProjection);
            prop_assert_eq!(coords_pass_required(&boxed(&set)), expected);

            let mut reversed = set.clone();
            reversed.reverse();
            prop_assert_eq!(coords_pass_required(&boxed(&reversed)), expected);
        }
    }
}
