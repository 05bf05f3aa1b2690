//! Simulator configuration, validation, and error types.
//!
//! [`SimulatorConfig`] is the builder-input for constructing an
//! [`ImagingSimulator`](crate::ImagingSimulator). [`validate()`](SimulatorConfig::validate)
//! checks every structural invariant before any pass runs, so a
//! misconfigured simulator is rejected at construction time.

use std::error::Error;
use std::fmt;

use skyvis_core::{BlockGenerator, Imager, ParsePrecisionError, Persister, Precision};

/// Upper bound on [`SimulatorConfig::prefetch_blocks`].
pub const MAX_PREFETCH_BLOCKS: usize = 64;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SimulatorConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The precision selector is not one of the supported values.
    InvalidPrecision(ParsePrecisionError),
    /// The generator simulates at a different precision than configured.
    PrecisionMismatch {
        /// Precision requested in the config.
        configured: Precision,
        /// Precision declared by the generator's header.
        generator: Precision,
    },
    /// The generator's header fails structural validation.
    InvalidHeader {
        /// Description of the validation failure.
        reason: String,
    },
    /// The observation contains no time samples.
    EmptyObservation,
    /// `prefetch_blocks` exceeds [`MAX_PREFETCH_BLOCKS`].
    PrefetchTooDeep {
        /// The configured depth.
        configured: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPrecision(e) => write!(f, "precision: {e}"),
            Self::PrecisionMismatch {
                configured,
                generator,
            } => write!(
                f,
                "configured for {configured} precision but generator simulates {generator}"
            ),
            Self::InvalidHeader { reason } => write!(f, "invalid header: {reason}"),
            Self::EmptyObservation => write!(f, "observation has no time samples"),
            Self::PrefetchTooDeep { configured } => write!(
                f,
                "prefetch_blocks {configured} exceeds maximum of {MAX_PREFETCH_BLOCKS}"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPrecision(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParsePrecisionError> for ConfigError {
    fn from(e: ParsePrecisionError) -> Self {
        Self::InvalidPrecision(e)
    }
}

// ── SimulatorConfig ────────────────────────────────────────────────

/// Complete configuration for constructing an imaging simulator.
///
/// Ownership of the generator, imagers and persister passes to the
/// simulator for the duration of the run.
pub struct SimulatorConfig {
    /// Source of the block sequence.
    pub generator: Box<dyn BlockGenerator>,
    /// Imagers, in the order they receive each block.
    pub imagers: Vec<Box<dyn Imager>>,
    /// Optional output sink for full-pass blocks.
    pub persister: Option<Box<dyn Persister>>,
    /// Numerical precision of the simulation. Default: double.
    pub precision: Precision,
    /// Blocks the generator may compute ahead of dispatch on a
    /// background thread. `0` generates inline. Default: 0.
    pub prefetch_blocks: usize,
}

impl SimulatorConfig {
    /// Configuration with no persister, double precision and inline
    /// generation.
    pub fn new(generator: Box<dyn BlockGenerator>, imagers: Vec<Box<dyn Imager>>) -> Self {
        Self {
            generator,
            imagers,
            persister: None,
            precision: Precision::default(),
            prefetch_blocks: 0,
        }
    }

    /// Attach an output sink.
    pub fn with_persister(mut self, persister: Box<dyn Persister>) -> Self {
        self.persister = Some(persister);
        self
    }

    /// Set the precision from its selector string (`"single"` or `"double"`).
    pub fn with_precision_str(mut self, selector: &str) -> Result<Self, ConfigError> {
        self.precision = selector.parse()?;
        Ok(self)
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Prefetch depth is bounded.
        if self.prefetch_blocks > MAX_PREFETCH_BLOCKS {
            return Err(ConfigError::PrefetchTooDeep {
                configured: self.prefetch_blocks,
            });
        }
        // 2. Header describes a splittable observation.
        let header = self.generator.header();
        header
            .validate()
            .map_err(|reason| ConfigError::InvalidHeader { reason })?;
        if header.num_times_total == 0 {
            return Err(ConfigError::EmptyObservation);
        }
        // 3. Generator agrees on precision.
        if header.precision != self.precision {
            return Err(ConfigError::PrecisionMismatch {
                configured: self.precision,
                generator: header.precision,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for SimulatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.imagers.iter().map(|im| im.name()).collect();
        f.debug_struct("SimulatorConfig")
            .field("num_blocks", &self.generator.header().num_blocks())
            .field("imagers", &names)
            .field("persister", &self.persister.is_some())
            .field("precision", &self.precision)
            .field("prefetch_blocks", &self.prefetch_blocks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyvis_test_utils::{EventLog, ScriptedGenerator};

    fn valid_config() -> SimulatorConfig {
        let log = EventLog::new();
        SimulatorConfig::new(Box::new(ScriptedGenerator::new(5, log)), Vec::new())
    }

    #[test]
    fn validate_valid_config_succeeds() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn unknown_precision_selector_rejected() {
        match valid_config().with_precision_str("quad") {
            Err(ConfigError::InvalidPrecision(e)) => assert_eq!(e.value, "quad"),
            other => panic!("expected InvalidPrecision, got {other:?}"),
        }
    }

    #[test]
    fn precision_mismatch_rejected() {
        let cfg = valid_config().with_precision_str("single").unwrap();
        match cfg.validate() {
            Err(ConfigError::PrecisionMismatch {
                configured: Precision::Single,
                generator: Precision::Double,
            }) => {}
            other => panic!("expected PrecisionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn prefetch_depth_is_capped() {
        let mut cfg = valid_config();
        cfg.prefetch_blocks = MAX_PREFETCH_BLOCKS;
        assert!(cfg.validate().is_ok());
        cfg.prefetch_blocks = MAX_PREFETCH_BLOCKS + 1;
        match cfg.validate() {
            Err(ConfigError::PrefetchTooDeep { configured }) => {
                assert_eq!(configured, MAX_PREFETCH_BLOCKS + 1)
            }
            other => panic!("expected PrefetchTooDeep, got {other:?}"),
        }
    }

    #[test]
    fn empty_observation_rejected() {
        let log = EventLog::new();
        let cfg = SimulatorConfig::new(Box::new(ScriptedGenerator::new(0, log)), Vec::new());
        match cfg.validate() {
            Err(ConfigError::EmptyObservation) => {}
            other => panic!("expected EmptyObservation, got {other:?}"),
        }
    }

    #[test]
    fn debug_lists_imager_names() {
        let text = format!("{:?}", valid_config());
        assert!(text.contains("SimulatorConfig"));
        assert!(text.contains("num_blocks: 5"));
    }
}
