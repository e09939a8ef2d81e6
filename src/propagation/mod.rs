//! Position time series from orbital elements.
//!
//! The physics lives behind [`PropagationCapability`]: SGP4 for production
//! screening, an unperturbed two-body model for fast what-if runs. This
//! module only steps the capability across a [`TimeWindow`] and collects
//! the samples, skipping steps the capability rejects.

mod capability;
mod kepler;
mod series;
mod time;

pub use capability::{
    CapabilityOutput, PropagationCapability, Sgp4Capability, CODE_INITIALISATION_FAILED,
    CODE_INVALID_ELEMENTS, CODE_OK, CODE_PROPAGATION_FAILED,
};
pub use kepler::KeplerCapability;
pub use series::{propagate_all, propagate_series, PositionSample, PositionSeries, SkippedSample};
pub use time::{JulianInstant, TimeWindow};
