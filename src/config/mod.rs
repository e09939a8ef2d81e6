pub mod screening;

pub use screening::{OutputSettings, ScreeningConfig};
