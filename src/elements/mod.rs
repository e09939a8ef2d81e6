mod catalog;
mod encode;
mod tle;

pub use catalog::{decode_catalog, parse_catalog_text, DecodedCatalog, RawTle};
pub use encode::{encode, encode_implied_decimal};
pub use tle::{
    checksum, decode, decode_implied_decimal, expand_epoch_year, expand_launch_year,
    OrbitalElementSet, TleField, LINE_LENGTH,
};
