use super::tle::{decode, OrbitalElementSet};
use crate::errors::ElementError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Undecoded record as delivered by catalog ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTle {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
}

impl RawTle {
    pub fn new(line1: impl Into<String>, line2: impl Into<String>) -> Self {
        Self {
            name: None,
            line1: line1.into(),
            line2: line2.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct DecodedCatalog {
    pub elements: Vec<OrbitalElementSet>,
    pub rejected: Vec<(RawTle, ElementError)>,
}

/// Splits concatenated TLE text into records. Accepts both the bare two-line
/// form and the three-line form with a leading name line.
pub fn parse_catalog_text(text: &str) -> Vec<RawTle> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();

    let mut records = Vec::new();
    let mut name: Option<String> = None;
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if line.starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            records.push(RawTle {
                name: name.take(),
                line1: line.to_string(),
                line2: lines[i + 1].to_string(),
            });
            i += 2;
            continue;
        }

        if name.is_some() {
            log::warn!("skipping unpaired catalog line {:?}", name);
        }
        name = Some(line.trim_start_matches("0 ").trim().to_string());
        i += 1;
    }

    records
}

/// Decodes every record in parallel. Malformed records are returned with their error.
pub fn decode_catalog(raws: &[RawTle]) -> DecodedCatalog {
    let results: Vec<_> = raws
        .par_iter()
        .map(|raw| (raw, decode(&raw.line1, &raw.line2)))
        .collect();

    let mut catalog = DecodedCatalog::default();
    for (raw, result) in results {
        match result {
            Ok(set) => catalog.elements.push(set),
            Err(e) => {
                log::warn!("rejected catalog record {:?}: {}", raw.name, e);
                catalog.rejected.push((raw.clone(), e));
            }
        }
    }

    log::info!(
        "decoded {} element sets, rejected {}",
        catalog.elements.len(),
        catalog.rejected.len()
    );
    catalog
}
