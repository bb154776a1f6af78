use crate::seed::{Seed, SeedError};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Reads seeds from a CSV file
///
/// The first row is a header and is skipped. The first column of every other
/// row holds a handle or profile URL; further columns are ignored.
pub fn read_seeds(path: &Path) -> Result<Vec<Seed>, SeedError> {
    let file = File::open(path)?;
    parse_seeds(file)
}

/// Parses seeds from CSV text, see [`read_seeds`]
pub fn parse_seeds<R: Read>(reader: R) -> Result<Vec<Seed>, SeedError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut seeds = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(seed) = record.get(0).and_then(Seed::from_handle) {
            seeds.push(seed);
        }
    }

    tracing::debug!("Parsed {} seeds from CSV input", seeds.len());
    Ok(seeds)
}
