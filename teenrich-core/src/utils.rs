use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

use crate::errors::CoreError;
use crate::models::{Region, Strand};

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

///
/// Read a `chrom.sizes` file: `<name> <length>` per line.
///
pub fn get_chrom_sizes<T: AsRef<Path>>(path: T) -> Result<HashMap<String, u32>> {
    let path = path.as_ref();
    let reader = get_dynamic_reader(path).context("Failed to open chrom sizes file.")?;

    let mut chrom_sizes: HashMap<String, u32> = HashMap::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Error while reading {}", path.display()))?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(name), Some(size)) = (parts.next(), parts.next()) else {
            return Err(parse_error("chrom sizes", path, idx, "expected two columns").into());
        };
        let size: u32 = size
            .parse()
            .map_err(|_| parse_error("chrom sizes", path, idx, &format!("bad length '{}'", size)))?;
        chrom_sizes.insert(name.to_string(), size);
    }

    if chrom_sizes.is_empty() {
        return Err(CoreError::EmptyFile(path.display().to_string()).into());
    }
    Ok(chrom_sizes)
}

///
/// Read a plain list of intervals (BED3+) such as assembly gaps, blacklists
/// or inclusion regions. Unlike reference features these may overlap.
///
pub fn read_regions<T: AsRef<Path>>(path: T) -> Result<Vec<Region>> {
    let path = path.as_ref();
    let reader = get_dynamic_reader(path)?;

    let mut regions = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser")
        {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 3 {
            return Err(parse_error("BED", path, idx, "expected at least 3 columns").into());
        }
        let start: u32 = parts[1]
            .parse()
            .map_err(|_| parse_error("BED", path, idx, &format!("bad start '{}'", parts[1])))?;
        let end: u32 = parts[2]
            .parse()
            .map_err(|_| parse_error("BED", path, idx, &format!("bad end '{}'", parts[2])))?;
        let region = Region {
            chr: parts[0].to_string(),
            start,
            end,
            strand: Strand::Unstranded,
        };
        region
            .validate(None)
            .map_err(|e| parse_error("BED", path, idx, &e.to_string()))?;
        regions.push(region);
    }
    Ok(regions)
}

pub(crate) fn parse_error(kind: &'static str, path: &Path, idx: usize, reason: &str) -> CoreError {
    CoreError::ParseError {
        kind,
        path: path.display().to_string(),
        line: idx + 1,
        reason: reason.to_string(),
    }
}
