use std::io::BufRead;
use std::path::Path;

use anyhow::Result;

use crate::errors::CoreError;
use crate::models::{Region, RepeatElement};
use crate::utils::{get_dynamic_reader, parse_error};

/// Minimum number of whitespace separated columns of a RepeatMasker `.out` record.
const RM_MIN_COLUMNS: usize = 15;

///
/// Read repeats from a RepeatMasker `.out` file (optionally gzipped).
///
/// Coordinates are 1-based inclusive in the file and converted to half-open.
/// The `class/family` column is split on `/`; a class without family uses the
/// class as family. The trailing ID column is the fragment id, shared by all
/// fragments RepeatMasker assigned to the same element.
///
pub fn read_repeatmasker<T: AsRef<Path>>(path: T) -> Result<Vec<RepeatElement>> {
    let path = path.as_ref();
    let reader = get_dynamic_reader(path)?;

    let mut elements = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();

        // header lines and blank lines
        if fields.len() < RM_MIN_COLUMNS || fields[0].parse::<f64>().is_err() {
            continue;
        }

        let begin: u32 = fields[5]
            .parse()
            .map_err(|_| parse_error("RepeatMasker", path, idx, &format!("bad begin '{}'", fields[5])))?;
        let end: u32 = fields[6]
            .parse()
            .map_err(|_| parse_error("RepeatMasker", path, idx, &format!("bad end '{}'", fields[6])))?;
        if begin == 0 || begin > end {
            return Err(parse_error("RepeatMasker", path, idx, "begin must be in 1..=end").into());
        }
        let strand = fields[8]
            .parse()
            .map_err(|e: CoreError| parse_error("RepeatMasker", path, idx, &e.to_string()))?;

        let (class, family) = match fields[10].split_once('/') {
            Some((class, family)) => (class, family),
            None => (fields[10], fields[10]),
        };

        let region = Region {
            chr: fields[4].to_string(),
            start: begin - 1,
            end,
            strand,
        };
        elements.push(RepeatElement::new(region, fields[14], fields[9], class, family));
    }

    if elements.is_empty() {
        return Err(CoreError::EmptyFile(path.display().to_string()).into());
    }
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Strand;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::path::PathBuf;

    fn get_test_path(file_name: &str) -> PathBuf {
        std::env::current_dir()
            .unwrap()
            .join("../tests/data")
            .join(file_name)
    }

    #[rstest]
    fn test_read_repeatmasker() {
        let elements = read_repeatmasker(get_test_path("repeats.out")).unwrap();
        assert_eq!(elements.len(), 6);

        let first = &elements[0];
        assert_eq!((first.region.start, first.region.end), (149, 160));
        assert_eq!(first.region.strand, Strand::Plus);
        assert_eq!(first.name, "AluY");
        assert_eq!(first.class, "SINE");
        assert_eq!(first.family, "Alu");
        assert_eq!(first.fragment_id, "1");

        let complement = elements.iter().find(|e| e.name == "L1PA2").unwrap();
        assert_eq!(complement.region.strand, Strand::Minus);

        // class without family
        let simple = elements.iter().find(|e| e.class == "Simple_repeat").unwrap();
        assert_eq!(simple.family, "Simple_repeat");

        // fragments of one element share the ID column
        let fragments = elements.iter().filter(|e| e.fragment_id == "4").count();
        assert_eq!(fragments, 2);
    }
}
