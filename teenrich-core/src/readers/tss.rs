use std::io::BufRead;
use std::path::Path;

use anyhow::Result;

use crate::errors::CoreError;
use crate::models::{Strand, Tss, TssIndex};
use crate::utils::{get_dynamic_reader, parse_error};

/// GTF feature types that carry a TSS.
const GTF_TSS_FEATURES: [&str; 2] = ["transcript", "gene"];

///
/// Read TSS from a GTF (`.gtf`, `.gtf.gz`) or BED file.
///
/// GTF: `transcript` and `gene` records, TSS at the 5' end given the strand.
/// BED: one site per line, at `start` (or `end - 1` on the minus strand when a
/// strand column is present).
///
pub fn read_tss<T: AsRef<Path>>(path: T) -> Result<TssIndex> {
    let path = path.as_ref();
    let is_gtf = path
        .file_name()
        .and_then(|f| f.to_str())
        .map(|f| f.ends_with(".gtf") || f.ends_with(".gtf.gz"))
        .unwrap_or(false);

    let reader = get_dynamic_reader(path)?;
    let mut sites = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() || line.starts_with('#') || line.starts_with("track") {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let site = if is_gtf {
            parse_gtf_line(&fields).map_err(|reason| parse_error("GTF", path, idx, &reason))?
        } else {
            Some(parse_bed_line(&fields).map_err(|reason| parse_error("BED", path, idx, &reason))?)
        };
        sites.extend(site);
    }

    if sites.is_empty() {
        return Err(CoreError::EmptyFile(path.display().to_string()).into());
    }
    Ok(TssIndex::from(sites))
}

fn parse_strand(raw: &str) -> Result<Strand, String> {
    raw.parse::<Strand>().map_err(|e| e.to_string())
}

fn parse_gtf_line(fields: &[&str]) -> Result<Option<Tss>, String> {
    if fields.len() < 7 {
        return Err(format!("expected 9 columns, got {}", fields.len()));
    }
    if !GTF_TSS_FEATURES.contains(&fields[2]) {
        return Ok(None);
    }
    let start: u32 = fields[3]
        .parse()
        .map_err(|_| format!("bad start '{}'", fields[3]))?;
    let end: u32 = fields[4]
        .parse()
        .map_err(|_| format!("bad end '{}'", fields[4]))?;
    if start == 0 || start > end {
        return Err("start must be in 1..=end".to_string());
    }
    let strand = parse_strand(fields[6])?;
    let pos = match strand {
        Strand::Minus => end - 1,
        _ => start - 1,
    };
    Ok(Some(Tss {
        chr: fields[0].to_string(),
        pos,
        strand,
    }))
}

fn parse_bed_line(fields: &[&str]) -> Result<Tss, String> {
    if fields.len() < 3 {
        return Err(format!("expected at least 3 columns, got {}", fields.len()));
    }
    let start: u32 = fields[1]
        .parse()
        .map_err(|_| format!("bad start '{}'", fields[1]))?;
    let end: u32 = fields[2]
        .parse()
        .map_err(|_| format!("bad end '{}'", fields[2]))?;
    let strand = match fields.get(5) {
        Some(raw) => parse_strand(raw)?,
        None => Strand::Unstranded,
    };
    let pos = match strand {
        Strand::Minus if end > start => end - 1,
        _ => start,
    };
    Ok(Tss {
        chr: fields[0].to_string(),
        pos,
        strand,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;

    #[rstest]
    fn test_read_gtf() {
        let mut file = tempfile::Builder::new().suffix(".gtf").tempfile().unwrap();
        writeln!(file, "#!genome-build test").unwrap();
        writeln!(file, "chr1\ttest\tgene\t1001\t2000\t.\t+\t.\tgene_id \"g1\";").unwrap();
        writeln!(file, "chr1\ttest\ttranscript\t1001\t2000\t.\t+\t.\tgene_id \"g1\";").unwrap();
        writeln!(file, "chr1\ttest\texon\t1001\t1100\t.\t+\t.\tgene_id \"g1\";").unwrap();
        writeln!(file, "chr1\ttest\ttranscript\t5001\t6000\t.\t-\t.\tgene_id \"g2\";").unwrap();
        let index = read_tss(file.path()).unwrap();

        // gene and transcript share a TSS
        assert_eq!(index.len(), 2);
        let sites = index.chr_sites("chr1");
        assert_eq!(sites[0].pos, 1000);
        assert_eq!(sites[1].pos, 5999);
        assert_eq!(sites[1].strand, Strand::Minus);
    }

    #[rstest]
    fn test_read_bed() {
        let mut file = tempfile::Builder::new().suffix(".bed").tempfile().unwrap();
        writeln!(file, "chr2\t300\t301\ttss1\t0\t+").unwrap();
        writeln!(file, "chr2\t100\t101").unwrap();
        let index = read_tss(file.path()).unwrap();
        assert_eq!(index.len(), 2);
        let closest = index.closest(&Region::new("chr2", 250, 260)).unwrap();
        assert_eq!(closest.pos, 300);
    }

    #[rstest]
    fn test_bad_gtf_line() {
        let mut file = tempfile::Builder::new().suffix(".gtf").tempfile().unwrap();
        writeln!(file, "chr1\ttest\tgene\tx\t2000\t.\t+\t.\t.").unwrap();
        assert!(read_tss(file.path()).is_err());
    }
}
