use anyhow::Result;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::errors::CoreError;
use crate::models::{Region, Strand};
use crate::utils::get_dynamic_reader;

///
/// One reference feature (e.g. a ChIP-seq peak) with a stable identifier.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct Feature {
    pub id: usize,
    pub region: Region,
    pub name: Option<String>,
}

///
/// FeatureSet struct, the fixed, non-overlapping reference set the repeats
/// are tested against. Feature ids are positions in the sorted set.
///
#[derive(Clone, Debug)]
pub struct FeatureSet {
    pub features: Vec<Feature>,
    pub path: Option<PathBuf>,
}

impl TryFrom<&Path> for FeatureSet {
    type Error = anyhow::Error;

    ///
    /// Create a new [FeatureSet] from a bed file (optionally gzipped).
    ///
    /// Only the first three columns are required; column 4 is kept as the
    /// feature name and column 6 as the strand.
    fn try_from(value: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(value)?;
        let mut regions: Vec<(Region, Option<String>)> = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty()
                || line.starts_with("browser")
                || line.starts_with("track")
                || line.starts_with('#')
            {
                continue;
            }
            let parse_err = |reason: String| CoreError::ParseError {
                kind: "BED",
                path: value.display().to_string(),
                line: idx + 1,
                reason,
            };

            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() < 3 {
                return Err(parse_err(format!("expected at least 3 columns, got {}", parts.len())).into());
            }
            let start: u32 = parts[1]
                .parse()
                .map_err(|_| parse_err(format!("bad start '{}'", parts[1])))?;
            let end: u32 = parts[2]
                .parse()
                .map_err(|_| parse_err(format!("bad end '{}'", parts[2])))?;
            let strand = match parts.get(5) {
                Some(s) => s.parse().map_err(|e: CoreError| parse_err(e.to_string()))?,
                None => Strand::Unstranded,
            };
            let region = Region {
                chr: parts[0].to_string(),
                start,
                end,
                strand,
            };
            region.validate(None).map_err(|e| parse_err(e.to_string()))?;
            let name = parts.get(3).map(|s| s.to_string()).filter(|s| !s.is_empty());
            regions.push((region, name));
        }

        if regions.is_empty() {
            return Err(CoreError::EmptyFile(value.display().to_string()).into());
        }

        let mut fs = FeatureSet::from_named(regions);
        fs.path = Some(value.to_owned());
        fs.check_non_overlapping()?;
        Ok(fs)
    }
}

impl TryFrom<&str> for FeatureSet {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self> {
        FeatureSet::try_from(Path::new(value))
    }
}

impl From<Vec<Region>> for FeatureSet {
    fn from(regions: Vec<Region>) -> Self {
        FeatureSet::from_named(regions.into_iter().map(|r| (r, None)).collect())
    }
}

impl FeatureSet {
    /// Sort by (chr, start, end) and assign ids in that order.
    fn from_named(mut regions: Vec<(Region, Option<String>)>) -> Self {
        regions.sort_by(|(a, _), (b, _)| {
            a.chr
                .cmp(&b.chr)
                .then_with(|| a.start.cmp(&b.start))
                .then_with(|| a.end.cmp(&b.end))
        });
        let features = regions
            .into_iter()
            .enumerate()
            .map(|(id, (region, name))| Feature { id, region, name })
            .collect();
        FeatureSet {
            features,
            path: None,
        }
    }

    ///
    /// Fail when two features share at least one base. Requires the set to be sorted,
    /// which every constructor guarantees.
    ///
    pub fn check_non_overlapping(&self) -> Result<(), CoreError> {
        for pair in self.features.windows(2) {
            let (a, b) = (&pair[0].region, &pair[1].region);
            if a.chr == b.chr && b.start < a.end {
                return Err(CoreError::OverlappingFeatures(a.to_string(), b.to_string()));
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over unique chromosomes in sorted order
    pub fn iter_chroms(&self) -> impl Iterator<Item = &String> {
        let mut chroms: Vec<&String> = self.features.iter().map(|f| &f.region.chr).collect();
        chroms.dedup();
        chroms.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;

    fn get_test_path(file_name: &str) -> PathBuf {
        std::env::current_dir()
            .unwrap()
            .join("../tests/data")
            .join(file_name)
    }

    #[rstest]
    fn test_read_bed() {
        let fs = FeatureSet::try_from(get_test_path("peaks.bed").as_path()).unwrap();
        assert_eq!(fs.len(), 4);
        assert_eq!(fs.features[0].region, Region::new("chr1", 100, 200));
        assert_eq!(fs.features[0].name.as_deref(), Some("peak1"));
        assert_eq!(fs.iter_chroms().count(), 2);
        // ids follow sorted order
        let ids: Vec<usize> = fs.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[rstest]
    fn test_overlapping_features_rejected() {
        let mut file = tempfile::Builder::new().suffix(".bed").tempfile().unwrap();
        writeln!(file, "chr1\t100\t200").unwrap();
        writeln!(file, "chr1\t150\t300").unwrap();
        let err = FeatureSet::try_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[rstest]
    fn test_bad_line_reports_location() {
        let mut file = tempfile::Builder::new().suffix(".bed").tempfile().unwrap();
        writeln!(file, "track name=peaks").unwrap();
        writeln!(file, "chr1\tabc\t200").unwrap();
        let err = FeatureSet::try_from(file.path()).unwrap_err().to_string();
        assert!(err.contains("line 2"));
        assert!(err.contains("abc"));
    }

    #[rstest]
    fn test_adjacent_features_allowed() {
        let fs = FeatureSet::from(vec![
            Region::new("chr1", 200, 300),
            Region::new("chr1", 100, 200),
        ]);
        assert!(fs.check_non_overlapping().is_ok());
        assert_eq!(fs.features[0].region.start, 100);
    }
}
