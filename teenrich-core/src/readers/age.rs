use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use anyhow::Result;

use crate::models::{AgeLabels, RepeatElement};
use crate::utils::{get_dynamic_reader, parse_error};

///
/// Age categories per repeat name.
///
/// File format: tab separated `name  scheme1  scheme2`; `-` or an empty
/// column means no category under that scheme. Lines starting with `#` are
/// comments.
///
#[derive(Debug, Clone, Default)]
pub struct AgeTable {
    by_name: HashMap<String, AgeLabels>,
}

impl TryFrom<&Path> for AgeTable {
    type Error = anyhow::Error;

    fn try_from(path: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(path)?;
        let mut by_name = HashMap::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            if fields.len() < 2 {
                return Err(parse_error("age table", path, idx, "expected name and at least one category").into());
            }
            let label = |i: usize| {
                fields
                    .get(i)
                    .filter(|v| !v.is_empty() && **v != "-")
                    .map(|v| v.to_string())
            };
            by_name.insert(
                fields[0].to_string(),
                AgeLabels {
                    primary: label(1),
                    secondary: label(2),
                },
            );
        }
        Ok(AgeTable { by_name })
    }
}

impl From<HashMap<String, AgeLabels>> for AgeTable {
    fn from(by_name: HashMap<String, AgeLabels>) -> Self {
        AgeTable { by_name }
    }
}

impl AgeTable {
    pub fn get(&self, name: &str) -> Option<&AgeLabels> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Attach labels to every element whose name is in the table. Returns the
    /// number of labelled elements.
    pub fn apply(&self, elements: &mut [RepeatElement]) -> usize {
        let mut labelled = 0;
        for element in elements.iter_mut() {
            if let Some(labels) = self.by_name.get(&element.name) {
                element.age = labels.clone();
                labelled += 1;
            }
        }
        labelled
    }
}
