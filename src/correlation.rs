//! Project-type correlation table: which Dodge project types become CRM leads
//! and which CRM segment code they carry.

use crate::errors::{AppError, ResultExt};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

const COL_PROJECT_TYPE: &str = "Dodge - Sub section";
const COL_INDUSTRY: &str = "CRM - Industry";
const COL_INDUSTRY_CODE: &str = "CRM - Industry Code";
const COL_SEGMENT: &str = "CRM - Segment";
const COL_SEGMENT_CODE: &str = "CRM - Segment Code";
const COL_INCLUDE: &str = "Include";

/// One row of the mapping sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationEntry {
    /// True when the sheet's include flag is `Y`.
    pub include: bool,
    pub segment_code: String,
    pub segment: String,
    pub industry: String,
    pub industry_code: String,
}

/// Project-type name → correlation entry. Built once per run, read-only after.
#[derive(Debug, Clone, Default)]
pub struct CorrelationTable {
    entries: BTreeMap<String, CorrelationEntry>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. The key is trimmed; blank keys are ignored.
    pub fn insert(&mut self, project_type: &str, entry: CorrelationEntry) {
        let key = project_type.trim();
        if key.is_empty() {
            return;
        }
        self.entries.insert(key.to_string(), entry);
    }

    pub fn get(&self, project_type: &str) -> Option<&CorrelationEntry> {
        self.entries.get(project_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Project types flagged for inclusion, used as search criteria.
    pub fn included_types(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.include)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Reads the mapping sheet exported as CSV.
    pub fn from_csv_path(path: &Path) -> Result<Self, AppError> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open mapping file {}", path.display()))?;
        Self::from_csv_reader(file)
    }

    /// Parses mapping rows. Header names are matched after trimming, so the
    /// sheet's trailing-space `CRM - Segment ` column is found too.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, AppError> {
        tracing::info!("Reading property type correlations...");

        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.trim() == name);

        let project_type_col = column(COL_PROJECT_TYPE).ok_or_else(|| {
            AppError::ConfigError(format!("Mapping file is missing '{}' column", COL_PROJECT_TYPE))
        })?;
        let industry_col = column(COL_INDUSTRY);
        let industry_code_col = column(COL_INDUSTRY_CODE);
        let segment_col = column(COL_SEGMENT);
        let segment_code_col = column(COL_SEGMENT_CODE);
        let include_col = column(COL_INCLUDE);

        let mut table = Self::new();
        for record in csv_reader.records() {
            let record = record?;
            let cell = |idx: Option<usize>| {
                idx.and_then(|i| record.get(i))
                    .map(|v| v.trim().to_string())
                    .unwrap_or_default()
            };

            let project_type = cell(Some(project_type_col));
            if project_type.is_empty() {
                continue;
            }

            let include_flag = cell(include_col).to_uppercase();
            table.insert(
                &project_type,
                CorrelationEntry {
                    include: include_flag == "Y",
                    segment_code: cell(segment_code_col),
                    segment: cell(segment_col),
                    industry: cell(industry_col),
                    industry_code: cell(industry_code_col),
                },
            );
        }

        tracing::info!("Found {} property type correlations", table.len());
        Ok(table)
    }
}
