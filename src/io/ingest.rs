//! CSV ingest and normalization.
//!
//! This module is responsible for turning a lipid measurement table into a
//! clean list of `(ontology, carbon, double bonds, rt)` samples that are safe
//! to fit.
//!
//! Design goals:
//! - **Strict schema** for required columns (a file missing them is skipped)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (input order is preserved)
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::warn;

use crate::data::species::parse_composition;
use crate::domain::Sample;
use crate::error::IngestError;

const COL_ONTOLOGY: &str = "ontology";
const COL_CARBON: &str = "carbon number";
const COL_DOUBLE_BOND: &str = "double bond number";
const COL_RT: &str = "rt (min)";
const COL_NAME: &str = "name";
const COL_GROUP_KEY: &str = "lipidgroupkey";
const COL_LIPID_MOLEC: &str = "lipidmolec";
const COL_TOP_RT: &str = "toprt";
const COL_HEIGHT: &str = "height";

/// Ingest switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Keep only the maximum-height row per (ontology, carbon, double bonds).
    pub dedup_height: bool,
}

/// Which column supplied the observed retention time.
///
/// MS-DIAL exports carry `RT (min)`; LipidSearch exports carry `TopRT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RtColumn {
    #[default]
    RtMin,
    TopRt,
}

impl RtColumn {
    fn key(self) -> &'static str {
        match self {
            RtColumn::RtMin => COL_RT,
            RtColumn::TopRt => COL_TOP_RT,
        }
    }
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// One accepted measurement row.
#[derive(Debug, Clone)]
pub struct MeasuredRow {
    pub line: usize,
    pub name: Option<String>,
    pub height: Option<f64>,
    pub sample: Sample,
}

/// Ingest output: accepted rows + bookkeeping about what was dropped.
#[derive(Debug, Clone, Default)]
pub struct IngestedData {
    pub rows: Vec<MeasuredRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Rows whose carbon number was missing or not an integer.
    pub dropped_non_numeric: usize,
    /// Rows removed by max-height deduplication.
    pub dropped_duplicates: usize,
    /// Rows with an empty `Ontology` (e.g. a class the index could not map).
    pub dropped_unclassified: usize,
    /// True when carbon/double-bond numbers were parsed from a name column.
    pub composition_from_name: bool,
    pub rt_column: RtColumn,
}

impl IngestedData {
    pub fn samples(&self) -> Vec<Sample> {
        self.rows.iter().map(|r| r.sample.clone()).collect()
    }

    pub fn rows_used(&self) -> usize {
        self.rows.len()
    }
}

/// Load and normalize a CSV file.
pub fn load_samples(path: &Path, opts: &IngestOptions) -> Result<IngestedData, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_samples(file, opts)
}

/// Normalize CSV content from any reader.
pub fn read_samples<R: Read>(reader: R, opts: &IngestOptions) -> Result<IngestedData, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let header_map = build_header_map(&headers);
    let layout = resolve_layout(&header_map, opts)?;

    let mut out = IngestedData {
        composition_from_name: layout.name_for_composition,
        rt_column: layout.rt_column,
        ..IngestedData::default()
    };

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        out.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                out.row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        if get_optional(&record, &header_map, COL_ONTOLOGY).is_none() {
            out.dropped_unclassified += 1;
            continue;
        }

        match parse_row(&record, &header_map, &layout, line) {
            Ok(Some(row)) => out.rows.push(row),
            Ok(None) => out.dropped_non_numeric += 1,
            Err(message) => out.row_errors.push(RowError { line, message }),
        }
    }

    if opts.dedup_height {
        let before = out.rows.len();
        out.rows = keep_max_height(std::mem::take(&mut out.rows));
        out.dropped_duplicates = before - out.rows.len();
    }

    for e in &out.row_errors {
        warn!("line {}: {}", e.line, e.message);
    }

    Ok(out)
}

/// Which columns supply each field.
#[derive(Debug, Clone)]
struct Layout {
    rt_column: RtColumn,
    /// Species label used for reporting and per-name selection.
    label_col: Option<&'static str>,
    /// Column parsed for composition when the numeric columns are absent.
    composition_col: Option<&'static str>,
    name_for_composition: bool,
    height: bool,
}

pub(crate) fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}').trim();
    name.to_lowercase()
}

fn resolve_layout(header_map: &HashMap<String, usize>, opts: &IngestOptions) -> Result<Layout, IngestError> {
    let mut missing = Vec::new();
    if !header_map.contains_key(COL_ONTOLOGY) {
        missing.push("Ontology".to_string());
    }
    let rt_column = if header_map.contains_key(COL_RT) {
        RtColumn::RtMin
    } else if header_map.contains_key(COL_TOP_RT) {
        RtColumn::TopRt
    } else {
        missing.push("RT (min)".to_string());
        RtColumn::RtMin
    };

    let first_present = |candidates: &[&'static str]| {
        candidates.iter().copied().find(|c| header_map.contains_key(*c))
    };
    let label_col = first_present(&[COL_NAME, COL_LIPID_MOLEC, COL_GROUP_KEY]);
    let composition_col = first_present(&[COL_NAME, COL_GROUP_KEY]);

    let has_numeric = header_map.contains_key(COL_CARBON) && header_map.contains_key(COL_DOUBLE_BOND);
    if !has_numeric && composition_col.is_none() {
        if !header_map.contains_key(COL_CARBON) {
            missing.push("Carbon number".to_string());
        }
        if !header_map.contains_key(COL_DOUBLE_BOND) {
            missing.push("Double bond number".to_string());
        }
    }

    let height = header_map.contains_key(COL_HEIGHT);
    if opts.dedup_height && !height {
        missing.push("Height".to_string());
    }

    if !missing.is_empty() {
        return Err(IngestError::MissingColumns(missing));
    }

    Ok(Layout {
        rt_column,
        label_col,
        composition_col,
        name_for_composition: !has_numeric,
        height,
    })
}

/// `Ok(None)` means the row was dropped for a non-numeric carbon number.
fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    layout: &Layout,
    line: usize,
) -> Result<Option<MeasuredRow>, String> {
    let ontology = get_optional(record, header_map, COL_ONTOLOGY)
        .ok_or_else(|| "Missing `Ontology` value.".to_string())?
        .to_string();

    let name = layout
        .label_col
        .and_then(|c| get_optional(record, header_map, c))
        .map(str::to_string);

    let (carbon, double_bonds) = if layout.name_for_composition {
        let composition = layout
            .composition_col
            .and_then(|c| get_optional(record, header_map, c))
            .and_then(parse_composition);
        match composition {
            Some(c) => (c.carbon, c.double_bonds),
            None => return Ok(None),
        }
    } else {
        let Some(carbon) = parse_integer(get_optional(record, header_map, COL_CARBON)) else {
            return Ok(None);
        };
        let double_bonds = parse_integer(get_optional(record, header_map, COL_DOUBLE_BOND))
            .ok_or_else(|| "Missing/invalid `Double bond number` value.".to_string())?;
        (carbon, double_bonds)
    };

    let rt = parse_opt_f64(get_optional(record, header_map, layout.rt_column.key()))
        .ok_or_else(|| "Missing/invalid retention time value.".to_string())?;

    let height = if layout.height {
        parse_opt_f64(get_optional(record, header_map, COL_HEIGHT))
    } else {
        None
    };

    Ok(Some(MeasuredRow {
        line,
        name,
        height,
        sample: Sample::new(ontology, carbon, double_bonds, rt),
    }))
}

/// Keep every row whose height equals its group's maximum, in input order.
///
/// Rows without a height lose to any row that has one.
fn keep_max_height(rows: Vec<MeasuredRow>) -> Vec<MeasuredRow> {
    let key = |r: &MeasuredRow| (r.sample.ontology.clone(), r.sample.carbon, r.sample.double_bonds);
    let height = |r: &MeasuredRow| r.height.unwrap_or(f64::NEG_INFINITY);

    let mut best: HashMap<(String, i64, i64), f64> = HashMap::new();
    for r in &rows {
        let h = height(r);
        best.entry(key(r))
            .and_modify(|m| *m = m.max(h))
            .or_insert(h);
    }

    rows.into_iter()
        .filter(|r| best.get(&key(r)).is_some_and(|&m| height(r) == m))
        .collect()
}

pub(crate) fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Integers may be written as `34` or `34.0` (spreadsheet exports).
fn parse_integer(s: Option<&str>) -> Option<i64> {
    let v = parse_opt_f64(s)?;
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingest(csv: &str, opts: IngestOptions) -> Result<IngestedData, IngestError> {
        read_samples(csv.as_bytes(), &opts)
    }

    #[test]
    fn reads_numeric_columns_case_insensitively() {
        let csv = "\u{feff}ontology,CARBON NUMBER,Double bond number,RT (min)\nPC,34,1,10.5\nPC,36.0,2,11.25\n";
        let data = ingest(csv, IngestOptions::default()).unwrap();
        assert_eq!(data.rows_read, 2);
        assert_eq!(data.samples(), vec![
            Sample::new("PC", 34, 1, 10.5),
            Sample::new("PC", 36, 2, 11.25),
        ]);
        assert!(!data.composition_from_name);
    }

    #[test]
    fn non_numeric_carbon_is_dropped_not_reported() {
        let csv = "Ontology,Carbon number,Double bond number,RT (min)\nPC,abc,1,10.5\nPC,34.5,1,10.5\nPC,34,1,10.5\n";
        let data = ingest(csv, IngestOptions::default()).unwrap();
        assert_eq!(data.rows_used(), 1);
        assert_eq!(data.dropped_non_numeric, 2);
        assert!(data.row_errors.is_empty());
    }

    #[test]
    fn bad_rt_or_double_bond_is_a_row_error() {
        let csv = "Ontology,Carbon number,Double bond number,RT (min)\nPC,34,x,10.5\nPC,34,1,\n";
        let data = ingest(csv, IngestOptions::default()).unwrap();
        assert_eq!(data.rows_used(), 0);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 3]);
    }

    #[test]
    fn missing_columns_are_reported_together() {
        let csv = "Ontology,Carbon number\nPC,34\n";
        match ingest(csv, IngestOptions::default()) {
            Err(IngestError::MissingColumns(cols)) => {
                assert_eq!(cols, vec!["RT (min)".to_string(), "Double bond number".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn composition_falls_back_to_name() {
        let csv = "Name,Ontology,RT (min)\nPC 34:1,PC,10.5\nweird,PC,3.0\n";
        let data = ingest(csv, IngestOptions::default()).unwrap();
        assert!(data.composition_from_name);
        assert_eq!(data.samples(), vec![Sample::new("PC", 34, 1, 10.5)]);
        assert_eq!(data.rows[0].name.as_deref(), Some("PC 34:1"));
        assert_eq!(data.dropped_non_numeric, 1);
    }

    #[test]
    fn lipidsearch_layout_uses_top_rt_and_group_key() {
        let csv = "LipidMolec,LipidGroupKey,Ontology,TopRT\nPC(16:0_18:1),PC34:1,PC,10.5\nPE(18:0_20:4),PE38:4,PE,12.0\n";
        let data = ingest(csv, IngestOptions::default()).unwrap();
        assert_eq!(data.rt_column, RtColumn::TopRt);
        assert!(data.composition_from_name);
        assert_eq!(data.samples(), vec![
            Sample::new("PC", 34, 1, 10.5),
            Sample::new("PE", 38, 4, 12.0),
        ]);
        assert_eq!(data.rows[0].name.as_deref(), Some("PC(16:0_18:1)"));
    }

    #[test]
    fn rows_without_ontology_are_counted_not_reported() {
        let csv = "Ontology,Carbon number,Double bond number,RT (min)\n,34,1,10.0\nPC,34,1,10.0\n";
        let data = ingest(csv, IngestOptions::default()).unwrap();
        assert_eq!(data.rows_used(), 1);
        assert_eq!(data.dropped_unclassified, 1);
        assert!(data.row_errors.is_empty());
    }

    #[test]
    fn rt_min_wins_over_top_rt() {
        let csv = "Ontology,Carbon number,Double bond number,RT (min),TopRT\nPC,34,1,10.5,99\n";
        let data = ingest(csv, IngestOptions::default()).unwrap();
        assert_eq!(data.rt_column, RtColumn::RtMin);
        assert_eq!(data.rows[0].sample.rt, 10.5);
    }

    #[test]
    fn dedup_keeps_max_height_rows() {
        let csv = "Ontology,Carbon number,Double bond number,RT (min),Height\n\
                   PC,34,1,10.0,100\n\
                   PC,34,1,10.4,500\n\
                   PC,36,1,11.0,50\n\
                   PC,34,1,10.2,500\n";
        let data = ingest(csv, IngestOptions { dedup_height: true }).unwrap();
        let rts: Vec<f64> = data.rows.iter().map(|r| r.sample.rt).collect();
        assert_eq!(rts, vec![10.4, 11.0, 10.2]);
        assert_eq!(data.dropped_duplicates, 1);
    }

    #[test]
    fn dedup_requires_height_column() {
        let csv = "Ontology,Carbon number,Double bond number,RT (min)\nPC,34,1,10.0\n";
        assert!(matches!(
            ingest(csv, IngestOptions { dedup_height: true }),
            Err(IngestError::MissingColumns(_))
        ));
    }
}
