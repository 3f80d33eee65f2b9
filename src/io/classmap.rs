//! LipidSearch class mapping.
//!
//! LipidSearch names lipid classes with a `ClassKey` / `SubClassKey` pair,
//! while models are keyed by `Ontology`. An index table maps one onto the
//! other. The same pass drops adducts that are not annotated: `M+H` for TG and
//! DG, and `M+HCOO` for every class.
//!
//! The output keeps every input column and fills (or appends) `Ontology`.
//! Unmapped rows keep an empty `Ontology` and are skipped later by ingest.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::StringRecord;
use log::debug;

use crate::error::IngestError;
use crate::io::ingest::{build_header_map, get_optional};

const COL_CLASS_KEY: &str = "classkey";
const COL_SUBCLASS_KEY: &str = "subclasskey";
const COL_ONTOLOGY: &str = "ontology";
const COL_ADDUCT: &str = "adduct";

/// `(ClassKey, SubClassKey) -> Ontology` lookup table.
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    entries: HashMap<(String, String), String>,
}

impl ClassIndex {
    pub fn load(path: &Path) -> Result<Self, IngestError> {
        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::read(file)
    }

    /// Read an index CSV with `ClassKey`, `SubClassKey` and `Ontology` columns.
    ///
    /// Rows without an ontology are ignored; the first row for a key wins.
    pub fn read<R: Read>(reader: R) -> Result<Self, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let header_map = build_header_map(reader.headers()?);
        require(&header_map, &[("ClassKey", COL_CLASS_KEY), ("SubClassKey", COL_SUBCLASS_KEY), ("Ontology", COL_ONTOLOGY)])?;

        let mut entries = HashMap::new();
        for record in reader.records() {
            let record = record?;
            let Some(ontology) = get_optional(&record, &header_map, COL_ONTOLOGY) else {
                continue;
            };
            entries.entry(class_pair(&record, &header_map)).or_insert_with(|| ontology.to_string());
        }
        Ok(Self { entries })
    }

    pub fn lookup(&self, class_key: &str, subclass_key: &str) -> Option<&str> {
        self.entries
            .get(&(class_key.to_string(), subclass_key.to_string()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<((String, String), String)> for ClassIndex {
    fn from_iter<T: IntoIterator<Item = ((String, String), String)>>(iter: T) -> Self {
        let mut entries = HashMap::new();
        for (key, ontology) in iter {
            entries.entry(key).or_insert(ontology);
        }
        Self { entries }
    }
}

/// What a mapping pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMapSummary {
    pub rows_read: usize,
    pub dropped_adducts: usize,
    pub unmatched: usize,
}

/// True for adducts that are removed before annotation.
pub fn is_excluded_adduct(class_key: &str, adduct: &str) -> bool {
    match adduct.trim() {
        "M+HCOO" => true,
        "M+H" => matches!(class_key, "TG" | "DG"),
        _ => false,
    }
}

/// Map classes of a LipidSearch table read from `reader` and write it to `writer`.
pub fn map_classes<R: Read, W: Write>(
    reader: R,
    writer: W,
    index: &ClassIndex,
) -> Result<ClassMapSummary, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let header_map = build_header_map(&headers);
    require(&header_map, &[("ClassKey", COL_CLASS_KEY), ("SubClassKey", COL_SUBCLASS_KEY)])?;

    let ontology_idx = header_map.get(COL_ONTOLOGY).copied();
    let mut out_headers = headers.clone();
    if ontology_idx.is_none() {
        out_headers.push_field("Ontology");
    }

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&out_headers)?;

    let mut summary = ClassMapSummary::default();
    for record in reader.records() {
        let record = record?;
        summary.rows_read += 1;

        let (class_key, subclass_key) = class_pair(&record, &header_map);
        let adduct = get_optional(&record, &header_map, COL_ADDUCT).unwrap_or("");
        if is_excluded_adduct(&class_key, adduct) {
            summary.dropped_adducts += 1;
            continue;
        }

        let ontology = match index.lookup(&class_key, &subclass_key) {
            Some(o) => o,
            None => {
                debug!("no ontology for ClassKey={class_key} SubClassKey={subclass_key}");
                summary.unmatched += 1;
                ""
            }
        };

        let mut fields: Vec<&str> = record.iter().collect();
        fields.resize(headers.len(), "");
        match ontology_idx {
            Some(i) => fields[i] = ontology,
            None => fields.push(ontology),
        }
        csv.write_record(&fields)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(summary)
}

/// File wrapper around [`map_classes`].
pub fn map_classes_file(input: &Path, output: &Path, index: &ClassIndex) -> Result<ClassMapSummary, IngestError> {
    let reader = File::open(input).map_err(|source| IngestError::Io {
        path: input.display().to_string(),
        source,
    })?;
    let writer = File::create(output).map_err(|source| IngestError::Io {
        path: output.display().to_string(),
        source,
    })?;
    map_classes(reader, writer, index)
}

fn class_pair(record: &StringRecord, header_map: &HashMap<String, usize>) -> (String, String) {
    let get = |col: &str| get_optional(record, header_map, col).unwrap_or("").to_string();
    (get(COL_CLASS_KEY), get(COL_SUBCLASS_KEY))
}

fn require(header_map: &HashMap<String, usize>, columns: &[(&str, &str)]) -> Result<(), IngestError> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|(_, key)| !header_map.contains_key(*key))
        .map(|(label, _)| label.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(IngestError::MissingColumns(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ClassIndex {
        ClassIndex::read(
            "ClassKey,SubClassKey,Ontology\n\
             PC,PC,PC\n\
             PE,Plasmenyl,EtherPE\n\
             TG,TG,TG\n\
             TG,TG,Duplicate\n\
             LPC,LPC,\n"
                .as_bytes(),
        )
        .unwrap()
    }

    fn run(input: &str) -> (ClassMapSummary, String) {
        let mut out = Vec::new();
        let summary = map_classes(input.as_bytes(), &mut out, &index()).unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    #[test]
    fn index_keeps_first_mapping_and_skips_blank_ontology() {
        let idx = index();
        assert_eq!(idx.len(), 3);
        assert_eq!(idx.lookup("TG", "TG"), Some("TG"));
        assert_eq!(idx.lookup("PE", "Plasmenyl"), Some("EtherPE"));
        assert_eq!(idx.lookup("LPC", "LPC"), None);
    }

    #[test]
    fn adduct_rules() {
        assert!(is_excluded_adduct("TG", "M+H"));
        assert!(is_excluded_adduct("DG", " M+H "));
        assert!(!is_excluded_adduct("PC", "M+H"));
        assert!(is_excluded_adduct("PC", "M+HCOO"));
        assert!(!is_excluded_adduct("TG", "M+NH4"));
    }

    #[test]
    fn appends_ontology_and_filters_adducts() {
        let (summary, text) = run(
            "LipidMolec,ClassKey,SubClassKey,Adduct,TopRT\n\
             PC(16:0_18:1),PC,PC,M+H,10.5\n\
             TG(16:0_18:1_18:2),TG,TG,M+H,20.0\n\
             TG(16:0_18:1_18:2),TG,TG,M+NH4,20.1\n\
             PC(16:0_18:1),PC,PC,M+HCOO,10.5\n\
             PE(P-18:0_20:4),PE,Plasmenyl,M+H,11.0\n\
             Cer(d18:1_16:0),Cer,Cer,M+H,9.0\n",
        );
        assert_eq!(
            summary,
            ClassMapSummary {
                rows_read: 6,
                dropped_adducts: 2,
                unmatched: 1,
            }
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "LipidMolec,ClassKey,SubClassKey,Adduct,TopRT,Ontology");
        assert_eq!(lines[1], "PC(16:0_18:1),PC,PC,M+H,10.5,PC");
        assert_eq!(lines[2], "TG(16:0_18:1_18:2),TG,TG,M+NH4,20.1,TG");
        assert_eq!(lines[3], "PE(P-18:0_20:4),PE,Plasmenyl,M+H,11.0,EtherPE");
        assert_eq!(lines[4], "Cer(d18:1_16:0),Cer,Cer,M+H,9.0,");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn overwrites_existing_ontology_column() {
        let (_, text) = run("ClassKey,SubClassKey,Ontology\nPC,PC,stale\n");
        assert_eq!(text.lines().nth(1), Some("PC,PC,PC"));
    }

    #[test]
    fn class_columns_are_required() {
        let mut out = Vec::new();
        match map_classes("ClassKey,TopRT\nPC,1.0\n".as_bytes(), &mut out, &index()) {
            Err(IngestError::MissingColumns(cols)) => assert_eq!(cols, vec!["SubClassKey".to_string()]),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }
}
