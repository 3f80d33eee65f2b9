//! Collected model records for one input table.

use serde::{Deserialize, Serialize};

use crate::domain::{FitKind, ModelRecord};

/// Accepted models keyed by `(ontology, double bonds)`.
///
/// Records are kept sorted by key so output does not depend on the order in
/// which parallel workers finished.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelRegistry {
    records: Vec<ModelRecord>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ModelRecord) {
        let key = (record.ontology.clone(), record.double_bonds);
        let pos = self
            .records
            .partition_point(|r| (r.ontology.as_str(), r.double_bonds) <= (key.0.as_str(), key.1));
        self.records.insert(pos, record);
    }

    pub fn records(&self) -> &[ModelRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record for the given subgroup.
    pub fn get(&self, ontology: &str, double_bonds: i64) -> Option<&ModelRecord> {
        self.records
            .iter()
            .find(|r| r.ontology == ontology && r.double_bonds == double_bonds)
    }

    pub fn count_kind(&self, kind: FitKind) -> usize {
        self.records.iter().filter(|r| r.fit_kind() == kind).count()
    }
}

impl FromIterator<ModelRecord> for ModelRegistry {
    fn from_iter<T: IntoIterator<Item = ModelRecord>>(iter: T) -> Self {
        let mut registry = ModelRegistry::new();
        for record in iter {
            registry.push(record);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EcnModel;

    fn record(ontology: &str, db: i64) -> ModelRecord {
        let model = EcnModel::linear(1.0, 0.0);
        ModelRecord {
            ontology: ontology.to_string(),
            double_bonds: db,
            equation: model.equation(),
            model,
            r_squared: 1.0,
            raw_x: vec![],
            raw_y: vec![],
            surviving_x: vec![],
            surviving_y: vec![],
        }
    }

    #[test]
    fn records_stay_sorted_by_key() {
        let registry: ModelRegistry =
            [record("TG", 2), record("PC", 1), record("TG", 0), record("PC", 0)]
                .into_iter()
                .collect();
        let keys: Vec<(&str, i64)> = registry
            .records()
            .iter()
            .map(|r| (r.ontology.as_str(), r.double_bonds))
            .collect();
        assert_eq!(keys, vec![("PC", 0), ("PC", 1), ("TG", 0), ("TG", 2)]);
        assert!(registry.get("TG", 2).is_some());
        assert!(registry.get("TG", 1).is_none());
        assert_eq!(registry.count_kind(FitKind::Linear), 4);
    }
}
