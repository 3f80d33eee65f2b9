//! Per-ontology carbon-number windows.
//!
//! Carbon numbers outside a lipid class's plausible range are dropped (never
//! clipped) before any regression sees them. Ontologies without a window pass
//! through untouched.

use std::collections::BTreeMap;

use crate::domain::{RangeWindow, Sample};

const LYSO: RangeWindow = RangeWindow::new(10, 23);
const SPHINGOMYELIN: RangeWindow = RangeWindow::new(26, 50);
const TRIACYLGLYCEROL: RangeWindow = RangeWindow::new(30, 72);
const DIACYL: RangeWindow = RangeWindow::new(25, 48);

const LYSO_CLASSES: [&str; 12] = [
    "EtherLPA", "EtherLPC", "EtherLPE", "EtherLPI", "EtherLPG", "EtherLPS", "LPA", "LPC", "LPE",
    "LPI", "LPG", "LPS",
];

const DIACYL_CLASSES: [&str; 13] = [
    "DG", "EtherPA", "EtherPC", "EtherPE", "EtherPI", "EtherPG", "EtherPS", "PA", "PC", "PE", "PI",
    "PG", "PS",
];

/// Built-in window for an ontology, if it has one.
pub fn default_window(ontology: &str) -> Option<RangeWindow> {
    if LYSO_CLASSES.contains(&ontology) {
        Some(LYSO)
    } else if ontology == "SM" {
        Some(SPHINGOMYELIN)
    } else if ontology == "TG" {
        Some(TRIACYLGLYCEROL)
    } else if DIACYL_CLASSES.contains(&ontology) {
        Some(DIACYL)
    } else {
        None
    }
}

/// Ontology → window lookup: the built-in table plus optional overrides.
#[derive(Debug, Clone, Default)]
pub struct RangeTable {
    overrides: BTreeMap<String, RangeWindow>,
}

impl RangeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: BTreeMap<String, RangeWindow>) -> Self {
        Self { overrides }
    }

    pub fn window(&self, ontology: &str) -> Option<RangeWindow> {
        self.overrides
            .get(ontology)
            .copied()
            .or_else(|| default_window(ontology))
    }

    /// Keep only samples whose carbon number lies inside the ontology's window.
    pub fn filter(&self, ontology: &str, samples: &[Sample]) -> Vec<Sample> {
        match self.window(ontology) {
            Some(w) => samples.iter().filter(|s| w.contains(s.carbon)).cloned().collect(),
            None => samples.to_vec(),
        }
    }
}
