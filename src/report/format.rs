//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use crate::annotate::AnnotationSummary;
use crate::app::pipeline::FileRun;
use crate::domain::FitKind;
use crate::fit::ModelRegistry;

/// Per-file summary: ingest bookkeeping, model counts, and rejected subgroups.
pub fn format_file_summary(run: &FileRun) -> String {
    let ingest = &run.ingest;
    let build = &run.build;
    let mut out = String::new();

    out.push_str(&format!("=== ecn - {} ===\n", run.path.display()));
    out.push_str(&format!(
        "Rows: read={} used={} | non-numeric={} duplicates={} errors={} unclassified={}\n",
        ingest.rows_read,
        ingest.rows_used(),
        ingest.dropped_non_numeric,
        ingest.dropped_duplicates,
        ingest.row_errors.len(),
        ingest.dropped_unclassified,
    ));
    if ingest.rt_column == crate::io::ingest::RtColumn::TopRt {
        out.push_str("Retention time read from TopRT.\n");
    }
    if ingest.composition_from_name {
        out.push_str("Composition parsed from species names.\n");
    }
    out.push_str(&format!(
        "Subgroups: {} | linear={} quadratic={} rejected={}\n",
        build.subgroups.len(),
        build.registry.count_kind(FitKind::Linear),
        build.registry.count_kind(FitKind::Quadratic),
        build.rejected().count(),
    ));

    let rejected: Vec<_> = build.rejected().collect();
    if !rejected.is_empty() {
        out.push_str("\nRejected:\n");
        for (s, why) in rejected {
            out.push_str(&format!(
                "  {:<10} db={:<2} n={}/{} {}\n",
                truncate(&s.ontology, 10),
                s.double_bonds,
                s.n_in_range,
                s.n_raw,
                why.describe()
            ));
        }
    }

    match run.written.as_slice() {
        [] => out.push_str("\nNo output written.\n"),
        files => {
            out.push_str("\nWrote:\n");
            for f in files {
                out.push_str(&format!("  {}\n", f.display()));
            }
        }
    }
    out
}

/// Table of accepted models.
pub fn format_models_table(registry: &ModelRegistry) -> String {
    let mut out = String::new();
    if registry.is_empty() {
        return out;
    }

    out.push_str(
        format!(
            "{:<10} {:>3} {:<10} {:>6} {:>7} {}",
            "ontology", "db", "model", "R2", "points", "equation"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!("{:-<10} {:-<3} {:-<10} {:-<6} {:-<7} {:-<8}\n", "", "", "", "", "", ""));

    for r in registry.records() {
        out.push_str(&format!(
            "{:<10} {:>3} {:<10} {:>6.3} {:>7} {}\n",
            truncate(&r.ontology, 10),
            r.double_bonds,
            r.fit_kind().display_name(),
            r.r_squared,
            format!("{}/{}", r.surviving_x.len(), r.raw_x.len()),
            r.equation,
        ));
    }
    out
}

pub fn format_annotation_summary(summary: &AnnotationSummary, kept: usize) -> String {
    format!(
        "Annotated {kept} of {} rows (no model: {}, outside tolerance: {}, superseded: {})",
        summary.rows_in, summary.without_model, summary.outside_tolerance, summary.superseded
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::domain::{EcnModel, ModelRecord, Rejection};
    use crate::fit::{BuildOutput, SubgroupReport};
    use crate::io::ingest::IngestedData;

    fn record(ontology: &str, db: i64, model: EcnModel) -> ModelRecord {
        ModelRecord {
            ontology: ontology.to_string(),
            double_bonds: db,
            equation: model.equation(),
            model,
            r_squared: 0.998,
            raw_x: vec![32.0, 34.0, 36.0, 38.0],
            raw_y: vec![10.0, 11.0, 12.0, 13.5],
            surviving_x: vec![32.0, 34.0, 36.0],
            surviving_y: vec![10.0, 11.0, 12.0],
        }
    }

    fn run() -> FileRun {
        let registry = [
            record("PC", 0, EcnModel::linear(0.5, -6.0)),
            record("PE", 1, EcnModel::quadratic(0.01, 0.2, 1.0)),
        ]
        .into_iter()
        .collect::<ModelRegistry>();
        let rejected = SubgroupReport {
            ontology: "TG".to_string(),
            double_bonds: 4,
            n_raw: 3,
            n_in_range: 1,
            global_slope: None,
            rounds: 0,
            result: Err(Rejection::TooFewSamples),
        };
        FileRun {
            path: PathBuf::from("mix.csv"),
            ingest: IngestedData {
                rows_read: 12,
                dropped_non_numeric: 1,
                ..IngestedData::default()
            },
            build: BuildOutput {
                registry,
                subgroups: vec![rejected],
            },
            written: vec![],
        }
    }

    #[test]
    fn summary_lists_counts_and_rejections() {
        let text = format_file_summary(&run());
        assert!(text.contains("read=12 used=0 | non-numeric=1"));
        assert!(text.contains("errors=0 unclassified=0"));
        assert!(!text.contains("TopRT"));
        assert!(text.contains("linear=1 quadratic=1 rejected=1"));
        assert!(text.contains("TG"));
        assert!(text.contains("too few samples in range"));
        assert!(text.contains("No output written."));
    }

    #[test]
    fn table_has_one_line_per_model() {
        let text = format_models_table(&run().build.registry);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("PC"));
        assert!(lines[2].contains("Linear"));
        assert!(lines[2].contains("3/4"));
        assert!(lines[3].contains("y = 0.0100x^2 + 0.2000x + 1.0000"));
    }

    #[test]
    fn empty_registry_prints_nothing() {
        assert!(format_models_table(&ModelRegistry::new()).is_empty());
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("LPC", 10), "LPC");
        assert_eq!(truncate("HexCer_NDS", 5), "HexC.");
    }
}
