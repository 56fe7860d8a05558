use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{AnnotationReport, FormulaReport};
use crate::classify::DecisionSource;
use crate::similarity::SimilarityMethod;

/// Counts of a completed run, written next to the output tables
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Unique run identifier
    pub run_id: Uuid,
    /// Run start time
    pub started_at: DateTime<Utc>,
    /// Run end time
    pub finished_at: DateTime<Utc>,
    /// Crate version that produced the output
    pub version: String,
    /// Similarity method of the search stage
    pub method: SimilarityMethod,
    /// Features submitted to the cascade
    pub features: usize,
    /// Input rows rejected at ingestion
    pub ingestion_errors: usize,
    /// Library matches
    pub matched: usize,
    /// Features sent to prediction
    pub unmatched: usize,
    /// Class decisions per source
    pub class_sources: BTreeMap<DecisionSource, usize>,
    /// Records with a name
    pub annotated: usize,
    /// Row failures over all stages
    pub failures: usize,
    /// Formula branch results, when it ran
    pub formulas: Option<usize>,
    /// Whether the run was cancelled
    pub cancelled: bool,
}

impl RunSummary {
    /// Summarize an annotation report
    pub fn new(
        started_at: DateTime<Utc>,
        method: SimilarityMethod,
        ingestion_errors: usize,
        report: &AnnotationReport,
    ) -> Self {
        let mut class_sources = BTreeMap::new();
        for class in &report.prediction.classes {
            *class_sources.entry(class.source).or_insert(0) += 1;
        }
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            method,
            features: report.features,
            ingestion_errors,
            matched: report.search.matched.len(),
            unmatched: report.search.unmatched.len(),
            class_sources,
            annotated: report.records.iter().filter(|r| r.name.is_some()).count(),
            failures: report.failures().count(),
            formulas: None,
            cancelled: report.cancelled,
        }
    }

    /// Add the formula branch counts
    pub fn with_formulas(mut self, formulas: &FormulaReport) -> Self {
        self.formulas = Some(formulas.annotations.len());
        self.failures += formulas.failures.len();
        self.cancelled |= formulas.cancelled;
        self.finished_at = Utc::now();
        self
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Annotated {} of {} features ({} library matches, {} predicted), {} failures",
            self.annotated,
            self.features,
            self.matched,
            self.unmatched,
            self.failures
        )?;
        if self.cancelled {
            write!(f, " [cancelled]")?;
        }
        Ok(())
    }
}
