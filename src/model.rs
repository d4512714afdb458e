use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One extracted document as handed over by the external extraction step.
/// The engine never re-parses PDFs; `metrics` carries whatever the extractor
/// pulled out, keyed by its raw field names.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub filename: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub metrics: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub doc_type: Option<DocumentType>,
    /// Optional free-text insight from the external AI enrichment step.
    /// Additive only; never load-bearing for scores or labels.
    #[serde(default)]
    pub supplementary_insight: Option<String>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Report,
    ManagementPlan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsManifest {
    pub documents: Vec<DocumentRecord>,
}

/// Lake identity and reporting year for one document. Absent fields stay
/// `None`; zero/empty-string are never used as "not found" values.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedMetadata {
    pub document_id: String,
    pub lake_name_raw: Option<String>,
    pub lake_name_canonical: Option<String>,
    pub year: Option<i32>,
}

impl ResolvedMetadata {
    pub fn is_groupable(&self) -> bool {
        self.lake_name_canonical.is_some() && self.year.is_some()
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendResult {
    pub parameter: String,
    pub slope: f64,
    pub intercept: f64,
    /// Two-sided t-test probability for the slope; `None` when fewer than
    /// 3 points were available.
    pub p_value: Option<f64>,
    /// `None` when the first observed value is zero.
    pub percent_change: Option<f64>,
    pub direction: TrendDirection,
    pub observations: usize,
    pub first_value: f64,
    pub last_value: f64,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum Trajectory {
    #[serde(rename = "Significant Improvement")]
    SignificantImprovement,
    #[serde(rename = "Gradual Improvement")]
    GradualImprovement,
    #[serde(rename = "Stable")]
    Stable,
    #[serde(rename = "Gradual Degradation")]
    GradualDegradation,
    #[serde(rename = "Significant Degradation")]
    SignificantDegradation,
}

impl Trajectory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SignificantImprovement => "Significant Improvement",
            Self::GradualImprovement => "Gradual Improvement",
            Self::Stable => "Stable",
            Self::GradualDegradation => "Gradual Degradation",
            Self::SignificantDegradation => "Significant Degradation",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentRecord {
    pub lake_name: String,
    pub years: Vec<i32>,
    pub reports_analyzed: usize,
    pub year_range: String,
    pub trend_results: Vec<TrendResult>,
    pub overall_trajectory: Trajectory,
    /// Normalized composite improvement score in [-1, 1].
    pub composite_score: f64,
    pub scored_parameters: usize,
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ComplianceResult {
    pub document_id: String,
    pub score: i64,
    pub present_critical: BTreeSet<String>,
    pub missing_critical: BTreeSet<String>,
    pub present_problematic: BTreeSet<String>,
    pub present_calculations: BTreeSet<String>,
    pub missing_calculations: BTreeSet<String>,
    pub unknown_metrics: Vec<String>,
}

/// Per-document and per-lake conditions surfaced alongside partial results.
/// None of these abort a batch.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    UnresolvedMetadata {
        document_id: String,
        missing_year: bool,
        missing_lake_name: bool,
    },
    InsufficientData {
        lake_name: String,
        distinct_years: usize,
    },
    AmbiguousGrouping {
        left: String,
        right: String,
    },
    UndefinedStatistic {
        lake_name: String,
        parameter: String,
        statistic: String,
        reason: String,
    },
    MalformedDocument {
        document_id: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessRunManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub mode: String,
    pub rules_source: String,
    pub document_count: usize,
    pub lake_count: usize,
    pub compliance_results: Vec<ComplianceResult>,
    pub assessments: Vec<AssessmentRecord>,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreRunManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub rules_source: String,
    pub document_count: usize,
    pub results: Vec<ScoredDocument>,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub result: ComplianceResult,
    pub compliance_level: &'static str,
}
