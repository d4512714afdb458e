use tracing::info;

use crate::model::{
    AssessmentRecord, ComplianceResult, Condition, DocumentRecord, ResolvedMetadata,
};
use crate::rules::RuleConfig;
use crate::util::sha256_hex;

use super::grouping::{self, LakeGroup};
use super::metadata;
use super::normalize::{self, NormalizedParameters};
use super::scoring;
use super::trajectory;
use super::trend;

/// Groups with fewer distinct years than this never enter trend analysis.
const MINIMUM_YEARS_FOR_TRENDS: usize = 3;

/// The document's own compliance score is trended alongside its measured
/// parameters, so multi-year reporting quality shows up in the trajectory.
const COMPLIANCE_SCORE_PARAMETER: &str = "compliance_score";

#[derive(Debug, Clone)]
pub struct BatchAssessment {
    pub document_count: usize,
    pub lake_count: usize,
    pub compliance_results: Vec<ComplianceResult>,
    pub assessments: Vec<AssessmentRecord>,
    pub conditions: Vec<Condition>,
}

struct DocumentAnalysis {
    index: usize,
    metadata: ResolvedMetadata,
    normalized: NormalizedParameters,
    compliance_score: i64,
}

/// Runs the full assessment over one batch: every document is normalized and
/// compliance-scored independently, then documents are grouped by lake and
/// each group with enough distinct years gets a trend assessment. All
/// per-document and per-lake failures surface as conditions; nothing here
/// aborts the batch.
pub fn assess_batch(
    documents: &[DocumentRecord],
    rules: &RuleConfig,
    trends_enabled: bool,
) -> BatchAssessment {
    let mut compliance_results = Vec::new();
    let mut conditions = Vec::new();
    let mut analyses = Vec::new();

    for (index, document) in documents.iter().enumerate() {
        let document_id = document_id_for(document);

        if document.metrics.is_empty() && document.text.trim().is_empty() {
            conditions.push(Condition::MalformedDocument {
                document_id,
                reason: "document has no metric mapping and no text".to_string(),
            });
            continue;
        }

        let normalized = normalize::normalize_metrics(&document_id, &document.metrics, rules);
        let compliance = scoring::score_document(
            &document_id,
            &normalized.values,
            &normalized.unknown,
            rules,
        );
        info!(
            document_id = %document_id,
            score = compliance.score,
            parameters = normalized.values.len(),
            "scored document"
        );

        let resolved = metadata::resolve_metadata(&document_id, &document.filename, &document.text);
        if trends_enabled && !resolved.is_groupable() {
            conditions.push(Condition::UnresolvedMetadata {
                document_id: resolved.document_id.clone(),
                missing_year: resolved.year.is_none(),
                missing_lake_name: resolved.lake_name_canonical.is_none(),
            });
        }

        analyses.push(DocumentAnalysis {
            index,
            metadata: resolved,
            normalized,
            compliance_score: compliance.score,
        });
        compliance_results.push(compliance);
    }

    let mut assessments = Vec::new();
    let mut lake_count = 0;

    if trends_enabled {
        let items: Vec<(usize, &ResolvedMetadata, &NormalizedParameters)> = analyses
            .iter()
            .map(|analysis| (analysis.index, &analysis.metadata, &analysis.normalized))
            .collect();

        let (groups, ambiguity) = grouping::group_documents(&items);
        conditions.extend(ambiguity);
        lake_count = groups.len();

        for group in &groups {
            let distinct_years = group.distinct_years();
            if !group.resolved || distinct_years.len() < MINIMUM_YEARS_FOR_TRENDS {
                info!(
                    lake = %group.display_name,
                    distinct_years = distinct_years.len(),
                    "insufficient data for trend analysis"
                );
                conditions.push(Condition::InsufficientData {
                    lake_name: group.display_name.clone(),
                    distinct_years: distinct_years.len(),
                });
                continue;
            }

            assessments.push(assess_lake(group, &distinct_years, documents, &analyses, rules, &mut conditions));
        }
    }

    BatchAssessment {
        document_count: documents.len(),
        lake_count,
        compliance_results,
        assessments,
        conditions,
    }
}

fn assess_lake(
    group: &LakeGroup,
    distinct_years: &[i32],
    documents: &[DocumentRecord],
    analyses: &[DocumentAnalysis],
    rules: &RuleConfig,
    conditions: &mut Vec<Condition>,
) -> AssessmentRecord {
    info!(
        lake = %group.display_name,
        reports = group.entries.len(),
        years = distinct_years.len(),
        "running trend analysis"
    );

    let mut entries = group.entries.clone();
    for entry in &mut entries {
        let score = analyses
            .iter()
            .find(|analysis| analysis.index == entry.document_index)
            .map(|analysis| analysis.compliance_score as f64);
        if let Some(score) = score {
            entry
                .parameters
                .insert(COMPLIANCE_SCORE_PARAMETER.to_string(), score);
        }
    }

    let (trend_results, trend_conditions) = trend::analyze_group(&group.display_name, &entries);
    conditions.extend(trend_conditions);

    let summary = trajectory::classify(&trend_results, rules);
    info!(
        lake = %group.display_name,
        trajectory = summary.trajectory.as_str(),
        scored_parameters = summary.scored_parameters,
        "classified lake trajectory"
    );

    let mut key_findings = summary.key_findings;
    for entry in &entries {
        let insight = documents
            .get(entry.document_index)
            .and_then(|document| document.supplementary_insight.as_deref());
        if let Some(insight) = insight {
            key_findings.push(insight.to_string());
        }
    }

    let first_year = distinct_years.first().copied().unwrap_or_default();
    let last_year = distinct_years.last().copied().unwrap_or_default();

    AssessmentRecord {
        lake_name: group.display_name.clone(),
        years: distinct_years.to_vec(),
        reports_analyzed: entries.len(),
        year_range: format!("{first_year} - {last_year}"),
        trend_results,
        overall_trajectory: summary.trajectory,
        composite_score: summary.composite_score,
        scored_parameters: summary.scored_parameters,
        key_findings,
        recommendations: summary.recommendations,
    }
}

/// Stable document identity: the extractor's id when present, otherwise a
/// digest of filename and text.
fn document_id_for(document: &DocumentRecord) -> String {
    match &document.id {
        Some(id) if !id.trim().is_empty() => id.clone(),
        _ => {
            let digest = sha256_hex(&format!("{}\n{}", document.filename, document.text));
            format!("doc-{}", &digest[..12])
        }
    }
}
