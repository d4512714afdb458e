use anyhow::Result;
use tracing::{info, warn};

use crate::cli::ScoreArgs;
use crate::engine;
use crate::model::{DocumentsManifest, ScoreRunManifest, ScoredDocument};
use crate::rules::RuleConfig;
use crate::util::{now_utc_string, print_json_pretty, read_json_file, write_json_pretty};

pub fn run(args: ScoreArgs) -> Result<()> {
    let (rules, rules_source) = RuleConfig::load(args.rules.as_deref())?;
    for warning in rules.validate()? {
        warn!(warning = %warning, "rule configuration warning");
    }

    let manifest: DocumentsManifest = read_json_file(&args.documents)?;
    info!(
        documents = manifest.documents.len(),
        rules = %rules_source,
        "loaded documents manifest"
    );

    let outcome = engine::assess_batch(&manifest.documents, &rules, false);
    let max_score = max_possible_score(&rules);

    let results: Vec<ScoredDocument> = outcome
        .compliance_results
        .into_iter()
        .map(|result| {
            let compliance_level = compliance_level(result.score, max_score);
            ScoredDocument {
                result,
                compliance_level,
            }
        })
        .collect();

    let run_manifest = ScoreRunManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        rules_source,
        document_count: outcome.document_count,
        results,
        conditions: outcome.conditions,
    };

    info!(
        scored = run_manifest.results.len(),
        conditions = run_manifest.conditions.len(),
        "compliance scoring complete"
    );

    match &args.output {
        Some(path) => {
            write_json_pretty(path, &run_manifest)?;
            info!(path = %path.display(), "wrote score manifest");
            Ok(())
        }
        None => print_json_pretty(&run_manifest),
    }
}

fn max_possible_score(rules: &RuleConfig) -> i64 {
    let critical: i64 = rules.critical_parameters.iter().map(|rule| rule.weight).sum();
    let calculations: i64 = rules
        .critical_calculations
        .iter()
        .map(|rule| rule.weight)
        .sum();
    critical + calculations
}

/// Descriptive banding for human consumption; the raw score stays unclamped
/// in the result itself.
fn compliance_level(score: i64, max_possible: i64) -> &'static str {
    if max_possible <= 0 {
        return "failing";
    }

    let percentage = (score.max(0) as f64 / max_possible as f64) * 100.0;
    if percentage >= 80.0 {
        "excellent"
    } else if percentage >= 60.0 {
        "good"
    } else if percentage >= 40.0 {
        "fair"
    } else if percentage >= 20.0 {
        "poor"
    } else {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compliance_level_bands_follow_percentage_of_max() {
        assert_eq!(compliance_level(65, 65), "excellent");
        assert_eq!(compliance_level(40, 65), "good");
        assert_eq!(compliance_level(30, 65), "fair");
        assert_eq!(compliance_level(15, 65), "poor");
        assert_eq!(compliance_level(0, 65), "failing");
        assert_eq!(compliance_level(-60, 65), "failing");
    }

    #[test]
    fn default_rules_max_score_counts_criticals_and_calculations() {
        let rules = RuleConfig::default();
        assert_eq!(max_possible_score(&rules), 65);
    }
}
