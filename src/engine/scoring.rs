use std::collections::BTreeMap;

use crate::model::ComplianceResult;
use crate::rules::RuleConfig;

/// Scores one document's normalized parameters against the weighted rubric.
/// A pure fold over the rule list: identical parameters and rules always
/// produce the identical result.
pub fn score_document(
    document_id: &str,
    parameters: &BTreeMap<String, f64>,
    unknown_metrics: &[String],
    rules: &RuleConfig,
) -> ComplianceResult {
    let mut result = ComplianceResult {
        document_id: document_id.to_string(),
        score: 0,
        present_critical: Default::default(),
        missing_critical: Default::default(),
        present_problematic: Default::default(),
        present_calculations: Default::default(),
        missing_calculations: Default::default(),
        unknown_metrics: unknown_metrics.to_vec(),
    };

    for rule in &rules.critical_parameters {
        if parameters.contains_key(&rule.key) {
            result.score += rule.weight;
            result.present_critical.insert(rule.key.clone());
        } else {
            result.score -= rule.weight;
            result.missing_critical.insert(rule.key.clone());
        }
    }

    // A calculation counts only when the derived value exists alongside
    // every input it is derived from.
    for rule in &rules.critical_calculations {
        let derived_present = parameters.contains_key(&rule.key);
        let inputs_present = rule
            .inputs
            .iter()
            .all(|input| parameters.contains_key(input));

        if derived_present && inputs_present {
            result.score += rule.weight;
            result.present_calculations.insert(rule.key.clone());
        } else {
            result.score -= rule.weight;
            result.missing_calculations.insert(rule.key.clone());
        }
    }

    for rule in &rules.problematic_parameters {
        if parameters.contains_key(&rule.key) {
            result.score -= rule.weight;
            result.present_problematic.insert(rule.key.clone());
        }
    }

    result
}
