use std::collections::BTreeMap;

use regex::Regex;
use tracing::warn;

use crate::rules::RuleConfig;

/// One document's metrics mapped onto the canonical parameter vocabulary.
/// Unmapped raw keys are retained for display, never treated as errors.
#[derive(Debug, Clone, Default)]
pub struct NormalizedParameters {
    pub values: BTreeMap<String, f64>,
    pub unknown: Vec<String>,
}

pub fn normalize_metrics(
    document_id: &str,
    metrics: &BTreeMap<String, serde_json::Value>,
    rules: &RuleConfig,
) -> NormalizedParameters {
    let vocabulary = rules.canonical_vocabulary();
    let mut normalized = NormalizedParameters::default();

    for (raw_key, raw_value) in metrics {
        let folded = fold_metric_key(raw_key);

        let canonical = match rules.synonyms.get(&folded) {
            Some(canonical) => canonical.as_str(),
            None if vocabulary.contains(folded.as_str()) => folded.as_str(),
            None => {
                warn!(document_id, metric = %raw_key, "unknown metric key");
                normalized.unknown.push(raw_key.clone());
                continue;
            }
        };

        let Some(value) = numeric_value(raw_value) else {
            warn!(document_id, metric = %raw_key, "metric value is not numeric");
            normalized.unknown.push(raw_key.clone());
            continue;
        };

        // First mapped raw key wins when two synonyms collide on one
        // canonical parameter; metric maps are ordered, so this stays
        // deterministic.
        if normalized.values.contains_key(canonical) {
            warn!(
                document_id,
                metric = %raw_key,
                canonical,
                "duplicate canonical parameter, keeping first value"
            );
            continue;
        }

        normalized.values.insert(canonical.to_string(), value);
    }

    normalized
}

/// Lowercases and collapses every non-alphanumeric run into one underscore,
/// so `Dissolved Oxygen (min)` and `dissolved_oxygen_min` fold identically.
pub fn fold_metric_key(raw: &str) -> String {
    let mut folded = String::with_capacity(raw.len());
    let mut last_was_separator = true;

    for character in raw.chars() {
        if character.is_ascii_alphanumeric() {
            folded.push(character.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            folded.push('_');
            last_was_separator = true;
        }
    }

    folded.trim_end_matches('_').to_string()
}

/// Accepts JSON numbers directly and pulls the leading numeric token out of
/// unit-suffixed strings such as `"4.2 mg/L"`.
fn numeric_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => {
            let regex = Regex::new(r"-?\d+(?:\.\d+)?").ok()?;
            regex.find(text.trim())?.as_str().parse::<f64>().ok()
        }
        _ => None,
    }
}
