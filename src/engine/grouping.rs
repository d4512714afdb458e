use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Condition, ResolvedMetadata};

use super::normalize::NormalizedParameters;

#[derive(Debug, Clone)]
pub struct GroupEntry {
    pub document_index: usize,
    pub document_id: String,
    /// Singleton entries for unresolved documents may lack a year; entries
    /// of resolved groups always carry one.
    pub year: Option<i32>,
    pub lake_name_raw: Option<String>,
    pub parameters: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct LakeGroup {
    pub key: String,
    /// Display name: the first raw lake name seen for the group, falling
    /// back to the canonical key.
    pub display_name: String,
    pub entries: Vec<GroupEntry>,
    pub resolved: bool,
}

impl LakeGroup {
    pub fn distinct_years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.entries.iter().filter_map(|entry| entry.year).collect();
        years.into_iter().collect()
    }
}

/// Clusters documents by canonical lake name using exact match. Documents
/// without a resolved lake name form singleton groups keyed by document id,
/// which can never qualify for trend analysis; documents with a name but no
/// year cannot join an ordered series and are excluded here (the resolver
/// already reported them). Output order is deterministic regardless of
/// input order.
pub fn group_documents(
    items: &[(usize, &ResolvedMetadata, &NormalizedParameters)],
) -> (Vec<LakeGroup>, Vec<Condition>) {
    let mut groups: BTreeMap<String, LakeGroup> = BTreeMap::new();

    for (document_index, metadata, parameters) in items {
        let (key, resolved) = match (&metadata.lake_name_canonical, metadata.year) {
            (Some(canonical), Some(_)) => (canonical.clone(), true),
            (Some(_), None) => continue,
            (None, _) => (format!("doc:{}", metadata.document_id), false),
        };

        let group = groups.entry(key.clone()).or_insert_with(|| LakeGroup {
            display_name: key.clone(),
            key,
            entries: Vec::new(),
            resolved,
        });
        group.entries.push(GroupEntry {
            document_index: *document_index,
            document_id: metadata.document_id.clone(),
            year: metadata.year,
            lake_name_raw: metadata.lake_name_raw.clone(),
            parameters: parameters.values.clone(),
        });
    }

    let mut groups: Vec<LakeGroup> = groups.into_values().collect();
    for group in &mut groups {
        group.entries.sort_by(|left, right| {
            (left.year, &left.document_id).cmp(&(right.year, &right.document_id))
        });

        // Display name comes from the earliest entry so output is identical
        // for any input order.
        if group.resolved {
            if let Some(raw) = group
                .entries
                .iter()
                .find_map(|entry| entry.lake_name_raw.clone())
            {
                group.display_name = raw;
            }
        } else {
            group.display_name = group
                .entries
                .first()
                .map(|entry| entry.document_id.clone())
                .unwrap_or_else(|| group.key.clone());
        }
    }

    let conditions = detect_ambiguous_names(&groups);
    (groups, conditions)
}

/// Flags pairs of canonical names that plausibly refer to the same lake:
/// identical token sets, or one name containing the other as a whole-word
/// phrase. Reported as warnings, never auto-merged.
fn detect_ambiguous_names(groups: &[LakeGroup]) -> Vec<Condition> {
    let named: Vec<&LakeGroup> = groups.iter().filter(|group| group.resolved).collect();
    let mut conditions = Vec::new();

    for (index, left) in named.iter().enumerate() {
        for right in named.iter().skip(index + 1) {
            if suspected_same_lake(&left.key, &right.key) {
                conditions.push(Condition::AmbiguousGrouping {
                    left: left.key.clone(),
                    right: right.key.clone(),
                });
            }
        }
    }

    conditions
}

fn suspected_same_lake(left: &str, right: &str) -> bool {
    let left_tokens: BTreeSet<&str> = left.split_whitespace().collect();
    let right_tokens: BTreeSet<&str> = right.split_whitespace().collect();
    if left_tokens == right_tokens {
        return true;
    }

    contains_phrase(left, right) || contains_phrase(right, left)
}

fn contains_phrase(haystack: &str, needle: &str) -> bool {
    let padded_haystack = format!(" {haystack} ");
    let padded_needle = format!(" {needle} ");
    padded_haystack.contains(&padded_needle)
}
