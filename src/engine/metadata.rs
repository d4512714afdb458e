use regex::Regex;

use crate::model::ResolvedMetadata;
use crate::util::current_year;

/// Monitoring programs in the corpus do not predate 1990; anything outside
/// this range is treated as a non-year token.
const YEAR_MIN: i32 = 1990;

/// Leading slice of text searched for lake names; full text is searched for
/// years.
const NAME_SEARCH_CHARS: usize = 500;

/// Resolves lake identity and reporting year for one document. Fields that
/// cannot be resolved stay `None`; the orchestrator surfaces those as
/// `unresolved_metadata` conditions per document.
pub fn resolve_metadata(document_id: &str, filename: &str, text: &str) -> ResolvedMetadata {
    let year = resolve_year(filename, text);
    let lake_name_raw = resolve_lake_name(filename, text);
    let lake_name_canonical = lake_name_raw.as_deref().map(canonical_lake_name);

    ResolvedMetadata {
        document_id: document_id.to_string(),
        lake_name_raw,
        lake_name_canonical,
        year,
    }
}

fn resolve_year(filename: &str, text: &str) -> Option<i32> {
    if let Some(year) = first_plausible_year_token(filename) {
        return Some(year);
    }

    year_from_text(text)
}

/// First 4-digit token within the plausible monitoring range.
fn first_plausible_year_token(input: &str) -> Option<i32> {
    let token_regex = Regex::new(r"(\d{4})").ok()?;
    let year_max = current_year() + 1;

    for captures in token_regex.captures_iter(input) {
        let Ok(year) = captures[1].parse::<i32>() else {
            continue;
        };
        if (YEAR_MIN..=year_max).contains(&year) {
            return Some(year);
        }
    }

    None
}

fn year_from_text(text: &str) -> Option<i32> {
    let patterns = [
        r"(?i)report\s+date[:\s][^\n]*?\b(\d{4})\b",
        r"(?i)monitoring\s+year[:\s][^\n]*?\b(\d{4})\b",
        r"(?i)data\s+from[:\s][^\n]*?\b(\d{4})\b",
        r"(?i)\byear[:\s][^\n]*?\b(\d{4})\b",
    ];
    let year_max = current_year() + 1;

    for pattern in patterns {
        let regex = Regex::new(pattern).ok()?;
        for captures in regex.captures_iter(text) {
            let Ok(year) = captures[1].parse::<i32>() else {
                continue;
            };
            if (YEAR_MIN..=year_max).contains(&year) {
                return Some(year);
            }
        }
    }

    None
}

fn resolve_lake_name(filename: &str, text: &str) -> Option<String> {
    if let Some(name) = lake_name_in(filename) {
        return Some(name);
    }

    let head_end = text
        .char_indices()
        .nth(NAME_SEARCH_CHARS)
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    lake_name_in(&text[..head_end])
}

/// Matches `<Word+> Lake` or `Lake <Word+>`; filename separators are treated
/// as spaces first so `Austin_Lake_2019.pdf` resolves like prose. The
/// multi-word form is anchored to capitalized words so prose like
/// "results for Lake X" does not swallow the preceding sentence.
fn lake_name_in(input: &str) -> Option<String> {
    let searchable = input.replace(['_', '-'], " ");

    let patterns = [
        r"\b([A-Z][A-Za-z]*(?:\s+[A-Z][A-Za-z]*)*\s+(?i:Lake))\b",
        r"(?i)\b(Lake\s+[A-Za-z]+)\b",
        r"(?i)\b([A-Za-z]+\s+Lake)\b",
    ];

    for pattern in patterns {
        let regex = Regex::new(pattern).ok()?;
        if let Some(captures) = regex.captures(&searchable) {
            return Some(collapse_whitespace(&captures[1]));
        }
    }

    None
}

/// Case-folds, strips noise tokens (years, parentheticals, revision/copy
/// markers), and rotates a leading `lake` token to the end so `Lake Austin`
/// and `Austin Lake` share one canonical form.
pub fn canonical_lake_name(raw: &str) -> String {
    let lowered = raw.to_lowercase().replace(['_', '-'], " ");

    let without_parens = match Regex::new(r"\([^)]*\)") {
        Ok(regex) => regex.replace_all(&lowered, " ").into_owned(),
        Err(_) => lowered,
    };

    let mut tokens: Vec<&str> = without_parens
        .split_whitespace()
        .filter(|token| !is_noise_token(token))
        .collect();

    if tokens.len() > 1 && tokens[0] == "lake" {
        tokens.rotate_left(1);
    }

    tokens.join(" ")
}

fn is_noise_token(token: &str) -> bool {
    if token.len() == 4 && token.chars().all(|character| character.is_ascii_digit()) {
        return true;
    }

    matches!(
        token,
        "report" | "final" | "draft" | "rev" | "revision" | "copy" | "survey" | "monitoring"
            | "annual"
    )
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}
