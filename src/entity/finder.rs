use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::distance::edit_distance;

/// Entity type for which a lone `x` token is rewarded.
const MEME_ENTITY_TYPE: &str = "com.imgflip:meme_id";
const MEME_TOKEN_BONUS: f64 = 1.0;

/// Words whose absence from the search term should not be penalized.
const IGNORABLE_TOKENS: [&str; 4] = ["the", "hotel", "house", "restaurant"];

const EXACT_TOKEN_SCORE: f64 = 10.0;
const PREFIX_TOKEN_SCORE: f64 = 0.5;

/// Candidate entity, as returned by an entity lookup or harvested from
/// previous results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub value: String,
    /// Lowercased display form used for matching.
    pub canonical: String,
    pub name: String,
}

impl EntityRecord {
    pub fn new(entity_type: &str, value: &str, name: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            value: value.to_string(),
            canonical: name.to_lowercase(),
            name: name.to_string(),
        }
    }
}

/// Strips a trailing parenthetical such as `" (cover)"`.
fn strip_parenthetical(term: &str) -> &str {
    if !term.ends_with(')') {
        return term;
    }
    match term.rfind(" (") {
        Some(idx) => term[..idx].trim_end(),
        None => term,
    }
}

fn score_candidate(search_term: &str, search_tokens: &[&str], entity_type: &str, canonical: &str) -> f64 {
    let mut score = -0.1 * edit_distance(search_term, canonical) as f64;

    let mut seen = HashSet::new();
    for cand_token in canonical.split(' ').filter(|t| seen.insert(*t)) {
        let mut found = false;
        for token in search_tokens {
            if *token == cand_token
                || (edit_distance(token, cand_token) <= 1 && token.chars().count() > 1)
            {
                score += EXACT_TOKEN_SCORE;
                found = true;
            } else if cand_token.starts_with(token) {
                score += PREFIX_TOKEN_SCORE;
            }
        }

        if !found && IGNORABLE_TOKENS.contains(&cand_token) {
            score += 0.1 * cand_token.chars().count() as f64;
        }
        if entity_type == MEME_ENTITY_TYPE && cand_token == "x" {
            score += MEME_TOKEN_BONUS;
        }
    }
    score
}

/// Picks the candidate that best matches a free-text reference.
///
/// The search term is compared as given against lowercased canonical
/// forms, so callers pass it lowercased. A candidate whose canonical form
/// equals the search term wins immediately. Otherwise the highest score wins and ties keep the
/// earlier candidate. Returns `None` only when there are no candidates.
pub fn get_best_entity_match<'a>(
    search_term: &str,
    entity_type: &str,
    candidates: &'a [EntityRecord],
) -> Option<&'a EntityRecord> {
    let normalized = strip_parenthetical(search_term);
    let search_tokens: Vec<&str> = normalized.split(' ').collect();

    let mut best: Option<(&EntityRecord, f64)> = None;
    for cand in candidates {
        if cand.canonical == search_term {
            return Some(cand);
        }

        let score = score_candidate(normalized, &search_tokens, entity_type, &cand.canonical);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((cand, score)),
        }
    }
    best.map(|(cand, _)| cand)
}
