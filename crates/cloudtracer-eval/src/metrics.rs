// Ranking and accuracy metrics - pure functions over prediction/truth pairs

use std::collections::HashSet;

/// Flexible match between a candidate finding and ground truth:
/// at least two shared words, or a case-insensitive substring either way.
pub fn flexible_match(candidate: &str, truth: &str) -> bool {
    let cand_lower = candidate.to_lowercase();
    let truth_lower = truth.to_lowercase();

    if truth_lower.contains(&cand_lower) || cand_lower.contains(&truth_lower) {
        return true;
    }

    let cand_words: HashSet<&str> = cand_lower.split_whitespace().collect();
    let truth_words: HashSet<&str> = truth_lower.split_whitespace().collect();
    cand_words.intersection(&truth_words).count() >= 2
}

/// 1/rank of the first candidate matching the truth, 0 when none match
pub fn reciprocal_rank(candidates: &[String], truth: &str) -> f64 {
    for (i, candidate) in candidates.iter().enumerate() {
        if flexible_match(candidate, truth) {
            return 1.0 / (i + 1) as f64;
        }
    }
    0.0
}

/// Mean Reciprocal Rank across scenarios. `ranked` and `truths` are zipped;
/// an empty batch scores 0.
pub fn mean_reciprocal_rank(ranked: &[Vec<String>], truths: &[String]) -> f64 {
    if ranked.is_empty() || truths.is_empty() {
        return 0.0;
    }

    let sum: f64 = ranked
        .iter()
        .zip(truths.iter())
        .map(|(candidates, truth)| reciprocal_rank(candidates, truth))
        .sum();
    sum / ranked.len().min(truths.len()) as f64
}

/// Fraction of expected-cause words present in the prediction
pub fn overlap_ratio(prediction: &str, truth: &str) -> f64 {
    let pred_lower = prediction.to_lowercase();
    let truth_lower = truth.to_lowercase();

    let pred_words: HashSet<&str> = pred_lower.split_whitespace().collect();
    let truth_words: HashSet<&str> = truth_lower.split_whitespace().collect();
    if truth_words.is_empty() {
        return 0.0;
    }

    let overlap = truth_words.intersection(&pred_words).count();
    overlap as f64 / truth_words.len() as f64
}

/// A scenario counts as correct when its overlap ratio reaches the threshold
pub fn root_cause_accuracy(predictions: &[String], truths: &[String], threshold: f64) -> f64 {
    if predictions.is_empty() || predictions.len() != truths.len() {
        return 0.0;
    }

    let correct = predictions
        .iter()
        .zip(truths.iter())
        .filter(|(pred, truth)| overlap_ratio(pred, truth) >= threshold)
        .count();
    correct as f64 / predictions.len() as f64
}

/// Split a diagnosis into ranked candidate findings: sentences longer than
/// 10 chars, optionally filtered to ones carrying a diagnostic keyword,
/// capped at `cap`.
pub fn extract_candidates(text: &str, keyword_filter: &[String], cap: usize) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|s| s.len() > 10)
        .filter(|s| {
            if keyword_filter.is_empty() {
                return true;
            }
            let lower = s.to_lowercase();
            keyword_filter.iter().any(|k| lower.contains(&k.to_lowercase()))
        })
        .take(cap)
        .map(str::to_string)
        .collect()
}
