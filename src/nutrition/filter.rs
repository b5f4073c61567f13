use crate::catalog::{Catalog, MealCandidate};

use super::goal::Goal;

/// Trimmed, lower-cased avoid keywords; blank entries are dropped.
pub fn normalize_avoid(avoid: &[String]) -> Vec<String> {
    avoid
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Keeps the meals that mention no avoided ingredient and, when the goal has
/// tags, mention at least one of them. Matching is plain substring search on
/// the lower-cased ingredient text, so "egg" also rules out "eggplant".
///
/// Every meal type of the input is present in the output, in the same order,
/// even when all of its meals were filtered out.
pub fn filter_meals(catalog: &Catalog, goal: &Goal, avoid: &[String]) -> Catalog {
    let avoid = normalize_avoid(avoid);
    let tags = goal.tags();

    catalog
        .iter()
        .map(|(meal_type, candidates)| {
            let kept = candidates
                .iter()
                .filter(|meal| is_suitable(meal, tags, &avoid))
                .cloned()
                .collect();
            (meal_type.to_string(), kept)
        })
        .collect()
}

fn is_suitable(meal: &MealCandidate, tags: &[&str], avoid: &[String]) -> bool {
    let text = meal.ingredient_text();
    if avoid.iter().any(|k| text.contains(k.as_str())) {
        return false;
    }
    tags.is_empty() || tags.iter().any(|t| text.contains(t))
}
