use super::aggregate::rank_top;
use super::document::SourceProfile;
use super::Rating;
use crate::sources::SourceSpec;
use tracing::debug;

/// Applies a higher-fidelity source's score to one category of an aggregate.
///
/// The replacement only happens when the override value is non-zero and the
/// entity already shows non-zero exposure for the category; otherwise a
/// specialized dataset would invent exposure the general source never saw.
/// The pre-override value is kept for audit and the top-N ranking is rebuilt,
/// since the new score can change relative order. Returns whether the
/// override was applied.
pub fn apply_category_override(
    profile: &mut SourceProfile,
    spec: &SourceSpec,
    category_key: &str,
    override_score: f64,
    top_n: usize,
) -> bool {
    if !override_score.is_finite() || override_score <= 0.0 {
        return false;
    }

    let scale = match spec.category(category_key) {
        Some(category) => category.scale,
        None => return false,
    };

    let Some(category) = profile.categories.get_mut(category_key) else {
        return false;
    };
    if category.score <= 0.0 {
        return false;
    }

    debug!(
        category = category_key,
        from = category.score,
        to = override_score,
        "applying category override"
    );
    category.pre_override_score = Some(category.score);
    category.score = override_score;
    category.rating = Rating::from_scaled(override_score, scale);

    profile.top_categories = rank_top(spec, &profile.categories, top_n);
    true
}
