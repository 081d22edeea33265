//! Marketplace filter engine.
//!
//! Pure, synchronous filtering of the in-memory teachable-listing
//! collection by three independent, conjunctive predicates, plus the
//! distinct-set reductions backing the filter dropdowns. Empty result is a
//! valid outcome and is distinct from a loading state (the caller tracks
//! loading separately).

use crate::entities::TeachableListing;

/// The three simultaneous marketplace predicates.
///
/// An empty string means "match all" for each predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    /// Case-insensitive substring match on the skill name.
    pub search_term: String,
    /// Exact match on the skill category.
    pub category: String,
    /// Exact match on the teacher's department.
    pub department: String,
}

impl ListingFilter {
    /// True when any predicate is active.
    pub fn is_active(&self) -> bool {
        !self.search_term.is_empty() || !self.category.is_empty() || !self.department.is_empty()
    }

    /// Reset all predicates to match-all.
    pub fn clear(&mut self) {
        *self = ListingFilter::default();
    }

    /// Whether a single listing satisfies all three predicates.
    pub fn matches(&self, listing: &TeachableListing) -> bool {
        let matches_term = listing
            .skill_name
            .to_lowercase()
            .contains(&self.search_term.to_lowercase());
        let matches_category = self.category.is_empty() || listing.skill_category == self.category;
        let matches_department =
            self.department.is_empty() || listing.teacher_department == self.department;
        matches_term && matches_category && matches_department
    }
}

/// Return the subsequence of `listings` satisfying all predicates.
pub fn filter_listings(listings: &[TeachableListing], filter: &ListingFilter) -> Vec<TeachableListing> {
    listings
        .iter()
        .filter(|listing| filter.matches(listing))
        .cloned()
        .collect()
}

/// Client-side set reduction: distinct values in first-seen order.
///
/// The store is queried for the full column, not `DISTINCT`; the reduction
/// happens here.
pub fn distinct(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}
