//! Article listing queries: a filter is composed into a single SQL statement
//! with positional arguments, and the flat joined rows it returns are folded
//! back into nested articles.

pub mod aggregate;
pub mod args;
pub mod compose;

pub use aggregate::{aggregate, try_aggregate, Aggregated, Aggregator, ArticleRow};
pub use args::{Arg, Args, Placeholder};
pub use compose::{compose, ArticleQuery, ComposedQuery, Join, JoinKind, Predicate};

/// Page size used when the caller asks for nothing, or for something out of range.
pub const MAX_LIMIT: i64 = 20;

/// Criteria for an article listing. Every field is optional; an empty filter
/// lists the newest articles.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArticleFilter {
    /// Authenticated user the listing is personalized for.
    pub viewer: Option<i64>,
    /// Only articles by authors the viewer follows.
    pub feed: bool,
    pub tag: Option<String>,
    pub author: Option<String>,
    pub favorited_by: Option<String>,
    pub slug: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ArticleFilter {
    pub fn by_slug<S: Into<String>>(slug: S, viewer: Option<i64>) -> ArticleFilter {
        ArticleFilter {
            viewer,
            slug: Some(slug.into()),
            limit: Some(1),
            ..ArticleFilter::default()
        }
    }

    pub fn feed(viewer: i64, limit: Option<i64>, offset: Option<i64>) -> ArticleFilter {
        ArticleFilter {
            viewer: Some(viewer),
            feed: true,
            limit,
            offset,
            ..ArticleFilter::default()
        }
    }

    /// Requested limit if it lies in (0, MAX_LIMIT], otherwise MAX_LIMIT.
    pub fn effective_limit(&self) -> i64 {
        match self.limit {
            Some(limit) if limit > 0 && limit <= MAX_LIMIT => limit,
            _ => MAX_LIMIT,
        }
    }

    /// Requested offset if positive. Zero and negative offsets are dropped.
    pub fn effective_offset(&self) -> Option<i64> {
        self.offset.filter(|offset| *offset > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_to_max_limit_and_no_offset() {
        let filter = ArticleFilter::default();
        assert_eq!(filter.effective_limit(), MAX_LIMIT);
        assert_eq!(filter.effective_offset(), None);
    }

    #[test]
    fn keeps_in_range_limit() {
        let filter = ArticleFilter {
            limit: Some(5),
            offset: Some(10),
            ..ArticleFilter::default()
        };
        assert_eq!(filter.effective_limit(), 5);
        assert_eq!(filter.effective_offset(), Some(10));
    }

    #[test]
    fn slug_lookup_reads_one_article() {
        let filter = ArticleFilter::by_slug("how-to-train", Some(3));
        assert_eq!(filter.effective_limit(), 1);
        assert_eq!(filter.viewer, Some(3));
        assert!(!filter.feed);
    }

    proptest! {
        #[test]
        fn out_of_range_limit_is_exactly_max(
            limit in prop_oneof![i64::MIN..=0i64, (MAX_LIMIT + 1)..=i64::MAX]
        ) {
            let filter = ArticleFilter { limit: Some(limit), ..ArticleFilter::default() };
            prop_assert_eq!(filter.effective_limit(), MAX_LIMIT);
        }

        #[test]
        fn in_range_limit_is_kept(limit in 1..=MAX_LIMIT) {
            let filter = ArticleFilter { limit: Some(limit), ..ArticleFilter::default() };
            prop_assert_eq!(filter.effective_limit(), limit);
        }

        #[test]
        fn non_positive_offset_is_dropped(offset in i64::MIN..=0i64) {
            let filter = ArticleFilter { offset: Some(offset), ..ArticleFilter::default() };
            prop_assert_eq!(filter.effective_offset(), None);
        }
    }
}
