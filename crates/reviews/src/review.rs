use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_catalog::ProductId;
use bazaar_core::{DomainError, DomainResult, EntityId, UserId};

const MIN_RATING: u8 = 1;
const MAX_RATING: u8 = 5;
const MAX_CONTENT_LEN: usize = 1_000;

/// Review identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(pub EntityId);

impl ReviewId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ReviewId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Content and rating of a review, as submitted by its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub content: String,
    pub rating: u8,
}

/// A review posted on a product by a verified purchaser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub author_id: UserId,
    pub rating: u8,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(
        id: ReviewId,
        product_id: ProductId,
        author_id: UserId,
        draft: ReviewDraft,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_draft(&draft)?;
        Ok(Self {
            id,
            product_id,
            author_id,
            rating: draft.rating,
            content: draft.content,
            created_at,
        })
    }

    /// Replace content and rating (author edit).
    pub fn edit(&mut self, draft: ReviewDraft) -> DomainResult<()> {
        validate_draft(&draft)?;
        self.rating = draft.rating;
        self.content = draft.content;
        Ok(())
    }

    pub fn is_authored_by(&self, user: UserId) -> bool {
        self.author_id == user
    }
}

fn validate_draft(draft: &ReviewDraft) -> DomainResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&draft.rating) {
        return Err(DomainError::validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    if draft.content.trim().is_empty() {
        return Err(DomainError::validation("review content must not be empty"));
    }
    if draft.content.chars().count() > MAX_CONTENT_LEN {
        return Err(DomainError::validation(format!(
            "review content must be at most {MAX_CONTENT_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(rating: u8) -> ReviewDraft {
        ReviewDraft {
            content: "Sturdy, arrived on time.".to_string(),
            rating,
        }
    }

    fn test_review() -> Review {
        Review::new(
            ReviewId::new(EntityId::new()),
            ProductId::new(EntityId::new()),
            UserId::new(),
            draft(4),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn rating_outside_range_is_rejected() {
        for rating in [0, 6] {
            let err = Review::new(
                ReviewId::new(EntityId::new()),
                ProductId::new(EntityId::new()),
                UserId::new(),
                draft(rating),
                Utc::now(),
            )
            .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }

    #[test]
    fn edit_replaces_content_and_rating() {
        let mut review = test_review();
        review
            .edit(ReviewDraft {
                content: "Broke after a week.".to_string(),
                rating: 2,
            })
            .unwrap();
        assert_eq!(review.rating, 2);
        assert_eq!(review.content, "Broke after a week.");
    }

    #[test]
    fn edit_validates_like_create() {
        let mut review = test_review();
        assert!(review.edit(draft(0)).is_err());
        assert_eq!(review.rating, 4);
    }

    #[test]
    fn authorship_check() {
        let review = test_review();
        assert!(review.is_authored_by(review.author_id));
        assert!(!review.is_authored_by(UserId::new()));
    }
}
