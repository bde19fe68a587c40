//! Review management: purchase-gated authoring, verified-purchase listings.

use chrono::Utc;

use bazaar_catalog::ProductId;
use bazaar_core::{EntityId, UserId};
use bazaar_reviews::{Review, ReviewDraft, ReviewId};

use crate::error::ServiceError;
use crate::store::{OrderStore, Pagination, ProductStore, ReviewStore};

/// A review together with whether its author verifiably purchased the product.
#[derive(Debug, Clone)]
pub struct PostedReview {
    pub review: Review,
    pub verified_purchase: bool,
}

#[derive(Debug, Clone)]
pub struct ReviewService<S> {
    store: S,
}

impl<S> ReviewService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ReviewStore + OrderStore + ProductStore> ReviewService<S> {
    /// Post a review. Only a user with a committed order containing the
    /// product may review it.
    pub async fn post(
        &self,
        author: UserId,
        product_id: ProductId,
        draft: ReviewDraft,
    ) -> Result<PostedReview, ServiceError> {
        self.store
            .product(product_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if !self.store.has_purchased(author, product_id).await? {
            return Err(ServiceError::Unauthorized);
        }

        let review = Review::new(
            ReviewId::new(EntityId::new()),
            product_id,
            author,
            draft,
            Utc::now(),
        )?;
        self.store.insert_review(review.clone()).await?;

        // The gate just passed, so the badge is a given here.
        Ok(PostedReview {
            review,
            verified_purchase: true,
        })
    }

    /// Reviews on a product, newest first, each annotated with the author's
    /// verified-purchase badge.
    pub async fn for_product(
        &self,
        product_id: ProductId,
        page: Pagination,
    ) -> Result<Vec<PostedReview>, ServiceError> {
        self.store
            .product(product_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let reviews = self.store.reviews_for_product(product_id, page).await?;
        let mut posted = Vec::with_capacity(reviews.len());
        for review in reviews {
            let verified_purchase = self
                .store
                .has_purchased(review.author_id, review.product_id)
                .await?;
            posted.push(PostedReview {
                review,
                verified_purchase,
            });
        }
        Ok(posted)
    }

    /// Reviews written by `author`, newest first. Authoring is purchase-gated,
    /// so the badge holds for every one of them.
    pub async fn by_author(
        &self,
        author: UserId,
        page: Pagination,
    ) -> Result<Vec<PostedReview>, ServiceError> {
        let reviews = self.store.reviews_by_author(author, page).await?;
        Ok(reviews
            .into_iter()
            .map(|review| PostedReview {
                review,
                verified_purchase: true,
            })
            .collect())
    }

    pub async fn edit(
        &self,
        author: UserId,
        review_id: ReviewId,
        draft: ReviewDraft,
    ) -> Result<Review, ServiceError> {
        let mut review = self
            .store
            .review(review_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if !review.is_authored_by(author) {
            return Err(ServiceError::Unauthorized);
        }

        review.edit(draft)?;
        self.store.update_review(&review).await?;
        Ok(review)
    }

    pub async fn remove(&self, author: UserId, review_id: ReviewId) -> Result<(), ServiceError> {
        let review = self
            .store
            .review(review_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if !review.is_authored_by(author) {
            return Err(ServiceError::Unauthorized);
        }

        self.store.delete_review(review_id).await?;
        Ok(())
    }
}
