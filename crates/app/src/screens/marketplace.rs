//! Marketplace screen controller.
//!
//! Three cached reads (listings, categories, departments) feed a filter
//! engine that runs entirely in memory; changing a filter never issues a
//! new fetch.

use std::sync::Arc;

use crossskill_client::Directory;
use crossskill_core::entities::TeachableListing;
use crossskill_core::filter::{filter_listings, ListingFilter};

use crate::cache::{QueryCache, QueryKey, QueryState};
use crate::notice::{Notice, NoticeBus};

pub struct MarketplaceScreen {
    directory: Arc<dyn Directory>,
    cache: Arc<QueryCache>,
    notices: NoticeBus,
    /// Current filter selection. Mutating it only changes what
    /// [`MarketplaceScreen::filtered`] returns.
    pub filter: ListingFilter,
}

impl MarketplaceScreen {
    pub fn new(directory: Arc<dyn Directory>, cache: Arc<QueryCache>, notices: NoticeBus) -> Self {
        Self {
            directory,
            cache,
            notices,
            filter: ListingFilter::default(),
        }
    }

    /// Every teachable listing, unfiltered.
    pub async fn listings(&self) -> QueryState<Vec<TeachableListing>> {
        let directory = Arc::clone(&self.directory);
        self.cache
            .get_or_fetch(QueryKey::Listings, move || async move {
                directory.teachable_listings().await
            })
            .await
            .into()
    }

    /// Distinct skill categories for the category select.
    pub async fn categories(&self) -> QueryState<Vec<String>> {
        let directory = Arc::clone(&self.directory);
        self.cache
            .get_or_fetch(QueryKey::Categories, move || async move {
                directory.skill_categories().await
            })
            .await
            .into()
    }

    /// Distinct teacher departments for the department select.
    pub async fn departments(&self) -> QueryState<Vec<String>> {
        let directory = Arc::clone(&self.directory);
        self.cache
            .get_or_fetch(QueryKey::Departments, move || async move {
                directory.teacher_departments().await
            })
            .await
            .into()
    }

    /// Listings after applying the current filter selection.
    pub async fn filtered(&self) -> QueryState<Vec<TeachableListing>> {
        match self.listings().await {
            QueryState::Ready(listings) => {
                QueryState::Ready(filter_listings(&listings, &self.filter))
            }
            other => other,
        }
    }

    /// Reset every filter to its match-all default.
    pub fn clear_filters(&mut self) {
        self.filter = ListingFilter::default();
    }

    /// Express interest in a listing. Session scheduling is not built yet,
    /// so this only acknowledges the request.
    pub fn request_session(&self, listing: &TeachableListing) {
        self.notices.publish(Notice::info(
            "Request Sent!",
            format!(
                "Your request to learn {} from {} has been noted.",
                listing.skill_name, listing.teacher_name
            ),
        ));
    }
}
