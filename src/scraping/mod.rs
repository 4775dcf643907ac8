pub mod base;
pub mod detail;
pub mod expiry;
pub mod harvest;
pub mod house_of_yes;

use detail::DetailLayout;

pub use detail::{DetailExtractor, ExtractError, TitleStrategy, TITLE_NOT_FOUND};
pub use expiry::compute_expires_at;
pub use harvest::{HarvestConfig, LinkHarvester, LinkSet};

/// A venue whose calendar can be harvested and whose event pages can be read.
pub trait VenueScraper: Send + Sync {
    fn venue_id(&self) -> &'static str;
    fn venue_name(&self) -> &'static str;
    /// Listing view used when no endpoint override is configured.
    fn venue_url(&self) -> &'static str;
    /// Matches the anchors on the listing that lead to detail pages.
    fn link_selector(&self) -> &'static str;
    fn detail_layout(&self) -> &'static DetailLayout;
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct VenueInfo {
    pub id: String,
    pub name: String,
    pub url: String,
}

fn active_venues() -> Vec<Box<dyn VenueScraper>> {
    vec![Box::new(house_of_yes::HouseOfYes)]
}

pub fn list_venues() -> Vec<VenueInfo> {
    active_venues()
        .into_iter()
        .map(|venue| VenueInfo {
            id: venue.venue_id().to_string(),
            name: venue.venue_name().to_string(),
            url: venue.venue_url().to_string(),
        })
        .collect()
}

pub fn find_venue(id: &str) -> Option<Box<dyn VenueScraper>> {
    active_venues()
        .into_iter()
        .find(|venue| venue.venue_id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_registered_venues_by_id() {
        let venue = find_venue("house_of_yes").expect("registered venue");
        assert_eq!(venue.venue_name(), "House of Yes");
        assert!(find_venue("nowhere").is_none());
        assert!(list_venues().iter().any(|info| info.id == "house_of_yes"));
    }
}
