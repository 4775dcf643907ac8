use once_cell::sync::Lazy;
use scraper::Selector;

use super::detail::{DetailLayout, TitleStrategy};
use super::VenueScraper;

const URL: &str = "https://www.houseofyes.org/";
const VENUE_ID: &str = "house_of_yes";
const VENUE_NAME: &str = "House of Yes";
const LINK_SELECTOR: &str = "td.cal-ticket a";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("house of yes selector")
}

// Ticket links lead to hosted event pages; these selectors follow that markup.
static LAYOUT: Lazy<DetailLayout> = Lazy::new(|| DetailLayout {
    title: vec![
        TitleStrategy::Text(selector(".event-title.css-0")),
        TitleStrategy::Text(selector("h1.event-title")),
        TitleStrategy::Text(selector(".ng-binding.pointer")),
    ],
    date: selector(".start-date"),
    genre: selector("p[class=\"summary\"] strong"),
    location: selector(".location-info__address-text"),
    time: selector(".date-info__full-datetime"),
    price: selector(".conversion-bar__panel-info"),
    image: selector("picture[data-testid=\"hero-image\"] img"),
    excerpt: selector(".event-description__content--expanded"),
});

pub struct HouseOfYes;

impl VenueScraper for HouseOfYes {
    fn venue_id(&self) -> &'static str {
        VENUE_ID
    }

    fn venue_name(&self) -> &'static str {
        VENUE_NAME
    }

    fn venue_url(&self) -> &'static str {
        URL
    }

    fn link_selector(&self) -> &'static str {
        LINK_SELECTOR
    }

    fn detail_layout(&self) -> &'static DetailLayout {
        &LAYOUT
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::scraping::detail::{DetailExtractor, TITLE_NOT_FOUND};
    use crate::scraping::harvest::collect_links;

    const SAMPLE_LISTING: &str = r#"
    <table class="calendar">
        <tr>
            <td class="cal-date">Fri 8</td>
            <td class="cal-ticket"><a href="https://www.eventbrite.com/e/dirty-epic-tickets-1001">Tickets</a></td>
        </tr>
        <tr>
            <td class="cal-date">Sat 9</td>
            <td class="cal-ticket"><a href="https://www.eventbrite.com/e/house-of-love-tickets-1002">Tickets</a></td>
        </tr>
        <tr>
            <td class="cal-date">Sat 9</td>
            <td class="cal-info"><a href="/about">About</a></td>
        </tr>
    </table>
    "#;

    const SAMPLE_DETAIL: &str = r#"
    <html><body>
        <h1 class="event-title css-0">DIRTY EPIC: Spring Fling</h1>
        <div class="date-info">
            <time class="start-date" datetime="2024-03-08">March 8</time>
            <span class="date-info__full-datetime">Friday, March 8 · 10pm - 4am EST</span>
        </div>
        <p class="summary"><strong>Dance party</strong> with live performance</p>
        <div class="location-info__address-text">2 Wyckoff Ave Brooklyn, NY 11237</div>
        <div class="conversion-bar__panel-info">$20 – $45</div>
        <picture data-testid="hero-image"><img src="https://img.evbuc.com/dirty-epic.jpg" alt=""></picture>
        <div class="event-description__content event-description__content--expanded">
            <p>Our monthly party is back.<br>Costumes encouraged!<br/>21+</p>
        </div>
    </body></html>
    "#;

    #[test]
    fn harvests_ticket_links_from_the_calendar() {
        let venue = HouseOfYes;
        let selector = selector(venue.link_selector());
        let links = collect_links(SAMPLE_LISTING, venue.venue_url(), &selector);
        assert_eq!(
            links,
            vec![
                "https://www.eventbrite.com/e/dirty-epic-tickets-1001",
                "https://www.eventbrite.com/e/house-of-love-tickets-1002",
            ]
        );
    }

    #[test]
    fn parses_house_of_yes_event_page() {
        let extractor = DetailExtractor::new(
            HouseOfYes.detail_layout(),
            Duration::from_millis(500),
            Duration::from_secs(30),
        );
        let gig = extractor.parse_document(SAMPLE_DETAIL).expect("gig");

        assert_eq!(gig.title, "DIRTY EPIC: Spring Fling");
        assert_eq!(gig.date.as_deref(), Some("2024-03-08"));
        assert_eq!(gig.expires_at.as_deref(), Some("2024-03-09T02:00:00.000Z"));
        assert_eq!(gig.genre.as_deref(), Some("Dance party"));
        assert_eq!(
            gig.location.as_deref(),
            Some("2 Wyckoff Ave Brooklyn, NY 11237")
        );
        assert_eq!(
            gig.time.as_deref(),
            Some("Friday, March 8 · 10pm - 4am EST")
        );
        assert_eq!(gig.price.as_deref(), Some("$20 – $45"));
        assert_eq!(
            gig.image.as_deref(),
            Some("https://img.evbuc.com/dirty-epic.jpg")
        );
        assert_eq!(
            gig.excerpt.as_deref(),
            Some("Our monthly party is back.\nCostumes encouraged!\n21+")
        );
    }

    #[test]
    fn falls_back_through_title_selectors() {
        let extractor = DetailExtractor::new(
            HouseOfYes.detail_layout(),
            Duration::from_millis(500),
            Duration::from_secs(30),
        );
        let angular = SAMPLE_DETAIL.replace(
            "<h1 class=\"event-title css-0\">DIRTY EPIC: Spring Fling</h1>",
            "<span class=\"ng-binding pointer\">Angular Title</span>",
        );
        assert_eq!(extractor.parse_document(&angular).expect("gig").title, "Angular Title");

        let untitled = SAMPLE_DETAIL.replace(
            "<h1 class=\"event-title css-0\">DIRTY EPIC: Spring Fling</h1>",
            "",
        );
        let gig = extractor.parse_document(&untitled).expect("gig");
        assert_eq!(gig.title, TITLE_NOT_FOUND);
        assert_eq!(gig.genre.as_deref(), Some("Dance party"));
    }
}
