use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};

use super::base;
use super::expiry::compute_expires_at;
use crate::browser::{BrowserError, BrowserPage, BrowserResult};
use crate::models::Gig;

pub const TITLE_NOT_FOUND: &str = "Title Not Found";

/// Why a single detail page produced no gig.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error("no expiry derivable from event date {0:?}")]
    UnparseableDate(String),
}

/// One way of reading an event title out of a detail page.
pub enum TitleStrategy {
    /// Text content of the first element matching the selector.
    Text(Selector),
    /// An attribute of the first element matching the selector.
    Attr(Selector, &'static str),
}

impl TitleStrategy {
    fn resolve(&self, root: &ElementRef<'_>) -> Option<String> {
        match self {
            TitleStrategy::Text(selector) => base::first_text(root, selector),
            TitleStrategy::Attr(selector, attr) => {
                base::first_attr(root, selector, attr).filter(|value| !value.is_empty())
            }
        }
    }
}

/// Where each gig field lives on a venue's detail pages.
pub struct DetailLayout {
    /// Tried in order; the first strategy yielding non-empty text wins.
    pub title: Vec<TitleStrategy>,
    /// Element carrying a machine-readable `datetime` attribute.
    pub date: Selector,
    pub genre: Selector,
    pub location: Selector,
    pub time: Selector,
    pub price: Selector,
    /// Hero `<img>`; its `src` is read.
    pub image: Selector,
    /// Description container; its markup is flattened to text.
    pub excerpt: Selector,
}

impl DetailLayout {
    fn title(&self, root: &ElementRef<'_>) -> String {
        self.title
            .iter()
            .find_map(|strategy| strategy.resolve(root))
            .unwrap_or_else(|| TITLE_NOT_FOUND.to_string())
    }
}

pub struct DetailExtractor<'a> {
    layout: &'a DetailLayout,
    network_idle: Duration,
    navigation_timeout: Duration,
}

impl<'a> DetailExtractor<'a> {
    pub fn new(layout: &'a DetailLayout, network_idle: Duration, navigation_timeout: Duration) -> Self {
        Self {
            layout,
            network_idle,
            navigation_timeout,
        }
    }

    /// Visit `address` and read one gig from it.
    ///
    /// Any failure is logged and yields `None` for this link only; a partial
    /// record is never returned.
    pub async fn extract(&self, page: &mut dyn BrowserPage, address: &str) -> Option<Gig> {
        let parsed = match self.load(page, address).await {
            Ok(html) => self.parse_document(&html),
            Err(err) => Err(err.into()),
        };
        match parsed {
            Ok(gig) => {
                debug!(url = %address, title = %gig.title, "scraped event details");
                Some(gig)
            }
            Err(err) => {
                warn!(url = %address, error = %err, "error scraping event details");
                None
            }
        }
    }

    async fn load(&self, page: &mut dyn BrowserPage, address: &str) -> BrowserResult<String> {
        page.goto(address).await?;
        page.wait_for_network_idle(self.network_idle, self.navigation_timeout)
            .await?;
        page.content().await
    }

    /// Read one gig out of a rendered detail page. A date with no derivable
    /// expiry rejects the whole page.
    pub fn parse_document(&self, html: &str) -> Result<Gig, ExtractError> {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let layout = self.layout;

        let title = layout.title(&root);
        let date = base::first_attr(&root, &layout.date, "datetime").unwrap_or_default();
        let expires_at =
            compute_expires_at(&date).ok_or_else(|| ExtractError::UnparseableDate(date.clone()))?;
        let text_or_empty =
            |selector: &Selector| base::first_text(&root, selector).unwrap_or_default();
        let genre = text_or_empty(&layout.genre);
        let location = text_or_empty(&layout.location);
        let time = text_or_empty(&layout.time);
        let price = text_or_empty(&layout.price);
        let image = base::first_attr(&root, &layout.image, "src").unwrap_or_default();
        let excerpt = base::first_inner_html(&root, &layout.excerpt)
            .map(|markup| base::html_to_text(&markup))
            .unwrap_or_default();

        Ok(Gig {
            title,
            date: Some(date),
            genre: Some(genre),
            location: Some(location),
            time: Some(time),
            price: Some(price),
            image: Some(image),
            excerpt: Some(excerpt),
            is_featured: false,
            rating: 0,
            expires_at: Some(expires_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::ScriptedPage;

    fn selector(css: &str) -> Selector {
        Selector::parse(css).expect("test selector")
    }

    fn layout() -> DetailLayout {
        DetailLayout {
            title: vec![
                TitleStrategy::Text(selector("h1.headline")),
                TitleStrategy::Text(selector(".subtitle")),
                TitleStrategy::Attr(selector("meta[property=\"og:title\"]"), "content"),
            ],
            date: selector("time.when"),
            genre: selector(".genre"),
            location: selector(".where"),
            time: selector(".hours"),
            price: selector(".price"),
            image: selector("img.hero"),
            excerpt: selector(".about"),
        }
    }

    const FULL_PAGE: &str = r#"
    <html><head><meta property="og:title" content="From Meta"></head>
    <body>
        <h1 class="headline">  Moonlight Cabaret </h1>
        <p class="subtitle">Second choice</p>
        <time class="when" datetime="2024-03-10T00:00:00Z">Sun, Mar 10</time>
        <span class="genre">Cabaret</span>
        <span class="where">2 Wyckoff Ave, Brooklyn</span>
        <span class="hours">9pm - 2am</span>
        <span class="price">$30</span>
        <img class="hero" src="https://img.test/moon.jpg">
        <div class="about"><p>Aerialists<br>and drag<br/>all night</p></div>
    </body></html>
    "#;

    fn extractor(layout: &DetailLayout) -> DetailExtractor<'_> {
        DetailExtractor::new(layout, Duration::from_millis(500), Duration::from_secs(30))
    }

    #[test]
    fn reads_every_field() {
        let layout = layout();
        let gig = extractor(&layout).parse_document(FULL_PAGE).expect("gig");

        assert_eq!(gig.title, "Moonlight Cabaret");
        assert_eq!(gig.date.as_deref(), Some("2024-03-10T00:00:00Z"));
        assert_eq!(gig.expires_at.as_deref(), Some("2024-03-11T02:00:00.000Z"));
        assert_eq!(gig.genre.as_deref(), Some("Cabaret"));
        assert_eq!(gig.location.as_deref(), Some("2 Wyckoff Ave, Brooklyn"));
        assert_eq!(gig.time.as_deref(), Some("9pm - 2am"));
        assert_eq!(gig.price.as_deref(), Some("$30"));
        assert_eq!(gig.image.as_deref(), Some("https://img.test/moon.jpg"));
        assert_eq!(gig.excerpt.as_deref(), Some("Aerialists\nand drag\nall night"));
        assert!(!gig.is_featured);
        assert_eq!(gig.rating, 0);
    }

    #[test]
    fn title_strategies_are_tried_in_order() {
        let layout = layout();
        let without_headline = FULL_PAGE.replace("class=\"headline\"", "class=\"other\"");
        let gig = extractor(&layout).parse_document(&without_headline).expect("gig");
        assert_eq!(gig.title, "Second choice");

        let only_meta = without_headline.replace("class=\"subtitle\"", "class=\"other\"");
        let gig = extractor(&layout).parse_document(&only_meta).expect("gig");
        assert_eq!(gig.title, "From Meta");
    }

    #[test]
    fn falls_back_to_title_marker_and_keeps_other_fields() {
        let layout = layout();
        let html = FULL_PAGE
            .replace("class=\"headline\"", "class=\"other\"")
            .replace("class=\"subtitle\"", "class=\"other\"")
            .replace("property=\"og:title\"", "property=\"og:site_name\"");
        let gig = extractor(&layout).parse_document(&html).expect("gig");

        assert_eq!(gig.title, TITLE_NOT_FOUND);
        assert_eq!(gig.genre.as_deref(), Some("Cabaret"));
        assert_eq!(gig.price.as_deref(), Some("$30"));
        assert_eq!(gig.excerpt.as_deref(), Some("Aerialists\nand drag\nall night"));
    }

    #[test]
    fn missing_fields_default_to_empty_strings() {
        let layout = layout();
        let html = FULL_PAGE.replace("<span class=\"genre\">Cabaret</span>", "");
        let gig = extractor(&layout).parse_document(&html).expect("gig");
        assert_eq!(gig.genre.as_deref(), Some(""));
        assert_eq!(gig.location.as_deref(), Some("2 Wyckoff Ave, Brooklyn"));

        let bare = extractor(&layout)
            .parse_document(
                "<html><body><time class=\"when\" datetime=\"2024-03-10\"></time></body></html>",
            )
            .expect("gig");
        assert_eq!(bare.title, TITLE_NOT_FOUND);
        assert_eq!(bare.date.as_deref(), Some("2024-03-10"));
        assert_eq!(bare.genre.as_deref(), Some(""));
        assert_eq!(bare.image.as_deref(), Some(""));
        assert_eq!(bare.excerpt.as_deref(), Some(""));
        assert_eq!(bare.expires_at.as_deref(), Some("2024-03-11T02:00:00.000Z"));
    }

    #[test]
    fn text_fields_keep_the_page_text() {
        let layout = layout();
        let html = FULL_PAGE
            .replace(
                "<h1 class=\"headline\">  Moonlight Cabaret </h1>",
                "<h1 class=\"headline\">DIRTY <em>EPIC</em>: Spring</h1>",
            )
            .replace(
                "<span class=\"price\">$30</span>",
                "<span class=\"price\"><span>$</span>30</span>",
            )
            .replace(
                "<span class=\"where\">2 Wyckoff Ave, Brooklyn</span>",
                "<span class=\"where\">2 Wyckoff Ave\nBrooklyn</span>",
            );
        let gig = extractor(&layout).parse_document(&html).expect("gig");

        assert_eq!(gig.title, "DIRTY EPIC: Spring");
        assert_eq!(gig.price.as_deref(), Some("$30"));
        assert_eq!(gig.location.as_deref(), Some("2 Wyckoff Ave\nBrooklyn"));
    }

    #[test]
    fn page_without_a_usable_date_is_rejected() {
        let layout = layout();
        let tba = FULL_PAGE.replace("datetime=\"2024-03-10T00:00:00Z\"", "datetime=\"TBA\"");
        assert!(matches!(
            extractor(&layout).parse_document(&tba),
            Err(ExtractError::UnparseableDate(date)) if date == "TBA"
        ));

        let undated = extractor(&layout).parse_document("<html><body></body></html>");
        assert!(matches!(undated, Err(ExtractError::UnparseableDate(date)) if date.is_empty()));
    }

    #[tokio::test]
    async fn extract_navigates_and_reads_the_rendered_page() {
        let layout = layout();
        let mut page = ScriptedPage::new().with_page("https://venue.test/e/1", FULL_PAGE);

        let gig = extractor(&layout)
            .extract(&mut page, "https://venue.test/e/1")
            .await
            .expect("gig");
        assert_eq!(gig.title, "Moonlight Cabaret");
        assert_eq!(page.navigations(), ["https://venue.test/e/1".to_string()]);
    }

    #[tokio::test]
    async fn navigation_failure_yields_no_record() {
        let layout = layout();
        let mut page = ScriptedPage::new()
            .with_page("https://venue.test/e/1", FULL_PAGE)
            .with_unreachable("https://venue.test/e/1");

        let gig = extractor(&layout)
            .extract(&mut page, "https://venue.test/e/1")
            .await;
        assert!(gig.is_none());
    }

    #[tokio::test]
    async fn failures_after_navigation_only_drop_their_own_link() {
        let layout = layout();
        let undated = FULL_PAGE.replace("datetime=\"2024-03-10T00:00:00Z\"", "datetime=\"TBA\"");
        let mut page = ScriptedPage::new()
            .with_page("https://venue.test/e/1", FULL_PAGE)
            .with_stalled("https://venue.test/e/1")
            .with_page("https://venue.test/e/2", FULL_PAGE)
            .with_unreadable("https://venue.test/e/2")
            .with_page("https://venue.test/e/3", undated)
            .with_page("https://venue.test/e/4", FULL_PAGE);
        let extractor = extractor(&layout);

        let mut gigs = Vec::new();
        for n in 1..=4 {
            let address = format!("https://venue.test/e/{n}");
            gigs.push(extractor.extract(&mut page, &address).await);
        }

        assert!(gigs[0].is_none());
        assert!(gigs[1].is_none());
        assert!(gigs[2].is_none());
        assert_eq!(
            gigs[3].as_ref().map(|gig| gig.title.as_str()),
            Some("Moonlight Cabaret")
        );
        assert_eq!(page.navigations().len(), 4);
    }
}
