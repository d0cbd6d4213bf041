//! CSS selectors for Amazon product-detail pages.
//!
//! This file contains all CSS selectors used to pull harvested fields out of
//! a loaded page. Update this file when Amazon changes their HTML structure.
//!
//! **Update process**: when extraction starts landing in the failed ledger,
//! inspect the page snapshots, update selectors, and add a test fixture.
//!
//! Strategy order is significant and fixed: the extractor tries the primary
//! selector first and only then the fallbacks, in the order declared here.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for the brand byline.
pub mod brand {
    use super::*;

    /// Primary byline element.
    pub static BYLINE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#bylineInfo").unwrap());

    /// Brand row in the product overview table.
    pub static OVERVIEW_ROW: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".po-brand .po-break-word").unwrap());
}

/// Selectors for the primary product image.
pub mod image {
    use super::*;

    /// Main landing image.
    pub static LANDING: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#landingImage").unwrap());

    /// Fallback: any image inside the wrapper.
    pub static WRAPPER: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#imgTagWrapperId img").unwrap());

    /// Attribute tried after `src` on the wrapper image.
    pub static HIRES_ATTR: &str = "data-old-hires";

    /// Placeholder marker in tracking-pixel URLs.
    pub static PLACEHOLDER_MARKER: &str = "pixel";
}

/// Selectors for the price block.
pub mod price {
    use super::*;

    /// Offscreen price text, the most reliable source.
    pub static OFFSCREEN: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-price span.a-offscreen").unwrap());

    /// Legacy price blocks, tried in this order.
    pub static OUR_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#priceblock_ourprice").unwrap());
    pub static DEAL_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#priceblock_dealprice").unwrap());
    pub static SALE_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#priceblock_saleprice").unwrap());
    pub static BUYBOX: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#price_inside_buybox").unwrap());

    /// Last resort: whole and fractional parts joined with a dot.
    pub static WHOLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".a-price-whole").unwrap());
    pub static FRACTION: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".a-price-fraction").unwrap());

    /// Availability probe, checked before any price strategy.
    pub static AVAILABILITY: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "#availability span, \
             span.a-color-price",
        )
        .unwrap()
    });

    /// Text marker for an unavailable listing.
    pub static UNAVAILABLE_MARKER: &str = "currently unavailable";
}

/// Selectors and markers for detecting block/challenge pages.
pub mod blocks {
    use super::*;

    /// Page title element.
    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

    /// CAPTCHA form.
    pub static CAPTCHA: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "form[action*='validateCaptcha'], \
             img[src*='captcha']",
        )
        .unwrap()
    });

    /// Dog page (Amazon's error page).
    pub static DOG_PAGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("img[alt*='dog']").unwrap());

    /// Title marker on the robot-check interstitial.
    pub static ROBOT_TITLE_MARKER: &str = "Robot Check";

    /// Body marker on the automated-access denial page.
    pub static ACCESS_DENIED_MARKER: &str = "To discuss automated access";
}
