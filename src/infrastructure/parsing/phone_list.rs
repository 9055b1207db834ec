//! Phone listing page parser and pagination URL assembly

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::entities::{Brand, Phone};

// Markdown link form on a brand listing page:
// [![](thumb.jpg)**Galaxy S24**](https://www.gsmarena.com/samsung_galaxy_s24-12773.php)
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\[!\[\]\([^)]*\)\*\*([^*]+)\*\*\]\((https://www\.gsmarena\.com/[a-z0-9_-]+\.php)\)",
    )
    .expect("phone pattern is valid")
});

static BRAND_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-phones-(\d+)\.php").expect("brand id pattern is valid"));

static BRAND_SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"gsmarena\.com/([a-z0-9]+)-phones-").expect("brand slug pattern is valid")
});

/// Navigation and cross-listing links that match the phone pattern but are
/// not catalog entries.
fn is_phone_url(url: &str) -> bool {
    !(url.contains("-phones-")
        || url.contains("makers")
        || url.contains("compare")
        || url.contains("search.php")
        || url.contains("news.php"))
}

/// Parse the phone links of one listing page, filtered and deduplicated
/// within the page. Cross-page deduplication is the discovery planner's job.
pub fn parse_phone_links(markdown: &str, brand: &Brand) -> Vec<Phone> {
    let mut phones: Vec<Phone> = Vec::new();
    for caps in PHONE_PATTERN.captures_iter(markdown) {
        let detail_url = caps[2].to_string();
        if !is_phone_url(&detail_url) {
            continue;
        }
        if phones.iter().any(|p| p.detail_url == detail_url) {
            continue;
        }
        phones.push(Phone {
            brand: brand.name.clone(),
            brand_slug: brand.slug.clone(),
            name: caps[1].trim().to_string(),
            detail_url,
            image: None,
        });
    }
    phones
}

/// Build the listing URL for a page of a brand.
///
/// Page 1 is the brand's own listing URL; later pages follow the site's
/// `{slug}-phones-f-{id}-0-p{page}.php` scheme. Returns None when the brand
/// URL does not carry a recognizable id, which aborts pagination.
pub fn brand_pagination_url(brand: &Brand, page: u32, base_url: &str) -> Option<String> {
    if page <= 1 {
        return Some(brand.listing_url.clone());
    }
    let brand_id = BRAND_ID_PATTERN.captures(&brand.listing_url)?[1].to_string();
    let name_slug = BRAND_SLUG_PATTERN.captures(&brand.listing_url)?[1].to_string();
    Some(format!(
        "{}/{}-phones-f-{}-0-p{}.php",
        base_url.trim_end_matches('/'),
        name_slug,
        brand_id,
        page
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samsung() -> Brand {
        Brand {
            name: "Samsung".to_string(),
            listing_url: "https://www.gsmarena.com/samsung-phones-9.php".to_string(),
            device_count: 1450,
            slug: "samsung_9".to_string(),
        }
    }

    const SAMPLE: &str = "\
[![](https://fdn2.gsmarena.com/s24.jpg)**Galaxy S24**](https://www.gsmarena.com/samsung_galaxy_s24-12773.php)
[![](https://fdn2.gsmarena.com/s23.jpg)**Galaxy S23**](https://www.gsmarena.com/samsung_galaxy_s23-12082.php)
[![](https://fdn2.gsmarena.com/s24.jpg)**Galaxy S24**](https://www.gsmarena.com/samsung_galaxy_s24-12773.php)
[![](nav.png)**All brands**](https://www.gsmarena.com/makers.php3)
[![](nav.png)**Samsung phones**](https://www.gsmarena.com/samsung-phones-9.php)
[![](nav.png)**Compare**](https://www.gsmarena.com/compare.php)
";

    #[test]
    fn test_parses_and_filters_phone_links() {
        let phones = parse_phone_links(SAMPLE, &samsung());
        // Duplicate S24 and the three navigation links are dropped
        assert_eq!(phones.len(), 2);
        assert_eq!(phones[0].name, "Galaxy S24");
        assert_eq!(
            phones[0].detail_url,
            "https://www.gsmarena.com/samsung_galaxy_s24-12773.php"
        );
        assert_eq!(phones[0].brand, "Samsung");
        assert_eq!(phones[1].name, "Galaxy S23");
    }

    #[test]
    fn test_pagination_urls() {
        let brand = samsung();
        assert_eq!(
            brand_pagination_url(&brand, 1, "https://www.gsmarena.com").unwrap(),
            "https://www.gsmarena.com/samsung-phones-9.php"
        );
        assert_eq!(
            brand_pagination_url(&brand, 3, "https://www.gsmarena.com").unwrap(),
            "https://www.gsmarena.com/samsung-phones-f-9-0-p3.php"
        );
    }

    #[test]
    fn test_pagination_url_requires_brand_id() {
        let brand = Brand {
            name: "Odd".to_string(),
            listing_url: "https://www.gsmarena.com/odd.php".to_string(),
            device_count: 10,
            slug: "odd".to_string(),
        };
        assert!(brand_pagination_url(&brand, 2, "https://www.gsmarena.com").is_none());
    }
}
