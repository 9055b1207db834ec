//! Brand listing (makers page) parser

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::entities::Brand;

// Markdown link form on the makers page:
// [Samsung\<br>\<br>1450 devices](https://www.gsmarena.com/samsung-phones-9.php)
static BRAND_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\[([^\]]+?)(?:\\?<br>\\?<br>|\s+)(\d+)\s+devices?\]\((https://www\.gsmarena\.com/[^)]+\.php)\)",
    )
    .expect("brand pattern is valid")
});

/// Parse the makers page into brands, in discovery order.
///
/// Unparsable entries are skipped; an empty result is the caller's signal
/// that the listing itself was unusable.
pub fn parse_brand_listing(markdown: &str) -> Vec<Brand> {
    let mut brands = Vec::new();
    for caps in BRAND_PATTERN.captures_iter(markdown) {
        let name = caps[1].trim().to_string();
        let Ok(device_count) = caps[2].parse::<u32>() else {
            continue;
        };
        let listing_url = caps[3].to_string();

        // samsung-phones-9.php -> samsung_9
        let slug = listing_url
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .replace("-phones-", "_")
            .replace(".php", "");

        brands.push(Brand {
            name,
            listing_url,
            device_count,
            slug,
        });
    }
    brands
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# All mobile phone brands

[Samsung\\<br>\\<br>1450 devices](https://www.gsmarena.com/samsung-phones-9.php)
[Nokia<br><br>494 devices](https://www.gsmarena.com/nokia-phones-1.php)
[Apple 120 devices](https://www.gsmarena.com/apple-phones-48.php)
[Not a brand link](https://www.gsmarena.com/news.php)
";

    #[test]
    fn test_parses_brand_entries() {
        let brands = parse_brand_listing(SAMPLE);
        assert_eq!(brands.len(), 3);

        assert_eq!(brands[0].name, "Samsung");
        assert_eq!(brands[0].device_count, 1450);
        assert_eq!(
            brands[0].listing_url,
            "https://www.gsmarena.com/samsung-phones-9.php"
        );
        assert_eq!(brands[0].slug, "samsung_9");

        assert_eq!(brands[1].name, "Nokia");
        assert_eq!(brands[2].name, "Apple");
        assert_eq!(brands[2].device_count, 120);
    }

    #[test]
    fn test_empty_input_yields_no_brands() {
        assert!(parse_brand_listing("").is_empty());
        assert!(parse_brand_listing("no links here at all").is_empty());
    }
}
