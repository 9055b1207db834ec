//! Spec field extraction from detail page markdown
//!
//! An ordered registry of named extraction rules, each a pure regex match
//! against the content. A rule that fails to match simply omits its key; no
//! input can make extraction fail. The registry is open: callers can append
//! rules without touching the pipeline.

use std::collections::BTreeMap;

use regex::Regex;

use crate::domain::entities::SpecRecord;

/// One named extraction rule. The first capture group is the field value.
pub struct ExtractionRule {
    pub field: &'static str,
    pattern: Regex,
}

impl ExtractionRule {
    pub fn new(field: &'static str, pattern: &str) -> Self {
        Self {
            field,
            pattern: Regex::new(pattern).expect("extraction rule pattern is valid"),
        }
    }

    fn apply(&self, markdown: &str) -> Option<String> {
        self.pattern
            .captures(markdown)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Ordered spec extractor over detail-page markdown.
pub struct SpecExtractor {
    name_rule: ExtractionRule,
    rules: Vec<ExtractionRule>,
}

impl Default for SpecExtractor {
    fn default() -> Self {
        // The display name is the first markdown heading line
        let name_rule = ExtractionRule::new("model_name", r"(?m)^#\s*(.+?)\s*$");

        let rules = vec![
            ExtractionRule::new("released", r"(?i)Released[:\s]+([^\n]+)"),
            ExtractionRule::new("body", r"(?i)Body[:\s]+([^\n]+)"),
            ExtractionRule::new("weight", r"(?i)Weight[:\s]+([^\n]+)"),
            ExtractionRule::new(
                "display_size",
                r#"(?i)Display[:\s]+(\d+\.?\d*["\s]*inch[^\n]*)"#,
            ),
            ExtractionRule::new(
                "display_type",
                r"(?i)Type[:\s]+(AMOLED|IPS|OLED|LCD|Super AMOLED[^\n]*)",
            ),
            ExtractionRule::new("resolution", r"(?i)Resolution[:\s]+(\d+\s*x\s*\d+[^\n]*)"),
            ExtractionRule::new("os", r"(?i)OS[:\s]+([^\n]+)"),
            ExtractionRule::new("chipset", r"(?i)Chipset[:\s]+([^\n]+)"),
            ExtractionRule::new("cpu", r"(?i)CPU[:\s]+([^\n]+)"),
            ExtractionRule::new("gpu", r"(?i)GPU[:\s]+([^\n]+)"),
            ExtractionRule::new("memory", r"(?i)Internal[:\s]+([^\n]+)"),
            ExtractionRule::new("main_camera", r"(?i)Main Camera[:\s]+([^\n]+)"),
            ExtractionRule::new("selfie_camera", r"(?i)Selfie[:\s]+([^\n]+)"),
            ExtractionRule::new("battery", r"(?i)Battery[:\s]+([^\n]+)"),
            ExtractionRule::new("charging", r"(?i)Charging[:\s]+([^\n]+)"),
            ExtractionRule::new("price", r"(?i)Price[:\s]+([^\n]+)"),
            ExtractionRule::new("colors", r"(?i)Colors[:\s]+([^\n]+)"),
            ExtractionRule::new("network", r"(?i)Network[:\s]+([^\n]+)"),
            ExtractionRule::new("sim", r"(?i)SIM[:\s]+([^\n]+)"),
            ExtractionRule::new("dimensions", r"(?i)Dimensions[:\s]+([^\n]+)"),
            ExtractionRule::new("build", r"(?i)Build[:\s]+([^\n]+)"),
            ExtractionRule::new("protection", r"(?i)Protection[:\s]+([^\n]+)"),
            ExtractionRule::new("wlan", r"(?i)WLAN[:\s]+([^\n]+)"),
            ExtractionRule::new("bluetooth", r"(?i)Bluetooth[:\s]+([^\n]+)"),
            ExtractionRule::new("nfc", r"(?i)NFC[:\s]+([^\n]+)"),
            ExtractionRule::new("usb", r"(?i)USB[:\s]+([^\n]+)"),
            ExtractionRule::new("sensors", r"(?i)Sensors[:\s]+([^\n]+)"),
        ];

        Self { name_rule, rules }
    }
}

impl SpecExtractor {
    /// Append a rule to the registry. Applied after the built-in rules, in
    /// insertion order.
    pub fn push_rule(&mut self, rule: ExtractionRule) {
        self.rules.push(rule);
    }

    /// Pure extraction: identical input always yields the identical map.
    /// Rules that fail to match omit their key; nothing here can fail.
    pub fn extract(&self, markdown: &str) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();

        if let Some(name) = self.name_rule.apply(markdown) {
            fields.insert(self.name_rule.field.to_string(), name);
        }
        for rule in &self.rules {
            if let Some(value) = rule.apply(markdown) {
                fields.insert(rule.field.to_string(), value);
            }
        }
        fields
    }

    /// Extract into a record stamped with its source URL.
    pub fn extract_record(&self, markdown: &str, source_url: &str) -> SpecRecord {
        SpecRecord::new(self.extract(markdown), source_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Samsung Galaxy S24

Released: 2024, January 24
Weight: 167 g
Chipset: Exynos 2400
Battery: 4000 mAh
Price: $ 799.99
";

    #[test]
    fn test_extracts_matching_fields() {
        let extractor = SpecExtractor::default();
        let fields = extractor.extract(SAMPLE);

        assert_eq!(fields["model_name"], "Samsung Galaxy S24");
        assert_eq!(fields["released"], "2024, January 24");
        assert_eq!(fields["chipset"], "Exynos 2400");
        assert_eq!(fields["battery"], "4000 mAh");
    }

    #[test]
    fn test_missing_section_omits_key() {
        let extractor = SpecExtractor::default();
        let fields = extractor.extract("# Phone X\n\nChipset: Dimensity 9300\n");

        assert!(!fields.contains_key("battery"));
        assert!(fields.contains_key("chipset"));
    }

    #[test]
    fn test_malformed_input_never_fails() {
        let extractor = SpecExtractor::default();
        assert!(extractor.extract("").is_empty());
        let garbage = "\u{0}\u{1}[[[**]]]((((";
        let _ = extractor.extract(garbage);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = SpecExtractor::default();
        assert_eq!(extractor.extract(SAMPLE), extractor.extract(SAMPLE));
    }

    #[test]
    fn test_registry_is_extensible() {
        let mut extractor = SpecExtractor::default();
        extractor.push_rule(ExtractionRule::new("ip_rating", r"(?i)IP rating[:\s]+([^\n]+)"));

        let fields = extractor.extract("# Phone\nIP rating: IP68\n");
        assert_eq!(fields["ip_rating"], "IP68");
    }
}
