//! Specification extractor: turns a raw record plus its resolved category
//! into a normalized spec map and a compatibility sub-structure.
//!
//! Priority is strict and first-writer-wins: metadata entries, then
//! attribute entries, then category regex rules, then a best-effort
//! fallback pass. A key populated by a higher-priority source is never
//! overwritten.

use crate::application::classifier::contains_word;
use crate::domain::{Compatibility, InternalCategory, RawProduct};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

/// Administrative meta-key substrings that never surface as specs.
const META_DENYLIST: &[&str] = &[
    "_wp_",
    "_yoast_",
    "_wc_",
    "_edit_lock",
    "_edit_last",
    "_thumbnail_id",
    "_product_attributes",
    "_default_attributes",
    "_tax_status",
    "_tax_class",
    "_manage_stock",
    "_backorders",
    "_sold_individually",
    "_virtual",
    "_downloadable",
    "_elementor",
    "_wpb_",
    "_oembed",
    "page_template",
    "rank_math",
    "_jetpack",
    "_wpcom",
];

/// Value length ceiling. Extracted values feed exactly one surface here,
/// the product detail spec table, so the tighter detail ceiling applies;
/// there is no separate comparison context with a looser one.
const MAX_VALUE_LEN: usize = 500;

static MARKUP_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:<[^>]*>\s*)+$").expect("markup regex"));

struct SpecRule {
    key: &'static str,
    regex: Regex,
}

fn rule(key: &'static str, pattern: &str) -> SpecRule {
    SpecRule {
        key,
        regex: Regex::new(pattern).expect("spec rule regex"),
    }
}

/// Fixed, ordered rule sets per category. All patterns are
/// case-insensitive and run over the original-case search text so the
/// captured values keep their casing ("16GB GDDR6X", not "16gb gddr6x").
/// Rules carry at most one capture group; group-less rules are boolean
/// flags recorded as "Yes".
static SPEC_RULES: Lazy<HashMap<InternalCategory, Vec<SpecRule>>> = Lazy::new(|| {
    use InternalCategory::*;
    let mut rules = HashMap::new();

    rules.insert(
        Gpu,
        vec![
            rule("VRAM", r"(?i)\b(\d+\s*GB\s*GDDR\d+X?)\b"),
            rule("Core Clock", r"(?i)(?:core|base)\s*clock\s*:?\s*([\d.]+\s*[MG]Hz)"),
            rule("Boost Clock", r"(?i)boost\s*clock\s*:?\s*([\d.]+\s*[MG]Hz)"),
            rule("Memory Clock", r"(?i)memory\s*(?:clock|speed)\s*:?\s*([\d.]+\s*(?:[MG]Hz|Gbps))"),
            rule("TDP", r"(?i)TDP\D{0,3}(\d+\s*W)\b"),
            rule("TDP", r"(?i)\b(\d+\s*W)\s*TDP\b"),
            rule("Interface", r"(?i)\b(PCIe?\s*(?:Gen\s*)?[345](?:\.0)?(?:\s*x\s*\d{1,2})?)\b"),
            rule("CUDA Cores", r"(?i)\b([\d,]{3,6})\s*CUDA"),
            rule("Stream Processors", r"(?i)\b([\d,]{3,6})\s*stream\s*processors"),
            rule("Ray Tracing", r"(?i)\bray[\s-]?tracing\b"),
            rule("DLSS", r"(?i)\bDLSS\b"),
        ],
    );
    rules.insert(
        Cpu,
        vec![
            rule("Cores", r"(?i)\b(\d{1,3})[\s-]*cores?\b"),
            rule("Threads", r"(?i)\b(\d{1,3})[\s-]*threads?\b"),
            rule("Base Clock", r"(?i)base\s*clock\s*:?\s*([\d.]+\s*GHz)"),
            rule("Boost Clock", r"(?i)(?:up\s*to|boost(?:\s*clock)?)[:\s]*([\d.]+\s*GHz)"),
            rule("L3 Cache", r"(?i)\b(\d+\s*MB)\s*(?:L3\s*)?cache\b"),
            rule("TDP", r"(?i)TDP\D{0,3}(\d+\s*W)\b"),
            rule("TDP", r"(?i)\b(\d+\s*W)\s*TDP\b"),
            rule("Socket", r"(?i)\b(AM[45]|LGA\s?\d{3,4})\b"),
            rule(
                "Architecture",
                r"(?i)\b(Zen\s?[2-5]\+?|Raptor\s*Lake|Alder\s*Lake|Comet\s*Lake|Rocket\s*Lake)\b",
            ),
        ],
    );
    rules.insert(
        Ram,
        vec![
            rule("Kit", r"(?i)\b(\d+\s*x\s*\d+\s*GB)\b"),
            rule("Capacity", r"(?i)\b(\d+\s*GB)\b"),
            rule("Speed", r"(?i)\b(\d{4,5})\s*(?:MHz|MT/s)\b"),
            rule("Type", r"(?i)\b(DDR[345])\b"),
            rule("CAS Latency", r"(?i)\b(?:CL|CAS)\s*(\d{1,2})\b"),
            rule("Timings", r"(?i)\b(\d{1,2}-\d{1,2}-\d{1,2}(?:-\d{1,2})?)\b"),
            rule("Voltage", r"(?i)\b([01]\.\d{1,2})\s*V\b"),
            rule("Form Factor", r"(?i)\b(SO-?DIMM|U?DIMM)\b"),
            rule("RGB", r"(?i)\bRGB\b"),
        ],
    );
    rules.insert(
        Storage,
        vec![
            rule("Capacity", r"(?i)\b(\d+(?:\.\d+)?\s*[GT]B)\b"),
            rule(
                "Interface",
                r"(?i)\b(NVMe|SATA(?:\s*(?:III|3|6\s*Gb/s))?|PCIe\s*(?:Gen\s*)?[345](?:\.0)?(?:\s*x\d)?)\b",
            ),
            rule("Form Factor", r#"(?i)\b(M\.2(?:\s*22(?:42|80|110))?|2\.5\s*(?:inch|")?|3\.5\s*(?:inch|")?)"#),
            rule("Read Speed", r"(?i)read(?:\s*speeds?)?(?:\s*up\s*to)?[:\s]*([\d,]+\s*MB/s)"),
            rule("Write Speed", r"(?i)write(?:\s*speeds?)?(?:\s*up\s*to)?[:\s]*([\d,]+\s*MB/s)"),
            rule("RPM", r"(?i)\b(\d{4})\s*RPM\b"),
            rule("Cache", r"(?i)\b(\d+\s*MB)\s*cache\b"),
        ],
    );
    rules.insert(
        Psu,
        vec![
            rule("Wattage", r"(?i)\b(\d{3,4}\s*W)(?:att)?s?\b"),
            rule(
                "Efficiency",
                r"(?i)\b(80\s*(?:\+|Plus)\s*(?:Bronze|Silver|Gold|Platinum|Titanium)?)",
            ),
            rule("Modularity", r"(?i)\b((?:fully|semi|non)[\s-]*modular)\b"),
            rule("Form Factor", r"(?i)\b(SFX-?L?|ATX)\b"),
        ],
    );
    rules.insert(
        Motherboard,
        vec![
            rule("Chipset", r"(?i)\b([BXZH]\d{3}[A-Z]?M?)\b"),
            rule("Socket", r"(?i)\b(AM[45]|LGA\s?\d{3,4})\b"),
            rule("Memory Support", r"(?i)\b(DDR[345])\b"),
            rule("Form Factor", r"(?i)\b(Mini-?ITX|Micro[\s-]?ATX|M-?ATX|E-?ATX|ATX)\b"),
            rule("Max Memory", r"(?i)up\s*to\s*(\d+\s*GB)"),
            rule("M.2 Slots", r"(?i)\b(\d)\s*x?\s*M\.2\b"),
        ],
    );
    rules.insert(
        Cooler,
        vec![
            rule("Type", r"(?i)\b(AIO)\b"),
            rule("Type", r"(?i)\b(liquid|air)\s*cool"),
            rule("Radiator Size", r"(?i)\b(\d{3}\s*mm)\s*(?:radiator|AIO)"),
            rule("Fan Size", r"(?i)\b(\d{2,3}\s*mm)\s*fan"),
            rule("Socket Support", r"(?i)\b(LGA\s?\d{3,4}|AM[2-5]\+?)\b"),
            rule("Fan Speed", r"(?i)\b(\d{3,4})\s*RPM\b"),
            rule("RGB", r"(?i)\bRGB\b"),
        ],
    );
    rules.insert(
        Case,
        vec![
            rule("Form Factor Support", r"(?i)\b(Mini-?ITX|Micro[\s-]?ATX|M-?ATX|E-?ATX|ATX)\b"),
            rule("Side Panel", r"(?i)\b(tempered\s*glass|acrylic)\b"),
            rule("Tower Type", r"(?i)\b(mid|full|mini)[\s-]*tower\b"),
            rule("Included Fans", r"(?i)\b(\d)\s*x?\s*(?:\d{2,3}\s*mm\s*)?fans\b"),
            rule("RGB", r"(?i)\bRGB\b"),
        ],
    );
    rules.insert(
        Monitor,
        vec![
            rule("Screen Size", r#"(?i)\b(\d{2}(?:\.\d)?)\s*(?:inch|")"#),
            rule("Refresh Rate", r"(?i)\b(\d{2,3}\s*Hz)\b"),
            rule(
                "Resolution",
                r"(?i)\b(\d{3,4}\s*x\s*\d{3,4}|4K\s*UHD|4K|WQHD|QHD|FHD|1080p|1440p|2160p)\b",
            ),
            rule("Panel", r"(?i)\b(IPS|OLED|VA|TN)\b"),
            rule("Response Time", r"(?i)\b(\d+(?:\.\d)?\s*ms)\b"),
        ],
    );
    rules.insert(
        Mouse,
        vec![
            rule("DPI", r"(?i)\b([\d,]{3,6})\s*DPI\b"),
            rule("Buttons", r"(?i)\b(\d{1,2})\s*(?:programmable\s*)?buttons\b"),
            rule("Polling Rate", r"(?i)\b(\d{3,4}\s*Hz)\s*polling"),
            rule("Connection", r"(?i)\b(wireless|wired|bluetooth)\b"),
            rule("RGB", r"(?i)\bRGB\b"),
        ],
    );
    rules.insert(
        Keyboard,
        vec![
            rule("Switches", r"(?i)\b((?:blue|red|brown|black|silver)\s*switch(?:es)?)\b"),
            rule("Layout", r"(?i)\b(TKL|tenkeyless|60%|65%|75%|full[\s-]?size)\b"),
            rule("Connection", r"(?i)\b(wireless|wired|bluetooth)\b"),
            rule("Backlight", r"(?i)\bRGB\b"),
        ],
    );
    rules.insert(
        Headset,
        vec![
            rule("Driver", r"(?i)\b(\d{2}\s*mm)\s*driver"),
            rule("Surround", r"(?i)\b(7\.1|5\.1)\b"),
            rule("Connection", r"(?i)\b(3\.5\s*mm|USB|wireless|bluetooth)\b"),
            rule("Microphone", r"(?i)\b(?:mic|microphone)\b"),
        ],
    );

    rules
});

static FEATURE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*(?:GB|TB|MHz|GHz|W|mm|Hz|RPM|DPI|ms)\b")
        .expect("feature token regex")
});

/// Brands probed against the product name, most-specific first where one
/// contains another (e.g. "Cooler Master" before any bare token).
const KNOWN_BRANDS: &[&str] = &[
    "Cooler Master",
    "Western Digital",
    "be quiet!",
    "Lian Li",
    "G.Skill",
    "TeamGroup",
    "PowerColor",
    "SteelSeries",
    "Thermaltake",
    "ViewSonic",
    "Gigabyte",
    "Seasonic",
    "Sapphire",
    "Gainward",
    "Redragon",
    "Logitech",
    "Kingston",
    "Deepcool",
    "Patriot",
    "Fantech",
    "Corsair",
    "Crucial",
    "Samsung",
    "Seagate",
    "HyperX",
    "Noctua",
    "Arctic",
    "ASRock",
    "NVIDIA",
    "Inno3D",
    "A4Tech",
    "Bloody",
    "Palit",
    "Razer",
    "Intel",
    "Antec",
    "Zotac",
    "ADATA",
    "BenQ",
    "Acer",
    "EVGA",
    "NZXT",
    "ASUS",
    "Dell",
    "XPG",
    "AMD",
    "AOC",
    "MSI",
    "FSP",
    "WD",
    "LG",
    "HP",
];

/// Detect the brand from the product name; `"Unknown"` when nothing hits.
/// Short tokens require word boundaries so "WD" never fires inside other
/// words.
pub fn detect_brand(name: &str) -> String {
    let lower = name.to_lowercase();
    for brand in KNOWN_BRANDS {
        let needle = brand.to_lowercase();
        let hit = if needle.len() <= 4 {
            contains_word(&lower, &needle)
        } else {
            lower.contains(&needle)
        };
        if hit {
            return (*brand).to_string();
        }
    }
    String::from("Unknown")
}

fn is_admin_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    META_DENYLIST.iter().any(|deny| lower.contains(deny))
}

/// A value is presentable when it is non-empty, not pure markup, and under
/// the length ceiling.
fn is_presentable(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed.len() <= MAX_VALUE_LEN && !MARKUP_ONLY_RE.is_match(trimmed)
}

/// Readable form of a provider meta key: leading underscores stripped,
/// remaining underscores spaced. Case is preserved so caller-supplied keys
/// stay recognizable.
fn prettify_key(key: &str) -> String {
    key.trim_start_matches('_').replace('_', " ")
}

/// Original-case concatenation of name + descriptions; the haystack for
/// every extraction regex.
fn search_text(record: &RawProduct) -> String {
    format!(
        "{} {} {}",
        record.name, record.description, record.short_description
    )
}

/// Extract the normalized spec map for a record in a given category.
///
/// Deterministic: the same record and category always produce the same
/// mapping. Guaranteed to emit at least a `Key Features` / `Brand` entry
/// when any signal exists in the name.
pub fn extract_specs(record: &RawProduct, category: InternalCategory) -> BTreeMap<String, String> {
    let mut specs: BTreeMap<String, String> = BTreeMap::new();

    // Metadata first: highest-priority source.
    for meta in &record.meta_data {
        if meta.key.is_empty() || is_admin_key(&meta.key) {
            continue;
        }
        let Some(value) = meta.value_str() else { continue };
        if !is_presentable(value) {
            continue;
        }
        specs
            .entry(prettify_key(&meta.key))
            .or_insert_with(|| value.trim().to_string());
    }

    // Attribute entries next.
    for attr in &record.attributes {
        if attr.name.is_empty() || is_admin_key(&attr.name) {
            continue;
        }
        let joined = attr.options.join(", ");
        if !is_presentable(&joined) {
            continue;
        }
        specs.entry(attr.name.clone()).or_insert(joined);
    }

    // Category regex rules over the search text, in rule order.
    let text = search_text(record);
    if let Some(rules) = SPEC_RULES.get(&category) {
        for spec_rule in rules {
            if specs.contains_key(spec_rule.key) {
                continue;
            }
            if let Some(caps) = spec_rule.regex.captures(&text) {
                let value = caps
                    .get(1)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_else(|| String::from("Yes"));
                if !value.is_empty() {
                    specs.insert(spec_rule.key.to_string(), value);
                }
            }
        }
    }

    // Fallback guarantee: never hand the UI a product with zero visible
    // specs when any signal exists.
    if specs.len() < 2 {
        let features: Vec<&str> = FEATURE_TOKEN_RE
            .find_iter(&record.name)
            .map(|m| m.as_str())
            .collect();
        if !features.is_empty() {
            specs
                .entry(String::from("Key Features"))
                .or_insert_with(|| features.join(", "));
        }
        let brand = detect_brand(&record.name);
        if brand != "Unknown" {
            specs.entry(String::from("Brand")).or_insert(brand);
        }
    }

    specs
}

/// Socket probes in priority order; first hit wins.
const SOCKET_PROBES: &[(&str, &str)] = &[
    ("am5", "AM5"),
    ("am4", "AM4"),
    ("lga1700", "LGA1700"),
    ("lga 1700", "LGA1700"),
    ("lga1200", "LGA1200"),
    ("lga 1200", "LGA1200"),
    ("lga1151", "LGA1151"),
    ("lga 1151", "LGA1151"),
];

/// Form-factor probes in canonical most-specific-first order. "atx" is a
/// substring of the larger tokens, so this ordering is load-bearing.
const FORM_FACTOR_PROBES: &[(&str, &str)] = &[
    ("mini-itx", "Mini-ITX"),
    ("mini itx", "Mini-ITX"),
    ("e-atx", "E-ATX"),
    ("eatx", "E-ATX"),
    ("micro atx", "Micro ATX"),
    ("micro-atx", "Micro ATX"),
    ("matx", "Micro ATX"),
    ("m-atx", "Micro ATX"),
    ("atx", "ATX"),
];

static WATTAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{3,4})\s*w\b").expect("wattage regex"));

/// Extract cross-component compatibility signals. Wattage is only
/// meaningful (and only parsed) for PSU records.
pub fn extract_compatibility(record: &RawProduct, category: InternalCategory) -> Compatibility {
    let text = record.search_text();

    let socket = SOCKET_PROBES
        .iter()
        .find(|(probe, _)| contains_word(&text, probe))
        .map(|(_, canonical)| (*canonical).to_string());

    // DDR5 before DDR4: the substrings never collide, but the fixed order
    // keeps the probe list self-documenting.
    let ram_type = ["ddr5", "ddr4", "ddr3"]
        .iter()
        .find(|probe| text.contains(*probe))
        .map(|probe| probe.to_uppercase());

    let form_factor = FORM_FACTOR_PROBES
        .iter()
        .find(|(probe, _)| text.contains(probe))
        .map(|(_, canonical)| (*canonical).to_string());

    let wattage = if category == InternalCategory::Psu {
        WATTAGE_RE
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
    } else {
        None
    };

    Compatibility {
        socket,
        ram_type,
        form_factor,
        wattage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttributeEntry, MetaEntry, ProductStatus};
    use serde_json::json;

    fn record(name: &str, description: &str) -> RawProduct {
        RawProduct {
            id: 1,
            name: name.to_string(),
            description: description.to_string(),
            status: ProductStatus::Publish,
            ..Default::default()
        }
    }

    #[test]
    fn test_gpu_vram_extraction() {
        let rec = record("ASUS ROG Strix RTX 4080 16GB GDDR6X", "");
        let specs = extract_specs(&rec, InternalCategory::Gpu);
        assert_eq!(specs.get("VRAM").map(String::as_str), Some("16GB GDDR6X"));
    }

    #[test]
    fn test_cpu_cores_and_tdp() {
        let rec = record("AMD Ryzen 9 7950X 16-Core TDP 170W", "");
        let specs = extract_specs(&rec, InternalCategory::Cpu);
        assert_eq!(specs.get("Cores").map(String::as_str), Some("16"));
        assert_eq!(specs.get("TDP").map(String::as_str), Some("170W"));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let rec = record(
            "Corsair Vengeance 32GB (2x16GB) DDR5 6000MHz CL30",
            "1.35V, DIMM form factor, RGB lighting",
        );
        let first = extract_specs(&rec, InternalCategory::Ram);
        let second = extract_specs(&rec, InternalCategory::Ram);
        assert_eq!(first, second);
        assert_eq!(first.get("Type").map(String::as_str), Some("DDR5"));
        assert_eq!(first.get("CAS Latency").map(String::as_str), Some("30"));
        assert_eq!(first.get("RGB").map(String::as_str), Some("Yes"));
    }

    #[test]
    fn test_metadata_wins_over_regex() {
        let mut rec = record("AMD Ryzen 7 7700X TDP 105W", "");
        rec.meta_data.push(MetaEntry {
            key: "TDP".into(),
            value: json!("105W (verified)"),
        });
        let specs = extract_specs(&rec, InternalCategory::Cpu);
        assert_eq!(specs.get("TDP").map(String::as_str), Some("105W (verified)"));
    }

    #[test]
    fn test_attributes_win_over_regex_but_not_metadata() {
        let mut rec = record("Kingston Fury 16GB DDR4 3200MHz", "");
        rec.meta_data.push(MetaEntry {
            key: "Capacity".into(),
            value: json!("16GB (meta)"),
        });
        rec.attributes.push(AttributeEntry {
            name: "Capacity".into(),
            options: vec!["16GB (attr)".into()],
        });
        rec.attributes.push(AttributeEntry {
            name: "Speed".into(),
            options: vec!["3200".into()],
        });
        let specs = extract_specs(&rec, InternalCategory::Ram);
        assert_eq!(specs.get("Capacity").map(String::as_str), Some("16GB (meta)"));
        assert_eq!(specs.get("Speed").map(String::as_str), Some("3200"));
    }

    #[test]
    fn test_admin_meta_filtered() {
        let mut rec = record("Plain product 750W", "");
        rec.meta_data.push(MetaEntry {
            key: "_yoast_wpseo_title".into(),
            value: json!("SEO title"),
        });
        rec.meta_data.push(MetaEntry {
            key: "_wp_page_template".into(),
            value: json!("default"),
        });
        rec.meta_data.push(MetaEntry {
            key: "warranty".into(),
            value: json!("2 years"),
        });
        let specs = extract_specs(&rec, InternalCategory::Psu);
        assert!(!specs.keys().any(|k| k.contains("yoast") || k.contains("template")));
        assert_eq!(specs.get("warranty").map(String::as_str), Some("2 years"));
    }

    #[test]
    fn test_markup_and_empty_values_skipped() {
        let mut rec = record("Thing", "");
        rec.meta_data.push(MetaEntry {
            key: "note".into(),
            value: json!("<p></p><br/>"),
        });
        rec.meta_data.push(MetaEntry {
            key: "empty".into(),
            value: json!("   "),
        });
        let specs = extract_specs(&rec, InternalCategory::Case);
        assert!(!specs.contains_key("note"));
        assert!(!specs.contains_key("empty"));
    }

    #[test]
    fn test_overlong_values_skipped() {
        let mut rec = record("Thing", "");
        rec.meta_data.push(MetaEntry {
            key: "story".into(),
            value: json!("x".repeat(MAX_VALUE_LEN + 1)),
        });
        rec.meta_data.push(MetaEntry {
            key: "warranty".into(),
            value: json!("2 years"),
        });
        let specs = extract_specs(&rec, InternalCategory::Case);
        assert!(!specs.contains_key("story"));
        assert_eq!(specs.get("warranty").map(String::as_str), Some("2 years"));
    }

    #[test]
    fn test_fallback_key_features_and_brand() {
        let rec = record("MSI Optix 27 240Hz 1ms", "");
        // Monitor rules pick up the refresh rate; force the sparse path by
        // using a category with no matching rules.
        let specs = extract_specs(&rec, InternalCategory::Keyboard);
        assert_eq!(specs.get("Brand").map(String::as_str), Some("MSI"));
        let features = specs.get("Key Features").expect("key features present");
        assert!(features.contains("240Hz"));
        assert!(features.contains("1ms"));
    }

    #[test]
    fn test_detect_brand_word_boundary() {
        assert_eq!(detect_brand("WD Blue 1TB"), "WD");
        assert_eq!(detect_brand("Crowdfunded gadget"), "Unknown");
        assert_eq!(detect_brand("Cooler Master Hyper 212"), "Cooler Master");
    }

    #[test]
    fn test_compatibility_socket_priority() {
        let rec = record("Dual socket support AM4 and AM5 ready", "");
        let compat = extract_compatibility(&rec, InternalCategory::Motherboard);
        assert_eq!(compat.socket.as_deref(), Some("AM5"));
    }

    #[test]
    fn test_compatibility_ddr5_before_ddr4() {
        let rec = record("Supports DDR5 and legacy DDR4 kits", "");
        let compat = extract_compatibility(&rec, InternalCategory::Motherboard);
        assert_eq!(compat.ram_type.as_deref(), Some("DDR5"));
    }

    #[test]
    fn test_form_factor_most_specific_first() {
        let rec = record("Gigabyte B650M Micro ATX motherboard", "");
        let compat = extract_compatibility(&rec, InternalCategory::Motherboard);
        // "atx" is contained in "micro atx"; ordering must not misread it.
        assert_eq!(compat.form_factor.as_deref(), Some("Micro ATX"));

        let itx = record("ASRock A620I Mini-ITX board", "");
        let compat = extract_compatibility(&itx, InternalCategory::Motherboard);
        assert_eq!(compat.form_factor.as_deref(), Some("Mini-ITX"));
    }

    #[test]
    fn test_wattage_only_for_psu() {
        let psu = record("Corsair RM750e 750W fully modular", "");
        let compat = extract_compatibility(&psu, InternalCategory::Psu);
        assert_eq!(compat.wattage, Some(750));

        let gpu = record("RTX 4070 needs a 650W supply", "");
        let compat = extract_compatibility(&gpu, InternalCategory::Gpu);
        assert_eq!(compat.wattage, None);
    }

    #[test]
    fn test_psu_specs() {
        let rec = record("Seasonic Focus GX-850 850W 80 Plus Gold fully modular ATX", "");
        let specs = extract_specs(&rec, InternalCategory::Psu);
        assert_eq!(specs.get("Wattage").map(String::as_str), Some("850W"));
        assert_eq!(specs.get("Modularity").map(String::as_str), Some("fully modular"));
        assert!(specs.get("Efficiency").is_some_and(|v| v.contains("Gold")));
    }
}
