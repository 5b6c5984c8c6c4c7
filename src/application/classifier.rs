//! Category classifier for raw provider records.
//!
//! A record is assigned exactly one `InternalCategory` through an ordered
//! fallback chain; each step short-circuits on first hit:
//!
//! 1. Provider-asserted category tag (highest trust, used verbatim)
//! 2. Taxonomy slug/name lookup against a fixed slug table, most-specific
//!    (longest) slug first
//! 3. Keyword scan over name + description in a fixed category order
//! 4. Default to `cpu`
//!
//! Unpublished records and CPU-cooler/case-fan records outside the cooler
//! facet are excluded outright (`None`).

use crate::domain::{InternalCategory, RawProduct, TaxonomyRef};
use once_cell::sync::Lazy;
use regex::Regex;

/// Caller-side knobs for classification.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyOptions {
    /// Set when the active facet *is* the cooler category, which disables
    /// the CPU-cooler/case-fan exclusion filter.
    pub include_cpu_coolers: bool,
}

/// Known provider slugs per category, including historical and alternate
/// WooCommerce slugs observed in the wild. Longest-key-wins on substring
/// matches, so more specific variants sit safely beside short ones.
const SLUG_TABLE: &[(&str, InternalCategory)] = &[
    // cpu
    ("cpu", InternalCategory::Cpu),
    ("cpus", InternalCategory::Cpu),
    ("processor", InternalCategory::Cpu),
    ("processors", InternalCategory::Cpu),
    ("amd-processors", InternalCategory::Cpu),
    ("intel-processors", InternalCategory::Cpu),
    ("amd-ryzen", InternalCategory::Cpu),
    ("intel-core", InternalCategory::Cpu),
    // gpu
    ("gpu", InternalCategory::Gpu),
    ("gpus", InternalCategory::Gpu),
    ("graphic-card", InternalCategory::Gpu),
    ("graphic-cards", InternalCategory::Gpu),
    ("graphics-card", InternalCategory::Gpu),
    ("graphics-cards", InternalCategory::Gpu),
    ("video-cards", InternalCategory::Gpu),
    // motherboard
    ("motherboard", InternalCategory::Motherboard),
    ("motherboards", InternalCategory::Motherboard),
    ("mainboard", InternalCategory::Motherboard),
    ("mainboards", InternalCategory::Motherboard),
    ("amd-motherboards", InternalCategory::Motherboard),
    ("intel-motherboards", InternalCategory::Motherboard),
    // ram
    ("ram", InternalCategory::Ram),
    ("rams", InternalCategory::Ram),
    ("memory", InternalCategory::Ram),
    ("desktop-ram", InternalCategory::Ram),
    ("laptop-ram", InternalCategory::Ram),
    ("ddr4-ram", InternalCategory::Ram),
    ("ddr5-ram", InternalCategory::Ram),
    // storage
    ("storage", InternalCategory::Storage),
    ("ssd", InternalCategory::Storage),
    ("ssds", InternalCategory::Storage),
    ("hdd", InternalCategory::Storage),
    ("hdds", InternalCategory::Storage),
    ("nvme", InternalCategory::Storage),
    ("hard-drives", InternalCategory::Storage),
    ("internal-storage", InternalCategory::Storage),
    ("external-storage", InternalCategory::Storage),
    ("solid-state-drives", InternalCategory::Storage),
    // psu
    ("psu", InternalCategory::Psu),
    ("psus", InternalCategory::Psu),
    ("power-supply", InternalCategory::Psu),
    ("power-supplies", InternalCategory::Psu),
    ("backup-power", InternalCategory::Psu),
    ("smps", InternalCategory::Psu),
    ("ups", InternalCategory::Psu),
    // case
    ("case", InternalCategory::Case),
    ("cases", InternalCategory::Case),
    ("casing", InternalCategory::Case),
    ("casings", InternalCategory::Case),
    ("pc-cases", InternalCategory::Case),
    ("computer-cases", InternalCategory::Case),
    ("chassis", InternalCategory::Case),
    // cooler
    ("cooler", InternalCategory::Cooler),
    ("coolers", InternalCategory::Cooler),
    ("coolers-fans", InternalCategory::Cooler),
    ("cooling", InternalCategory::Cooler),
    ("cpu-coolers", InternalCategory::Cooler),
    ("case-fans", InternalCategory::Cooler),
    ("laptop-coolers", InternalCategory::Cooler),
    ("cooling-pads", InternalCategory::Cooler),
    // monitor
    ("monitor", InternalCategory::Monitor),
    ("monitors", InternalCategory::Monitor),
    ("displays", InternalCategory::Monitor),
    ("led-monitors", InternalCategory::Monitor),
    ("gaming-monitors", InternalCategory::Monitor),
    // mouse
    ("mouse", InternalCategory::Mouse),
    ("mice", InternalCategory::Mouse),
    ("gaming-mouse", InternalCategory::Mouse),
    ("gaming-mice", InternalCategory::Mouse),
    // keyboard
    ("keyboard", InternalCategory::Keyboard),
    ("keyboards", InternalCategory::Keyboard),
    ("gaming-keyboards", InternalCategory::Keyboard),
    ("mechanical-keyboards", InternalCategory::Keyboard),
    // headset
    ("headset", InternalCategory::Headset),
    ("headsets", InternalCategory::Headset),
    ("headphones", InternalCategory::Headset),
    ("gaming-headsets", InternalCategory::Headset),
    ("earphones", InternalCategory::Headset),
];

/// Classify one raw record.
///
/// Returns `None` only when the record must be excluded entirely: it is
/// not published, or it tripped the cooler exclusion filter. Otherwise a
/// category is always assigned (default `cpu`).
pub fn classify(record: &RawProduct, options: &ClassifyOptions) -> Option<InternalCategory> {
    if !record.is_published() {
        return None;
    }

    let category = provider_asserted(record)
        .or_else(|| match_taxonomy(&record.categories))
        .or_else(|| keyword_category(&record.search_text()))
        .unwrap_or(InternalCategory::Cpu);

    // The laptop-accessory cooler bucket must not surface CPU cooling or
    // case fans unless the caller is browsing the cooler facet itself.
    if category == InternalCategory::Cooler && !options.include_cpu_coolers {
        let text = record.search_text();
        if is_cpu_cooler(&text) || is_case_fan(&text) {
            tracing::debug!(product_id = record.id, "excluded by cooler post-filter");
            return None;
        }
    }

    Some(category)
}

/// Step 1: a tag or meta entry carrying an `InternalCategory` token verbatim.
fn provider_asserted(record: &RawProduct) -> Option<InternalCategory> {
    for tag in &record.tags {
        if let Some(cat) =
            InternalCategory::from_token(&tag.slug).or_else(|| InternalCategory::from_token(&tag.name))
        {
            return Some(cat);
        }
    }
    record
        .meta_data
        .iter()
        .filter(|m| m.key == "internal_category")
        .find_map(|m| m.value_str().and_then(InternalCategory::from_token))
}

/// Step 2: taxonomy entries against the slug table, most specific slug
/// first. The first entry (in sorted order) that produces any match wins;
/// later entries are not examined.
fn match_taxonomy(entries: &[TaxonomyRef]) -> Option<InternalCategory> {
    let mut sorted: Vec<&TaxonomyRef> = entries.iter().collect();
    sorted.sort_by(|a, b| b.slug.len().cmp(&a.slug.len()));

    for entry in sorted {
        let slug = entry.slug.to_lowercase();
        let name = entry.name.to_lowercase();

        if let Some(cat) = lookup_slug(&slug).or_else(|| lookup_slug(&name)) {
            return Some(cat);
        }
    }
    None
}

/// Exact key hit, then bidirectional containment with longest-key-wins.
/// Containment only applies when the shorter side has at least 3 chars,
/// guarding against spurious matches on degenerate slugs.
pub fn lookup_slug(token: &str) -> Option<InternalCategory> {
    if token.is_empty() {
        return None;
    }
    if let Some(cat) = lookup_slug_exact(token) {
        return Some(cat);
    }

    let mut best: Option<(&str, InternalCategory)> = None;
    for (key, cat) in SLUG_TABLE {
        let shorter = key.len().min(token.len());
        if shorter < 3 {
            continue;
        }
        if token.contains(key) || key.contains(token) {
            match best {
                Some((best_key, _)) if best_key.len() >= key.len() => {}
                _ => best = Some((key, *cat)),
            }
        }
    }
    best.map(|(_, cat)| cat)
}

/// Verbatim key hit only, no containment. Used where a fuzzy match would
/// do more harm than a miss (taxonomy alias resolution).
pub fn lookup_slug_exact(token: &str) -> Option<InternalCategory> {
    SLUG_TABLE
        .iter()
        .find(|(key, _)| *key == token)
        .map(|(_, cat)| *cat)
}

/// Step 3: keyword scan in a fixed category order, first hit wins.
fn keyword_category(text: &str) -> Option<InternalCategory> {
    let mentions_cooling = text.contains("cooler") || text.contains("cooling");

    if text.contains("motherboard") || text.contains("mainboard") || contains_word(text, "mobo") {
        return Some(InternalCategory::Motherboard);
    }
    // CPU keywords are skipped for cooling products, which routinely name
    // the CPUs and sockets they support.
    if !mentions_cooling
        && (text.contains("processor")
            || text.contains("ryzen")
            || text.contains("core i3")
            || text.contains("core i5")
            || text.contains("core i7")
            || text.contains("core i9")
            || contains_word(text, "cpu"))
    {
        return Some(InternalCategory::Cpu);
    }
    if text.contains("graphics card")
        || text.contains("graphic card")
        || text.contains("video card")
        || text.contains("geforce")
        || text.contains("radeon")
        || contains_word(text, "rtx")
        || contains_word(text, "gtx")
    {
        return Some(InternalCategory::Gpu);
    }
    if text.contains("ddr3")
        || text.contains("ddr4")
        || text.contains("ddr5")
        || text.contains("sodimm")
        || text.contains("so-dimm")
        || contains_word(text, "ram")
        || contains_word(text, "dimm")
    {
        return Some(InternalCategory::Ram);
    }
    if contains_word(text, "ssd")
        || contains_word(text, "hdd")
        || contains_word(text, "nvme")
        || text.contains("hard drive")
        || text.contains("hard disk")
        || text.contains("solid state")
        || text.contains("m.2")
    {
        return Some(InternalCategory::Storage);
    }
    if text.contains("power supply")
        || text.contains("80 plus")
        || text.contains("80+")
        || contains_word(text, "psu")
        || contains_word(text, "smps")
    {
        return Some(InternalCategory::Psu);
    }
    // "phone case" is the classic false positive for the case bucket.
    if !text.contains("phone case")
        && (contains_word(text, "case") || text.contains("chassis") || text.contains("mid tower") || text.contains("full tower"))
    {
        return Some(InternalCategory::Case);
    }
    if text.contains("cooler")
        || text.contains("cooling pad")
        || text.contains("heatsink")
        || text.contains("heat sink")
        || text.contains("radiator")
        || contains_word(text, "aio")
    {
        return Some(InternalCategory::Cooler);
    }
    if contains_word(text, "monitor")
        || text.contains("144hz")
        || text.contains("165hz")
        || text.contains("240hz")
        || text.contains("ips panel")
    {
        return Some(InternalCategory::Monitor);
    }
    if contains_word(text, "mouse") || contains_word(text, "mice") {
        return Some(InternalCategory::Mouse);
    }
    if text.contains("keyboard") {
        return Some(InternalCategory::Keyboard);
    }
    if text.contains("headset")
        || text.contains("headphone")
        || text.contains("earphone")
        || text.contains("earbud")
    {
        return Some(InternalCategory::Headset);
    }
    None
}

/// Token-boundary containment check; `text` is expected lowercase.
pub(crate) fn contains_word(text: &str, word: &str) -> bool {
    for (idx, _) in text.match_indices(word) {
        let before_ok = idx == 0
            || !text[..idx]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let after = idx + word.len();
        let after_ok = after >= text.len()
            || !text[after..].chars().next().is_some_and(|c| c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
    }
    false
}

static SOCKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:lga\s*\d{3,4}|am[2-5]\+?)\b").expect("socket regex"));

static FAN_SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{2,3}\s*mm\b").expect("fan size regex"));

static FAN_PACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d+\s*(?:pcs|pack|in\s*1)|pack of\s*\d+)\b").expect("fan pack regex"));

/// Known CPU-cooler brand + product-line combinations. Brand-only matching
/// would misflag laptop cooling pads from the same vendors, so the line
/// token is required too.
const CPU_COOLER_LINES: &[(&str, &str)] = &[
    ("nzxt", "kraken"),
    ("corsair", "h100"),
    ("corsair", "h150"),
    ("corsair", "icue link"),
    ("cooler master", "hyper"),
    ("cooler master", "masterliquid"),
    ("deepcool", "ak"),
    ("deepcool", "le"),
    ("noctua", "nh-"),
    ("thermaltake", "water"),
    ("arctic", "freezer"),
    ("arctic", "liquid"),
    ("be quiet", "dark rock"),
    ("be quiet", "pure loop"),
    ("lian li", "galahad"),
];

/// CPU-cooling signature: AIO/radiator wording, a socket pattern, or a
/// known brand + line combination.
fn is_cpu_cooler(text: &str) -> bool {
    if contains_word(text, "aio")
        || text.contains("radiator")
        || text.contains("liquid cooler")
        || text.contains("liquid cooling")
        || text.contains("water cooling")
        || text.contains("cpu cooler")
        || text.contains("cpu air cooler")
        || text.contains("tower cooler")
    {
        return true;
    }
    if SOCKET_RE.is_match(text) {
        return true;
    }
    CPU_COOLER_LINES
        .iter()
        .any(|(brand, line)| text.contains(brand) && text.contains(line))
}

/// Case-fan signature: pack-size wording plus a fan-diameter pattern,
/// without laptop/notebook qualifiers.
fn is_case_fan(text: &str) -> bool {
    if text.contains("laptop") || text.contains("notebook") {
        return false;
    }
    FAN_SIZE_RE.is_match(text) && (FAN_PACK_RE.is_match(text) || text.contains("case fan"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MetaEntry, ProductStatus};

    fn published(name: &str) -> RawProduct {
        RawProduct {
            id: 1,
            name: name.to_string(),
            status: ProductStatus::Publish,
            ..Default::default()
        }
    }

    fn with_category(name: &str, slug: &str) -> RawProduct {
        let mut record = published(name);
        record.categories.push(TaxonomyRef {
            id: 10,
            name: slug.replace('-', " "),
            slug: slug.to_string(),
        });
        record
    }

    #[test]
    fn test_unpublished_is_always_excluded() {
        let mut record = with_category("ASUS ROG Strix RTX 4080", "graphic-cards");
        record.status = ProductStatus::Draft;
        assert_eq!(classify(&record, &ClassifyOptions::default()), None);
        record.status = ProductStatus::Pending;
        assert_eq!(classify(&record, &ClassifyOptions::default()), None);
    }

    #[test]
    fn test_provider_asserted_tag_short_circuits() {
        let mut record = with_category("Mystery Bundle", "graphic-cards");
        record.tags.push(TaxonomyRef {
            id: 1,
            name: "monitor".into(),
            slug: "monitor".into(),
        });
        // The tag wins over the gpu taxonomy slug.
        assert_eq!(
            classify(&record, &ClassifyOptions::default()),
            Some(InternalCategory::Monitor)
        );
    }

    #[test]
    fn test_provider_asserted_meta_entry() {
        let mut record = published("Some Device");
        record.meta_data.push(MetaEntry {
            key: "internal_category".into(),
            value: serde_json::Value::String("keyboard".into()),
        });
        assert_eq!(
            classify(&record, &ClassifyOptions::default()),
            Some(InternalCategory::Keyboard)
        );
    }

    #[test]
    fn test_taxonomy_slug_match() {
        let record = with_category("ASUS ROG Strix RTX 4080 16GB GDDR6X", "graphic-cards");
        assert_eq!(
            classify(&record, &ClassifyOptions::default()),
            Some(InternalCategory::Gpu)
        );
    }

    #[test]
    fn test_longer_slug_examined_first() {
        let mut record = published("Combo Deal");
        // "memory" would map to ram, but the longer, more specific slug is
        // examined first and wins.
        record.categories.push(TaxonomyRef {
            id: 1,
            name: "Memory".into(),
            slug: "memory".into(),
        });
        record.categories.push(TaxonomyRef {
            id: 2,
            name: "Solid State Drives".into(),
            slug: "solid-state-drives".into(),
        });
        assert_eq!(
            classify(&record, &ClassifyOptions::default()),
            Some(InternalCategory::Storage)
        );
    }

    #[test]
    fn test_containment_prefers_longest_key() {
        // "gaming-mouse-collection" hits both "mouse" and "gaming-mouse";
        // the longest table key decides.
        assert_eq!(lookup_slug("gaming-mouse-collection"), Some(InternalCategory::Mouse));
        assert_eq!(lookup_slug("backup-power"), Some(InternalCategory::Psu));
        assert_eq!(lookup_slug(""), None);
    }

    #[test]
    fn test_keyword_fallback_cpu() {
        let record = published("AMD Ryzen 9 7950X 16-Core TDP 170W");
        assert_eq!(
            classify(&record, &ClassifyOptions::default()),
            Some(InternalCategory::Cpu)
        );
    }

    #[test]
    fn test_keyword_fallback_fixed_order() {
        // Mentions both a motherboard and a cpu; motherboard is tested
        // first in the chain and wins.
        let record = published("MSI B650 Motherboard for Ryzen processors");
        assert_eq!(
            classify(&record, &ClassifyOptions::default()),
            Some(InternalCategory::Motherboard)
        );
    }

    #[test]
    fn test_phone_case_guard() {
        let record = published("Shockproof phone case for iPhone 15");
        // Falls through the case step, matches nothing, lands on the
        // documented cpu default.
        assert_eq!(
            classify(&record, &ClassifyOptions::default()),
            Some(InternalCategory::Cpu)
        );
    }

    #[test]
    fn test_default_is_cpu_never_none() {
        let record = published("Gift voucher");
        assert_eq!(
            classify(&record, &ClassifyOptions::default()),
            Some(InternalCategory::Cpu)
        );
    }

    #[test]
    fn test_cooler_exclusion_aio() {
        let record = with_category("NZXT Kraken X73 AIO 360mm Radiator", "coolers-fans");
        assert_eq!(classify(&record, &ClassifyOptions::default()), None);
    }

    #[test]
    fn test_cooler_facet_keeps_cpu_coolers() {
        let record = with_category("NZXT Kraken X73 AIO 360mm Radiator", "coolers-fans");
        let opts = ClassifyOptions { include_cpu_coolers: true };
        assert_eq!(classify(&record, &opts), Some(InternalCategory::Cooler));
    }

    #[test]
    fn test_cooler_exclusion_socket_pattern() {
        let record = with_category("Deepcool AK400 for LGA1700 and AM5", "coolers");
        assert_eq!(classify(&record, &ClassifyOptions::default()), None);
    }

    #[test]
    fn test_case_fan_pack_excluded() {
        let record = with_category("RGB 120mm fans 3 pcs case fan kit", "coolers-fans");
        assert_eq!(classify(&record, &ClassifyOptions::default()), None);
    }

    #[test]
    fn test_laptop_cooling_pad_survives_filter() {
        let record = with_category("Laptop cooling pad with 200mm silent fan", "cooling-pads");
        assert_eq!(
            classify(&record, &ClassifyOptions::default()),
            Some(InternalCategory::Cooler)
        );
    }

    #[test]
    fn test_contains_word_boundaries() {
        assert!(contains_word("gaming mouse pad", "mouse"));
        assert!(!contains_word("showcase shelf", "case"));
        assert!(contains_word("atx case, black", "case"));
    }
}
