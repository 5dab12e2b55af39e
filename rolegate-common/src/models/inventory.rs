use serde::{Deserialize, Serialize};

/// Asset-type categories queried by a full inventory scan, in scan order.
pub const INVENTORY_CATALOG: &[&str] = &[
    "Shirt", "Pants", "TShirt", "Hat", "HairAccessory", "FaceAccessory",
    "NeckAccessory", "Gear", "Face", "Package", "Animation",
    "ShoulderAccessory", "FrontAccessory", "BackAccessory",
    "WaistAccessory", "EmoteAnimation", "Badge", "GamePass",
    "Decal", "Audio", "Model", "Place", "Head",
];

/// Canonical item shape. The platform client normalizes every response into
/// this; nothing past the client boundary looks at raw JSON.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    pub item_id: u64,
    pub item_name: String,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "Asc",
            SortOrder::Desc => "Desc",
        }
    }
}

/// Aggregated outcome of one scan.
///
/// Every planned category lands in exactly one of the four lists.
/// `categories_restricted` holds the ones skipped because the inventory
/// section was forbidden; they are not failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub items: Vec<InventoryItem>,
    pub categories_succeeded: Vec<String>,
    pub categories_invalid: Vec<String>,
    pub categories_rate_limited: Vec<String>,
    pub categories_restricted: Vec<String>,
}

impl ScanResult {
    /// Some categories could not be read for reasons other than privacy.
    pub fn is_obstructed(&self) -> bool {
        !self.categories_invalid.is_empty() || !self.categories_rate_limited.is_empty()
    }

    /// No items and nothing got in the way.
    pub fn is_confirmed_empty(&self) -> bool {
        self.items.is_empty() && !self.is_obstructed()
    }

    pub fn owns(&self, item_id: u64) -> bool {
        self.items.iter().any(|item| item.item_id == item_id)
    }

    pub fn was_restricted(&self, category: &str) -> bool {
        self.categories_restricted.iter().any(|c| c == category)
    }

    pub fn was_inconclusive(&self, category: &str) -> bool {
        self.categories_invalid.iter().any(|c| c == category)
            || self.categories_rate_limited.iter().any(|c| c == category)
    }
}

/// Snapshot handed to progress observers while a scan runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    /// Category about to be queried.
    pub current_category: String,
    /// 1-based position of `current_category` in the plan.
    pub position: usize,
    pub total: usize,
    pub items_found: usize,
    pub rate_limited: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_23_unique_categories() {
        let mut sorted: Vec<&str> = INVENTORY_CATALOG.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 23);
        assert_eq!(INVENTORY_CATALOG[0], "Shirt");
    }

    #[test]
    fn test_empty_vs_obstructed() {
        let mut result = ScanResult::default();
        assert!(result.is_confirmed_empty());

        result.categories_rate_limited.push("Hat".into());
        assert!(!result.is_confirmed_empty());
        assert!(result.was_inconclusive("Hat"));
        assert!(!result.was_inconclusive("Shirt"));
    }
}
