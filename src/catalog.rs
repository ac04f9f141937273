use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

use crate::error::CatalogError;

/// Stable identifier of an item type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub i32);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved item type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub id: ItemId,
    /// Raw (untranslated) name
    pub name: String,
    /// Localized name shown to players
    #[serde(default)]
    pub display_name: String,
}

/// Resolves text identifiers (numeric id, raw name or display name) to items
pub trait ItemLookup {
    fn find(&self, text: &str) -> Option<ItemInfo>;
}

/// Item table loaded from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemCatalog {
    items: Vec<ItemInfo>,
}

impl ItemCatalog {
    pub fn new(items: Vec<ItemInfo>) -> Self {
        Self { items }
    }

    /// Load catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|e| CatalogError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        Self::from_json(&content).map_err(|e| match e {
            CatalogError::Invalid(reason) => CatalogError::LoadFailed {
                path: path.display().to_string(),
                source: reason.into(),
            },
            other => other,
        })
    }

    /// Parse a catalog from JSON text
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let catalog: ItemCatalog =
            serde_json::from_str(content).map_err(|e| CatalogError::Invalid(e.to_string()))?;
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Compose to NFC so names typed by players match folder names written by
/// decomposing file systems
fn normalize(text: &str) -> String {
    text.nfc().collect()
}

impl ItemLookup for ItemCatalog {
    /// First item whose id equals `text` parsed as an integer, or whose raw
    /// or display name equals `text`.
    fn find(&self, text: &str) -> Option<ItemInfo> {
        let id = text.trim().parse::<i32>().ok().map(ItemId);
        let wanted = normalize(text);

        self.items
            .iter()
            .find(|item| {
                Some(item.id) == id
                    || normalize(&item.name) == wanted
                    || (!item.display_name.is_empty() && normalize(&item.display_name) == wanted)
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ItemCatalog {
        ItemCatalog::new(vec![
            ItemInfo {
                id: ItemId(105),
                name: "Item_Cola".to_string(),
                display_name: "Cola".to_string(),
            },
            ItemInfo {
                id: ItemId(449),
                name: "Item_Bandage".to_string(),
                display_name: "Bandage".to_string(),
            },
            ItemInfo {
                id: ItemId(7),
                name: "Item_Cafe".to_string(),
                display_name: "Caf\u{e9}".to_string(),
            },
        ])
    }

    #[test]
    fn test_find_by_numeric_id() {
        assert_eq!(catalog().find("449").map(|i| i.id), Some(ItemId(449)));
    }

    #[test]
    fn test_find_by_raw_and_display_name() {
        let catalog = catalog();
        assert_eq!(catalog.find("Item_Cola").map(|i| i.id), Some(ItemId(105)));
        assert_eq!(catalog.find("Bandage").map(|i| i.id), Some(ItemId(449)));
    }

    #[test]
    fn test_name_match_is_exact_case() {
        assert!(catalog().find("cola").is_none());
        assert!(catalog().find("Unknown").is_none());
    }

    #[test]
    fn test_decomposed_name_matches() {
        // "Cafe" + combining acute accent, as written by NFD file systems
        assert_eq!(catalog().find("Cafe\u{301}").map(|i| i.id), Some(ItemId(7)));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{"items":[{"id":1,"name":"Item_Apple","display_name":"Apple"},{"id":2,"name":"Item_Pear"}]}"#;
        let catalog = ItemCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.find("Item_Pear").map(|i| i.id), Some(ItemId(2)));
        assert!(catalog.find("").is_none());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            ItemCatalog::from_json("not json"),
            Err(CatalogError::Invalid(_))
        ));
    }
}
