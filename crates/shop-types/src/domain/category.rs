use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalogue category shown in the admin area.
///
/// A nil `id` marks an entity whose identity has not been assigned yet;
/// the upsert path uses that to decide between insert and update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// Position in storefront listings, 1 through 100.
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: String, display_order: i32) -> anyhow::Result<Self> {
        if name.trim().is_empty() {
            anyhow::bail!("category name empty");
        }
        if !(1..=100).contains(&display_order) {
            anyhow::bail!("display_order must be between 1 and 100");
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            display_order,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn rename(&mut self, name: String, display_order: i32) {
        self.name = name;
        self.display_order = display_order;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_category_gets_identity_and_timestamps() {
        let category = Category::new("Fruits".into(), 1).unwrap();
        assert!(!category.id.is_nil());
        assert_eq!(category.created_at, category.updated_at);
    }

    #[test]
    fn validation_errors() {
        assert!(Category::new("".into(), 1).is_err());
        assert!(Category::new("  ".into(), 1).is_err());
        assert!(Category::new("Fruits".into(), 0).is_err());
        assert!(Category::new("Fruits".into(), 101).is_err());
    }

    #[test]
    fn rename_touches_updated_at() {
        let mut category = Category::new("Fruits".into(), 1).unwrap();
        let before = category.updated_at;
        category.rename("Vegetables".into(), 2);
        assert_eq!(category.name, "Vegetables");
        assert_eq!(category.display_order, 2);
        assert!(category.updated_at > before);
    }
}
