//! Transaction categories.

use crate::framework::SyncEntity;
use serde::{Deserialize, Serialize};

/// A category as returned by `/categories`. Default categories are seeded by the
/// server for every account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

pub type CategoryUpdate = CategoryCreate;

impl CategoryCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Category name is required".to_string());
        }
        Ok(())
    }
}

impl SyncEntity for Category {
    type Id = String;
    type Create = CategoryCreate;
    type Update = CategoryUpdate;

    const LABEL: &'static str = "Category";
    const PLURAL: &'static str = "categories";

    fn id(&self) -> &String {
        &self.id
    }

    fn validate_create(params: &CategoryCreate) -> Result<(), String> {
        params.validate()
    }

    fn validate_update(_id: &String, params: &CategoryUpdate) -> Result<(), String> {
        params.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_flag() {
        let category: Category = serde_json::from_value(json!({
            "_id": "c1",
            "name": "Food",
            "color": "#6366f1",
            "isDefault": true
        }))
        .unwrap();
        assert!(category.is_default);

        let custom: Category =
            serde_json::from_value(json!({ "_id": "c2", "name": "Pets" })).unwrap();
        assert!(!custom.is_default);
        assert_eq!(custom.color, None);
    }

    #[test]
    fn test_name_required() {
        assert!(Category::validate_create(&CategoryCreate::new("Travel")).is_ok());
        assert_eq!(
            Category::validate_create(&CategoryCreate::new(" ").with_color("#ef4444")),
            Err("Category name is required".to_string())
        );
    }
}
