use serde::{Deserialize, Serialize};

/// A subcategory as stored by the record store. The engine only reads
/// `id` and `category_id`, to check a rule's subcategory action against
/// the category actually in effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: String,
    pub category_id: String,
    #[serde(default)]
    pub name: String,
}

impl Subcategory {
    pub fn new(id: &str, category_id: &str, name: &str) -> Self {
        Subcategory {
            id: id.to_string(),
            category_id: category_id.to_string(),
            name: name.to_string(),
        }
    }

    pub fn belongs_to(&self, category_id: &str) -> bool {
        !category_id.is_empty() && self.category_id == category_id
    }
}

/// Looks up a subcategory by id.
pub fn find_subcategory<'a>(subcategories: &'a [Subcategory], id: &str) -> Option<&'a Subcategory> {
    subcategories.iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn belongs_to_requires_matching_non_empty_category() {
        let sub = Subcategory::new("s1", "food", "Bakery");
        assert!(sub.belongs_to("food"));
        assert!(!sub.belongs_to("transport"));
        assert!(!sub.belongs_to(""));
    }

    #[test]
    fn find_by_id() {
        let subs = vec![
            Subcategory::new("s1", "food", "Bakery"),
            Subcategory::new("s2", "transport", "Ride hailing"),
        ];
        assert_eq!(find_subcategory(&subs, "s2").map(|s| s.category_id.as_str()), Some("transport"));
        assert!(find_subcategory(&subs, "s9").is_none());
    }

    #[test]
    fn deserializes_camel_case() {
        let sub: Subcategory =
            serde_json::from_str(r#"{"id":"s1","categoryId":"food","name":"Bakery"}"#).unwrap();
        assert_eq!(sub, Subcategory::new("s1", "food", "Bakery"));
    }
}
