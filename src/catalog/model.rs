use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Preparation steps, delivered either as one block of text or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instructions {
    Steps(Vec<String>),
    Text(String),
}

impl Default for Instructions {
    fn default() -> Self {
        Instructions::Text(String::new())
    }
}

impl Instructions {
    /// Flattened form stored on meal documents: one step per line.
    pub fn joined(&self) -> String {
        match self {
            Instructions::Steps(steps) => steps.join("\n"),
            Instructions::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealCandidate {
    pub title: String,
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub instructions: Instructions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl MealCandidate {
    /// Lower-cased ingredient text that keyword filters match against.
    pub fn ingredient_text(&self) -> String {
        self.ingredients.join(" ").to_lowercase()
    }
}

/// Candidate meals grouped by meal type ("breakfast", "lunch", ...).
///
/// Group order is the order the types were inserted (or appeared in the
/// source JSON object); meal selection cycles through types in this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    groups: Vec<(String, Vec<MealCandidate>)>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the group if the type already exists, otherwise appends it.
    pub fn insert(&mut self, meal_type: impl Into<String>, candidates: Vec<MealCandidate>) {
        let meal_type = meal_type.into();
        match self.groups.iter_mut().find(|(t, _)| *t == meal_type) {
            Some((_, existing)) => *existing = candidates,
            None => self.groups.push((meal_type, candidates)),
        }
    }

    pub fn get(&self, meal_type: &str) -> Option<&[MealCandidate]> {
        self.groups
            .iter()
            .find(|(t, _)| t == meal_type)
            .map(|(_, c)| c.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[MealCandidate])> {
        self.groups.iter().map(|(t, c)| (t.as_str(), c.as_slice()))
    }

    pub fn meal_types(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(t, _)| t.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total_candidates(&self) -> usize {
        self.groups.iter().map(|(_, c)| c.len()).sum()
    }

    pub(crate) fn candidates_mut(&mut self) -> impl Iterator<Item = &mut MealCandidate> {
        self.groups.iter_mut().flat_map(|(_, c)| c.iter_mut())
    }
}

impl FromIterator<(String, Vec<MealCandidate>)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, Vec<MealCandidate>)>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for (meal_type, candidates) in iter {
            catalog.insert(meal_type, candidates);
        }
        catalog
    }
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (meal_type, candidates) in &self.groups {
            map.serialize_entry(meal_type, candidates)?;
        }
        map.end()
    }
}

// Hand-written so that key order survives into `groups`.
impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = Catalog;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping meal types to lists of meals")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Catalog, A::Error> {
                let mut catalog = Catalog::new();
                while let Some((meal_type, candidates)) =
                    access.next_entry::<String, Vec<MealCandidate>>()?
                {
                    catalog.insert(meal_type, candidates);
                }
                Ok(catalog)
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_keeps_source_key_order() {
        let raw = r#"{
            "dinner": [{ "title": "Stew", "ingredients": ["beef"], "calories": 640 }],
            "breakfast": [{ "title": "Oats", "ingredients": ["oats"], "calories": 310 }],
            "lunch": []
        }"#;
        let catalog: Catalog = serde_json::from_str(raw).unwrap();
        let types: Vec<_> = catalog.meal_types().collect();
        assert_eq!(types, vec!["dinner", "breakfast", "lunch"]);
        assert_eq!(catalog.total_candidates(), 2);
        assert_eq!(catalog.get("dinner").unwrap()[0].calories, 640.0);
    }

    #[test]
    fn deserialize_from_value_keeps_key_order() {
        let value = json!({
            "lunch": [{ "title": "Wrap", "ingredients": ["chicken"] }],
            "breakfast": [{ "title": "Oats", "ingredients": ["oats"] }],
            "dinner": []
        });
        let catalog: Catalog = serde_json::from_value(value).unwrap();
        let types: Vec<_> = catalog.meal_types().collect();
        assert_eq!(types, vec!["lunch", "breakfast", "dinner"]);
    }

    #[test]
    fn instructions_accept_text_or_steps() {
        let text: MealCandidate = serde_json::from_value(json!({
            "title": "Toast", "ingredients": ["bread"], "instructions": "Toast it."
        }))
        .unwrap();
        assert_eq!(text.instructions.joined(), "Toast it.");

        let steps: MealCandidate = serde_json::from_value(json!({
            "title": "Toast", "ingredients": ["bread"], "instructions": ["Step 1", "Step 2"]
        }))
        .unwrap();
        assert_eq!(steps.instructions.joined(), "Step 1\nStep 2");
        assert_eq!(steps.image, None);
    }

    #[test]
    fn missing_ingredients_is_rejected() {
        let err = serde_json::from_value::<Catalog>(json!({
            "lunch": [{ "title": "Mystery", "calories": 100 }]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("ingredients"));
    }

    #[test]
    fn insert_replaces_existing_group_in_place() {
        let mut catalog = Catalog::new();
        catalog.insert("breakfast", vec![]);
        catalog.insert("lunch", vec![]);
        catalog.insert(
            "breakfast",
            vec![MealCandidate {
                title: "Eggs".into(),
                ingredients: vec!["egg".into()],
                calories: 200.0,
                instructions: Instructions::default(),
                image: None,
            }],
        );
        let types: Vec<_> = catalog.meal_types().collect();
        assert_eq!(types, vec!["breakfast", "lunch"]);
        assert_eq!(catalog.get("breakfast").unwrap().len(), 1);
    }

    #[test]
    fn ingredient_text_is_joined_and_lowercased() {
        let meal = MealCandidate {
            title: "Bowl".into(),
            ingredients: vec!["Brown Rice".into(), "Grilled CHICKEN".into()],
            calories: 550.0,
            instructions: Instructions::default(),
            image: None,
        };
        assert_eq!(meal.ingredient_text(), "brown rice grilled chicken");
    }
}
