use serde::{Deserialize, Serialize};

/// Fitness goal chosen for a nutrition plan.
///
/// Serialized as its display label. Labels outside the known set are kept
/// verbatim as [`Goal::Other`] and behave like a goal without tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Goal {
    BuildMuscle,
    LoseFat,
    MaintainWeight,
    ImprovePerformance,
    Other(String),
}

const BUILD_MUSCLE_TAGS: &[&str] = &[
    "chicken",
    "beef",
    "turkey",
    "egg",
    "salmon",
    "tuna",
    "greek yogurt",
    "cottage cheese",
    "tofu",
    "lentil",
    "protein",
];

const LOSE_FAT_TAGS: &[&str] = &[
    "spinach",
    "broccoli",
    "kale",
    "lettuce",
    "cucumber",
    "zucchini",
    "cauliflower",
    "berries",
    "white fish",
    "egg white",
];

const IMPROVE_PERFORMANCE_TAGS: &[&str] = &[
    "oat",
    "rice",
    "quinoa",
    "banana",
    "sweet potato",
    "pasta",
    "whole grain",
    "beet",
];

impl Goal {
    pub fn label(&self) -> &str {
        match self {
            Goal::BuildMuscle => "Build Muscle",
            Goal::LoseFat => "Lose Fat",
            Goal::MaintainWeight => "Maintain Weight",
            Goal::ImprovePerformance => "Improve Performance",
            Goal::Other(label) => label,
        }
    }

    /// Ingredient keywords a meal must mention to suit this goal.
    /// An empty set means every meal suits it.
    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            Goal::BuildMuscle => BUILD_MUSCLE_TAGS,
            Goal::LoseFat => LOSE_FAT_TAGS,
            Goal::ImprovePerformance => IMPROVE_PERFORMANCE_TAGS,
            Goal::MaintainWeight | Goal::Other(_) => &[],
        }
    }
}

impl From<&str> for Goal {
    fn from(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "build muscle" => Goal::BuildMuscle,
            "lose fat" => Goal::LoseFat,
            "maintain weight" => Goal::MaintainWeight,
            "improve performance" => Goal::ImprovePerformance,
            _ => Goal::Other(label.to_string()),
        }
    }
}

impl From<String> for Goal {
    fn from(label: String) -> Self {
        Goal::from(label.as_str())
    }
}

impl From<Goal> for String {
    fn from(goal: Goal) -> Self {
        goal.label().to_string()
    }
}
