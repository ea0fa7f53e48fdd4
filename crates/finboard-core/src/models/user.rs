use serde::{Deserialize, Serialize};

/// Key of the savings goal inside the user's metadata blob
const SAVINGS_GOAL_KEY: &str = "moneyGoal";

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub path_image_icon: Option<String>,
    #[serde(default)]
    pub path_image_banner: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Free-form metadata stored through `users/{id}/meta`
    #[cfg_attr(feature = "ts", ts(type = "unknown"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl User {
    /// Uppercase initials of the first two words of the name, for avatars
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }

    pub fn savings_goal(&self) -> Option<f64> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.get(SAVINGS_GOAL_KEY))
            .and_then(serde_json::Value::as_f64)
    }

    /// The metadata blob with the savings goal replaced, other keys kept
    pub fn meta_with_savings_goal(&self, goal: f64) -> serde_json::Value {
        let mut meta = match self.meta {
            Some(serde_json::Value::Object(ref map)) => map.clone(),
            _ => serde_json::Map::new(),
        };
        meta.insert(SAVINGS_GOAL_KEY.to_string(), serde_json::json!(goal));
        serde_json::Value::Object(meta)
    }
}
