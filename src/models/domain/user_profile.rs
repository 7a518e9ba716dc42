use serde::{Deserialize, Serialize};

pub const DEFAULT_AGE: u8 = 10;
pub const DEFAULT_INTEREST: &str = "learning";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub age: u8,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl UserProfile {
    pub fn new(user_id: &str, name: &str, age: u8, interests: &[&str]) -> Self {
        UserProfile {
            user_id: user_id.to_string(),
            name: name.to_string(),
            age,
            interests: interests.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Stand-in profile for users the directory does not know about.
    pub fn default_for(user_id: &str) -> Self {
        UserProfile::new(user_id, user_id, DEFAULT_AGE, &[DEFAULT_INTEREST])
    }

    pub fn interests_label(&self) -> String {
        if self.interests.is_empty() {
            return DEFAULT_INTEREST.to_string();
        }
        self.interests.join(", ")
    }
}
