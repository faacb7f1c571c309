use crate::http::ApiResponder;
use serde::{Deserialize, Serialize};

/// Writable columns of a user row. Every field is nullable in storage and
/// `None` maps to `NULL`, never to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "user_status")]
    pub status: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "user_id")]
    pub id: i32,
    #[serde(flatten)]
    pub data: UserData,
}

impl ApiResponder for User {
    fn unit() -> &'static str {
        "user"
    }
    fn article() -> &'static str {
        "A"
    }
}
