//! Dashboard login accounts

use crate::impl_record;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

impl_record!(
    /// Stored user. Never serialize this into a response; use [`UserView`].
    User,
    "user",
    "users",
    label: "Users",
    path: "/users",
    text: ["name", "email"],
    numeric: [],
    dates: [],
    {
        name: String,
        email: String,
        password_hash: String,
        #[serde(deserialize_with = "crate::core::field::lenient::boolean")]
        is_verified: bool,
        verification_token: Option<String>,
        reset_token: Option<String>,
        #[serde(deserialize_with = "crate::core::field::lenient::timestamp")]
        reset_token_expires_at: Option<DateTime<Utc>>,
    }
);

/// Public shape of a user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

impl User {
    pub fn view(&self) -> UserView {
        UserView::from(self)
    }

    /// Whether `token` is the current, unexpired reset token.
    pub fn reset_token_valid(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.reset_token.as_deref() == Some(token)
            && self.reset_token_expires_at.is_some_and(|expires| now < expires)
    }
}
