//! Users as seen by authentication and by populated references.

use serde::Serialize;
use utoipa::ToSchema;

use super::ObjectId;

/// The public projection of a user embedded in other records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
}

/// Login lookup result. Never serialized.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

impl UserCredentials {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role_name: String,
}
