//! Geolocated clock-in records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::ObjectId;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClockIn {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user: ObjectId,
    pub latitude: f64,
    pub longitude: f64,
    pub note: Option<String>,
    pub clocked_in_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewClockIn {
    pub user: ObjectId,
    pub latitude: f64,
    pub longitude: f64,
    pub note: Option<String>,
}
