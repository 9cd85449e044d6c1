//! Record types for the school directory.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Maximum accepted field lengths, matching the storage schema.
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_ADDRESS_LEN: usize = 500;

/// A school as submitted by a client, before an id is assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSchool {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A stored school. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct School {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// RFC 3339, UTC.
    pub created_at: String,
}

impl NewSchool {
    /// Materialize a stored school under the given id, stamped now.
    pub(crate) fn into_school(self, id: i64) -> School {
        School {
            id,
            name: self.name,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

impl School {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.latitude,
            lon: self.longitude,
        }
    }
}
