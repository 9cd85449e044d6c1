//! Volatile in-memory store. Process-lifetime only; ids restart at 1.

use async_trait::async_trait;
use std::sync::Mutex;

use super::{SchoolStore, StorageError, StorageKind};
use crate::school::{NewSchool, School};

/// School list behind a mutex. The lock is never held across an await.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

struct Inner {
    next_id: i64,
    schools: Vec<School>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                schools: Vec::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchoolStore for MemoryStore {
    async fn insert(&self, school: &NewSchool) -> Result<School, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        let stored = school.clone().into_school(id);
        inner.schools.push(stored.clone());
        Ok(stored)
    }

    async fn list_all(&self) -> Result<Vec<School>, StorageError> {
        Ok(self.inner.lock().unwrap().schools.clone())
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Memory
    }
}
