use crate::storage::Backend;

pub struct AppState {
    pub backend: Backend,
}
