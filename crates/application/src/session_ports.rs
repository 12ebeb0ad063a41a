mod backend;
mod storage;

pub use backend::{AuthBackend, BackendReply, LoginGrant};
pub use storage::{SessionStorage, StorageWrite};
