//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod authorized_api_client;
mod file_session_storage;
mod http_auth_backend;
mod http_support;
mod in_memory_session_storage;

pub use authorized_api_client::AuthorizedApiClient;
pub use file_session_storage::FileSessionStorage;
pub use http_auth_backend::HttpAuthBackend;
pub use in_memory_session_storage::InMemorySessionStorage;
