// Google infra layer.
// - `service_account.rs` signs JWTs and exchanges them for access tokens.
// - `fetch_cache.rs` keeps API responses on disk for a bounded time.
// - `drive_client.rs` talks to the Drive and Docs REST APIs.

pub mod drive_client;
pub mod fetch_cache;
pub mod service_account;

pub use drive_client::GoogleDriveClient;
pub use fetch_cache::FetchCache;
pub use service_account::ServiceAccountAuth;
