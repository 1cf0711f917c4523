// The infra module contains implementations of core traits and everything
// that touches the network or the filesystem.

#[path = "google/mod.rs"]
pub mod google;

#[path = "images/mod.rs"]
pub mod images;

#[path = "output/mod.rs"]
pub mod output;
