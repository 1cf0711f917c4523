// The core module contains all site-generation logic that doesn't touch the
// network or the filesystem. Each concern gets its own submodule.

#[path = "config/site_config.rs"]
pub mod config;

#[path = "markup/mod.rs"]
pub mod markup;

#[path = "site/mod.rs"]
pub mod site;
