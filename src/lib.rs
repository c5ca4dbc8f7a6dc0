pub mod config;
pub mod error;
pub mod logging;
pub mod motive;
pub mod provider;
pub mod render;
pub mod search;
pub mod selection;
pub mod themes;
pub mod web;
pub mod tasks {
    pub mod prefetch;
}
