// Presentation layer - read-only HTTP surface
pub mod app_state;
pub mod handlers;
pub mod view;
