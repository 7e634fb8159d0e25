// Application layer - collaborator traits and the refresh cycle
pub mod metrics_engine;
pub mod price_cache;
pub mod price_repository;
pub mod refresh_loop;
pub mod serial_source;
