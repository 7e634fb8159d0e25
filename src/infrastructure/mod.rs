// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod device_serial;
pub mod electricity_maps;
