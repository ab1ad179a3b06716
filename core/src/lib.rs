pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod model;
pub mod rng;
pub mod schedule;
pub mod store;
pub mod types;
pub mod validation;

pub use api::{connect, CourtroomApi};
pub use config::CourtroomConfig;
pub use error::{CourtroomError, CourtroomResult};
pub use store::MockDataStore;
