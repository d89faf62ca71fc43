pub mod flags;
pub mod health;
pub mod metrics;
