pub mod health;
pub mod progress;
pub mod visits;
