pub mod db;
pub mod feedback;
pub mod health;
pub mod settings;
pub mod stats;
