pub mod priority;
pub mod sentiment;
