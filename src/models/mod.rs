pub mod feedback;
pub mod stats;
