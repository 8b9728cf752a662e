pub mod features;
pub mod generations;
pub mod jobs;
pub mod uploads;
