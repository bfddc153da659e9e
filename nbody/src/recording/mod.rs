pub mod recorder;
pub mod export;
