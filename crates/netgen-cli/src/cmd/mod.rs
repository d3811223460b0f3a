pub mod batch;
pub mod catalog;
pub mod completions;
pub mod generate;
pub mod verify;
