pub mod report;
pub mod verify;
