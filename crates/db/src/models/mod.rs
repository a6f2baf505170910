pub mod credit;
pub mod generation;
pub mod user;
