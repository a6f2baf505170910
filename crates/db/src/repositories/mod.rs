mod credit_repo;
mod generation_repo;
mod user_repo;

pub use credit_repo::CreditRepo;
pub use generation_repo::{page_bounds, CompleteGeneration, GenerationRepo};
pub use user_repo::UserRepo;
