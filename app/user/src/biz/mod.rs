pub mod models;
pub mod user_usecase;

pub use models::{User, UserInput};
pub use user_usecase::{UserRepo, UserUseCase};
