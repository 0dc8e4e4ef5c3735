pub mod adapter;
pub mod repo;

pub use adapter::{GixAdapter, RepositoryAdapter};
pub use repo::GitRepo;
