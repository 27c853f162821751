pub mod catalog;
pub mod gesture;
pub mod providers;
pub mod recommendations;
pub mod session;

pub use catalog::{Catalog, MergeOutcome};
pub use providers::{BookSearcher, GoogleBooksProvider};
pub use recommendations::Recommender;
pub use session::Session;
