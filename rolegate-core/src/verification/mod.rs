pub mod persistence;
pub mod store;
pub mod workflow;

pub use persistence::JsonFilePersistence;
pub use store::VerificationStore;
pub use workflow::{generate_code, VerificationWorkflow};
