pub mod dev_backend;
pub mod polly_backend;
pub mod speechify_backend;

pub use dev_backend::DevTtsBackend;
pub use polly_backend::{polly_client_from_env, PollyTtsBackend};
pub use speechify_backend::SpeechifyTtsBackend;
