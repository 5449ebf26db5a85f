pub mod dispatcher;
pub mod service;
pub mod worker;

pub use dispatcher::{TtsDispatcher, TtsJob};
pub use service::{AudioStatusView, DocumentAudioService, StartAudioRequest};
pub use worker::DocumentAudioWorker;
