pub mod audio;
pub mod document;
pub mod plan;
pub mod tts;
pub mod usage;
