pub mod config;
pub mod db;
pub mod extract;
pub mod logging;
pub mod repositories;
pub mod storage;
pub mod translate;
pub mod tts;
