pub mod model;

pub use model::{AudioStatus, Document};
