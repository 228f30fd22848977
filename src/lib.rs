//! Headless core of the image expander: canvas geometry, compositing, the
//! Gemini expansion client, and session state. The egui shell lives in the
//! binary.

pub mod canvas;
pub mod data_uri;
pub mod error;
pub mod expansion_client;
pub mod expansion_manager;
pub mod gemini;
pub mod geometry;
pub mod history;
pub mod image_loader;
pub mod pipeline;
pub mod session;
pub mod settings;

pub use error::ExpandError;
pub use expansion_client::ExpansionClient;
pub use geometry::{Preset, TargetDimensions, MAX_DIM};
pub use history::{GeneratedImage, History};
pub use image_loader::OriginalImage;
pub use pipeline::{request_expansion, ExpansionRequest};
pub use session::Session;
