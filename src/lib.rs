//! Moodlight - emotion to room environment mapping
//!
//! Turns a user's mood text into a climate, music and lighting suggestion by
//! asking a chat-completion model, then normalizing its answer into allowed
//! values.

pub mod color;
pub mod config;
pub mod emotion;
pub mod error;
pub mod generate;
pub mod music;
pub mod normalize;
pub mod presets;
pub mod provider;
pub mod server;
pub mod store;
pub mod util;
pub mod weather;

pub use config::Config;
pub use error::{FixSuggestion, MoodlightError};
pub use generate::{GenerateRequest, GenerateResponse, Generator};
pub use normalize::{Normalized, Normalizer, NormalizerProfile};
pub use server::Server;
