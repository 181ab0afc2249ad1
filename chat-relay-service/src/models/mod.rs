pub mod chat;
pub mod transcript;

pub use chat::{ChatResponse, ErrorResponse};
pub use transcript::{ChatTurn, Role, TextPart, TranscriptEntry};
