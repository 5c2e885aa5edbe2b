//! TTS Adapter - HTTP TTS 客户端实现

mod fake_tts_client;
mod http_tts_client;

pub use fake_tts_client::{FakeTtsClient, FakeTtsClientConfig, FAKE_VOICE_ID};
pub use http_tts_client::*;
