pub mod chat_llm;
pub mod classifier;
pub mod db;
pub mod gemini;
pub mod memory;
pub mod tts;
pub mod weather;

pub use chat_llm::OpenAiChatAdapter;
pub use classifier::HttpClassifierAdapter;
pub use db::DbAdapter;
pub use gemini::GeminiAdapter;
pub use memory::InMemoryUserStore;
pub use tts::OpenAiTtsAdapter;
pub use weather::OpenWeatherAdapter;
