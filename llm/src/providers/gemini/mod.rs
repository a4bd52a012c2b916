pub(crate) mod chat;
pub(crate) mod files;
mod provider;

pub use chat::model::GeminiChatModel;
pub use provider::GeminiProvider;
