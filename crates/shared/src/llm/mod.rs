pub mod completion;
pub mod gateway;
pub mod openrouter;
pub mod prompts;

pub use completion::{
    ChatCompletionRequest, SseDecoder, extract_delta_content, extract_message_content,
};
pub use gateway::{CompletionFuture, CompletionGateway, CompletionStream, GatewayError};
pub use openrouter::OpenRouterGateway;
pub use prompts::{APOLOGY_MESSAGE, SYSTEM_PROMPT, WELCOME_MESSAGE, system_turn};
