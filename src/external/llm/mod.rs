//! Text generation over Groq, Gemini and OpenAI with ordered fallback.

mod chain;
mod gemini;
mod openai;
mod parse;
mod provider;

pub use chain::{Generation, LlmChain};
pub use gemini::GeminiProvider;
pub use openai::OpenAiCompatible;
pub use parse::{extract_json, first_line, parse_list};
pub use provider::{LlmProvider, Prompt};
