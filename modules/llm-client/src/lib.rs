pub mod gemini;
pub mod openai;
pub mod traits;
pub mod util;

pub use gemini::GeminiJudge;
pub use openai::OpenAiJudge;
pub use traits::JudgmentProvider;
pub use util::{strip_code_blocks, truncate_to_char_boundary};
