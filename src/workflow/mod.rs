pub mod parse_ctx;
pub mod quiz_flow;

pub use parse_ctx::ParseCtx;
pub use quiz_flow::{parse_quizzes, QuizFlow};
