pub mod element_type;
pub mod loaders;
pub mod question;
pub mod quiz;
pub mod tags;

pub use element_type::ElementType;
pub use loaders::{load_ids_file, load_tags_file};
pub use question::{DifficultyLevel, McqOption, Question, QuestionParts, QuestionVariant};
pub use quiz::{Quiz, QuizKind, QuizVariant};
pub use tags::{Tag, TagSet};
