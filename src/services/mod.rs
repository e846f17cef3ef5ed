pub mod asset_service;
pub mod cleanup;
pub mod id_allocator;
pub mod inline_code;
pub mod normalizer;
pub mod prompt;
pub mod transcript_writer;

pub use asset_service::{AssetFailure, AssetReport, AssetService};
pub use cleanup::{clean_fragment, has_correct_flag, FragmentKind};
pub use id_allocator::IdAllocator;
pub use inline_code::transform_inline_code;
pub use normalizer::normalize;
pub use transcript_writer::TranscriptWriter;
