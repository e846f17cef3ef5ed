//! 基础设施层：持有被各阶段共同修改的标记文档树

pub mod document;

pub use document::Document;
pub use kuchiki::NodeRef;
