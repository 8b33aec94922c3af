//! Source front-end: turns Rust files into owned declaration data.

pub mod extractor;
pub mod namespace;
pub mod type_ref;
pub mod types;

pub use extractor::DeclarationExtractor;
pub use types::{
    AttrArg, AttrValue, AttributeDecl, ExtractedFileData, HandlerDecl, ParamDecl, ReceiverKind,
    SourceFile, StructDecl,
};
