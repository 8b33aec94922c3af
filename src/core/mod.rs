pub mod errors;
pub mod model;
pub mod parsing;
pub mod types;

pub use errors::{Result, RouteGenError};
pub use model::{
    AttributeKind, BindingAttribute, BindingSource, ContainingType, DeclKey, EndpointDescriptor,
    GroupFrame, Location, OwnerKind, ParameterDescriptor, RouteSegment, RouteTemplate,
    SpecialKind,
};
pub use types::TypeRef;
