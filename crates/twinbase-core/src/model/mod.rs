pub mod element;
pub mod handler;
pub mod reference;
pub mod submodel;
pub mod value;

pub use element::{
    Direction, Element, ElementKind, EntityType, LangString, ModelType, Qualifier, StateOfEvent,
};
pub use handler::{
    Message, MessageType, MethodCall, MethodHandler, MethodHandlerRef, OperationResult,
    ValueHandler, ValueHandlerRef,
};
pub use reference::{Key, KeyType, Reference, ReferenceType};
pub use submodel::{AssetAdministrationShell, Submodel};
pub use value::DataType;
