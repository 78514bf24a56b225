//! # Spindle Convert
//!
//! Turns handler results into responses:
//! - [`ConverterChain`] tries converters in order, with explicit fallthrough
//! - [`ResponseConverterProvider`] supplies converters per result type
//! - [`ObservableResponseConverter`] waits for an [`Observable`] to
//!   terminate and converts what it emitted
//! - Built-in converters for text, bytes, JSON and `()`

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod builtin;
pub mod converter;
pub mod exception;
pub mod handler;
pub mod observable;
pub mod provider;
pub mod subscriber;

pub use builtin::{
    builtin_converters, BytesResponseConverter, JsonResponseConverter,
    ResponsePassthroughConverter, StringResponseConverter, UnitResponseConverter,
};
pub use converter::{
    AnyResult, Conversion, ConverterChain, ExceptionHandler, ResponseConverter, ResponseFuture,
};
pub use exception::DefaultExceptionHandler;
pub use handler::{default_converters, ConvertingHandler};
pub use observable::{Observable, Observer};
pub use provider::{
    find_converter, ObservableConverterProvider, ObservableResponseConverter,
    ResponseConverterProvider,
};
pub use subscriber::{Completion, ConvertingSubscriber};
