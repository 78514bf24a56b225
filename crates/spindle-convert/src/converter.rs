//! Response converter chain

use futures::future::BoxFuture;
use http::Response;
use spindle_core::body::Body;
use spindle_core::{Error, RequestContext, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A handler result of any type
pub type AnyResult = Box<dyn Any + Send>;

/// Response produced by a converter, resolved later
pub type ResponseFuture = BoxFuture<'static, Result<Response<Body>>>;

/// Outcome of offering a result to a converter
pub enum Conversion {
    /// The converter accepted the result
    Converted(ResponseFuture),
    /// The converter does not handle this type; the value is handed back
    Fallthrough(AnyResult),
}

impl Conversion {
    /// Whether the result was accepted
    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted(_))
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converted(_) => f.write_str("Converted"),
            Self::Fallthrough(_) => f.write_str("Fallthrough"),
        }
    }
}

/// Turns a handler result into a response
pub trait ResponseConverter: Send + Sync + fmt::Debug {
    /// Convert `result`, or hand it back with [`Conversion::Fallthrough`]
    fn convert_response(&self, ctx: &RequestContext, result: AnyResult) -> Result<Conversion>;
}

/// Turns an error into a response
pub trait ExceptionHandler: Send + Sync + fmt::Debug {
    /// Build the response for `error`
    fn handle_exception(&self, ctx: &RequestContext, error: Error) -> Response<Body>;
}

/// Ordered list of converters; the first that accepts a result wins
#[derive(Debug, Clone, Default)]
pub struct ConverterChain {
    converters: Vec<Arc<dyn ResponseConverter>>,
}

impl ConverterChain {
    /// An empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a converter
    pub fn with(mut self, converter: Arc<dyn ResponseConverter>) -> Self {
        self.converters.push(converter);
        self
    }

    /// Number of converters
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Whether the chain has no converters
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Convert `result` with the first converter that accepts it.
    ///
    /// Fails with [`Error::UnhandledResult`] when every converter falls
    /// through.
    pub fn convert(&self, ctx: &RequestContext, result: AnyResult) -> Result<ResponseFuture> {
        match self.convert_response(ctx, result)? {
            Conversion::Converted(response) => Ok(response),
            Conversion::Fallthrough(_) => Err(Error::UnhandledResult(format!(
                "no converter among {} accepted the result of request {}",
                self.converters.len(),
                ctx.request_id
            ))),
        }
    }
}

impl ResponseConverter for ConverterChain {
    fn convert_response(&self, ctx: &RequestContext, result: AnyResult) -> Result<Conversion> {
        let mut result = result;
        for converter in &self.converters {
            match converter.convert_response(ctx, result)? {
                Conversion::Converted(response) => return Ok(Conversion::Converted(response)),
                Conversion::Fallthrough(value) => result = value,
            }
        }
        Ok(Conversion::Fallthrough(result))
    }
}
