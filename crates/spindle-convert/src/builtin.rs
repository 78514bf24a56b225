//! Converters for plain handler results

use crate::converter::{AnyResult, Conversion, ConverterChain, ResponseConverter};
use bytes::Bytes;
use http::{Response, StatusCode};
use serde_json::Value;
use spindle_core::body::Body;
use spindle_core::response::{responses, ResponseBuilder};
use spindle_core::{RequestContext, Result};
use std::sync::Arc;

fn ready(response: Result<Response<Body>>) -> Conversion {
    Conversion::Converted(Box::pin(futures::future::ready(response)))
}

/// `String` and `&'static str` as `text/plain`
#[derive(Debug, Clone, Copy, Default)]
pub struct StringResponseConverter;

impl ResponseConverter for StringResponseConverter {
    fn convert_response(&self, _ctx: &RequestContext, result: AnyResult) -> Result<Conversion> {
        let result = match result.downcast::<String>() {
            Ok(text) => return Ok(ready(responses::ok().text(*text))),
            Err(other) => other,
        };
        match result.downcast::<&'static str>() {
            Ok(text) => Ok(ready(responses::ok().text(*text))),
            Err(other) => Ok(Conversion::Fallthrough(other)),
        }
    }
}

/// `Bytes` and `Vec<u8>` as `application/octet-stream`
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesResponseConverter;

impl ResponseConverter for BytesResponseConverter {
    fn convert_response(&self, _ctx: &RequestContext, result: AnyResult) -> Result<Conversion> {
        let result = match result.downcast::<Bytes>() {
            Ok(data) => return Ok(ready(responses::ok().bytes(*data))),
            Err(other) => other,
        };
        match result.downcast::<Vec<u8>>() {
            Ok(data) => Ok(ready(responses::ok().bytes(*data))),
            Err(other) => Ok(Conversion::Fallthrough(other)),
        }
    }
}

/// JSON values, lists of them, and collected lists of JSON-compatible items
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseConverter;

impl JsonResponseConverter {
    fn is_json_item(item: &AnyResult) -> bool {
        item.is::<Value>() || item.is::<String>() || item.is::<&'static str>()
    }

    fn into_json_item(item: AnyResult) -> Value {
        let item = match item.downcast::<Value>() {
            Ok(value) => return *value,
            Err(other) => other,
        };
        let item = match item.downcast::<String>() {
            Ok(text) => return Value::String(*text),
            Err(other) => other,
        };
        match item.downcast::<&'static str>() {
            Ok(text) => Value::String((*text).to_string()),
            Err(_) => Value::Null,
        }
    }
}

impl ResponseConverter for JsonResponseConverter {
    fn convert_response(&self, _ctx: &RequestContext, result: AnyResult) -> Result<Conversion> {
        let result = match result.downcast::<Value>() {
            Ok(value) => return Ok(ready(responses::ok().json_body(&*value))),
            Err(other) => other,
        };
        let result = match result.downcast::<Vec<Value>>() {
            Ok(values) => return Ok(ready(responses::ok().json_body(&*values))),
            Err(other) => other,
        };
        match result.downcast::<Vec<AnyResult>>() {
            Ok(items) if items.iter().all(Self::is_json_item) => {
                let values: Vec<Value> = items.into_iter().map(Self::into_json_item).collect();
                Ok(ready(responses::ok().json_body(&values)))
            }
            Ok(items) => Ok(Conversion::Fallthrough(items)),
            Err(other) => Ok(Conversion::Fallthrough(other)),
        }
    }
}

/// `()` as `204 No Content`
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitResponseConverter;

impl ResponseConverter for UnitResponseConverter {
    fn convert_response(&self, _ctx: &RequestContext, result: AnyResult) -> Result<Conversion> {
        if result.is::<()>() {
            return Ok(ready(ResponseBuilder::new(StatusCode::NO_CONTENT).build()));
        }
        Ok(Conversion::Fallthrough(result))
    }
}

/// A ready-made `http::Response` passed through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponsePassthroughConverter;

impl ResponseConverter for ResponsePassthroughConverter {
    fn convert_response(&self, _ctx: &RequestContext, result: AnyResult) -> Result<Conversion> {
        match result.downcast::<Response<Body>>() {
            Ok(response) => Ok(ready(Ok(*response))),
            Err(other) => Ok(Conversion::Fallthrough(other)),
        }
    }
}

/// Chain of every built-in converter
pub fn builtin_converters() -> ConverterChain {
    ConverterChain::new()
        .with(Arc::new(ResponsePassthroughConverter))
        .with(Arc::new(UnitResponseConverter))
        .with(Arc::new(StringResponseConverter))
        .with(Arc::new(BytesResponseConverter))
        .with(Arc::new(JsonResponseConverter))
}
