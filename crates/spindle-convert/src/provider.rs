//! Converter providers and the observable converter

use crate::converter::{AnyResult, Conversion, ConverterChain, ExceptionHandler, ResponseConverter};
use crate::observable::Observable;
use crate::subscriber::ConvertingSubscriber;
use spindle_core::{Error, RequestContext, Result};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Supplies a converter for result types it knows about
pub trait ResponseConverterProvider: Send + Sync + fmt::Debug {
    /// Converter for `result_type`, or `None` when this provider does not
    /// handle it. `general` converts plain values; `exception` renders
    /// failures.
    fn create_response_converter(
        &self,
        result_type: TypeId,
        general: &ConverterChain,
        exception: Arc<dyn ExceptionHandler>,
    ) -> Option<Arc<dyn ResponseConverter>>;
}

/// First converter any provider offers for `result_type`
pub fn find_converter(
    providers: &[Arc<dyn ResponseConverterProvider>],
    result_type: TypeId,
    general: &ConverterChain,
    exception: Arc<dyn ExceptionHandler>,
) -> Option<Arc<dyn ResponseConverter>> {
    providers.iter().find_map(|provider| {
        provider.create_response_converter(result_type, general, Arc::clone(&exception))
    })
}

/// Provides [`ObservableResponseConverter`] for [`Observable`] results
#[derive(Debug, Clone, Copy, Default)]
pub struct ObservableConverterProvider;

impl ResponseConverterProvider for ObservableConverterProvider {
    fn create_response_converter(
        &self,
        result_type: TypeId,
        general: &ConverterChain,
        exception: Arc<dyn ExceptionHandler>,
    ) -> Option<Arc<dyn ResponseConverter>> {
        if result_type != TypeId::of::<Observable>() {
            return None;
        }
        Some(Arc::new(ObservableResponseConverter::new(
            general.clone(),
            exception,
        )))
    }
}

/// Subscribes to an [`Observable`] result and converts what it emits.
///
/// The response resolves once the observable terminates. Emitted items are
/// collected by a [`ConvertingSubscriber`] and handed to the general chain;
/// errors, including values the chain cannot convert, go to the exception
/// handler. Anything that is not an `Observable` falls through.
#[derive(Debug, Clone)]
pub struct ObservableResponseConverter {
    general: ConverterChain,
    exception: Arc<dyn ExceptionHandler>,
}

impl ObservableResponseConverter {
    /// Converter delegating emitted values to `general`
    pub fn new(general: ConverterChain, exception: Arc<dyn ExceptionHandler>) -> Self {
        Self { general, exception }
    }
}

impl ResponseConverter for ObservableResponseConverter {
    fn convert_response(&self, ctx: &RequestContext, result: AnyResult) -> Result<Conversion> {
        let observable = match result.downcast::<Observable>() {
            Ok(observable) => observable,
            Err(other) => return Ok(Conversion::Fallthrough(other)),
        };

        let (subscriber, completion) = ConvertingSubscriber::new();
        observable.subscribe(subscriber);

        let ctx = ctx.clone();
        let general = self.general.clone();
        let exception = Arc::clone(&self.exception);

        Ok(Conversion::Converted(Box::pin(async move {
            let value = match completion.await {
                Ok(Ok(value)) => value,
                Ok(Err(err)) => return Ok(exception.handle_exception(&ctx, err)),
                Err(_) => {
                    let err = Error::Internal("subscription ended without a signal".to_string());
                    return Ok(exception.handle_exception(&ctx, err));
                }
            };

            let converted = match general.convert(&ctx, value) {
                Ok(response) => response.await,
                Err(err) => Err(err),
            };
            Ok(converted.unwrap_or_else(|err| exception.handle_exception(&ctx, err)))
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::builtin_converters;
    use crate::exception::DefaultExceptionHandler;
    use http::StatusCode;
    use spindle_core::body;

    fn converter() -> Arc<dyn ResponseConverter> {
        let providers: Vec<Arc<dyn ResponseConverterProvider>> =
            vec![Arc::new(ObservableConverterProvider)];
        find_converter(
            &providers,
            TypeId::of::<Observable>(),
            &builtin_converters(),
            Arc::new(DefaultExceptionHandler),
        )
        .unwrap()
    }

    async fn convert(observable: Observable) -> http::Response<spindle_core::Body> {
        match converter()
            .convert_response(&RequestContext::new(), Box::new(observable))
            .unwrap()
        {
            Conversion::Converted(response) => response.await.unwrap(),
            Conversion::Fallthrough(_) => panic!("observable fell through"),
        }
    }

    #[test]
    fn test_provider_ignores_other_types() {
        let converter = ObservableConverterProvider.create_response_converter(
            TypeId::of::<String>(),
            &builtin_converters(),
            Arc::new(DefaultExceptionHandler),
        );
        assert!(converter.is_none());
    }

    #[test]
    fn test_non_observable_falls_through() {
        let conversion = converter()
            .convert_response(&RequestContext::new(), Box::new(String::from("plain")))
            .unwrap();
        match conversion {
            Conversion::Fallthrough(value) => assert!(value.is::<String>()),
            Conversion::Converted(_) => panic!("plain value converted"),
        }
    }

    #[tokio::test]
    async fn test_single_item() {
        let response = convert(Observable::just("hello")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body::collect(response.into_body()).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_empty_is_no_content() {
        let response = convert(Observable::empty()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_many_items_as_json_list() {
        let response = convert(Observable::from_items(["a", "b"])).await;
        assert_eq!(body::collect(response.into_body()).await.unwrap(), r#"["a","b"]"#);
    }

    #[tokio::test]
    async fn test_error_goes_to_exception_handler() {
        let response = convert(Observable::error(Error::Status(StatusCode::CONFLICT))).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_unconvertible_item_is_server_error() {
        let response = convert(Observable::just(3.5f64)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
