//! Collects an observable's signals into a single result

use crate::converter::AnyResult;
use crate::observable::Observer;
use spindle_core::{Error, Result};
use tokio::sync::oneshot;

/// Result of a finished subscription
pub type Completion = oneshot::Receiver<Result<AnyResult>>;

/// Observer that resolves a [`Completion`] once the source terminates.
///
/// On completion the collected items become one value: no items yield
/// `()`, a single item is passed through as is, and several items are
/// wrapped in a `Vec<AnyResult>`. An error resolves the completion with that
/// error and discards collected items.
#[derive(Debug)]
pub struct ConvertingSubscriber {
    items: Vec<AnyResult>,
    done: Option<oneshot::Sender<Result<AnyResult>>>,
}

impl ConvertingSubscriber {
    /// Create a subscriber and the completion it resolves
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, Completion) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                items: Vec::new(),
                done: Some(tx),
            },
            rx,
        )
    }

    fn finish(&mut self, result: Result<AnyResult>) {
        if let Some(done) = self.done.take() {
            if done.send(result).is_err() {
                tracing::debug!("Subscription result dropped, response no longer awaited");
            }
        }
    }
}

impl Observer for ConvertingSubscriber {
    fn on_next(&mut self, item: AnyResult) {
        if self.done.is_some() {
            self.items.push(item);
        }
    }

    fn on_error(&mut self, error: Error) {
        self.items.clear();
        self.finish(Err(error));
    }

    fn on_completed(&mut self) {
        let mut items = std::mem::take(&mut self.items);
        let value: AnyResult = match items.len() {
            0 => Box::new(()),
            1 => items.remove(0),
            _ => Box::new(items),
        };
        self.finish(Ok(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_items_is_unit() {
        let (mut subscriber, completion) = ConvertingSubscriber::new();
        subscriber.on_completed();
        let value = completion.await.unwrap().unwrap();
        assert!(value.is::<()>());
    }

    #[tokio::test]
    async fn test_single_item_passes_through() {
        let (mut subscriber, completion) = ConvertingSubscriber::new();
        subscriber.on_next(Box::new("only".to_string()));
        subscriber.on_completed();
        let value = completion.await.unwrap().unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("only"));
    }

    #[tokio::test]
    async fn test_many_items_become_list() {
        let (mut subscriber, completion) = ConvertingSubscriber::new();
        for n in 0..3u32 {
            subscriber.on_next(Box::new(n));
        }
        subscriber.on_completed();

        let value = completion.await.unwrap().unwrap();
        let items = value.downcast::<Vec<AnyResult>>().unwrap();
        let numbers: Vec<u32> = items
            .iter()
            .filter_map(|item| item.downcast_ref::<u32>().copied())
            .collect();
        assert_eq!(numbers, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_error_resolves_once() {
        let (mut subscriber, completion) = ConvertingSubscriber::new();
        subscriber.on_next(Box::new(1u8));
        subscriber.on_error(Error::Internal("upstream".to_string()));
        subscriber.on_completed();

        let err = completion.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
