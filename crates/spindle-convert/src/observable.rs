//! Push-based reactive source

use crate::converter::AnyResult;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use spindle_core::{Error, Result};
use std::any::Any;
use std::fmt;
use tokio::task::JoinHandle;

/// Receives the signals of an [`Observable`]
pub trait Observer: Send + 'static {
    /// An item was emitted
    fn on_next(&mut self, item: AnyResult);

    /// The source failed; no further signals follow
    fn on_error(&mut self, error: Error);

    /// The source finished; no further signals follow
    fn on_completed(&mut self);
}

/// A source emitting zero or more items, then completing or failing
pub struct Observable {
    source: BoxStream<'static, Result<AnyResult>>,
}

impl Observable {
    /// Observable over a stream of fallible items
    pub fn from_stream<S, T>(source: S) -> Self
    where
        S: Stream<Item = Result<T>> + Send + 'static,
        T: Any + Send,
    {
        Self {
            source: source
                .map(|item| item.map(|value| Box::new(value) as AnyResult))
                .boxed(),
        }
    }

    /// Observable over a fixed list of items
    pub fn from_items<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
        T: Any + Send,
    {
        Self::from_stream(stream::iter(items.into_iter().map(Ok)))
    }

    /// Observable emitting one item
    pub fn just<T: Any + Send>(value: T) -> Self {
        Self::from_items([value])
    }

    /// Observable that completes without items
    pub fn empty() -> Self {
        Self {
            source: stream::empty().boxed(),
        }
    }

    /// Observable that fails immediately
    pub fn error(error: Error) -> Self {
        Self {
            source: stream::iter([Err(error)]).boxed(),
        }
    }

    /// Drive the source on a new task, forwarding every signal to `observer`
    pub fn subscribe<O: Observer>(self, mut observer: O) -> JoinHandle<()> {
        let mut source = self.source;
        tokio::spawn(async move {
            while let Some(item) = source.next().await {
                match item {
                    Ok(value) => observer.on_next(value),
                    Err(error) => {
                        observer.on_error(error);
                        return;
                    }
                }
            }
            observer.on_completed();
        })
    }
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}
