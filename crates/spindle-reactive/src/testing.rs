//! Recording writer for unit tests

use crate::writer::{HttpResponseWriter, ResponseHead};
use async_trait::async_trait;
use bytes::Bytes;
use spindle_core::{Error, Result};
use std::sync::{Arc, Mutex};

/// Calls seen by a [`RecordingWriter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WriterEvent {
    Headers(ResponseHead),
    Data(Bytes),
    Close,
    CloseWith(String),
}

/// Writer that records every call and can simulate a vanished peer
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingWriter {
    events: Arc<Mutex<Vec<WriterEvent>>>,
    open: Arc<Mutex<bool>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl RecordingWriter {
    pub(crate) fn new() -> Self {
        Self {
            open: Arc::new(Mutex::new(true)),
            ..Default::default()
        }
    }

    pub(crate) fn events(&self) -> Vec<WriterEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn heads(&self) -> Vec<ResponseHead> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                WriterEvent::Headers(head) => Some(head),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn body(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                WriterEvent::Data(data) => Some(data.to_vec()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub(crate) fn count(&self, matches: impl Fn(&WriterEvent) -> bool) -> usize {
        self.events().iter().filter(|e| matches(e)).count()
    }

    /// Simulate the peer going away: writes fail and the writer reports closed
    pub(crate) fn disconnect(&self) {
        *self.open.lock().unwrap() = false;
        *self.fail_writes.lock().unwrap() = true;
    }

    fn record(&self, event: WriterEvent) -> Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(Error::ConnectionClosed);
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[async_trait]
impl HttpResponseWriter for RecordingWriter {
    async fn write_headers(&mut self, head: ResponseHead) -> Result<()> {
        self.record(WriterEvent::Headers(head))
    }

    async fn write_data(&mut self, data: Bytes) -> Result<()> {
        self.record(WriterEvent::Data(data))
    }

    async fn close(&mut self) -> Result<()> {
        self.record(WriterEvent::Close)?;
        *self.open.lock().unwrap() = false;
        Ok(())
    }

    async fn close_with(&mut self, error: Error) -> Result<()> {
        self.record(WriterEvent::CloseWith(error.to_string()))?;
        *self.open.lock().unwrap() = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        *self.open.lock().unwrap()
    }
}
