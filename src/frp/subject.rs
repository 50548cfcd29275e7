// Copyright (c) 2025 - Cowboy AI, Inc.
//! Subject - Push Sources
//!
//! A `Subject<T>` is a leaf of the stage graph. Application code (usually the
//! input source) pushes occurrences into it; every stage built on
//! [`Subject::stream`] sees them synchronously.

use super::stream::{Emitter, Stream};
use super::Time;
use crate::errors::PipelineError;

/// Hot, multicast push source
///
/// Cloning shares the subject: both handles push into the same node.
#[derive(Debug)]
pub struct Subject<T> {
    stream: Stream<T>,
    emitter: Emitter<T>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            stream: self.stream.clone(),
            emitter: self.emitter.clone(),
        }
    }
}

impl<T: Clone + 'static> Subject<T> {
    /// Create a new subject
    pub fn new() -> Self {
        Self::named("subject")
    }

    /// Create a subject with a debug label
    pub fn named(label: &'static str) -> Self {
        let (stream, emitter) = Stream::source(label);
        Self { stream, emitter }
    }

    /// Push a value occurring at `time`
    pub fn next(&self, time: Time, value: T) {
        self.emitter.next(time, value);
    }

    /// Push an error signal
    pub fn error(&self, error: PipelineError) {
        self.emitter.error(error);
    }

    /// End the subject; later pushes are ignored
    pub fn complete(&self) {
        self.emitter.complete();
    }

    /// Whether the subject has completed
    pub fn is_completed(&self) -> bool {
        self.emitter.is_closed()
    }

    /// The stream of values pushed into this subject
    pub fn stream(&self) -> Stream<T> {
        self.stream.clone()
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}
