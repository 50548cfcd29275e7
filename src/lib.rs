//! Reactive input pipeline for tick-driven simulations
//!
//! This crate wires polled keyboard and mouse state through a push-based
//! stage graph (filter, map, scan, throttle, debounce, merge, combine) into
//! an explicit simulation state record, once per frame.

pub mod config;
pub mod errors;
pub mod frp;
pub mod input;
pub mod pipeline;
pub mod sim;
pub mod store;

// Re-export commonly used types
pub use config::{Bounds, MovementConfig, PipelineConfig, TimeUnit};
pub use errors::{reset_unhandled_error_hook, set_unhandled_error_hook, PipelineError, PipelineResult};
pub use frp::{
    Behavior, Clock, CompositeSubscription, DiscreteEvent, Observer, Samplable, Signal, Stream, Subject,
    Subscription, Time,
};
pub use input::{
    EventKind, InputBackend, InputEvent, InputScript, InputSnapshot, InputSource, Key, MouseButton,
    ScriptedInput, Vec2,
};
pub use pipeline::{Pipeline, Renderer, RunSummary, TickReport};
pub use store::Store;
