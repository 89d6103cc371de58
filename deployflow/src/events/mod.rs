//! Event sink system for observability.
//!
//! Composition emits lifecycle events (`composition.started`,
//! `graph.finalized`, `unit.ordered`, `unit.handed`, ...) through an
//! [`EventSink`]. The default sink discards them.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
