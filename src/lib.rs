//! Lazy pass-through wrappers that measure how long a query or iterator
//! spends producing its elements.
//!
//! Elements flow through unchanged; the only side effect is on a
//! caller-owned [`Timer`]:
//!
//! - [`TimedQuery`] wraps a [`Queryable`]. Each cursor it opens starts the
//!   timer on the first advance and stops it when disposed or dropped.
//! - [`TimedSeq`] wraps an [`Iterator`]. It starts the timer on the first
//!   pull and stops it when the source is exhausted.
//!
//! Attach either with [`QueryableExt::with_timer`] or
//! [`TimedIteratorExt::with_timer`]; when [`Instrumentation`] is disabled those
//! return the source untouched.
pub use config::{INSTRUMENTATION_ENV, Instrumentation};
pub use error::QueryError;
pub use extensions::{
    MaybeTimedCursor, MaybeTimedQuery, MaybeTimedSeq, QueryableExt, TimedIteratorExt, time_query,
    time_sequence,
};
pub use query::{TimedCursor, TimedQuery};
pub use sequence::TimedSeq;
pub use timers::{Stopwatch, Timer, TimerSnapshot};
pub use traits::{
    Cursor, CursorItems, ElementType, ErrorOf, ExpressionOf, ItemOf, QueryProvider, Queryable,
};

mod config;
mod error;
mod extensions;
pub mod memory;
mod query;
mod sequence;
mod timers;
mod traits;

#[cfg(test)]
mod tests;
