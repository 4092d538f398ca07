//! Attachment points.
//!
//! `with_timer` decides once, at the call, whether to wrap: with
//! instrumentation enabled the source comes back as a timed wrapper, with it
//! disabled the source comes back as-is and the timer is never touched.
//!
//! ```rust
//! use timed_query::{Instrumentation, Stopwatch, Timer, TimedIteratorExt};
//!
//! let watch = Stopwatch::new();
//! let doubled: Vec<u32> = [1, 2, 3]
//!     .into_iter()
//!     .with_timer_using(&watch, Instrumentation::Enabled)
//!     .map(|x| x * 2)
//!     .collect();
//! assert_eq!(doubled, vec![2, 4, 6]);
//! assert!(!watch.is_running());
//! ```

use crate::config::Instrumentation;
use crate::query::{TimedCursor, TimedQuery};
use crate::sequence::TimedSeq;
use crate::timers::Timer;
use crate::traits::{Cursor, ElementType, ErrorOf, ExpressionOf, QueryProvider, Queryable};

/// Result of attaching a timer to a queryable.
#[derive(Debug, Clone)]
pub enum MaybeTimedQuery<Q, T> {
    /// Instrumentation disabled: the original queryable.
    Plain(Q),
    Timed(TimedQuery<Q, T>),
}

impl<Q, T> MaybeTimedQuery<Q, T> {
    /// True when the timing wrapper was attached.
    pub fn is_timed(&self) -> bool {
        matches!(self, MaybeTimedQuery::Timed(_))
    }
}

impl<Q, T> MaybeTimedQuery<Q, T>
where
    Q: Queryable,
    T: Timer + Clone,
{
    /// Recover the original queryable.
    pub fn into_inner(self) -> Q {
        match self {
            MaybeTimedQuery::Plain(source) => source,
            MaybeTimedQuery::Timed(timed) => timed.into_inner(),
        }
    }
}

impl<Q, T> Queryable for MaybeTimedQuery<Q, T>
where
    Q: Queryable,
    T: Timer + Clone,
{
    type Provider = Q::Provider;
    type Cursor = MaybeTimedCursor<Q::Cursor, <Q::Provider as QueryProvider>::Cursor, T>;

    fn expression(&self) -> &ExpressionOf<Q> {
        match self {
            MaybeTimedQuery::Plain(source) => source.expression(),
            MaybeTimedQuery::Timed(timed) => timed.expression(),
        }
    }

    fn provider(&self) -> &Q::Provider {
        match self {
            MaybeTimedQuery::Plain(source) => source.provider(),
            MaybeTimedQuery::Timed(timed) => timed.provider(),
        }
    }

    fn element_type(&self) -> ElementType {
        match self {
            MaybeTimedQuery::Plain(source) => source.element_type(),
            MaybeTimedQuery::Timed(timed) => timed.element_type(),
        }
    }

    fn cursor(&self) -> Result<Self::Cursor, ErrorOf<Q>> {
        Ok(match self {
            MaybeTimedQuery::Plain(source) => MaybeTimedCursor::Plain(source.cursor()?),
            MaybeTimedQuery::Timed(timed) => MaybeTimedCursor::Timed(timed.cursor()?),
        })
    }
}

/// Cursor opened from a [`MaybeTimedQuery`].
#[derive(Debug)]
pub enum MaybeTimedCursor<P, C: Cursor, T: Timer> {
    Plain(P),
    Timed(TimedCursor<C, T>),
}

impl<P, C, T> Cursor for MaybeTimedCursor<P, C, T>
where
    P: Cursor,
    C: Cursor<Item = P::Item, Error = P::Error>,
    T: Timer,
{
    type Item = P::Item;
    type Error = P::Error;

    fn advance(&mut self) -> Result<bool, P::Error> {
        match self {
            MaybeTimedCursor::Plain(cursor) => cursor.advance(),
            MaybeTimedCursor::Timed(cursor) => cursor.advance(),
        }
    }

    fn current(&self) -> Option<&P::Item> {
        match self {
            MaybeTimedCursor::Plain(cursor) => cursor.current(),
            MaybeTimedCursor::Timed(cursor) => cursor.current(),
        }
    }

    fn reset(&mut self) -> Result<(), P::Error> {
        match self {
            MaybeTimedCursor::Plain(cursor) => cursor.reset(),
            MaybeTimedCursor::Timed(cursor) => cursor.reset(),
        }
    }

    fn dispose(self) -> Result<(), P::Error> {
        match self {
            MaybeTimedCursor::Plain(cursor) => cursor.dispose(),
            MaybeTimedCursor::Timed(cursor) => cursor.dispose(),
        }
    }
}

/// Result of attaching a timer to an iterator.
#[derive(Debug)]
pub enum MaybeTimedSeq<I, T> {
    /// Instrumentation disabled: the original iterator.
    Plain(I),
    Timed(TimedSeq<I, T>),
}

impl<I, T> MaybeTimedSeq<I, T> {
    /// True when the timing wrapper was attached.
    pub fn is_timed(&self) -> bool {
        matches!(self, MaybeTimedSeq::Timed(_))
    }
}

impl<I, T> Iterator for MaybeTimedSeq<I, T>
where
    I: Iterator,
    T: Timer,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        match self {
            MaybeTimedSeq::Plain(source) => source.next(),
            MaybeTimedSeq::Timed(timed) => timed.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            MaybeTimedSeq::Plain(source) => source.size_hint(),
            MaybeTimedSeq::Timed(timed) => timed.size_hint(),
        }
    }
}

/// Attach a timer to any [`Queryable`].
pub trait QueryableExt: Queryable + Sized {
    /// Wrap using the process-wide [`Instrumentation::current`] setting.
    fn with_timer<T>(self, timer: T) -> MaybeTimedQuery<Self, T>
    where
        T: Timer + Clone,
    {
        self.with_timer_using(timer, Instrumentation::current())
    }

    /// Wrap according to an explicit `instrumentation` setting.
    fn with_timer_using<T>(
        self,
        timer: T,
        instrumentation: Instrumentation,
    ) -> MaybeTimedQuery<Self, T>
    where
        T: Timer + Clone,
    {
        match instrumentation {
            Instrumentation::Enabled => MaybeTimedQuery::Timed(TimedQuery::new(self, timer)),
            Instrumentation::Disabled => MaybeTimedQuery::Plain(self),
        }
    }
}

impl<Q: Queryable> QueryableExt for Q {}

/// Attach a timer to any [`Iterator`].
pub trait TimedIteratorExt: Iterator + Sized {
    /// Wrap using the process-wide [`Instrumentation::current`] setting.
    fn with_timer<T: Timer>(self, timer: T) -> MaybeTimedSeq<Self, T> {
        self.with_timer_using(timer, Instrumentation::current())
    }

    /// Wrap according to an explicit `instrumentation` setting.
    fn with_timer_using<T: Timer>(
        self,
        timer: T,
        instrumentation: Instrumentation,
    ) -> MaybeTimedSeq<Self, T> {
        match instrumentation {
            Instrumentation::Enabled => MaybeTimedSeq::Timed(TimedSeq::new(self, timer)),
            Instrumentation::Disabled => MaybeTimedSeq::Plain(self),
        }
    }
}

impl<I: Iterator> TimedIteratorExt for I {}

/// Free-function form of [`QueryableExt::with_timer`].
pub fn time_query<Q, T>(source: Q, timer: T) -> MaybeTimedQuery<Q, T>
where
    Q: Queryable,
    T: Timer + Clone,
{
    source.with_timer(timer)
}

/// Free-function form of [`TimedIteratorExt::with_timer`].
pub fn time_sequence<S, T>(source: S, timer: T) -> MaybeTimedSeq<S::IntoIter, T>
where
    S: IntoIterator,
    T: Timer,
{
    source.into_iter().with_timer(timer)
}
