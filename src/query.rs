//! Timing wrappers for queryables.
//!
//! [`TimedQuery`] looks exactly like the queryable it wraps, except that every
//! cursor it opens is a [`TimedCursor`] bound to the caller's timer. The
//! cursor starts the timer on the first `advance` after the timer was left
//! idle and stops it when the traversal is disposed.

use tracing::{debug, trace};

use crate::timers::Timer;
use crate::traits::{Cursor, ElementType, ErrorOf, ExpressionOf, QueryProvider, Queryable};

/// A queryable whose cursors accumulate production time into `timer`.
///
/// Metadata (`expression`, `provider`, `element_type`) is passed through from
/// the source untouched. Nothing is measured until a cursor is advanced.
#[derive(Debug, Clone)]
pub struct TimedQuery<Q, T> {
    source: Q,
    timer: T,
    element_type: ElementType,
}

impl<Q, T> TimedQuery<Q, T>
where
    Q: Queryable,
    T: Timer + Clone,
{
    /// Wrap `source`, caching its element type.
    pub fn new(source: Q, timer: T) -> Self {
        let element_type = source.element_type();
        Self {
            source,
            timer,
            element_type,
        }
    }

    /// The wrapped queryable.
    pub fn source(&self) -> &Q {
        &self.source
    }

    /// The timer every cursor from this query drives.
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Unwrap, returning the original queryable.
    pub fn into_inner(self) -> Q {
        self.source
    }
}

impl<Q, T> Queryable for TimedQuery<Q, T>
where
    Q: Queryable,
    T: Timer + Clone,
{
    type Provider = Q::Provider;
    type Cursor = TimedCursor<<Q::Provider as QueryProvider>::Cursor, T>;

    fn expression(&self) -> &ExpressionOf<Q> {
        self.source.expression()
    }

    fn provider(&self) -> &Q::Provider {
        self.source.provider()
    }

    fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Re-issue the source's expression through its provider and wrap the
    /// resulting cursor. Provider errors are returned unchanged.
    fn cursor(&self) -> Result<Self::Cursor, ErrorOf<Q>> {
        let inner = self.source.provider().execute(self.source.expression())?;
        Ok(TimedCursor::new(inner, self.timer.clone(), self.element_type))
    }
}

/// Cursor wrapper that drives the shared timer.
///
/// - `advance`: when the timer is idle, reset and start it, then forward.
///   Never stops the timer.
/// - `dispose` (or dropping the cursor): stop the timer, then release the
///   inner cursor. This is the only path that stops the timer.
/// - `current` and `reset` forward without touching the timer.
///
/// Leaking the cursor (e.g. `std::mem::forget`) skips disposal and leaves the
/// timer running.
#[derive(Debug)]
pub struct TimedCursor<C: Cursor, T: Timer> {
    // Some until disposed or dropped.
    inner: Option<C>,
    timer: T,
    element_type: ElementType,
}

impl<C: Cursor, T: Timer> TimedCursor<C, T> {
    /// Wrap `inner` so that advancing it drives `timer`.
    pub fn new(inner: C, timer: T, element_type: ElementType) -> Self {
        Self {
            inner: Some(inner),
            timer,
            element_type,
        }
    }

    /// The shared timer this cursor drives.
    pub fn timer(&self) -> &T {
        &self.timer
    }

    fn stop_timer(&self) {
        self.timer.stop();
        debug!(
            event = "Timer",
            phase = "Stop",
            element_type = %self.element_type,
            elapsed_ms = self.timer.elapsed().as_secs_f64() * 1_000.0
        );
    }
}

impl<C, T> Cursor for TimedCursor<C, T>
where
    C: Cursor,
    T: Timer,
{
    type Item = C::Item;
    type Error = C::Error;

    fn advance(&mut self) -> Result<bool, C::Error> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(false);
        };
        if !self.timer.is_running() {
            self.timer.reset();
            self.timer.start();
            debug!(event = "Timer", phase = "Start", element_type = %self.element_type);
        }
        let advanced = inner.advance()?;
        trace!(event = "Timer", phase = "Advance", advanced);
        Ok(advanced)
    }

    fn current(&self) -> Option<&C::Item> {
        self.inner.as_ref()?.current()
    }

    fn reset(&mut self) -> Result<(), C::Error> {
        match self.inner.as_mut() {
            Some(inner) => inner.reset(),
            None => Ok(()),
        }
    }

    fn dispose(mut self) -> Result<(), C::Error> {
        self.stop_timer();
        match self.inner.take() {
            Some(inner) => inner.dispose(),
            None => Ok(()),
        }
    }
}

impl<C: Cursor, T: Timer> Drop for TimedCursor<C, T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            // Scoped release of a cursor nobody disposed explicitly. Drop has
            // no way to report the inner dispose error.
            self.stop_timer();
            if inner.dispose().is_err() {
                debug!(
                    event = "Timer",
                    phase = "Dispose",
                    element_type = %self.element_type,
                    "Inner cursor failed to dispose"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::memory::{MemoryExpression, MemoryProvider, MemoryQuery, Operation};
    use crate::timers::Stopwatch;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_metadata_is_passed_through() {
        let watch = Stopwatch::new();
        let source = MemoryQuery::new(vec![1u32, 2, 3]).skip(1);
        let timed = TimedQuery::new(source.clone(), &watch);

        assert_eq!(timed.expression(), source.expression());
        assert_eq!(timed.element_type(), source.element_type());
        assert_eq!(timed.provider().len(), 3);
        assert!(!watch.is_running());
        assert_eq!(watch.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_full_traversal_then_dispose_stops_timer() {
        let watch = Stopwatch::new();
        let timed = TimedQuery::new(MemoryQuery::new(vec![1u32, 2, 3]), &watch);

        let mut cursor = timed.cursor().unwrap();
        assert!(!watch.is_running());

        let mut items = Vec::new();
        while cursor.advance().unwrap() {
            assert!(watch.is_running());
            items.push(*cursor.current().unwrap());
        }
        thread::sleep(Duration::from_millis(1));
        assert!(watch.is_running());

        cursor.dispose().unwrap();
        assert_eq!(items, vec![1, 2, 3]);
        assert!(!watch.is_running());
        assert!(watch.elapsed() > Duration::ZERO);
    }

    #[test]
    fn test_empty_source_starts_on_first_advance() {
        let watch = Stopwatch::new();
        let timed = TimedQuery::new(MemoryQuery::new(Vec::<u32>::new()), &watch);

        let mut cursor = timed.cursor().unwrap();
        assert!(!cursor.advance().unwrap());
        assert!(watch.is_running());

        cursor.dispose().unwrap();
        assert!(!watch.is_running());
    }

    #[test]
    fn test_early_dispose_stops_timer() {
        let watch = Stopwatch::new();
        let timed = TimedQuery::new(MemoryQuery::new(vec![1u32, 2, 3]), &watch);

        let mut cursor = timed.cursor().unwrap();
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.current(), Some(&1));
        cursor.dispose().unwrap();
        assert!(!watch.is_running());
    }

    #[test]
    fn test_drop_is_scoped_disposal() {
        let watch = Stopwatch::new();
        let timed = TimedQuery::new(MemoryQuery::new(vec![1u32, 2, 3]), &watch);
        {
            let mut cursor = timed.cursor().unwrap();
            cursor.advance().unwrap();
            assert!(watch.is_running());
        }
        assert!(!watch.is_running());
    }

    #[test]
    fn test_leaked_cursor_leaves_timer_running() {
        let watch = Stopwatch::new();
        let timed = TimedQuery::new(MemoryQuery::new(vec![1u32, 2, 3]), &watch);
        let mut cursor = timed.cursor().unwrap();
        cursor.advance().unwrap();
        std::mem::forget(cursor);
        assert!(watch.is_running());
    }

    #[test]
    fn test_dispose_stops_even_if_never_advanced() {
        let watch = Stopwatch::start_new();
        let timed = TimedQuery::new(MemoryQuery::new(vec![1u32]), &watch);
        timed.cursor().unwrap().dispose().unwrap();
        assert!(!watch.is_running());
    }

    #[test]
    fn test_advance_restarts_timer_from_zero_after_external_stop() {
        let watch = Stopwatch::new();
        let timed = TimedQuery::new(MemoryQuery::new(vec![1u32, 2, 3]), &watch);
        let mut cursor = timed.cursor().unwrap();

        cursor.advance().unwrap();
        thread::sleep(Duration::from_millis(20));
        watch.stop();
        assert!(watch.elapsed() >= Duration::from_millis(20));

        cursor.advance().unwrap();
        assert!(watch.is_running());
        assert!(watch.elapsed() < Duration::from_millis(20));
    }

    #[test]
    fn test_advance_does_not_reset_running_timer() {
        let watch = Stopwatch::new();
        let timed = TimedQuery::new(MemoryQuery::new(vec![1u32, 2]), &watch);
        let mut cursor = timed.cursor().unwrap();

        cursor.advance().unwrap();
        thread::sleep(Duration::from_millis(10));
        cursor.advance().unwrap();
        assert!(watch.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_reset_forwards_without_touching_timer() {
        let watch = Stopwatch::new();
        let timed = TimedQuery::new(MemoryQuery::new(vec![4u32, 5]), &watch);
        let mut cursor = timed.cursor().unwrap();

        cursor.reset().unwrap();
        assert!(!watch.is_running());

        cursor.advance().unwrap();
        cursor.advance().unwrap();
        cursor.reset().unwrap();
        assert!(watch.is_running());
        assert_eq!(cursor.current(), None);
        cursor.advance().unwrap();
        assert_eq!(cursor.current(), Some(&4));
    }

    #[test]
    fn test_each_cursor_reexecutes_the_query() {
        let watch = Rc::new(Stopwatch::new());
        let timed = TimedQuery::new(
            MemoryQuery::new(vec![1u32, 2, 3]).take(2),
            Rc::clone(&watch),
        );

        let first: Vec<u32> = timed
            .cursor()
            .unwrap()
            .into_items()
            .collect::<Result<_, _>>()
            .unwrap();
        let second: Vec<u32> = timed
            .cursor()
            .unwrap()
            .into_items()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(first, vec![1, 2]);
        assert_eq!(first, second);
        assert!(!watch.is_running());
    }

    #[test]
    fn test_provider_error_is_propagated_unchanged() {
        let watch = Stopwatch::new();
        let query = MemoryQuery::from_provider(
            MemoryProvider::new(vec![1u32]),
            MemoryExpression::new().then(Operation::StepBy(0)),
        );
        let timed = TimedQuery::new(query, &watch);

        let err = timed.cursor().unwrap_err();
        assert!(matches!(err, QueryError::InvalidExpression(_)));
        assert!(!watch.is_running());
    }

    /// Provider whose cursors fail on a chosen advance and record disposal.
    struct FaultyProvider {
        fail_at: usize,
        disposed: Rc<Cell<bool>>,
    }

    struct FaultyCursor {
        calls: usize,
        fail_at: usize,
        disposed: Rc<Cell<bool>>,
    }

    impl Cursor for FaultyCursor {
        type Item = usize;
        type Error = String;

        fn advance(&mut self) -> Result<bool, String> {
            self.calls += 1;
            if self.calls == self.fail_at {
                return Err(format!("boom at {}", self.calls));
            }
            Ok(true)
        }

        fn current(&self) -> Option<&usize> {
            Some(&self.calls)
        }

        fn reset(&mut self) -> Result<(), String> {
            Err("reset unsupported".to_string())
        }

        fn dispose(self) -> Result<(), String> {
            self.disposed.set(true);
            Err("dispose failed".to_string())
        }
    }

    impl QueryProvider for FaultyProvider {
        type Item = usize;
        type Expression = ();
        type Error = String;
        type Cursor = FaultyCursor;

        fn execute(&self, _expression: &()) -> Result<FaultyCursor, String> {
            Ok(FaultyCursor {
                calls: 0,
                fail_at: self.fail_at,
                disposed: Rc::clone(&self.disposed),
            })
        }
    }

    struct FaultyQuery(FaultyProvider);

    impl Queryable for FaultyQuery {
        type Provider = FaultyProvider;
        type Cursor = FaultyCursor;

        fn expression(&self) -> &() {
            &()
        }

        fn provider(&self) -> &FaultyProvider {
            &self.0
        }

        fn cursor(&self) -> Result<FaultyCursor, String> {
            self.0.execute(&())
        }
    }

    #[test]
    fn test_inner_errors_propagate_unchanged() {
        let watch = Stopwatch::new();
        let disposed = Rc::new(Cell::new(false));
        let timed = TimedQuery::new(
            FaultyQuery(FaultyProvider {
                fail_at: 2,
                disposed: Rc::clone(&disposed),
            }),
            &watch,
        );

        let mut cursor = timed.cursor().unwrap();
        assert_eq!(cursor.advance(), Ok(true));
        assert_eq!(cursor.advance(), Err("boom at 2".to_string()));
        assert_eq!(cursor.reset(), Err("reset unsupported".to_string()));
        assert!(watch.is_running());

        assert_eq!(cursor.dispose(), Err("dispose failed".to_string()));
        assert!(disposed.get());
        assert!(!watch.is_running());
    }

    #[test]
    fn test_drop_disposes_inner_cursor() {
        let watch = Stopwatch::new();
        let disposed = Rc::new(Cell::new(false));
        let timed = TimedQuery::new(
            FaultyQuery(FaultyProvider {
                fail_at: 0,
                disposed: Rc::clone(&disposed),
            }),
            &watch,
        );
        {
            let mut cursor = timed.cursor().unwrap();
            assert_eq!(cursor.advance(), Ok(true));
        }
        assert!(disposed.get());
        assert!(!watch.is_running());
    }

    #[test]
    fn test_into_items_disposes_inner_cursor_on_advance_error() {
        let watch = Stopwatch::new();
        let disposed = Rc::new(Cell::new(false));
        let timed = TimedQuery::new(
            FaultyQuery(FaultyProvider {
                fail_at: 2,
                disposed: Rc::clone(&disposed),
            }),
            &watch,
        );

        let mut items = timed.cursor().unwrap().into_items();
        assert_eq!(items.next(), Some(Ok(1)));
        assert_eq!(items.next(), Some(Err("boom at 2".to_string())));
        assert!(disposed.get());
        assert!(!watch.is_running());
        assert_eq!(items.next(), None);
    }

    #[test]
    fn test_element_type_is_cached_from_source() {
        let watch = Stopwatch::new();
        let timed = TimedQuery::new(
            FaultyQuery(FaultyProvider {
                fail_at: 0,
                disposed: Rc::new(Cell::new(false)),
            }),
            &watch,
        );
        assert_eq!(timed.element_type().name(), "usize");
    }
}
