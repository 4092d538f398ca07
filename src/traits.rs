use std::fmt;

/// Name of the element type a query produces, e.g. `u32` or `my_crate::Row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementType {
    name: &'static str,
}

impl ElementType {
    pub fn of<T: ?Sized>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A live, stateful traversal over query results.
///
/// A fresh cursor sits *before* the first element: call [`Cursor::advance`]
/// to move onto it. `current` is only meaningful after `advance` has returned
/// `Ok(true)`.
pub trait Cursor {
    type Item;
    type Error;

    /// Move to the next element. Returns `Ok(false)` once the results are
    /// exhausted.
    fn advance(&mut self) -> Result<bool, Self::Error>;

    /// The element the cursor is positioned on, if any.
    fn current(&self) -> Option<&Self::Item>;

    /// Rewind to the position before the first element.
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// End the traversal and release whatever the cursor holds.
    ///
    /// Default: nothing to release beyond dropping the cursor.
    fn dispose(self) -> Result<(), Self::Error>
    where
        Self: Sized,
    {
        Ok(())
    }

    /// Adapt the cursor into an iterator of cloned elements.
    ///
    /// The cursor is disposed as soon as it reports exhaustion or an error.
    fn into_items(self) -> CursorItems<Self>
    where
        Self: Sized,
        Self::Item: Clone,
    {
        CursorItems { cursor: Some(self) }
    }
}

/// Iterator returned by [`Cursor::into_items`].
pub struct CursorItems<C> {
    cursor: Option<C>,
}

impl<C> Iterator for CursorItems<C>
where
    C: Cursor,
    C::Item: Clone,
{
    type Item = Result<C::Item, C::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        let item = match cursor.advance() {
            Ok(true) => cursor.current().cloned(),
            Ok(false) => None,
            Err(err) => {
                // The advance error wins over anything dispose reports.
                let _ = self.finish();
                return Some(Err(err));
            }
        };
        match item {
            Some(item) => Some(Ok(item)),
            None => self.finish().err().map(Err),
        }
    }
}

impl<C: Cursor> CursorItems<C> {
    fn finish(&mut self) -> Result<(), C::Error> {
        match self.cursor.take() {
            Some(cursor) => cursor.dispose(),
            None => Ok(()),
        }
    }
}

/// The execution engine behind a [`Queryable`].
///
/// Turns an expression into a live cursor. How it does so is its own
/// business; the timing wrappers only ever call [`QueryProvider::execute`].
pub trait QueryProvider {
    type Item;
    type Expression;
    type Error;
    type Cursor: Cursor<Item = Self::Item, Error = Self::Error>;

    /// Create a query for `expression` and open a cursor over its results.
    fn execute(&self, expression: &Self::Expression) -> Result<Self::Cursor, Self::Error>;
}

/// Item type produced by a queryable.
pub type ItemOf<Q> = <<Q as Queryable>::Provider as QueryProvider>::Item;
/// Expression type carried by a queryable.
pub type ExpressionOf<Q> = <<Q as Queryable>::Provider as QueryProvider>::Expression;
/// Error type raised by a queryable's provider.
pub type ErrorOf<Q> = <<Q as Queryable>::Provider as QueryProvider>::Error;

/// A composable, not-yet-executed query bound to a provider.
pub trait Queryable {
    type Provider: QueryProvider;

    /// Cursor handed out by [`Queryable::cursor`]. Plain queryables use the
    /// provider's cursor; wrappers substitute their own.
    type Cursor: Cursor<
            Item = <Self::Provider as QueryProvider>::Item,
            Error = <Self::Provider as QueryProvider>::Error,
        >;

    fn expression(&self) -> &<Self::Provider as QueryProvider>::Expression;

    fn provider(&self) -> &Self::Provider;

    fn element_type(&self) -> ElementType {
        ElementType::of::<<Self::Provider as QueryProvider>::Item>()
    }

    /// Execute the query and open a cursor over its results.
    fn cursor(&self) -> Result<Self::Cursor, <Self::Provider as QueryProvider>::Error>;
}
