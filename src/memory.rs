//! In-memory query engine.
//!
//! A small [`QueryProvider`] over a shared slice, used to exercise the timing
//! wrappers without a real data source. Expressions are an ordered list of
//! index operations applied lazily at execution time:
//!
//! ```rust
//! use timed_query::memory::MemoryQuery;
//! use timed_query::{Cursor, Queryable};
//!
//! let query = MemoryQuery::new(vec![1, 2, 3, 4, 5, 6]).skip(1).step_by(2);
//! let items: Vec<i32> = query.cursor().unwrap().into_items().collect::<Result<_, _>>().unwrap();
//! assert_eq!(items, vec![2, 4, 6]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

use crate::error::QueryError;
use crate::traits::{Cursor, ElementType, QueryProvider, Queryable};

/// A single step of a [`MemoryExpression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Skip(usize),
    Take(usize),
    /// Keep every n-th element, starting with the first. Zero is rejected at
    /// execution.
    StepBy(usize),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Skip(n) => write!(f, "skip({n})"),
            Operation::Take(n) => write!(f, "take({n})"),
            Operation::StepBy(n) => write!(f, "step_by({n})"),
        }
    }
}

/// Ordered list of operations; empty means "every element".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryExpression {
    operations: Vec<Operation>,
}

impl MemoryExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    fn select(&self, len: usize) -> Result<Vec<usize>, QueryError> {
        let mut indices: Box<dyn Iterator<Item = usize>> = Box::new(0..len);
        for operation in &self.operations {
            indices = match *operation {
                Operation::Skip(n) => Box::new(indices.skip(n)),
                Operation::Take(n) => Box::new(indices.take(n)),
                Operation::StepBy(0) => {
                    return Err(QueryError::InvalidExpression(
                        "step_by requires a non-zero step".to_string(),
                    ));
                }
                Operation::StepBy(n) => Box::new(indices.step_by(n)),
            };
        }
        Ok(indices.collect())
    }
}

impl fmt::Display for MemoryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("source")?;
        for operation in &self.operations {
            write!(f, ".{operation}")?;
        }
        Ok(())
    }
}

/// Executes [`MemoryExpression`]s against a shared slice.
#[derive(Debug)]
pub struct MemoryProvider<T> {
    items: Rc<[T]>,
}

impl<T> Clone for MemoryProvider<T> {
    fn clone(&self) -> Self {
        Self {
            items: Rc::clone(&self.items),
        }
    }
}

impl<T> MemoryProvider<T> {
    pub fn new(items: impl Into<Rc<[T]>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> QueryProvider for MemoryProvider<T> {
    type Item = T;
    type Expression = MemoryExpression;
    type Error = QueryError;
    type Cursor = MemoryCursor<T>;

    fn execute(&self, expression: &MemoryExpression) -> Result<MemoryCursor<T>, QueryError> {
        let indices = expression.select(self.items.len())?;
        debug!(
            event = "Query",
            phase = "Execute",
            element_type = %ElementType::of::<T>(),
            expression = %expression,
            selected = indices.len()
        );
        Ok(MemoryCursor {
            items: Rc::clone(&self.items),
            indices,
            position: None,
        })
    }
}

/// Cursor over the indices an expression selected.
#[derive(Debug)]
pub struct MemoryCursor<T> {
    items: Rc<[T]>,
    indices: Vec<usize>,
    // None before the first advance; indices.len() once exhausted.
    position: Option<usize>,
}

impl<T> Cursor for MemoryCursor<T> {
    type Item = T;
    type Error = QueryError;

    fn advance(&mut self) -> Result<bool, QueryError> {
        let next = self.position.map_or(0, |p| p.saturating_add(1));
        if next < self.indices.len() {
            self.position = Some(next);
            Ok(true)
        } else {
            self.position = Some(self.indices.len());
            Ok(false)
        }
    }

    fn current(&self) -> Option<&T> {
        let index = *self.indices.get(self.position?)?;
        self.items.get(index)
    }

    fn reset(&mut self) -> Result<(), QueryError> {
        self.position = None;
        Ok(())
    }
}

/// A not-yet-executed query over in-memory data.
#[derive(Debug)]
pub struct MemoryQuery<T> {
    provider: MemoryProvider<T>,
    expression: MemoryExpression,
}

impl<T> Clone for MemoryQuery<T> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            expression: self.expression.clone(),
        }
    }
}

impl<T> MemoryQuery<T> {
    pub fn new(items: impl Into<Rc<[T]>>) -> Self {
        Self::from_provider(MemoryProvider::new(items), MemoryExpression::new())
    }

    pub fn from_provider(provider: MemoryProvider<T>, expression: MemoryExpression) -> Self {
        Self {
            provider,
            expression,
        }
    }

    pub fn skip(self, n: usize) -> Self {
        self.then(Operation::Skip(n))
    }

    pub fn take(self, n: usize) -> Self {
        self.then(Operation::Take(n))
    }

    pub fn step_by(self, step: usize) -> Self {
        self.then(Operation::StepBy(step))
    }

    fn then(self, operation: Operation) -> Self {
        Self {
            provider: self.provider,
            expression: self.expression.then(operation),
        }
    }
}

impl<T> Queryable for MemoryQuery<T> {
    type Provider = MemoryProvider<T>;
    type Cursor = MemoryCursor<T>;

    fn expression(&self) -> &MemoryExpression {
        &self.expression
    }

    fn provider(&self) -> &MemoryProvider<T> {
        &self.provider
    }

    fn cursor(&self) -> Result<MemoryCursor<T>, QueryError> {
        self.provider.execute(&self.expression)
    }
}
