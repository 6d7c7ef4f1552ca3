use core::future::Future;
use core::pin::Pin;
use std::sync::Arc;

/// Deferred result produced by a request factory.
pub type RequestFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;

/// Zero-argument factory invoked once per tracker run.
pub type RequestFn<T, E> = Arc<dyn Fn() -> RequestFuture<T, E> + Send + Sync>;

/// Wraps an async closure into a [`RequestFn`].
pub fn request_fn<T, E, F, Fut>(factory: F) -> RequestFn<T, E>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: 'static,
    E: 'static,
{
    Arc::new(move || -> RequestFuture<T, E> { Box::pin(factory()) })
}

/// Value produced by a successful run.
///
/// A tracker wrapping a single request yields [`Payload::Single`]; one wrapping
/// several yields [`Payload::Many`] in the order the requests were supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload<T> {
    Single(T),
    Many(Vec<T>),
}

impl<T> Payload<T> {
    pub(crate) fn from_values(mut values: Vec<T>, request_count: usize) -> Self {
        if request_count == 1 && values.len() == 1 {
            if let Some(value) = values.pop() {
                return Payload::Single(value);
            }
        }
        Payload::Many(values)
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Single(_) => 1,
            Payload::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value of a single-request run, `None` for multi-request runs.
    pub fn into_single(self) -> Option<T> {
        match self {
            Payload::Single(value) => Some(value),
            Payload::Many(_) => None,
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Payload::Single(value) => vec![value],
            Payload::Many(values) => values,
        }
    }
}
