//! Default-value policy for absent keys.
//!
//! The policy is part of the store's type, so it decides the result type of
//! reads at compile time:
//!
//! | Policy | `get` returns | Absent key |
//! |--------|---------------|------------|
//! | [`NoDefault`] | `Option<T>` | `None` |
//! | [`WithDefault<T>`] | `T` | the default |
//!
//! A policy is chosen when the store is built and can't be changed per call.

use std::fmt;
use std::sync::Arc;

/// Resolves a decoded (possibly absent) value into the caller-facing result.
pub trait DefaultPolicy<T>: Send + Sync {
    /// Caller-facing result of a read.
    type Output;

    fn resolve(&self, decoded: Option<T>) -> Self::Output;
}

/// No default: absent keys read as `None`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDefault;

impl<T> DefaultPolicy<T> for NoDefault {
    type Output = Option<T>;

    fn resolve(&self, decoded: Option<T>) -> Option<T> {
        decoded
    }
}

type DefaultFactory<T> = dyn Fn() -> T + Send + Sync;

/// A default substituted for absent keys.
pub enum WithDefault<T> {
    /// Fixed value, cloned on every resolution.
    Value(T),
    /// Factory invoked on every resolution; results are not reused.
    Factory(Arc<DefaultFactory<T>>),
}

impl<T> WithDefault<T> {
    pub fn value(value: T) -> Self {
        WithDefault::Value(value)
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        WithDefault::Factory(Arc::new(factory))
    }
}

impl<T: Clone> WithDefault<T> {
    /// Produce a fresh default.
    pub fn produce(&self) -> T {
        match self {
            WithDefault::Value(value) => value.clone(),
            WithDefault::Factory(factory) => factory(),
        }
    }
}

impl<T: Clone> Clone for WithDefault<T> {
    fn clone(&self) -> Self {
        match self {
            WithDefault::Value(value) => WithDefault::Value(value.clone()),
            WithDefault::Factory(factory) => WithDefault::Factory(Arc::clone(factory)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for WithDefault<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WithDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            WithDefault::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl<T> DefaultPolicy<T> for WithDefault<T>
where
    T: Clone + Send + Sync,
{
    type Output = T;

    fn resolve(&self, decoded: Option<T>) -> T {
        match decoded {
            Some(value) => value,
            None => self.produce(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_no_default_passes_through() {
        assert_eq!(NoDefault.resolve(Some(3)), Some(3));
        assert_eq!(DefaultPolicy::<i32>::resolve(&NoDefault, None), None);
    }

    #[test]
    fn test_value_default() {
        let policy = WithDefault::value("default".to_string());
        assert_eq!(policy.resolve(None), "default");
        assert_eq!(policy.resolve(Some("stored".to_string())), "stored");
    }

    #[test]
    fn test_factory_invoked_per_resolution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let policy = WithDefault::factory(move || counter.fetch_add(1, Ordering::SeqCst) + 100);

        assert_eq!(policy.resolve(None), 100);
        assert_eq!(policy.resolve(None), 101);
        assert_eq!(policy.resolve(Some(7)), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clone_shares_factory() {
        let policy = WithDefault::factory(|| vec![1, 2]);
        let cloned = policy.clone();
        assert_eq!(cloned.produce(), vec![1, 2]);
        assert_eq!(format!("{:?}", cloned), "Factory(..)");
    }
}
