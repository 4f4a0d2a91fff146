//! The value an adapter starts with when the store has nothing for its key.

use std::fmt;

/// A default that is either ready-made or computed on demand.
///
/// A factory is only called when hydration actually needs the default, and
/// at most once: resolving consumes the `DefaultValue`.
pub enum DefaultValue<T> {
    Literal(T),
    Factory(Box<dyn FnOnce() -> T>),
}

impl<T> DefaultValue<T> {
    pub fn literal(value: T) -> Self {
        Self::Literal(value)
    }

    pub fn factory(factory: impl FnOnce() -> T + 'static) -> Self {
        Self::Factory(Box::new(factory))
    }

    /// Produce the value, invoking the factory if there is one.
    pub fn resolve(self) -> T {
        match self {
            Self::Literal(value) => value,
            Self::Factory(factory) => factory(),
        }
    }
}

impl<T> From<T> for DefaultValue<T> {
    fn from(value: T) -> Self {
        Self::Literal(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for DefaultValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}
