//! Interop protocol for foreign then-capable objects.

use crate::value::Value;

/// An object exposing a `then`-like capability, interoperable with the native
/// promise regardless of its concrete implementation.
///
/// Derived or subclassed promise types participate in resolution through this
/// trait; only the library's own [`crate::promise::Promise`] takes the
/// fast splice path.
///
/// Implementations may misbehave: `call_then` is allowed to invoke either or
/// both callbacks, any number of times, or throw synchronously. The resolution
/// job guards against all of that; only the first callback invocation has an
/// effect.
pub trait Thenable: Send + Sync {
    /// Read the `then` capability.
    ///
    /// `Ok(true)` means `then` is callable, `Ok(false)` that the object turned
    /// out not to be thenable after all (the consuming promise fulfills with
    /// it as a plain value). `Err` models a throwing accessor; the thrown
    /// value becomes the consuming promise's rejection reason.
    fn then_callable(&self) -> Result<bool, Value> {
        Ok(true)
    }

    /// Invoke `then(resolve, reject)`.
    ///
    /// A synchronous `Err` is routed to the reject callback by the caller,
    /// never re-thrown into the scheduler.
    fn call_then(
        &self,
        resolve: &mut dyn FnMut(Value),
        reject: &mut dyn FnMut(Value),
    ) -> Result<(), Value>;
}
