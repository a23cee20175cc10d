//! Type aliases for commonly used shared and callback types.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use penarm_core::types::*;
//!
//! // Instead of: Arc<parking_lot::Mutex<Progress>>
//! let progress: ThreadSafe<Progress> = thread_safe(Progress::default());
//! ```

use parking_lot::Mutex;
use std::sync::Arc;

// =============================================================================
// THREAD-SAFE SHARED TYPES (Arc<Mutex<T>>)
// =============================================================================

/// A thread-safe, mutex-protected wrapper for cross-thread sharing.
///
/// Uses `parking_lot::Mutex`, which never poisons.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

// =============================================================================
// CALLBACK TYPES
// =============================================================================

/// A callback invoked after each blocking step of a multi-step routine.
pub type StepCallback<'a> = &'a mut dyn FnMut(&str);

// =============================================================================
// CONSTRUCTOR HELPERS
// =============================================================================

/// Create a new `ThreadSafe<T>` from a value.
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_safe_shares_value() {
        let a = thread_safe(1u32);
        let b = Arc::clone(&a);
        *b.lock() += 1;
        assert_eq!(*a.lock(), 2);
    }

    #[test]
    fn test_step_callback_collects_messages() {
        let mut steps = Vec::new();
        let callback: StepCallback<'_> = &mut |msg| steps.push(msg.to_string());
        callback("lift");
        callback("lower");
        assert_eq!(steps, vec!["lift", "lower"]);
    }
}
