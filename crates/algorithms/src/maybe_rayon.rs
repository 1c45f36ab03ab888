//! Row-parallel execution when the `parallel` feature is on, plain iteration otherwise.
//!
//! Call sites always write `.into_par_iter()`; without rayon the shim below
//! turns that into `.into_iter()` so the rest of the chain resolves to
//! `Iterator` methods.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
pub use sequential::IntoParallelIterator;

#[cfg(not(feature = "parallel"))]
mod sequential {
    pub trait IntoParallelIterator: IntoIterator + Sized {
        fn into_par_iter(self) -> Self::IntoIter {
            self.into_iter()
        }
    }

    impl<I: IntoIterator> IntoParallelIterator for I {}
}
