//! Row-parallel iteration that degrades to sequential iteration.
//!
//! With the `parallel` feature the kernels run on rayon's thread pool.
//! Without it, `into_par_iter()` is a plain `into_iter()`, so the kernels'
//! iterator chains compile unchanged against `std::iter::Iterator`.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
