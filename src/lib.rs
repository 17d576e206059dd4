pub use sqlq_core::*;
