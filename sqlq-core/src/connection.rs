use crate::{Executor, Result};
use std::future::Future;

pub trait Connection: Executor + 'static {
    /// Release the underlying handle, reporting any error the engine raises while closing.
    fn close(self) -> impl Future<Output = Result<()>> + Send {
        async move {
            drop(self);
            Ok(())
        }
    }
}
