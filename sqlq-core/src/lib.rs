mod client;
mod connection;
mod cursor;
mod driver;
mod executor;
mod lifecycle;
mod query;
mod queue;
mod record;
mod sql_writer;
mod util;
mod value;

pub use ::anyhow::Context;
pub use client::*;
pub use connection::*;
pub use cursor::*;
pub use driver::*;
pub use executor::*;
pub use lifecycle::*;
pub use query::*;
pub(crate) use queue::*;
pub use record::*;
pub use sql_writer::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
