mod crud;
mod cursor;
mod ordering;

use crate::{
    crud::{crud, integer_primary_key, rowid_is_reserved},
    cursor::{cursor_mutations, cursor_stepping},
    ordering::{failure_does_not_block, issue_order},
};
use log::LevelFilter;
use sqlq::{Client, Driver};
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Run the whole suite against a client, every part works on its own tables.
pub async fn execute_tests<D: Driver>(client: Client<D>) {
    crud(&client).await;
    rowid_is_reserved(&client).await;
    integer_primary_key(&client).await;
    cursor_stepping(&client).await;
    cursor_mutations(&client).await;
    issue_order(&client).await;
    failure_does_not_block(&client).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
