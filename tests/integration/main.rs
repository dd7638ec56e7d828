//! Integration tests for ticker-dash

mod config_test;
mod engine_test;
mod feed_test;
