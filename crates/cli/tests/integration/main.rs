mod common;

mod clean_tests;
mod run_tests;
