mod common;

mod build_tests;
mod failure_tests;
