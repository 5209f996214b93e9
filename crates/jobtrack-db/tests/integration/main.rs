mod common;
mod occupation_tests;
mod program_tests;
