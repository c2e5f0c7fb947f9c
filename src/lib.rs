pub mod app;
pub mod cli;
pub mod config;
pub mod fragment;
pub mod loader;
pub mod output;
pub mod record;
pub mod runner;
pub mod source;
pub mod utils;
pub mod view;

#[cfg(test)]
mod tests;
