mod app;
mod cli;
mod config;
mod error;
mod persistence;
mod store;
mod ui;

use anyhow::Result;

fn main() -> Result<()> {
    cli::run()
}
