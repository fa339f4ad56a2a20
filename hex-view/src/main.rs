//! Application entry point for the hex grid viewer.
//!
//! This binary parses the command line, loads options and posts, sets up
//! eframe/egui and delegates all interactive logic and rendering to
//! [`Viewer`] from the `viewer` module.

mod controls;
mod viewer;

use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use hex_core::config::Options;
use hex_core::post::{PostData, load_posts};
use log::{error, info};

use viewer::Viewer;

/// Interactive hex-tile grid.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// RON file with options; missing fields keep their defaults.
    #[arg(long)]
    options: Option<PathBuf>,

    /// RON file with the list of posts shown on content tiles.
    #[arg(long)]
    posts: Option<PathBuf>,

    /// Seed for content placement and every random effect.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// Loads the options file, falling back to defaults if it cannot be read.
fn load_options(path: Option<&PathBuf>) -> Options {
    let Some(path) = path else {
        return Options::default();
    };
    match Options::load(path) {
        Ok(options) => {
            info!("loaded options from {}", path.display());
            options
        }
        Err(err) => {
            error!("{err}; using default options");
            Options::default()
        }
    }
}

fn load_post_list(path: Option<&PathBuf>) -> Vec<PostData> {
    let Some(path) = path else {
        return Vec::new();
    };
    match load_posts(path) {
        Ok(posts) => {
            info!("loaded {} posts from {}", posts.len(), path.display());
            posts
        }
        Err(err) => {
            error!("{err}; starting without posts");
            Vec::new()
        }
    }
}

/// Starts the native eframe application.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let options = load_options(args.options.as_ref());
    let posts = load_post_list(args.posts.as_ref());
    let native_options = eframe::NativeOptions::default();

    eframe::run_native(
        "Hex Grid",
        native_options,
        Box::new(move |_cc| Ok(Box::new(Viewer::new(options, posts, args.seed)))),
    )
}
