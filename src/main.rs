//! Afterglow demo binary.
//!
//! Usage: `afterglow [preset.toml]`. With no argument the viewer runs on
//! default options; with a path it loads a TOML preset first (partial
//! files fill in defaults).

use std::path::Path;

use afterglow::{options::Options, viewer::Viewer};

fn main() {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(arg) => match Options::load(Path::new(&arg)) {
            Ok(options) => {
                log::info!("loaded preset {arg}");
                options
            }
            Err(e) => {
                log::error!("failed to load preset {arg}: {e}");
                std::process::exit(1);
            }
        },
        None => Options::default(),
    };

    if let Err(e) = Viewer::builder().with_options(options).build().run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
