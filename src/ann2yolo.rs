use clap::Parser;
use log::{error, info};

use damage2yolo::{process_polygon_dataset, Args, Format};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.to_config(Format::Bbox);

    info!("Starting the conversion process...");

    match process_polygon_dataset(&config) {
        Ok(summary) => {
            info!("Wrote dataset to {}", summary.output_root.display());
            info!(
                "Classes ({}): {:?}",
                summary.class_names.len(),
                summary.class_names
            );
        }
        Err(e) => {
            error!("Failed to process dataset: {}", e);
            std::process::exit(1);
        }
    }
}
