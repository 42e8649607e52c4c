use clap::Parser;
use log::{error, info};

use damage2yolo::{process_mask_dataset, Args, Format};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.to_config(Format::Polygon);

    info!("Starting mask to YOLO segmentation conversion...");

    match process_mask_dataset(&config) {
        Ok(summary) => {
            info!(
                "Wrote damage segmentation dataset to {}",
                summary.output_root.display()
            );
        }
        Err(e) => {
            error!("Failed to process dataset: {}", e);
            std::process::exit(1);
        }
    }
}
