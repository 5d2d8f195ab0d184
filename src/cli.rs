use clap::{Parser, Subcommand};
use nobg_common::CropRect;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nobg")]
#[command(about = "Batch background removal with local crop and rotate", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Removal endpoint (overrides config and NOBG_ENDPOINT)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Remove backgrounds from images and save the results
    Process {
        /// Image files or folders
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output folder for results
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Images sent at the same time
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Crop every image before upload (x,y,width,height)
        #[arg(long, value_parser = parse_crop_rect)]
        crop: Option<CropRect>,

        /// Quarter turns clockwise applied before upload
        #[arg(long, default_value = "0")]
        rotate: u8,

        /// Quarter turns clockwise applied to results
        #[arg(long, default_value = "0")]
        rotate_result: u8,

        /// Print the final queue as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit and process images interactively
    Edit {
        /// Image files or folders
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output folder for results
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Show or change settings
    Config {
        /// Set the removal endpoint URL
        #[arg(long)]
        set_endpoint: Option<String>,

        /// Set how many images are sent at the same time
        #[arg(long)]
        set_concurrency: Option<usize>,

        /// Show settings
        #[arg(long)]
        show: bool,
    },
}

fn parse_crop_rect(s: &str) -> Result<CropRect, String> {
    s.parse::<CropRect>().map_err(|e| e.to_string())
}
