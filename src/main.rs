//! Command-line entry point for training and prediction.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use catdog::dataset::Label;
use catdog::inference::Predictor;
use catdog::training::{TrainingSession, CHECKPOINT_FILE};
use catdog::utils::logging::{init_logging, LogConfig};

#[derive(Parser)]
#[command(name = "catdog", about = "Cat vs dog image classifier", version)]
struct Cli {
    /// Enable debug-level logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a classifier on a directory of labeled images
    Train {
        /// Directory of labeled training images (dog.N.jpg / cat.N.jpg)
        #[arg(long, default_value = "Data/train")]
        data_dir: PathBuf,

        /// Directory for the checkpoint and the exported scalar log
        #[arg(long, default_value = "runs")]
        output_dir: PathBuf,

        /// Number of training epochs
        #[arg(long, default_value_t = 10)]
        epochs: usize,
    },

    /// Classify a single image with a trained checkpoint
    Predict {
        /// Path to the checkpoint file
        #[arg(long, default_value = "runs/best_model.mpk")]
        checkpoint: PathBuf,

        /// Image file to classify
        #[arg(long, conflicts_with_all = ["test_dir", "index"])]
        image: Option<PathBuf>,

        /// Directory of test images, used with --index
        #[arg(long, requires = "index")]
        test_dir: Option<PathBuf>,

        /// Index into the sorted test listing
        #[arg(long)]
        index: Option<usize>,

        /// Write the resized input image to this path as a PNG
        #[arg(long)]
        preview: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config)?;

    match cli.command {
        Command::Train {
            data_dir,
            output_dir,
            epochs,
        } => {
            println!(
                "{}",
                format!("Training for {} epochs on {:?}", epochs, data_dir).bold()
            );

            let session = TrainingSession::new(&data_dir, &output_dir, epochs);
            let report = session.run()?;

            println!(
                "{} best validation accuracy {}",
                "Done:".green().bold(),
                format!("{:.2}%", report.best_val_accuracy).bold()
            );
            println!("Checkpoint: {:?}", output_dir.join(CHECKPOINT_FILE));
        }

        Command::Predict {
            checkpoint,
            image,
            test_dir,
            index,
            preview,
        } => {
            let predictor = Predictor::from_checkpoint(&checkpoint)?;

            let (path, prediction) = match (image, test_dir, index) {
                (Some(image), _, _) => {
                    let prediction = predictor.predict_image(&image)?;
                    (image, prediction)
                }
                (None, Some(dir), Some(index)) => {
                    predictor.predict_index(&dir, index, preview.as_deref())?
                }
                _ => anyhow::bail!("pass either --image or both --test-dir and --index"),
            };

            let verdict = match prediction.label {
                Label::Cat => "cat".cyan().bold(),
                Label::Dog => "dog".yellow().bold(),
            };
            println!(
                "{:?}: {} (p(cat) = {:.4})",
                path, verdict, prediction.probability
            );
        }
    }

    Ok(())
}
