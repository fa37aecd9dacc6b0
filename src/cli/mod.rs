//! CLI commands and interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "membrane-mesh")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Display information about a mesh file
    Info {
        /// Path to the mesh file (.off, .json or .tmsh)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Compute normals, point areas and densities and export them
    Analyze {
        /// Path to the mesh file (.off, .json or .tmsh)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output VTP file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Gaussian bandwidth for a "density" field over all vertices
        #[arg(long)]
        sigma: Option<f64>,

        /// Write a JSON summary next to the output
        #[arg(long, value_name = "FILE")]
        summary: Option<PathBuf>,
    },

    /// Wrap a mesh into a periodic box and export the trimmed patch
    Periodic {
        /// Path to the mesh file (.off, .json or .tmsh)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Periodic box as "x0,y0,x1,y1"
        #[arg(long, value_delimiter = ',', required = true, allow_negative_numbers = true)]
        bbox: Vec<f64>,

        /// Output VTP file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Write a JSON summary next to the output
        #[arg(long, value_name = "FILE")]
        summary: Option<PathBuf>,
    },
}
