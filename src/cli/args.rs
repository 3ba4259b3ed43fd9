use clap::Parser;
use std::path::PathBuf;

use histcorr::FallbackPolicy;

#[derive(Parser)]
#[command(name = "histcorr", version, about = "Histogram-mode radiometric correction")]
pub struct CliArgs {
    /// Input multi-band raster (single file mode)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Input directory containing .tif/.tiff rasters (batch mode)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Output filename (single file mode)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing (batch mode)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// JSON file with per-band target profiles (defaults to Landsat bands 1-7)
    #[arg(long)]
    pub profiles: Option<PathBuf>,

    /// JSON file with correction parameters; flags below override it
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Number of histogram bins
    #[arg(long)]
    pub bins: Option<usize>,

    /// Keep the histogram tails instead of trimming 1% on each side
    #[arg(long, default_value_t = false)]
    pub no_trim: bool,

    /// Target to anchor to when a two-mode band shows only one mode
    #[arg(long, value_enum)]
    pub fallback: Option<FallbackPolicy>,

    /// Rescale the spread around a single anchor by the detected/target volume ratio
    #[arg(long, default_value_t = false)]
    pub respread: bool,

    /// Also write per-band histograms (<name>_hist.json) for input and output
    #[arg(long, default_value_t = false)]
    pub histogram: bool,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,

    /// Batch mode: continue processing other files when one fails
    #[arg(long, default_value_t = false)]
    pub batch: bool,
}
