use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use encoding_rs::Encoding;

use crate::data::dashboard::DashboardParams;
use crate::data::loader::LoadOptions;

/// Smallest and largest selectable top-artist count.
pub const TOP_N_RANGE: std::ops::RangeInclusive<usize> = 5..=30;

#[derive(Parser, Debug)]
#[command(version, about = "Explore a music track dataset")]
pub struct CliArgs {
    /// Dataset to open at startup (.csv, .json or .parquet).
    #[arg(default_value = "spotify-2023.csv")]
    pub path: PathBuf,

    /// Text encoding of CSV input (any WHATWG label).
    #[arg(long, default_value = "latin1")]
    pub encoding: String,

    /// Separator between names in a multi-artist field.
    #[arg(long, default_value = ",")]
    pub artist_delimiter: String,

    /// Initial number of artists in the top-artist charts.
    #[arg(long, default_value_t = 15)]
    pub top_n: usize,
}

/// Validated startup settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub dataset: PathBuf,
    pub load: LoadOptions,
    pub dashboard: DashboardParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("spotify-2023.csv"),
            load: LoadOptions::default(),
            dashboard: DashboardParams::default(),
        }
    }
}

impl Settings {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let encoding = Encoding::for_label(args.encoding.trim().as_bytes())
            .with_context(|| format!("unknown text encoding '{}'", args.encoding))?;
        if args.artist_delimiter.trim().is_empty() {
            bail!("artist delimiter must contain a non-whitespace character");
        }
        let top_n = args.top_n.clamp(*TOP_N_RANGE.start(), *TOP_N_RANGE.end());
        if top_n != args.top_n {
            log::warn!("--top-n {} out of range, using {top_n}", args.top_n);
        }

        Ok(Settings {
            dataset: args.path,
            load: LoadOptions { encoding },
            dashboard: DashboardParams {
                top_n,
                artist_delimiter: args.artist_delimiter,
            },
        })
    }
}
