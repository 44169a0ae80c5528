mod app;
mod color;
mod config;
mod data;
mod plot;
mod render;
mod state;
mod ui;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use config::{RenderConfig, load_config};
use data::filter::LayerSelection;
use data::loader::read_event;
use data::model::Event;
use plot::hit_pairs::{hit_pair_gnn_prediction_plot_2d, hit_pair_plot_2d, hit_pair_plot_3d};
use plot::hit_positions::{
    hit_position_plot_2d, hit_position_plot_2d_no_group, hit_position_plot_3d,
    hit_position_plot_3d_no_group,
};
use render::{present, save_figure};

#[derive(Parser)]
#[command(name = "lrt-viz")]
#[command(about = "Read detector events and plot hits, true edges and GNN edge predictions")]
#[command(version)]
struct Cli {
    /// JSON render configuration (image size, dpi, colours, threshold)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EventArgs {
    /// Dataset directory holding one record per event
    #[arg(short, long)]
    dataset: PathBuf,

    /// Event id
    #[arg(short, long)]
    event: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Scatter hit positions, coloured by layer
    Hits {
        #[command(flatten)]
        event: EventArgs,

        /// x/y/z view instead of the transverse plane
        #[arg(long)]
        three_d: bool,

        /// Draw all hits as one series
        #[arg(long)]
        no_group: bool,

        /// Only these layers (comma separated). Defaults to all.
        #[arg(long, value_delimiter = ',')]
        layers: Vec<i64>,

        /// Write the figure here instead of opening a window
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Draw the true edges over the hits
    Truth {
        #[command(flatten)]
        event: EventArgs,

        /// x/y/z view instead of the transverse plane
        #[arg(long)]
        three_d: bool,

        /// Only these layers (comma separated). Defaults to all.
        #[arg(long, value_delimiter = ',')]
        layers: Vec<i64>,

        /// Write the figure here instead of opening a window
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Colour GNN edge predictions by agreement with the truth
    Predictions {
        #[command(flatten)]
        event: EventArgs,

        /// CSV with hit_index_1, hit_index_2, score, truth
        #[arg(short, long)]
        predictions: PathBuf,

        /// Score cut. Overrides the config file.
        #[arg(long)]
        threshold: Option<f64>,

        /// Only these layers (comma separated). Defaults to all.
        #[arg(long, value_delimiter = ',')]
        layers: Vec<i64>,

        /// Write the figure here instead of opening a window
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Write the hit, particle and true-edge tables as CSV
    Export {
        #[command(flatten)]
        event: EventArgs,

        /// Output directory
        #[arg(short, long)]
        out_dir: PathBuf,
    },

    /// Write a 3D hit plot for each event to OUT_DIR/{event}/hit3D.png
    Batch {
        /// Dataset directory holding one record per event
        #[arg(short, long)]
        dataset: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out_dir: PathBuf,

        /// Event ids
        #[arg(required = true)]
        events: Vec<u64>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Hits {
            event,
            three_d,
            no_group,
            layers,
            save,
        } => {
            let event = load(&event)?;
            let hits = LayerSelection::new(layers).filter_hits(&event.hits);
            let figure = match (three_d, no_group) {
                (false, false) => hit_position_plot_2d(&hits),
                (false, true) => hit_position_plot_2d_no_group(&hits),
                (true, false) => hit_position_plot_3d(&hits),
                (true, true) => hit_position_plot_3d_no_group(&hits),
            };
            present(&figure.with_title(format!("Event {}", event.id)), save.as_deref(), &config)?;
        }
        Commands::Truth {
            event,
            three_d,
            layers,
            save,
        } => {
            let event = load(&event)?;
            let selection = LayerSelection::new(layers);
            let hits = selection.filter_hits(&event.hits);
            let groups = BTreeMap::from([("Truth", selection.filter_pairs(&event.truth))]);
            log::info!(
                "Drawing {} of {} true edges ({} referenced missing hits)",
                groups["Truth"].len(),
                event.truth.len() + event.dropped_edges,
                event.dropped_edges
            );
            let figure = if three_d {
                hit_pair_plot_3d(&hits, &groups, &config.pairs)
            } else {
                hit_pair_plot_2d(&hits, &groups, &config.pairs)
            };
            present(&figure.with_title(format!("Event {}", event.id)), save.as_deref(), &config)?;
        }
        Commands::Predictions {
            event,
            predictions,
            threshold,
            layers,
            save,
        } => {
            if let Some(threshold) = threshold {
                config.prediction.threshold = threshold;
            }
            let event = load(&event)?;
            let selection = LayerSelection::new(layers);
            let hits = selection.filter_hits(&event.hits);
            let set = data::predictions::load_predictions(&predictions, &event.hits)?;
            let set = set.select(&selection.kept_pair_indices(&set.pairs));
            if set.is_empty() {
                log::warn!("No prediction rows left to draw for event {}", event.id);
            }
            let (figure, summary) = hit_pair_gnn_prediction_plot_2d(
                &hits,
                &set.pairs,
                &set.scores,
                &set.truth,
                &config.prediction,
            )?;
            log::info!(
                "Classified {} of {} prediction rows ({} unresolved)",
                summary.total(),
                set.len() + set.dropped,
                set.dropped
            );
            present(&figure.with_title(format!("Event {}", event.id)), save.as_deref(), &config)?;
        }
        Commands::Export { event, out_dir } => {
            let event = load(&event)?;
            for path in data::export::export_event(&event, &out_dir)? {
                log::debug!("Wrote {}", path.display());
            }
        }
        Commands::Batch {
            dataset,
            out_dir,
            events,
        } => {
            for id in events {
                batch_event(&dataset, id, &out_dir, &config)?;
            }
        }
    }
    Ok(())
}

fn load(args: &EventArgs) -> Result<Event> {
    Ok(read_event(&args.dataset, args.event)?)
}

fn batch_event(dataset: &Path, id: u64, out_dir: &Path, config: &RenderConfig) -> Result<()> {
    let event = read_event(dataset, id)?;
    let dir = out_dir.join(id.to_string());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating {}", dir.display()))?;
    save_figure(&hit_position_plot_3d_no_group(&event.hits), &dir.join("hit3D.png"), config)?;
    Ok(())
}
