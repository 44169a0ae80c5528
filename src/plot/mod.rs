//! Figure builders for hit positions, edge overlays and GNN edge predictions.
//!
//! Every builder returns a [`figure::Figure`]; nothing is drawn until the
//! figure is handed to [`crate::render::present`].

pub mod confusion;
pub mod figure;
pub mod hit_pairs;
pub mod hit_positions;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("{what} has {actual} entries but there are {expected} edges")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}
