//! boxrecon - box size reconciliation for page layout analysis
//!
//! Line, word and page segmentation produce arrays of boxes whose sizes are
//! expected to be similar. This crate measures how far each box is from the
//! robust (median) size of its array and corrects the outliers.
//!
//! # Features
//!
//! - Median width/height statistics, with even/odd splits for facing pages
//! - Size consistency scores, pairwise or against the median
//! - Reconciliation of anomalous widths and/or heights
//! - `.ba` text and JSON persistence, tiled PNG debug rendering
//! - A batch pipeline and the `boxrecon` CLI
//!
//! # Example
//!
//! ```
//! use boxrecon::{reconcile, BoundingBox, BoxArray, CheckMode};
//!
//! let boxes = BoxArray::from_boxes([
//!     BoundingBox::new(0, 0, 100, 30),
//!     BoundingBox::new(110, 0, 102, 30),
//!     BoundingBox::new(220, 0, 98, 30),
//!     BoundingBox::new(330, 0, 140, 30),
//! ]);
//!
//! let result = reconcile(&boxes, CheckMode::Width, 0.05, 1.03).unwrap();
//! assert_eq!(result.stats.num_width_corrected, 1);
//! assert_eq!(result.boxes.get(3).unwrap().width(), 104);
//! ```

pub mod boxa;
pub mod cli;
pub mod config;
pub mod consistency;
pub mod io;
pub mod pipeline;
pub mod reconcile;
pub mod render;
pub mod stats;

// Re-exports for convenience
pub use boxa::{BoundingBox, BoxArray, BoxError, BoxSlot, Dimension};
pub use config::{BoxReconConfig, ConfigError};
pub use consistency::{
    evaluate_size_consistency, size_uniformity, ConsistencyMode, SizeDeviation, SizeUniformity,
    UniformityReport,
};
pub use io::{from_bytes, read_boxa, to_bytes, write_boxa, BoxFormat, BoxIoError};
pub use pipeline::{BoxaPipeline, FileOutcome, PipelineError, PipelineReport, PipelineSummary};
pub use reconcile::{
    reconcile, CheckMode, ReconcileOptions, ReconcileOptionsBuilder, ReconcileStats, Reconciler,
    Reconciliation,
};
pub use render::{render_tiled, save_tiled_png, RenderError, TileOptions};
pub use stats::{mean_sizes, median, median_dimensions, median_sizes, MedianDimensions};
