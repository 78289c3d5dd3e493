pub mod config;
pub mod error;
pub mod interactive;
pub mod pipeline;
pub mod timing;
pub mod toolkit;
pub mod tracks;

pub use config::Config;
pub use error::{PalfixError, Result};
pub use pipeline::{print_summary, retime_file, retime_file_with_cancel, PipelineResult, PipelineStats};
pub use timing::{RationalFactor, Timestamp};
pub use tracks::{SyncDirective, TrackDescriptor, TrackKind};
