//! Locate, extract and rewrite brace-delimited blocks in the text save files of Paradox games.
//!
//! Blocks are found by key and extracted without reformatting. Replacement text is spliced
//! back in while every other byte of the file is left as it was.

#![warn(missing_debug_implementations)]

pub use crate::balance::{check_braces, check_file, BraceBalance};
pub use crate::block::{Entries, Entry, ParsedBlock, Scalar, Value};
pub use crate::config_load::{load_config, parse_config, Config, OutputConfig};
pub use crate::error::ScanError;
pub use crate::loc::{LineIndex, Loc};
pub use crate::report::{
    disable_ansi_colors, emit_reports, minimum_confidence, minimum_severity, set_output_file,
    take_reports, Confidence, ErrorKey, LogReport, Severity,
};
pub use crate::savefile::SaveFile;
pub use crate::scan::{find_key_block, find_matching_close, BlockScanner, KeyBlocks, ScanOptions};
pub use crate::span::TextSpan;
pub use crate::splice::{rewrite_key_blocks, splice_span, Rewrite};

mod balance;
mod block;
mod config_load;
mod error;
mod helpers;
mod loc;
pub mod report;
mod savefile;
mod scan;
mod span;
mod splice;
