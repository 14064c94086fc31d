//! Loading and interpreting the config file.
//!
//! The config file is conventionally named `save-tiger.conf` and is written in the same
//! `key = value` grammar as the save files themselves:
//!
//! ```text
//! scan = { quotes = yes comments = yes }
//! output = {
//!     color = yes json = no min_severity = warning min_confidence = weak
//!     colors = { error = purple tips = blue }
//!     ignore = { brace-placement }
//! }
//! ```

use std::path::Path;

use anyhow::Result;
use strum::IntoEnumIterator;

use crate::block::{ParsedBlock, Scalar, Value};
use crate::helpers::stringify_choices;
use crate::report::{
    disable_ansi_colors, err, set_filter, set_output_style, warn, Confidence, ErrorKey,
    OutputStyle, ReportFilter, Severity,
};
use crate::savefile::SaveFile;
use crate::scan::ScanOptions;
use crate::span::TextSpan;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    pub color: bool,
    pub json: bool,
    pub min_severity: Severity,
    pub min_confidence: Confidence,
    /// Overrides for the color of each severity tag.
    pub colors: Vec<(Severity, String)>,
    /// Report keys that are never logged.
    pub ignore_keys: Vec<ErrorKey>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            color: true,
            json: false,
            min_severity: Severity::Tips,
            min_confidence: Confidence::Weak,
            colors: Vec::new(),
            ignore_keys: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub scan: ScanOptions,
    pub output: OutputConfig,
}

impl Config {
    /// Push the output settings into the report collector.
    pub fn apply(&self) {
        if self.output.color {
            let mut style = OutputStyle::default();
            for (severity, color) in &self.output.colors {
                style.set(*severity, color);
            }
            set_output_style(style);
        } else {
            disable_ansi_colors();
        }
        set_filter(ReportFilter {
            min_severity: self.output.min_severity,
            min_confidence: self.output.min_confidence,
            ignore_keys: self.output.ignore_keys.clone(),
        });
    }
}

/// Read the config file at `pathname`. Problems inside the file are reported and the
/// defaults are kept for the affected settings; only failing to read the file is an error.
pub fn load_config(pathname: &Path) -> Result<Config> {
    let file = SaveFile::read(pathname)?;
    Ok(parse_config(&file))
}

pub fn parse_config(file: &SaveFile) -> Config {
    let mut config = Config::default();
    let doc = ParsedBlock::document(file.contents(), ScanOptions::default());
    for_each_field(file, &doc, |key, value| match key.as_str() {
        "scan" => {
            if let Some(block) = expect_block(file, key, value) {
                load_scan(file, &block, &mut config.scan);
            }
        }
        "output" => {
            if let Some(block) = expect_block(file, key, value) {
                load_output(file, &block, &mut config.output);
            }
        }
        _ => unknown_key(file, key),
    });
    config
}

fn load_scan(file: &SaveFile, block: &ParsedBlock, scan: &mut ScanOptions) {
    for_each_field(file, block, |key, value| match key.as_str() {
        "quotes" => set_bool(file, key, value, &mut scan.quotes),
        "comments" => set_bool(file, key, value, &mut scan.comments),
        _ => unknown_key(file, key),
    });
}

fn load_output(file: &SaveFile, block: &ParsedBlock, output: &mut OutputConfig) {
    for_each_field(file, block, |key, value| match key.as_str() {
        "color" => set_bool(file, key, value, &mut output.color),
        "json" => set_bool(file, key, value, &mut output.json),
        "min_severity" => set_level(file, key, value, &mut output.min_severity),
        "min_confidence" => set_level(file, key, value, &mut output.min_confidence),
        "colors" => {
            if let Some(block) = expect_block(file, key, value) {
                load_colors(file, &block, &mut output.colors);
            }
        }
        "ignore" => {
            if let Some(block) = expect_block(file, key, value) {
                load_ignore(file, &block, &mut output.ignore_keys);
            }
        }
        _ => unknown_key(file, key),
    });
}

fn load_colors(file: &SaveFile, block: &ParsedBlock, colors: &mut Vec<(Severity, String)>) {
    // Only used to validate the color names.
    let mut trial = OutputStyle::default();
    for_each_field(file, block, |key, value| {
        let Ok(severity) = key.as_str().parse::<Severity>() else {
            let choices: Vec<&'static str> = Severity::iter().map(Into::into).collect();
            let msg = format!("unknown severity `{}`", key.as_str());
            let info = format!("expected {}", stringify_choices(&choices));
            err(ErrorKey::Config).msg(msg).info(info).loc((file, key.span())).push();
            return;
        };
        let Some(color) = expect_scalar(file, key, value) else {
            return;
        };
        if trial.set(severity, color.as_str()) {
            colors.push((severity, color.as_str().to_owned()));
        } else {
            let msg = format!("unknown color `{}`", color.as_str());
            let info = "expected black, red, green, yellow, blue, purple, cyan or white";
            err(ErrorKey::Config).msg(msg).info(info).loc((file, color.span())).push();
        }
    });
}

fn load_ignore(file: &SaveFile, block: &ParsedBlock, ignore_keys: &mut Vec<ErrorKey>) {
    for entry in block.entries() {
        let Ok(entry) = entry else {
            let msg = "could not parse the `ignore` block";
            err(ErrorKey::ParseError).msg(msg).loc((file, block.span())).push();
            return;
        };
        match (entry.key, entry.value.as_scalar()) {
            (None, Some(name)) => match name.as_str().parse::<ErrorKey>() {
                Ok(key) => ignore_keys.push(key),
                Err(e) => {
                    let msg = format!("{e} `{}`", name.as_str());
                    warn(ErrorKey::Config).msg(msg).loc((file, name.span())).push();
                }
            },
            _ => {
                let msg = "expected a list of report keys";
                warn(ErrorKey::Config).msg(msg).loc((file, entry.span())).push();
            }
        }
    }
}

/// Call `f` for every `key = value` entry in `block`. Bare values are reported and skipped.
/// A parse error is reported and ends the walk over this block.
fn for_each_field<'a, F>(file: &SaveFile, block: &ParsedBlock<'a>, mut f: F)
where
    F: FnMut(Scalar<'a>, Value<'a>),
{
    for entry in block.entries() {
        match entry {
            Ok(entry) => {
                if let Some(key) = entry.key {
                    f(key, entry.value);
                } else {
                    let msg = "expected `key = value`";
                    warn(ErrorKey::Config).msg(msg).loc((file, entry.span())).push();
                }
            }
            Err(e) => {
                let offset = e.offset();
                err(ErrorKey::ParseError)
                    .msg(format!("could not parse config: {e}"))
                    .loc((file, TextSpan::new(offset, offset)))
                    .push();
                return;
            }
        }
    }
}

fn unknown_key(file: &SaveFile, key: Scalar) {
    let msg = format!("unknown config key `{}`", key.as_str());
    warn(ErrorKey::Config).msg(msg).loc((file, key.span())).push();
}

fn expect_block<'a>(file: &SaveFile, key: Scalar, value: Value<'a>) -> Option<ParsedBlock<'a>> {
    let block = value.as_block();
    if block.is_none() {
        let msg = format!("`{}` expects a block", key.as_str());
        err(ErrorKey::Config).msg(msg).loc((file, value.span())).push();
    }
    block
}

fn expect_scalar<'a>(file: &SaveFile, key: Scalar, value: Value<'a>) -> Option<Scalar<'a>> {
    let scalar = value.as_scalar();
    if scalar.is_none() {
        let msg = format!("`{}` expects a value, not a block", key.as_str());
        err(ErrorKey::Config).msg(msg).loc((file, value.span())).push();
    }
    scalar
}

fn set_bool(file: &SaveFile, key: Scalar, value: Value, setting: &mut bool) {
    let Some(scalar) = expect_scalar(file, key, value) else {
        return;
    };
    if let Some(b) = scalar.as_bool() {
        *setting = b;
    } else {
        let msg = format!("`{}` expects yes or no", key.as_str());
        err(ErrorKey::Config).msg(msg).loc((file, scalar.span())).push();
    }
}

/// Set a `Severity` or `Confidence` from its lowercase name.
fn set_level<T>(file: &SaveFile, key: Scalar, value: Value, setting: &mut T)
where
    T: IntoEnumIterator + std::str::FromStr + Into<&'static str>,
{
    let Some(scalar) = expect_scalar(file, key, value) else {
        return;
    };
    if let Ok(level) = scalar.as_str().parse::<T>() {
        *setting = level;
    } else {
        let choices: Vec<&'static str> = T::iter().map(Into::into).collect();
        let msg = format!("unknown level `{}` for `{}`", scalar.as_str(), key.as_str());
        let info = format!("expected {}", stringify_choices(&choices));
        err(ErrorKey::Config).msg(msg).info(info).loc((file, scalar.span())).push();
    }
}
