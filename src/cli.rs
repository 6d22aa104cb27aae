//! Command-line front-end.
//!
//! [`Args`] is the clap definition; [`run`] resolves the diagram source,
//! renders it and writes the result. The binary only sets up logging and
//! maps errors to an exit code.

use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::{info, warn};

use crate::error::{RenderError, Result};
use crate::svg::theme;
use crate::{layout, parse, render_ascii, render_svg_with_options, AsciiRenderOptions, SvgRenderOptions};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Unicode box-drawing text (plain ASCII with --ascii)
    Ascii,
    /// SVG document
    Svg,
}

/// Command-line arguments for mermaid-render
#[derive(Parser, Debug)]
#[command(name = "mermaid-render", author, version, about, long_about = None)]
pub struct Args {
    /// Output format
    #[arg(value_enum)]
    pub mode: Option<Mode>,

    /// Diagram source; literal "\n" sequences are read as line breaks
    pub diagram: Option<String>,

    /// Read the diagram from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Write the SVG to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// SVG colour theme (see --list-themes)
    #[arg(short, long)]
    pub theme: Option<String>,

    /// Use plain ASCII glyphs instead of Unicode box drawing
    #[arg(long)]
    pub ascii: bool,

    /// List the built-in themes and exit
    #[arg(long)]
    pub list_themes: bool,

    /// Horizontal gap between nodes in ASCII output
    #[arg(long)]
    pub padding_x: Option<usize>,

    /// Vertical gap between nodes in ASCII output
    #[arg(long)]
    pub padding_y: Option<usize>,

    /// Leave the SVG background unpainted
    #[arg(long)]
    pub transparent: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Execute one invocation.
///
/// `stdin` is the piped input, or `None` when standard input is a terminal.
/// Rendered output and status lines go to `out`.
pub fn run<W: Write>(args: &Args, stdin: Option<&mut dyn Read>, out: &mut W) -> Result<()> {
    if args.list_themes {
        writeln!(out, "Available themes:")?;
        for name in theme::names() {
            writeln!(out, "  {}", name)?;
        }
        return Ok(());
    }

    let mode = args
        .mode
        .ok_or_else(|| RenderError::usage("No mode given. Use \"ascii\" or \"svg\"."))?;
    warn_ignored_options(args, mode);

    // Fail on a bad theme before touching the input.
    let theme = match mode {
        Mode::Svg => Some(theme::resolve(args.theme.as_deref())?),
        Mode::Ascii => None,
    };

    let source = read_source(args, stdin)?;
    let graph = parse(&source)?;
    let positioned = layout(&graph)?;

    match mode {
        Mode::Ascii => {
            let defaults = AsciiRenderOptions::default();
            let options = AsciiRenderOptions {
                use_ascii: args.ascii,
                padding_x: args.padding_x.unwrap_or(defaults.padding_x),
                padding_y: args.padding_y.unwrap_or(defaults.padding_y),
                ..defaults
            };
            let text = render_ascii(&positioned, &options);
            writeln!(out, "{}", text)?;
        }
        Mode::Svg => {
            let options = SvgRenderOptions {
                theme,
                transparent: args.transparent,
            };
            let svg = render_svg_with_options(&positioned, &options);
            match &args.output {
                Some(path) => {
                    fs::write(path, &svg)?;
                    info!("wrote {} bytes of SVG", svg.len());
                    writeln!(out, "SVG written to {}", path.display())?;
                }
                None => writeln!(out, "{}", svg)?,
            }
        }
    }
    Ok(())
}

/// Positional text, then --file, then piped stdin. The result is trimmed
/// and never empty.
fn read_source(args: &Args, stdin: Option<&mut dyn Read>) -> Result<String> {
    let raw = if let Some(text) = &args.diagram {
        text.replace("\\n", "\n")
    } else if let Some(path) = &args.file {
        info!("reading diagram from {}", path.display());
        fs::read_to_string(path)?
    } else if let Some(input) = stdin {
        let mut buf = String::new();
        input.read_to_string(&mut buf)?;
        buf
    } else {
        return Err(RenderError::usage(
            "No diagram provided. Pass as argument, --file, or pipe via stdin.",
        ));
    };

    let source = raw.trim();
    if source.is_empty() {
        return Err(RenderError::usage("Empty diagram"));
    }
    Ok(source.to_string())
}

fn warn_ignored_options(args: &Args, mode: Mode) {
    let ignored: &[(&str, bool)] = match mode {
        Mode::Ascii => &[
            ("--output", args.output.is_some()),
            ("--theme", args.theme.is_some()),
            ("--transparent", args.transparent),
        ],
        Mode::Svg => &[
            ("--ascii", args.ascii),
            ("--padding-x", args.padding_x.is_some()),
            ("--padding-y", args.padding_y.is_some()),
        ],
    };
    for (flag, given) in ignored {
        if *given {
            warn!("{} has no effect in {:?} mode; ignoring it", flag, mode);
        }
    }
}
