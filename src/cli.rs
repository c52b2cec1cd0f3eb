// Command line interface module
// Handles parsing of command line arguments

use clap::{Args as ClapArgs, Parser, Subcommand};
use easel::config::DEFAULT_DISPLAY_NAME;
use easel::{ColorModel, SaveFormat, Settings, Zoom};
use std::path::PathBuf;

/// easel - View, crop, composite and convert raster images
#[derive(Parser, Debug)]
#[command(name = "easel")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory the file dialogs open in
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Display name given to images created from scratch
    #[arg(long, global = true, default_value = DEFAULT_DISPLAY_NAME)]
    pub name: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open an image in a viewer window and wait until it is closed
    Show {
        /// Image to show; a file dialog is opened when omitted
        #[arg(value_name = "IMAGE")]
        image: Option<PathBuf>,

        /// Initial zoom level (100, 75, 50 or 25)
        #[arg(short, long, default_value = "100", value_parser = parse_zoom)]
        zoom: Zoom,

        /// Window title (defaults to the file name)
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Print dimensions and color model of an image
    Info {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },

    /// Copy a rectangular region into a new image
    Crop {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
        width: u32,
        height: u32,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Draw one image over another at an offset
    Composite {
        #[arg(value_name = "BASE")]
        base: PathBuf,
        #[arg(value_name = "OVERLAY")]
        overlay: PathBuf,
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Re-encode an image, optionally in another color model
    Convert {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Target color model (e.g. rgb, argb, gray, indexed, rgb565)
        #[arg(short, long, value_parser = parse_model)]
        model: Option<ColorModel>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Create an image filled with one color
    Blank {
        width: u32,
        height: u32,

        /// Fill color as RRGGBB or AARRGGBB hex
        #[arg(short, long, default_value = "000000", value_parser = parse_color)]
        color: u32,

        #[arg(short, long, default_value = "rgb", value_parser = parse_model)]
        model: ColorModel,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Where and how to write a result
#[derive(ClapArgs, Debug)]
pub struct OutputArgs {
    /// Output file; a save dialog is opened when omitted
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (jpg, png, bmp, gif); inferred from the file name when omitted
    #[arg(short, long, value_parser = parse_format)]
    pub format: Option<SaveFormat>,
}

impl Args {
    /// Defaults for images created from scratch
    pub fn settings(&self) -> Settings {
        Settings::new(self.name.clone(), self.dir.clone())
    }
}

/// Parse a zoom percentage such as "50" or "75 %"
fn parse_zoom(s: &str) -> Result<Zoom, String> {
    s.parse()
}

fn parse_model(s: &str) -> Result<ColorModel, String> {
    s.parse()
}

fn parse_format(s: &str) -> Result<SaveFormat, String> {
    s.parse().map_err(|e: easel::Error| e.to_string())
}

/// Parse RRGGBB (opaque) or AARRGGBB, with an optional leading '#'
fn parse_color(s: &str) -> Result<u32, String> {
    let hex = s.trim_start_matches('#');
    let value = u32::from_str_radix(hex, 16).map_err(|_| format!("Invalid color '{}'", s))?;
    match hex.len() {
        6 => Ok(0xFF00_0000 | value),
        8 => Ok(value),
        _ => Err("Color must be RRGGBB or AARRGGBB".to_string()),
    }
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_default_to_opaque() {
        assert_eq!(parse_color("ff8000"), Ok(0xFFFF_8000));
        assert_eq!(parse_color("#80ff8000"), Ok(0x80FF_8000));
        assert!(parse_color("fff").is_err());
        assert!(parse_color("zzzzzz").is_err());
    }

    #[test]
    fn show_accepts_percent_zoom() {
        let args = Args::try_parse_from(["easel", "show", "a.png", "--zoom", "50"]).unwrap();
        match args.command {
            Command::Show { image, zoom, title } => {
                assert_eq!(image, Some(PathBuf::from("a.png")));
                assert_eq!(zoom, Zoom::Half);
                assert_eq!(title, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Args::try_parse_from(["easel", "show", "--zoom", "60"]).is_err());
    }

    #[test]
    fn crop_takes_negative_origin_and_global_options() {
        let args = Args::try_parse_from([
            "easel", "crop", "in.png", "-5", "3", "10", "10", "-o", "out.png", "--dir", "/tmp",
        ])
        .unwrap();
        assert_eq!(args.dir, PathBuf::from("/tmp"));
        assert_eq!(args.settings().display_name, DEFAULT_DISPLAY_NAME);
        match args.command {
            Command::Crop { x, y, output, .. } => {
                assert_eq!((x, y), (-5, 3));
                assert_eq!(output.output, Some(PathBuf::from("out.png")));
                assert_eq!(output.format, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_format_is_rejected() {
        let result =
            Args::try_parse_from(["easel", "convert", "a.png", "-o", "b.x", "--format", "tiff"]);
        assert!(result.is_err());
    }
}
