// easel - Raster images with file persistence and a zoomable Wayland viewer
// Command line front-end: view, inspect and transform image files

mod cli;

use anyhow::{Context, Result};
use cli::{Command, OutputArgs};
use easel::persistence::{self, DialogPicker, FilePicker, PresetPicker};
use easel::{Raster, UiThread};
use log::info;
use std::path::Path;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args = cli::parse_args();
    let settings = args.settings();
    info!("Starting easel ({:?})", args.command);

    match args.command {
        Command::Show { image, zoom, title } => {
            let raster = match image {
                Some(path) => open(&path)?,
                None => match persistence::load(&DialogPicker, &settings.directory)? {
                    Some(raster) => raster,
                    None => return Ok(()),
                },
            };
            let title = title.unwrap_or_else(|| raster.display_name().to_string());

            let ui = UiThread::spawn().context("Failed to start the viewer")?;
            ui.show_titled(&raster, &title, zoom)?;
            ui.wait_idle()
        }
        Command::Info { image } => {
            let raster = open(&image)?;
            println!("{}", raster.describe());
            Ok(())
        }
        Command::Crop {
            image,
            x,
            y,
            width,
            height,
            output,
        } => {
            let raster = open(&image)?;
            let cropped = raster
                .crop(x, y, width, height)
                .with_context(|| format!("Failed to crop {}", image.display()))?;
            write(&cropped, &output, &settings.directory)
        }
        Command::Composite {
            base,
            overlay,
            x,
            y,
            output,
        } => {
            let mut raster = open(&base)?;
            let overlay = open(&overlay)?;
            raster.composite(&overlay, x, y);
            write(&raster, &output, &settings.directory)
        }
        Command::Convert {
            image,
            model,
            output,
        } => {
            let raster = open(&image)?;
            let converted = match model {
                Some(model) => raster.convert(model),
                None => raster,
            };
            write(&converted, &output, &settings.directory)
        }
        Command::Blank {
            width,
            height,
            color,
            model,
            output,
        } => {
            let mut raster = Raster::with_settings(width, height, model, &settings)
                .context("Failed to create image")?;
            raster.fill(color);
            write(&raster, &output, &settings.directory)
        }
    }
}

fn open(path: &Path) -> Result<Raster> {
    persistence::load_path(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Save `raster` to `-o` when given, otherwise through the save dialog
fn write(raster: &Raster, output: &OutputArgs, directory: &Path) -> Result<()> {
    let picker: Box<dyn FilePicker> = match &output.output {
        Some(path) => Box::new(PresetPicker::new(path)),
        None => Box::new(DialogPicker),
    };
    let saved = match output.format {
        Some(format) => persistence::save(raster, picker.as_ref(), directory, format)?,
        None => persistence::save_as(raster, picker.as_ref(), directory)?,
    };
    match saved {
        Some(path) => println!("{}", path.display()),
        None => info!("Nothing written"),
    }
    Ok(())
}
