use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use quake::{
    palette::{self, Palette},
    prelude::*,
};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "bsp-readout", version, about = "Inspect Quake BSP maps and palettes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print header, lump counts, textures, meshes and warnings
    Info {
        map: PathBuf,
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// overrides the palette named in the config
        #[arg(long, value_name = "PATH")]
        palette: Option<PathBuf>,
    },
    /// Write the packed lightmap atlas as a PNG
    Atlas {
        map: PathBuf,
        out: PathBuf,
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Convert a palette between .lmp and .pal, adjusting it on the way
    Palette {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = 1.0)]
        gamma: f32,
        #[arg(long, default_value_t = 0.5)]
        brightness: f32,
        #[arg(long, default_value_t = 0.5)]
        contrast: f32,
        /// accept raw input of any size, truncating or padding to 256 colors
        #[arg(long)]
        relaxed: bool,
    },
}

#[derive(Debug, Error)]
enum ReadoutError {
    #[error(transparent)]
    Bsp(#[from] BspError),
    #[error(transparent)]
    Palette(#[from] PaletteError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("writing {}: {source}", .path.display())]
    Png {
        path: PathBuf,
        source: png::EncodingError,
    },
    #[error("{} has no lightmaps", .0.display())]
    NoAtlas(PathBuf),
}

fn load_config(path: Option<&Path>) -> Result<LoaderConfig, ConfigError> {
    match path {
        Some(path) => LoaderConfig::load(path),
        None => Ok(LoaderConfig::default()),
    }
}

fn info(
    map_path: &Path,
    config: Option<&Path>,
    palette: Option<PathBuf>,
) -> Result<(), ReadoutError> {
    let mut config = load_config(config)?;
    if palette.is_some() {
        config.palette.path = palette;
    }

    let map = Map::load_with_config(map_path, &config)?;

    println!("{}", map_path.display());
    println!("  version      {}", map.version);
    println!("  entities     {} bytes", map.entities.len());
    println!("  planes       {}", map.planes.len());
    println!("  vertices     {}", map.vertices.len());
    println!("  edges        {}", map.edges.len());
    println!("  surfedges    {}", map.surf_edges.len());
    println!("  faces        {}", map.faces.len());
    println!("  texinfo      {}", map.tex_info.len());
    println!("  models       {}", map.models.len());
    println!("  lighting     {} bytes", map.lighting.len());
    if let Some(world) = map.world_model() {
        println!("  world bounds {} .. {}", world.mins(), world.maxs());
    }

    println!("  textures     {}", map.textures.len());
    for (i, texture) in map.textures.iter().enumerate() {
        println!(
            "    {i:>3} {:<16} {:>4}x{:<4} {}{}",
            texture.name,
            texture.width,
            texture.height,
            if texture.has_pixels() {
                "embedded"
            } else {
                "external"
            },
            if texture.is_special() { ", special" } else { "" }
        );
    }

    let drawn = map.meshes.iter().filter(|m| !m.vertices.is_empty()).count();
    println!(
        "  meshes       {} ({} drawn, {} triangles)",
        map.meshes.len(),
        drawn,
        map.triangle_count()
    );

    let atlas = &map.lightmap_atlas;
    if atlas.is_empty() {
        println!("  lightmaps    none");
    } else {
        println!(
            "  lightmaps    {} in {}x{}",
            atlas.rects.iter().filter(|r| r.valid).count(),
            atlas.width,
            atlas.height
        );
    }

    match &map.palette {
        Some(palette) => println!("  palette      loaded, color 0 = {:?}", palette.color(0)),
        None => println!("  palette      none"),
    }

    println!("  warnings     {}", map.warnings.len());
    for warning in &map.warnings {
        println!("    {warning}");
    }

    Ok(())
}

fn write_png(path: &Path, width: u32, height: u32, rgba: &[u8]) -> Result<(), ReadoutError> {
    let png_error = |source: png::EncodingError| ReadoutError::Png {
        path: path.to_owned(),
        source,
    };

    let w = BufWriter::new(File::create(path).map_err(|e| png_error(e.into()))?);
    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().map_err(png_error)?;
    writer.write_image_data(rgba).map_err(png_error)?;
    Ok(())
}

fn atlas(map_path: &Path, out: &Path, config: Option<&Path>) -> Result<(), ReadoutError> {
    let config = load_config(config)?;
    let map = Map::load_with_config(map_path, &config)?;
    let atlas = &map.lightmap_atlas;

    if atlas.is_empty() {
        return Err(ReadoutError::NoAtlas(map_path.to_owned()));
    }

    write_png(out, atlas.width, atlas.height, &atlas.rgba)?;
    log::info!(
        "Wrote {}x{} atlas to {}",
        atlas.width,
        atlas.height,
        out.display()
    );
    Ok(())
}

fn convert_palette(
    input: &Path,
    output: &Path,
    gamma: f32,
    brightness: f32,
    contrast: f32,
    relaxed: bool,
) -> Result<(), ReadoutError> {
    let mut palette = if relaxed && !palette::is_jasc_path(input) {
        Palette::from_relaxed(&std::fs::read(input).map_err(PaletteError::from)?)
    } else {
        palette::load(input)?
    };

    palette.apply_gamma(gamma);
    palette.apply_brightness_contrast(brightness, contrast);
    palette::save(output, &palette)?;

    log::info!("Wrote {}", output.display());
    Ok(())
}

fn run(cli: Cli) -> Result<(), ReadoutError> {
    match cli.command {
        Command::Info {
            map,
            config,
            palette,
        } => info(&map, config.as_deref(), palette),
        Command::Atlas { map, out, config } => atlas(&map, &out, config.as_deref()),
        Command::Palette {
            input,
            output,
            gamma,
            brightness,
            contrast,
            relaxed,
        } => convert_palette(&input, &output, gamma, brightness, contrast, relaxed),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
