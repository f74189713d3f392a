//! lenticule CLI — interlace frames, print calibration charts, preview parallax.

mod config;
mod image_loader;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use lenticule_core::geometry::analyze_lens;
use lenticule_core::{
    Frame, Raster, SimulationStatus, encode_png, encode_tiff, interlace, render_calibration_chart,
    render_simulation,
};

use crate::config::CliConfig;
use crate::image_loader::load_raster;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "lenticule")]
#[command(about = "Lenticular print interlacing, pitch calibration charts and parallax preview")]
#[command(version)]
struct Cli {
    /// JSON settings file (job, calibration, physics, simulation, marks).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interlace frames into a print-ready image.
    Interlace(InterlaceArgs),

    /// Render a lens pitch test chart.
    Calibrate {
        /// Output file (.tif/.tiff or .png).
        #[arg(long)]
        out: PathBuf,
    },

    /// Render the view seen from one eye position.
    Simulate(SimulateArgs),

    /// Print the lens field of view for the configured physics.
    Fov,
}

#[derive(Debug, Clone, Args)]
struct InterlaceArgs {
    /// Frame images in sequence order.
    #[arg(long = "frame", required = true)]
    frames: Vec<PathBuf>,

    /// Per-frame registration offset `x,y` in output pixels, in frame order.
    #[arg(long = "offset", value_parser = parse_offset)]
    offsets: Vec<(i32, i32)>,

    /// Output file (.tif/.tiff or .png).
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct SimulateArgs {
    /// Frame images in sequence order.
    #[arg(long = "frame", required = true)]
    frames: Vec<PathBuf>,

    /// Eye position, 0 (far left) to 1 (far right).
    #[arg(long, default_value = "0.5")]
    sim_x: f64,

    #[arg(long, default_value = "800")]
    width: u32,

    #[arg(long, default_value = "600")]
    height: u32,

    /// Output PNG file.
    #[arg(long)]
    out: PathBuf,
}

fn parse_offset(s: &str) -> Result<(i32, i32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got {s:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x offset: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y offset: {e}"))?;
    Ok((x, y))
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.settings.as_deref())?;

    match cli.command {
        Commands::Interlace(args) => run_interlace(&config, &args),
        Commands::Calibrate { out } => run_calibrate(&config, &out),
        Commands::Simulate(args) => run_simulate(&config, &args),
        Commands::Fov => run_fov(&config),
    }
}

fn load_frames(paths: &[PathBuf]) -> CliResult<Vec<Raster>> {
    let mut rasters = Vec::with_capacity(paths.len());
    for path in paths {
        rasters.push(load_raster(path).map_err(|e| format!("{}: {e}", path.display()))?);
    }
    Ok(rasters)
}

/// Write `raster` as PNG when the extension asks for it, TIFF otherwise.
fn write_raster(path: &Path, raster: &Raster, ppi_x: f64, ppi_y: f64) -> CliResult<()> {
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    let bytes = if is_png {
        encode_png(raster)?
    } else {
        encode_tiff(raster, ppi_x, ppi_y)?
    };
    std::fs::write(path, &bytes)?;
    tracing::info!(
        "wrote {} ({}x{}, {} bytes)",
        path.display(),
        raster.width(),
        raster.height(),
        bytes.len()
    );
    Ok(())
}

// ── interlace ─────────────────────────────────────────────────────────

fn run_interlace(config: &CliConfig, args: &InterlaceArgs) -> CliResult<()> {
    if !args.offsets.is_empty() && args.offsets.len() != args.frames.len() {
        return Err(format!(
            "{} offsets given for {} frames",
            args.offsets.len(),
            args.frames.len()
        )
        .into());
    }
    let rasters = load_frames(&args.frames)?;
    let frames: Vec<Frame<'_>> = rasters
        .iter()
        .zip(&args.frames)
        .enumerate()
        .map(|(i, (raster, path))| {
            let (x, y) = args.offsets.get(i).copied().unwrap_or((0, 0));
            Frame::new(path.display().to_string(), raster).with_offset(x, y)
        })
        .collect();

    let mut surface = Raster::default();
    let report = interlace(&mut surface, &frames, &config.job, &config.marks)?;
    println!(
        "lenses: {}  strip width: {:.4} px  canvas: {}x{}",
        report.lens_count,
        report.strip_width,
        surface.width(),
        surface.height()
    );
    write_raster(&args.out, &surface, config.job.ppi_x, config.job.ppi_y)
}

// ── calibrate ─────────────────────────────────────────────────────────

fn run_calibrate(config: &CliConfig, out: &Path) -> CliResult<()> {
    let mut surface = Raster::default();
    let chart = render_calibration_chart(&mut surface, &config.job, &config.calibration)?;
    for band in &chart.bands {
        println!(
            "  strip {:>2}: {:>8.3} LPI  rows {}..{}",
            band.index, band.lpi, band.y_start, band.y_end
        );
    }
    write_raster(out, &surface, config.job.ppi_x, config.job.ppi_y)
}

// ── simulate ──────────────────────────────────────────────────────────

fn run_simulate(config: &CliConfig, args: &SimulateArgs) -> CliResult<()> {
    config.physics.validate()?;
    let rasters = load_frames(&args.frames)?;
    let refs: Vec<&Raster> = rasters.iter().collect();

    let mut surface = Raster::default();
    let status = render_simulation(
        &mut surface,
        args.width,
        args.height,
        &refs,
        &config.job,
        &config.physics,
        args.sim_x,
        &config.simulation,
    )?;
    match status {
        SimulationStatus::Rendered {
            fov_degrees,
            center_position,
            postfx_applied,
        } => println!(
            "fov: {fov_degrees:.2}°  centre frame position: {center_position:.3}  post effects: {postfx_applied}"
        ),
        SimulationStatus::InvalidOptics => {
            tracing::warn!("lens configuration is invalid for simulation")
        }
        SimulationStatus::NoFrames => tracing::warn!("no frames to simulate"),
    }
    let bytes = encode_png(&surface)?;
    std::fs::write(&args.out, bytes)?;
    Ok(())
}

// ── fov ───────────────────────────────────────────────────────────────

fn run_fov(config: &CliConfig) -> CliResult<()> {
    let job = &config.job;
    let physics = &config.physics;
    match analyze_lens(
        job.lpi,
        physics.radius_microns,
        physics.thickness_microns,
        physics.refractive_index,
    ) {
        Ok(lens) => {
            println!("pitch:               {:.2} µm", lens.pitch_microns);
            println!("sagitta:             {:.2} µm", lens.sagitta_microns);
            println!("effective thickness: {:.2} µm", lens.effective_thickness_microns);
            println!("field of view:       {:.2}°", lens.fov_degrees);
        }
        Err(reason) => println!("field of view:       0 (invalid geometry: {reason:?})"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("3,-2"), Ok((3, -2)));
        assert_eq!(parse_offset(" 4 , 5 "), Ok((4, 5)));
        assert!(parse_offset("3").is_err());
        assert!(parse_offset("a,1").is_err());
    }
}
