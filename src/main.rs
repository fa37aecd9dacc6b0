//! Membrane Mesh CLI Application

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use membrane_mesh::config::{AnalysisConfig, DensityRequest};
use membrane_mesh::io::{self, AnalysisSummary};
use membrane_mesh::{DensityKernel, MeshView, TriMesh, TriMeshPeriodic};
use std::path::{Path, PathBuf};

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Info { input } => cmd_info(input),
        Commands::Analyze {
            input,
            output,
            config,
            sigma,
            summary,
        } => cmd_analyze(input, output, config, sigma, summary),
        Commands::Periodic {
            input,
            bbox,
            output,
            summary,
        } => cmd_periodic(input, bbox, output, summary),
    }
}

fn read_input(input: &Path) -> Result<TriMesh> {
    io::read_mesh(input).with_context(|| format!("Failed to read mesh {}", input.display()))
}

fn cmd_info(input: PathBuf) -> Result<()> {
    println!("Reading mesh file: {}", input.display());
    let mut mesh = read_input(&input)?;

    let boundary = mesh.boundary_edges()?.len();
    let non_manifold = mesh.non_manifold_edges()?.len();
    let closed = mesh.is_closed()?;

    println!("\n{}", "=".repeat(60));
    println!("MESH INFORMATION");
    println!("{}", "=".repeat(60));
    println!();
    println!("  Name:                {}", mesh.name());
    println!("  Dimensionality:      {:?}", mesh.dimensionality());
    println!("  Vertices:            {}", mesh.nvertices());
    println!("  Faces:               {}", mesh.nfaces());
    println!("  Boundary edges:      {}", boundary);
    println!("  Non-manifold edges:  {}", non_manifold);
    println!("  Closed:              {}", closed);
    println!("  Total area:          {:.6}", mesh.total_area());
    println!();

    if !mesh.fields().is_empty() {
        println!("Fields:");
        let mut names: Vec<_> = mesh.fields().keys().collect();
        names.sort();
        for name in names {
            println!("  - {}", name);
        }
        println!();
    }

    println!("{}", "=".repeat(60));

    Ok(())
}

fn density_progress(len: usize) -> Result<ProgressBar> {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    Ok(bar)
}

/// Apply one density request to a plain or periodic mesh
fn apply_density(
    mesh: &mut TriMesh,
    periodic: Option<&mut TriMeshPeriodic>,
    request: &DensityRequest,
) -> Result<()> {
    let name = request.name.as_str();
    let kernel = &request.kernel;

    match (periodic, &request.sources) {
        (Some(p), Some(sources)) => p.kde_from_sources(kernel, name, sources)?,
        (Some(p), None) => p.kde(kernel, name, request.ids.as_deref())?,
        (None, Some(sources)) => mesh.kde_from_sources(kernel, name, sources)?,
        (None, None) => mesh.kde(kernel, name, request.ids.as_deref())?,
    };
    Ok(())
}

fn cmd_analyze(
    input: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    sigma: Option<f64>,
    summary: Option<PathBuf>,
) -> Result<()> {
    let mut config = match config {
        Some(path) => AnalysisConfig::from_file(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::new(input.display().to_string(), output.display().to_string()),
    };

    // Command-line paths take precedence over the config file
    config.input_file = input.display().to_string();
    config.output_file = output.display().to_string();
    if let Some(path) = summary {
        config.summary_file = Some(path.display().to_string());
    }
    if let Some(sigma) = sigma {
        config
            .densities
            .push(DensityRequest::new("density", DensityKernel::gaussian(sigma)));
    }
    config.validate()?;

    let mut mesh = read_input(&input)?;
    mesh.set_manifold_policy(config.manifold_policy);

    let mut periodic = match &config.periodic {
        Some(settings) => {
            let mut p = TriMeshPeriodic::new(mesh.clone());
            p.set_bbox(settings.bbox)?;
            p.wrap_vertices(settings.wrap_axes)?;
            Some(p)
        }
        None => None,
    };

    let progress = density_progress(config.densities.len())?;
    for request in &config.densities {
        progress.set_message(request.name.clone());
        apply_density(&mut mesh, periodic.as_mut(), request)
            .with_context(|| format!("Density '{}' failed", request.name))?;
        progress.inc(1);
    }
    progress.finish_with_message("densities done");

    // Periodic meshes are exported as their trimmed patch
    let mut out_mesh = match (&mut periodic, &config.periodic) {
        (Some(p), Some(settings)) if settings.duplicate => {
            p.create_duplicate_vertices()?;
            p.trimmed_patch()?
        }
        (Some(p), _) => p.mesh().clone(),
        (None, _) => mesh,
    };

    if config.point_areas {
        out_mesh.point_areas();
    }

    let output_path = Path::new(&config.output_file);
    if config.normals {
        io::write_mesh_with_normals(&mut out_mesh, output_path, None)?;
    } else {
        io::write_vtp(&out_mesh, None, None, output_path, None)?;
    }
    println!("Wrote {}", output_path.display());

    if let Some(path) = &config.summary_file {
        let mut report = AnalysisSummary::new(config.input_file.clone(), &mut out_mesh)?;
        if let Some(p) = periodic.as_ref().filter(|p| p.duplication().is_ok()) {
            report = report.with_periodic(p)?;
        }
        report.export(path)?;
        println!("Wrote {}", path);
    }

    Ok(())
}

fn cmd_periodic(
    input: PathBuf,
    bbox: Vec<f64>,
    output: PathBuf,
    summary: Option<PathBuf>,
) -> Result<()> {
    let mesh = read_input(&input)?;

    let mut periodic = TriMeshPeriodic::new(mesh);
    periodic
        .set_bbox_flat(&bbox, 2)
        .context("Invalid --bbox, expected x0,y0,x1,y1")?;
    periodic.wrap_vertices(2)?;
    periodic.create_duplicate_vertices()?;

    let duplication = periodic.duplication()?;
    println!("  Interior faces:   {}", duplication.interior_faces.len());
    println!("  Periodic faces:   {}", duplication.periodic_faces.len());
    println!("  Ghost vertices:   {}", duplication.num_duplicates());

    io::write_periodic_vtp(&periodic, &output, None)?;
    println!("Wrote {}", output.display());

    if let Some(path) = summary {
        let mut patch = periodic.trimmed_patch()?;
        AnalysisSummary::new(input.display().to_string(), &mut patch)?
            .with_periodic(&periodic)?
            .export(&path)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}
