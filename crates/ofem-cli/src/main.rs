use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ofem_compat::{PostprocessRequest, RawPostprocess, SolveOptions, log_warnings};
use ofem_io::{
    BridgeError, DeckError, DeckOptions, DeckWriter, EntityGrouping, InMemoryKernel, MeshExport,
    MeshReadError, import_discrete, read_s3dx,
};
use ofem_model::{ConfigError, ModelDefaults, ModelError, StructuralModel, load_defaults};
use ofem_s2k::{S2kError, S2kReader};
use thiserror::Error;
use tracing::info;

#[derive(Parser)]
#[command(name = "ofem")]
#[command(about = "Convert S2K exports and femix meshes to solver decks and Gmsh files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables of an S2K file
    Tables {
        /// Path to the .s2k file
        input: PathBuf,
    },
    /// Print entity counts of the model built from an S2K file
    Summary {
        input: PathBuf,
        /// JSON file with default sections and materials
        #[arg(long)]
        defaults: Option<PathBuf>,
    },
    /// Write a .gldat solver deck from an S2K or .s3dx file
    ToDeck {
        input: PathBuf,
        /// Output deck, defaults to the input with a .gldat extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        defaults: Option<PathBuf>,
        /// JSON file with deck options (title, dimensions, load case)
        #[arg(long)]
        options: Option<PathBuf>,
    },
    /// Write a Gmsh .msh file from an S2K file
    ToMsh {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        defaults: Option<PathBuf>,
        /// Entity grouping: types, sections or elements
        #[arg(long, default_value = "types")]
        grouping: EntityGrouping,
        /// Add one physical group per section
        #[arg(long)]
        section_physicals: bool,
    },
    /// Write a Gmsh .msh file from a femix .s3dx mesh
    S3dxToMsh {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the built-in defaults as JSON
    Defaults {
        /// Print deck options instead of model defaults
        #[arg(long)]
        deck: bool,
    },
    /// Normalize solve and post-process options and print them as JSON
    CheckOptions {
        #[arg(long, default_value = "d")]
        soalg: String,
        #[arg(long, default_value_t = 1.0e-6, allow_negative_numbers = true)]
        randsn: f64,
        /// Post-process option file (JSON), missing keys use defaults
        #[arg(long)]
        postprocess: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    S2k(#[from] S2kError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Mesh(#[from] MeshReadError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Tables { input } => cmd_tables(&input),
        Commands::Summary { input, defaults } => cmd_summary(&input, defaults.as_deref()),
        Commands::ToDeck {
            input,
            output,
            defaults,
            options,
        } => cmd_to_deck(&input, output, defaults.as_deref(), options.as_deref()),
        Commands::ToMsh {
            input,
            output,
            defaults,
            grouping,
            section_physicals,
        } => cmd_to_msh(&input, output, defaults.as_deref(), grouping, section_physicals),
        Commands::S3dxToMsh { input, output } => cmd_s3dx_to_msh(&input, output),
        Commands::Defaults { deck } => cmd_defaults(deck),
        Commands::CheckOptions {
            soalg,
            randsn,
            postprocess,
        } => cmd_check_options(&soalg, randsn, postprocess.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn defaults_from(path: Option<&Path>) -> Result<ModelDefaults, CliError> {
    Ok(match path {
        Some(path) => load_defaults(path)?,
        None => ModelDefaults::default(),
    })
}

fn is_s3dx(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("s3dx"))
}

fn load_model(input: &Path, defaults: &ModelDefaults) -> Result<StructuralModel, CliError> {
    if is_s3dx(input) {
        let mesh = read_s3dx(input)?;
        return Ok(StructuralModel::from_mesh(&mesh, defaults)?);
    }
    let tables = S2kReader::read_file(input)?;
    Ok(StructuralModel::from_tables(tables, defaults)?)
}

fn cmd_tables(input: &Path) -> Result<(), CliError> {
    let tables = S2kReader::read_file(input)?;
    for table in tables.iter() {
        println!("{:6}  {}", table.len(), table.name());
    }
    Ok(())
}

fn cmd_summary(input: &Path, defaults: Option<&Path>) -> Result<(), CliError> {
    let model = load_model(input, &defaults_from(defaults)?)?;
    println!("title: {}", model.title());
    println!("joints: {}", model.joint_count());
    println!("frames: {}", model.frame_count());
    println!("areas: {}", model.area_count());
    println!("elements: {}", model.element_count());
    println!("sections: {}", model.sections().len());
    println!("materials: {}", model.materials().len());
    println!("restrained_joints: {}", model.boundaries().len());
    if !model.groups().is_empty() {
        let names: Vec<&str> = model.groups().iter().map(|g| g.name.as_str()).collect();
        println!("groups: {}", names.join(", "));
    }
    Ok(())
}

fn cmd_to_deck(
    input: &Path,
    output: Option<PathBuf>,
    defaults: Option<&Path>,
    options: Option<&Path>,
) -> Result<(), CliError> {
    let model = load_model(input, &defaults_from(defaults)?)?;
    let options = match options {
        Some(path) => DeckOptions::load(path)?,
        None => DeckOptions::default(),
    };
    let output = output.unwrap_or_else(|| input.with_extension("gldat"));
    DeckWriter::new(&model, options).write(&output)?;
    println!("{}", output.display());
    Ok(())
}

fn cmd_to_msh(
    input: &Path,
    output: Option<PathBuf>,
    defaults: Option<&Path>,
    grouping: EntityGrouping,
    section_physicals: bool,
) -> Result<(), CliError> {
    let model = load_model(input, &defaults_from(defaults)?)?;
    let mut kernel = InMemoryKernel::new();
    MeshExport::new(&model)
        .grouping(grouping)
        .section_physicals(section_physicals)
        .export(&mut kernel)?;
    let output = output.unwrap_or_else(|| input.with_extension("msh"));
    kernel.write_msh(&output)?;
    info!(
        grouping = %grouping,
        nodes = kernel.node_count(),
        elements = kernel.element_count(),
        "mesh exported"
    );
    println!("{}", output.display());
    Ok(())
}

fn cmd_s3dx_to_msh(input: &Path, output: Option<PathBuf>) -> Result<(), CliError> {
    let mesh = read_s3dx(input)?;
    let mut kernel = InMemoryKernel::new();
    import_discrete(&mesh, &mut kernel)?;
    let output = output.unwrap_or_else(|| input.with_extension("msh"));
    kernel.write_msh(&output)?;
    println!("{}", output.display());
    Ok(())
}

fn cmd_defaults(deck: bool) -> Result<(), CliError> {
    let json = if deck {
        serde_json::to_string_pretty(&DeckOptions::default())?
    } else {
        serde_json::to_string_pretty(&ModelDefaults::default())?
    };
    println!("{json}");
    Ok(())
}

fn cmd_check_options(soalg: &str, randsn: f64, postprocess: Option<&Path>) -> Result<(), CliError> {
    let (solve, mut warnings) = SolveOptions::from_raw(soalg, randsn);
    let raw = match postprocess {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str::<RawPostprocess>(&text)?
        }
        None => RawPostprocess::default(),
    };
    let (request, post_warnings) = PostprocessRequest::from_raw(&raw);
    warnings.extend(post_warnings);
    log_warnings(&warnings);

    let report = serde_json::json!({
        "solve": solve,
        "postprocess": request,
        "warnings": warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_msh_grouping() {
        let cli = Cli::try_parse_from([
            "ofem",
            "to-msh",
            "slab.s2k",
            "--grouping",
            "Sections",
            "--section-physicals",
        ])
        .expect("parse");
        match cli.command {
            Commands::ToMsh {
                grouping,
                section_physicals,
                ..
            } => {
                assert_eq!(grouping, EntityGrouping::Sections);
                assert!(section_physicals);
            }
            _ => panic!("expected to-msh"),
        }
        assert!(Cli::try_parse_from(["ofem", "to-msh", "slab.s2k", "--grouping", "layers"]).is_err());
    }

    #[test]
    fn negative_convergence_is_accepted() {
        let cli = Cli::try_parse_from(["ofem", "check-options", "--soalg", "i", "--randsn", "-1"])
            .expect("parse");
        assert!(matches!(cli.command, Commands::CheckOptions { randsn, .. } if randsn == -1.0));
    }

    #[test]
    fn input_kind_follows_extension() {
        assert!(is_s3dx(Path::new("plate_me.S3DX")));
        assert!(!is_s3dx(Path::new("plate.s2k")));
    }

    #[test]
    fn deck_from_s3dx_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("strip.s3dx");
        std::fs::write(&input, "s3dx\nstrip\n1 4 0\n1 9 4 1 2 3 4\n1 0 0 0\n2 1 0 0\n3 1 1 0\n4 0 1 0\n")
            .expect("write");
        cmd_to_deck(&input, None, None, None).expect("deck");
        let deck = std::fs::read_to_string(dir.path().join("strip.gldat")).expect("read");
        assert!(deck.contains("    1 # nelem"));
    }
}
