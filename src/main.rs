use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dotviz::data::GraphDocument;
use dotviz::{GraphViz, OutputFormat};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "dotviz")]
#[command(about = "Render graphs through Graphviz dot", long_about = None)]
struct Args {
    /// Graph document (JSON) or edge list (CSV); stdin if omitted
    input: Option<PathBuf>,

    /// Input format (defaults to the file extension, else json)
    #[arg(long, value_enum)]
    input_format: Option<InputFormat>,

    /// Treat a CSV edge list as directed
    #[arg(long)]
    directed: bool,

    /// Output image format
    #[arg(short = 'T', long)]
    format: Option<OutputFormat>,

    /// Renderer executable
    #[arg(long)]
    program: Option<String>,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the generated dot script without rendering
    #[arg(long, conflicts_with_all = ["data_uri", "html", "display"])]
    script: bool,

    /// Print a base64 data URI of the image
    #[arg(long, conflicts_with_all = ["html", "display"])]
    data_uri: bool,

    /// Print an HTML element embedding the image
    #[arg(long, conflicts_with = "display")]
    html: bool,

    /// Open the rendered image in the desktop viewer
    #[arg(long)]
    display: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let doc = load_document(&args).context("Failed to load graph")?;
    tracing::debug!(
        vertices = doc.graph.vertex_count(),
        edges = doc.graph.edge_count(),
        "loaded graph"
    );

    let mut viz = GraphViz::with_layout(&doc.graph, doc.layout);
    let mut options = doc.options.unwrap_or_default();
    if let Some(format) = &args.format {
        options.format = format.clone();
    }
    if let Some(program) = &args.program {
        options.program = program.clone();
    }
    viz.set_options(options);

    if args.display {
        return viz.display().context("Failed to display graph");
    }

    let bytes = if args.script {
        viz.create_script().into_bytes()
    } else if args.data_uri {
        viz.create_image_src().context("Failed to render graph")?.into_bytes()
    } else if args.html {
        viz.create_image_html().context("Failed to render graph")?.into_bytes()
    } else {
        viz.create_image_data().context("Failed to render graph")?
    };

    match &args.output {
        Some(path) => fs::write(path, &bytes)
            .with_context(|| format!("Failed to write output to '{}'", path.display()))?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(&bytes)
                .context("Failed to write output to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}

fn load_document(args: &Args) -> Result<GraphDocument> {
    let format = args.input_format.unwrap_or_else(|| {
        match args.input.as_ref().and_then(|p| p.extension()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => InputFormat::Csv,
            _ => InputFormat::Json,
        }
    });

    let reader: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open '{}'", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    match format {
        InputFormat::Json => GraphDocument::from_json_reader(reader),
        InputFormat::Csv => GraphDocument::from_csv_reader(reader, args.directed),
    }
}
