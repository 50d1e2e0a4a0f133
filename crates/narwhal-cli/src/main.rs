use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;

use futures::executor::block_on;
use narwhal::{DrawOp, ExtensionRegistry, Graph, GraphOptions, RecordingTarget, Transform};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Narwhal(narwhal::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Narwhal(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<narwhal::Error> for CliError {
    fn from(value: narwhal::Error) -> Self {
        Self::Narwhal(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    Render,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    fit: bool,
    width: Option<f64>,
    height: Option<f64>,
    rotate: Option<f64>,
}

#[derive(Serialize)]
struct LayoutOut<'a> {
    layout: &'a str,
    positions: Map<String, Value>,
}

#[derive(Serialize)]
struct RenderOut {
    transform: Transform,
    ops: Vec<DrawOp>,
}

fn usage() -> &'static str {
    "narwhal-cli\n\
\n\
USAGE:\n\
  narwhal-cli [layout] [--pretty] [--width <w>] [--height <h>] [<path>|-]\n\
  narwhal-cli render [--pretty] [--fit] [--rotate <degrees>] [--width <w>] [--height <h>] [<path>|-]\n\
\n\
NOTES:\n\
  - Input is a JSON graph options record: {data, layout, viewport, behaviors, plugins, ...}.\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - layout prints node positions once the layout has converged.\n\
  - render prints every draw operation emitted to a headless target, in order.\n\
  - Set RUST_LOG=debug to trace layout steps on stderr.\n\
"
}

fn parse_number(value: Option<&String>) -> Result<f64, CliError> {
    let Some(value) = value else {
        return Err(CliError::Usage(usage()));
    };
    let n = value.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
    if !n.is_finite() {
        return Err(CliError::Usage(usage()));
    }
    Ok(n)
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "--fit" => args.fit = true,
            "--width" => args.width = Some(parse_number(it.next())?),
            "--height" => args.height = Some(parse_number(it.next())?),
            "--rotate" => args.rotate = Some(parse_number(it.next())?),
            "-" => args.input = None,
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn load_options(args: &Args) -> Result<GraphOptions, CliError> {
    let text = read_input(args.input.as_deref())?;
    let mut options: GraphOptions = serde_json::from_str(&text)?;
    if let Some(w) = args.width {
        options.viewport.width = w;
    }
    if let Some(h) = args.height {
        options.viewport.height = h;
    }
    if args.fit {
        options.auto_fit = true;
    }
    Ok(options)
}

fn run(args: Args) -> Result<(), CliError> {
    let options = load_options(&args)?;
    let layout_name = options.layout.name();
    let mut graph = Graph::new(options, &ExtensionRegistry::with_builtins())?;
    let target = Rc::new(RefCell::new(RecordingTarget::new()));
    graph.attach(target.clone());
    block_on(graph.render())?;
    tracing::info!(
        layout = layout_name,
        nodes = graph.scene().node_count(),
        generation = graph.layout_generation(),
        "layout converged"
    );

    match args.command {
        Command::Layout => {
            let positions = graph
                .scene()
                .nodes()
                .filter_map(|n| {
                    let (x, y) = n.style.position()?;
                    Some((n.id.clone(), serde_json::json!({ "x": x, "y": y })))
                })
                .collect();
            write_json(
                &LayoutOut {
                    layout: layout_name,
                    positions,
                },
                args.pretty,
            )
        }
        Command::Render => {
            if let Some(degrees) = args.rotate {
                graph.rotate_to_degrees(degrees)?;
                graph.tick()?;
            }
            let ops = target.borrow_mut().take_batches().concat();
            write_json(
                &RenderOut {
                    transform: graph.transform(),
                    ops,
                },
                args.pretty,
            )
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
