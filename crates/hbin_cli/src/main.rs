#![allow(missing_docs)]

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use hbin::format::FileKind;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "hbin2json", about = "Convert classic .bgeo/.bclip files to JSON")]
struct Cli {
	/// Input `.bgeo`, `.bhclassic`, or `.bclip` file.
	path: PathBuf,
	/// Write JSON to this file instead of stdout.
	#[arg(short, long)]
	out: Option<PathBuf>,
	/// Omit clip track names.
	#[arg(long)]
	no_names: bool,
	/// Emit clip samples as bytes clamped to 0..=255.
	#[arg(long)]
	quantize: bool,
	/// Override extension-based format detection.
	#[arg(long, value_enum)]
	kind: Option<KindArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
	Geo,
	Clip,
}

impl From<KindArg> for FileKind {
	fn from(kind: KindArg) -> Self {
		match kind {
			KindArg::Geo => FileKind::Geo,
			KindArg::Clip => FileKind::Clip,
		}
	}
}

fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.with_writer(std::io::stderr)
		.init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> hbin::format::Result<()> {
	let cli = Cli::parse();

	cmd::run(cmd::Args {
		path: cli.path,
		out: cli.out,
		kind: cli.kind.map(FileKind::from),
		clip: cmd::clip::ClipJsonOptions {
			names: !cli.no_names,
			quantize: cli.quantize,
		},
	})
}
