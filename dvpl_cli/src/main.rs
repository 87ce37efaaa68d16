use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use dvpl_codecs::{compressor_by_name, COMPRESSOR_NAMES};
use dvpl_core::{read_container_file, DecodeOptions, DvplCodec, Signature, SIGNATURE_SIZE};

mod logging;

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "dvpl",
    about = "Encode, decode, and inspect DVPL containers",
    version
)]
struct Cli {
    /// Default log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "error")]
    log_level: LevelFilter,
    /// Also write logs to rotated files in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wrap a raw file into a DVPL container
    Encode {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        /// Destination container ("-" writes to stdout)
        output: PathBuf,
        /// Block compressor: hc | fast
        #[arg(short, long, default_value = "hc")]
        compressor: String,
    },
    /// Unwrap a DVPL container back to raw bytes
    Decode {
        /// Source container ("-" reads stdin)
        input: PathBuf,
        /// Destination file ("-" writes to stdout)
        output: PathBuf,
        /// Reject containers whose stored payload fails the CRC-32 check
        #[arg(long)]
        verify_checksum: bool,
    },
    /// Print the signature of a DVPL container
    Inspect {
        /// Container to inspect
        file: PathBuf,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn is_stdio(path: &Path) -> bool {
    path.to_str() == Some("-")
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if is_stdio(path) {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        read_container_file(path).with_context(|| format!("reading input file {:?}", path))
    }
}

fn write_output(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    if is_stdio(path) {
        let mut out = io::stdout().lock();
        out.write_all(data)?;
        out.flush()?;
    } else {
        let mut file =
            File::create(path).with_context(|| format!("creating output file {:?}", path))?;
        file.write_all(data)?;
    }
    Ok(())
}

fn codec_from_name(name: &str) -> anyhow::Result<DvplCodec> {
    let compressor = compressor_by_name(name).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown compressor '{}'. Valid options: {}",
            name,
            COMPRESSOR_NAMES.join(", ")
        )
    })?;
    Ok(DvplCodec::new(compressor))
}

/// Byte count rendered with a binary unit, e.g. `1.50 KiB`.
struct ByteSize(usize);

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const KIB: f64 = 1024.0;
        let n = self.0 as f64;
        match self.0 {
            0..=1023 => write!(f, "{} B", self.0),
            1024..=1_048_575 => write!(f, "{:.2} KiB", n / KIB),
            1_048_576..=1_073_741_823 => write!(f, "{:.2} MiB", n / (KIB * KIB)),
            _ => write!(f, "{:.2} GiB", n / (KIB * KIB * KIB)),
        }
    }
}

fn ratio(raw: usize, stored: usize) -> f64 {
    if stored == 0 {
        return 1.0;
    }
    raw as f64 / stored as f64
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_encode(input: PathBuf, output: PathBuf, compressor: &str) -> anyhow::Result<()> {
    let codec = codec_from_name(compressor)?;
    let raw = read_input(&input)?;

    let t0 = Instant::now();
    let container = codec.encode(&raw)?;
    let elapsed = t0.elapsed();

    write_output(&output, &container)?;
    tracing::info!(
        input = ?input,
        output = ?output,
        raw = raw.len(),
        container = container.len(),
        "encoded"
    );

    let stored = container.len() - SIGNATURE_SIZE;
    eprintln!("  compressor  : {}", codec.compressor_name());
    eprintln!("  raw size    : {}", ByteSize(raw.len()));
    eprintln!("  stored      : {}", ByteSize(stored));
    eprintln!("  container   : {}", ByteSize(container.len()));
    eprintln!("  ratio       : {:.2}x", ratio(raw.len(), stored));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_decode(input: PathBuf, output: PathBuf, verify_checksum: bool) -> anyhow::Result<()> {
    // Any LZ4 decoder reads any DVPL block; the compressor choice only
    // matters for encoding.
    let codec = dvpl_codecs::default_codec().with_options(DecodeOptions { verify_checksum });
    let container = read_input(&input)?;

    let t0 = Instant::now();
    let raw = codec
        .decode(&container)
        .with_context(|| format!("decoding {:?}", input))?;
    let elapsed = t0.elapsed();

    write_output(&output, &raw)?;
    tracing::info!(
        input = ?input,
        output = ?output,
        container = container.len(),
        raw = raw.len(),
        "decoded"
    );

    eprintln!("  container   : {}", ByteSize(container.len()));
    eprintln!("  raw size    : {}", ByteSize(raw.len()));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_inspect(file: PathBuf) -> anyhow::Result<()> {
    let data = read_input(&file)?;
    let (sign, stored) =
        Signature::parse(&data).with_context(|| format!("parsing signature of {:?}", file))?;

    println!("=== DVPL container: {:?} ===", file);
    println!();
    println!("  container size : {}", ByteSize(data.len()));
    println!("  origin size    : {}", ByteSize(sign.origin_size as usize));
    println!("  stored size    : {}", ByteSize(sign.compress_size as usize));
    println!("  actual stored  : {}", ByteSize(stored.len()));
    println!(
        "  size check     : {}",
        if sign.compress_size as usize == stored.len() {
            "ok"
        } else {
            "MISMATCH"
        }
    );
    println!("  compressed     : {}", sign.is_compressed());
    println!("  level          : {}", sign.compress_level);
    println!("  crc32          : {:08x}", sign.checksum);
    println!(
        "  crc32 check    : {}",
        if sign.verify_checksum(stored).is_ok() {
            "ok"
        } else {
            "MISMATCH"
        }
    );
    println!(
        "  ratio          : {:.2}x",
        ratio(sign.origin_size as usize, sign.compress_size as usize)
    );
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guards = logging::init(cli.log_level, cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Encode {
            input,
            output,
            compressor,
        } => run_encode(input, output, &compressor),
        Commands::Decode {
            input,
            output,
            verify_checksum,
        } => run_decode(input, output, verify_checksum),
        Commands::Inspect { file } => run_inspect(file),
    }
}
