mod error;
mod parser;
mod processor;
mod serialiser;
mod srt;
mod timecode;

use crate::parser::Parser;
use crate::timecode::FrameRate;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use glob::glob;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

#[derive(ClapParser)]
#[command(about = "Write frame-timed captions as SRT subtitles")]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        num_args = 1..,
        help = "The caption lists to read from. Patterns containing '*' or '?' are expanded. If not supplied, a single list is read from standard input.",
        default_value = "-"
    )]
    input: Vec<String>,
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "The file to write to when converting a single input. Use '-' for standard output. If not supplied, each input file name with an .srt extension is used, or standard output when reading from standard input."
    )]
    output: Option<String>,
    #[arg(
        short = 'r',
        long,
        value_name = "RATE",
        help = "Frame rate of the caption positions, e.g. 24, 25, 29.97 or 24000/1001.",
        default_value = "24"
    )]
    fps: FrameRate,
    #[arg(
        short,
        long,
        value_name = "DURATION",
        help = "Treat the input as plain text, one caption per paragraph, spread evenly over DURATION (frames or HH:MM:SS:FF)."
    )]
    spread: Option<String>,
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Drop every caption with a line matching one of the regular expressions in FILE (one per line, '#' starts a comment)."
    )]
    drop_patterns: Option<PathBuf>,
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let inputs = expand_inputs(&cli.input)?;

    if let [input] = inputs.as_slice() {
        return convert(&cli, input, cli.output.as_deref());
    }
    if cli.output.is_some() || inputs.iter().any(|input| input == "-") {
        return Err(anyhow!(
            "--output and standard input can only be used with a single input."
        ));
    }

    let succeeded = convert_all(&cli, &inputs);
    println!(
        "Processed {} file(s), {} successful",
        inputs.len(),
        succeeded
    );
    if succeeded < inputs.len() {
        return Err(anyhow!("{} file(s) failed.", inputs.len() - succeeded));
    }
    Ok(())
}

/// Expands wildcard arguments into the files they match, keeping plain paths as given.
fn expand_inputs(args: &[String]) -> Result<Vec<String>> {
    let mut inputs = Vec::new();
    for arg in args {
        if !arg.contains('*') && !arg.contains('?') {
            inputs.push(arg.clone());
            continue;
        }
        let before = inputs.len();
        for entry in glob(arg).context(format!("Invalid file pattern: '{}'", arg))? {
            match entry {
                Ok(path) if path.is_file() => inputs.push(path.to_string_lossy().into_owned()),
                Ok(_) => (),
                Err(err) => log::warn!("Error matching pattern: {}", err),
            }
        }
        if inputs.len() == before {
            return Err(anyhow!("No files found matching pattern: '{}'", arg));
        }
    }
    Ok(inputs)
}

/// Converts every input to its derived `.srt` file, carrying on past failures.
///
/// Returns how many inputs were converted.
fn convert_all(cli: &Cli, inputs: &[String]) -> usize {
    inputs
        .iter()
        .filter(|input| match convert(cli, input, None) {
            Ok(()) => true,
            Err(err) => {
                log::error!("{}: {:#}", input, err);
                false
            }
        })
        .count()
}

fn convert(cli: &Cli, input: &str, output: Option<&str>) -> Result<()> {
    let data = if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(input)
            .context(format!("Failed to open input file: '{}'", input))?
    };

    let parser = Parser::new(cli.fps);

    let captions = match &cli.spread {
        Some(duration) => {
            let total_frames = parser
                .parse_duration(duration)
                .context(format!("Invalid spread duration: '{}'", duration))?;
            let paragraphs = parser
                .parse_paragraphs(&data)
                .context(format!("Failed to read captions from: '{}'", input))?;
            processor::spread_evenly(&paragraphs, total_frames)?
        }
        None => parser
            .parse(&data)
            .context(format!("Failed to parse caption list: '{}'", input))?,
    };
    if captions.is_empty() {
        return Err(anyhow!("You appear to have supplied an empty file."));
    }
    log::info!("Read {} captions from {} at {} fps", captions.len(), input, cli.fps);

    let opts = processor::ProcessOpts {
        drop_patterns: cli.drop_patterns.clone(),
    };
    let captions = processor::process(captions, opts)?;

    match output_path(input, output)? {
        Some(path) => {
            let written = serialiser::serialise(&captions, &path, cli.fps)
                .context(format!("Failed to write SRT file: '{}'", path.display()))?;
            log::info!("Wrote {} subtitles to {}", written, path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut dst = stdout.lock();
            serialiser::write_captions(&mut dst, &captions, cli.fps)
                .context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Resolves where the subtitles go; `None` means standard output.
fn output_path(input: &str, output: Option<&str>) -> Result<Option<PathBuf>> {
    match output {
        Some("-") => Ok(None),
        Some(path) => Ok(Some(PathBuf::from(path))),
        None if input == "-" => Ok(None),
        None => {
            let derived = Path::new(input).with_extension("srt");
            if derived == Path::new(input) {
                Err(anyhow!(
                    "Refusing to overwrite the input file '{}'; supply --output.",
                    input
                ))
            } else {
                Ok(Some(derived))
            }
        }
    }
}
