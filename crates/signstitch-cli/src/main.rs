use std::path::Path;

use signstitch_cli::errors::Result;
use signstitch_cli::types::RenderConfig;
use signstitch_cli::SentenceRenderer;

const DEFAULT_CONFIG_FILE: &str = "signstitch.yaml";

const USAGE: &str = "\
Usage: signstitch <command> [options]

Commands:
  render <word>... [-o NAME]   Render a sentence from word clips
  meta <file>                  Print the recovered byte layout of a clip
  resolve <word>               Print how a word resolves to clip files

Options:
  -c, --config PATH            Config file (default: ./signstitch.yaml)
  -o, --output NAME            Output video name (default: generated)
";

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprint!("{USAGE}");
        std::process::exit(2);
    }

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let mut config_path: Option<String> = None;
    let mut output_name: Option<String> = None;
    let mut positional: Vec<String> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" | "--config" => config_path = iter.next().cloned(),
            "-o" | "--output" => output_name = iter.next().cloned(),
            "-h" | "--help" => {
                print!("{USAGE}");
                return Ok(());
            }
            _ => positional.push(arg.clone()),
        }
    }

    let config = load_config(config_path.as_deref())?;

    match positional.split_first() {
        Some((command, rest)) if command == "render" && !rest.is_empty() => {
            let renderer = SentenceRenderer::new(config)?;
            let report = renderer.render_sentence(rest, output_name.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Some((command, [file])) if command == "meta" => {
            let renderer = SentenceRenderer::new(config)?;
            let layout = renderer.clip_layout(file)?;
            println!("{}", serde_json::to_string_pretty(&layout)?);
            Ok(())
        }
        Some((command, [word])) if command == "resolve" => {
            let renderer = SentenceRenderer::new(config)?;
            let report = renderer.resolve_report(word)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        _ => {
            eprint!("{USAGE}");
            std::process::exit(2);
        }
    }
}

fn load_config(path: Option<&str>) -> Result<RenderConfig> {
    match path {
        Some(path) => RenderConfig::load(path),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            RenderConfig::load(DEFAULT_CONFIG_FILE)
        }
        None => Ok(RenderConfig::default()),
    }
}
