use std::env;
use std::error;
use std::process::ExitCode;

use bibinstitute::Bibliography;

use clap::Parser as CLIParser;
use tracing_subscriber::EnvFilter;

#[derive(clap::Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Settings {
    /// Filepath to the .bib file to parse
    bib_file: String,

    /// Institute to look for in author names and affiliations
    institute_name: String,

    /// Save the sorted bibliography to this file
    #[clap(short, long)]
    output: Option<String>,

    /// Print every entry before the report
    #[clap(short, long)]
    details: bool,

    /// Log debug messages unless RUST_LOG says otherwise
    #[clap(short, long)]
    verbose: bool,

    /// Print the bibliography as JSON instead of the report (needs the `json` feature)
    #[clap(long)]
    json: bool,
}

fn print_usage(program: &str) {
    println!("Usage: {} <bib_file> <institute_name>", program);
    println!("Example: {} papers.bib \"MIT\"", program);
    println!("Example: {} papers.bib \"University of California\"", program);
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(s: &Settings, bib: &Bibliography) {
    if s.details {
        println!("=== Bibliography ({} publications) ===\n", bib.len());
        for (i, entry) in bib.entries().iter().enumerate() {
            println!("{}. {}", i + 1, entry);
        }
    }

    let report = bib.institute_report(&s.institute_name);
    print!("{}", report);

    println!("\n=== Summary ===");
    println!("Total BibTeX entries processed: {}", bib.len());
    println!("Total authors from {}: {}", s.institute_name, report.total);
}

#[cfg(feature = "json")]
fn print_json(bib: &Bibliography) -> Result<(), Box<dyn error::Error>> {
    println!("{}", serde_json::to_string_pretty(bib)?);
    Ok(())
}

#[cfg(not(feature = "json"))]
fn print_json(_bib: &Bibliography) -> Result<(), Box<dyn error::Error>> {
    Err("JSON output is not available, rebuild with `--features json`".into())
}

fn run(s: &Settings) -> Result<(), Box<dyn error::Error>> {
    println!("Parsing BibTeX file: {}", s.bib_file);
    let bib = Bibliography::load(&s.bib_file)?;
    println!("Loaded {} publications", bib.len());

    if s.json {
        return print_json(&bib);
    }

    print_report(s, &bib);

    if let Some(output) = &s.output {
        bib.save(output)?;
        println!("Saved {} publications to {}", bib.len(), output);
    }

    Ok(())
}

fn main() -> ExitCode {
    let settings = match Settings::try_parse() {
        Ok(settings) => settings,
        Err(err) => {
            let program = env::args().next().unwrap_or_else(|| "bibinstitute".to_string());
            print_usage(&program);
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    init_logging(settings.verbose);

    match run(&settings) {
        Ok(()) => {
            println!("\nProgram completed successfully.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            println!("\nProgram failed with errors.");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_positionals() -> Result<(), clap::Error> {
        let s = Settings::try_parse_from(["bibinstitute", "papers.bib", "University of California"])?;
        assert_eq!(s.bib_file, "papers.bib");
        assert_eq!(s.institute_name, "University of California");
        assert_eq!(s.output, None);
        assert!(!s.details);
        Ok(())
    }

    #[test]
    fn test_options() -> Result<(), clap::Error> {
        let s = Settings::try_parse_from(["bibinstitute", "-d", "in.bib", "MIT", "--output", "out.bib"])?;
        assert!(s.details);
        assert_eq!(s.output.as_deref(), Some("out.bib"));
        Ok(())
    }

    #[test]
    fn test_wrong_argument_count() {
        assert!(Settings::try_parse_from(["bibinstitute"]).is_err());
        assert!(Settings::try_parse_from(["bibinstitute", "papers.bib"]).is_err());
        assert!(Settings::try_parse_from(["bibinstitute", "a.bib", "MIT", "extra"]).is_err());
    }
}
