//! # lib2yaml
//!
//! Liberty to Liberty21 YAML Schema Converter
//!

use clap::Parser;
use log::{debug, info};
use std::error::Error;

use liberty21utils::{EnumStr, KeyCase, SerdeFile, SerializationFormat};
use liberty21::{read_with_diagnostics, ReadOptions, Split};

// => The doc-comment on `ProgramOptions` here is displayed by the `clap`-generated help docs =>

/// Liberty to Liberty21 YAML Schema Converter
#[derive(Parser, Debug)]
struct ProgramOptions {
    /// Liberty Input File
    #[arg(short = 'i', long, default_value = "")]
    lib: String,
    /// Output File
    #[arg(short = 'o', long, default_value = "")]
    out: String,
    /// Output Format. One of (yaml, json, lib). Inferred from the output file extension if omitted.
    #[arg(short = 'f', long)]
    fmt: Option<String>,
    /// Analysis Corner. One of (early, late).
    #[arg(short = 's', long, default_value = "late")]
    split: String,
    /// Match Liberty keywords case-sensitively
    #[arg(long)]
    strict_case: bool,
    /// Reader-Options File (yaml, json, or toml). Overrides `split` and `strict_case`.
    #[arg(short = 'c', long)]
    config: Option<String>,
    /// Verbose Output Mode
    #[arg(short, long)]
    verbose: bool,
}

/// Output Formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    /// Serialized data-model
    Markup(SerializationFormat),
    /// Re-rendered Liberty text
    Liberty,
}

/// The main entry point.
/// All logic is offloaded to `_main` for sake of testing.
fn main() -> Result<(), Box<dyn Error>> {
    let options = ProgramOptions::parse();
    let level = if options.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    _main(&options)
}

/// All the real logic, with `ProgramOptions` argument for sake of testing
fn _main(options: &ProgramOptions) -> Result<(), Box<dyn Error>> {
    let opts = read_options(options)?;
    let fmt = output_format(options)?;

    // Load the Liberty file to a [Celllib]
    let report = read_with_diagnostics(&options.lib, &opts)?;
    for diag in report.diagnostics.iter() {
        debug!("{:?}", diag);
    }
    info!(
        "Read {:?} with {} diagnostics",
        &options.lib,
        report.diagnostics.len()
    );
    let celllib = report.celllib;

    // And store it in the target format
    match fmt {
        OutputFormat::Markup(fmt) => fmt.save(&celllib, &options.out)?,
        OutputFormat::Liberty => celllib.save(&options.out)?,
    }

    if options.verbose {
        println!("wrote {:?}", &options.out);
    }
    Ok(())
}

/// Collect the [ReadOptions], from the config file if provided, else from the command line
fn read_options(options: &ProgramOptions) -> Result<ReadOptions, Box<dyn Error>> {
    if let Some(ref path) = options.config {
        return Ok(ReadOptions::open_inferred(path)?);
    }
    let split = match Split::parse(&options.split, KeyCase::Lenient) {
        Some(s) => s,
        None => return Err(format!("Invalid split: {}. Must be one of (early, late).", options.split).into()),
    };
    let key_case = if options.strict_case {
        KeyCase::Strict
    } else {
        KeyCase::Lenient
    };
    Ok(ReadOptions { split, key_case })
}

/// Get the [OutputFormat], from `fmt` if provided, else from the output file extension
fn output_format(options: &ProgramOptions) -> Result<OutputFormat, Box<dyn Error>> {
    if let Some(ref fmt) = options.fmt {
        return parse_format(fmt);
    }
    let ext = std::path::Path::new(&options.out)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml");
    match ext {
        "yml" => parse_format("yaml"),
        _ => parse_format(ext),
    }
}

/// Parse the `fmt` string into an [OutputFormat]
fn parse_format(format: &str) -> Result<OutputFormat, Box<dyn Error>> {
    match format {
        "json" => Ok(OutputFormat::Markup(SerializationFormat::Json)),
        "yaml" => Ok(OutputFormat::Markup(SerializationFormat::Yaml)),
        "lib" => Ok(OutputFormat::Liberty),
        "toml" => Err("TOML output is not supported for cell libraries".into()),
        _ => Err(format!("Invalid format: {}. Must be one of (yaml, json, lib).", format).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liberty21::Celllib;
    use liberty21utils::SerializationFormat::{Json, Yaml};

    fn options(lib: String, out: String) -> ProgramOptions {
        ProgramOptions {
            lib,
            out,
            fmt: None,
            split: "late".into(),
            strict_case: false,
            config: None,
            verbose: true,
        }
    }

    #[test]
    fn roundtrip_to_golden_file() -> Result<(), Box<dyn Error>> {
        // The golden file was created by running the program:
        // $ cargo run -- -i resources/inv.lib -o resources/inv.golden.yaml
        let golden_output_path = resource("inv.golden.yaml");
        let output_path = scratch("inv.yaml");

        // Run the main function, producing file `output_path`
        _main(&options(resource("inv.lib"), output_path.clone()))?;

        // Read back what it wrote to disk, and compare to the golden version
        let readback: Celllib = Yaml.open(&output_path)?;
        let golden: Celllib = Yaml.open(&golden_output_path)?;
        assert_eq!(readback, golden);
        Ok(())
    }
    #[test]
    fn it_writes_json() -> Result<(), Box<dyn Error>> {
        let output_path = scratch("inv.out");
        let mut opts = options(resource("inv.lib"), output_path.clone());
        opts.fmt = Some("json".into());
        _main(&opts)?;
        let readback: Celllib = Json.open(&output_path)?;
        let golden: Celllib = Yaml.open(resource("inv.golden.yaml"))?;
        assert_eq!(readback, golden);
        Ok(())
    }
    #[test]
    fn it_rerenders_liberty() -> Result<(), Box<dyn Error>> {
        let output_path = scratch("inv.lib");
        _main(&options(resource("inv.lib"), output_path.clone()))?;
        let readback = Celllib::open(&output_path, Split::Late)?;
        let golden: Celllib = Yaml.open(resource("inv.golden.yaml"))?;
        assert_eq!(readback, golden);
        Ok(())
    }
    #[test]
    fn it_reads_config_files() -> Result<(), Box<dyn Error>> {
        let mut opts = options(resource("inv.lib"), scratch("early.yaml"));
        opts.config = Some(resource("early_strict.yaml"));
        let ropts = read_options(&opts)?;
        assert_eq!(ropts.split, Split::Early);
        assert_eq!(ropts.key_case, KeyCase::Strict);
        _main(&opts)?;
        let readback: Celllib = Yaml.open(&opts.out)?;
        assert_eq!(readback.split(), Split::Early);
        assert_eq!(readback.num_cells(), 1);
        Ok(())
    }
    #[test]
    fn it_parses_formats() {
        let mut opts = options(String::new(), "x.yml".into());
        assert_eq!(output_format(&opts).unwrap(), OutputFormat::Markup(Yaml));
        opts.out = "x.json".into();
        assert_eq!(output_format(&opts).unwrap(), OutputFormat::Markup(Json));
        opts.out = "x".into();
        assert_eq!(output_format(&opts).unwrap(), OutputFormat::Markup(Yaml));
        opts.out = "x.toml".into();
        assert!(output_format(&opts).is_err());
        opts.fmt = Some("lib".into());
        assert_eq!(output_format(&opts).unwrap(), OutputFormat::Liberty);
        opts.fmt = Some("gds".into());
        assert!(output_format(&opts).is_err());
    }
    #[test]
    fn it_rejects_bad_inputs() {
        let mut opts = options(resource("inv.lib"), scratch("bad.yaml"));
        opts.split = "typical".into();
        assert!(_main(&opts).is_err());
        let opts = options(resource("never_created.lib"), scratch("bad.yaml"));
        assert!(_main(&opts).is_err());
    }

    /// Grab the full path of resource-file `fname`
    fn resource(rname: &str) -> String {
        format!("{}/resources/{}", env!("CARGO_MANIFEST_DIR"), rname)
    }
    /// Grab the path of scratch-file `fname`, outside the source tree
    fn scratch(fname: &str) -> String {
        let dir = std::env::temp_dir().join(format!("lib2yaml_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(fname).to_string_lossy().into_owned()
    }
}
