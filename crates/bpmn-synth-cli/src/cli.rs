//! Command-line interface for the bpmn-synth utility
//!
//! Provides a CLI to turn raw process descriptions into diagram XML and to
//! inspect the intermediate stages.

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::debug;

use bpmn_synth::core::logging::{init_logging, FORMAT_ENV, LEVEL_ENV};
use bpmn_synth::plugins::{
    read_document, CanonicalGraph, LayoutConfig, OntologyCatalog, Orchestrator, RawProcess,
    Synthesis, SuggestionSet, XmlRenderer,
};

/// bpmn-synth - Turn process descriptions into BPMN diagram documents
#[derive(Parser)]
#[command(name = "bpmn-synth")]
#[command(about = "Flatten, lay out and serialize BPMN process descriptions")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a raw process (JSON) into diagram XML
    Convert {
        /// Input file containing the raw process (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the XML document (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Indent the XML, one element per line
        #[arg(long)]
        pretty: bool,
    },

    /// Flatten a raw process (JSON) into a canonical graph (JSON)
    Normalize {
        /// Input file containing the raw process (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the canonical graph (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Lay out a canonical graph (JSON) and write diagram XML
    Layout {
        /// Input file containing the canonical graph (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file for the XML document (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Indent the XML, one element per line
        #[arg(long)]
        pretty: bool,

        /// Skip graph validation; dangling flows become unrouted connectors
        #[arg(long)]
        lenient: bool,
    },

    /// Validate a raw process, or a canonical graph with --graph
    Validate {
        /// Input file to validate (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Treat the input as a canonical graph instead of a raw process
        #[arg(long)]
        graph: bool,
    },

    /// List ontology paths, or review security suggestions against a diagram
    Ontology {
        /// Ontology template XML
        #[arg(short, long)]
        template: PathBuf,

        /// Suggestion set JSON to review
        #[arg(short, long, requires = "diagram")]
        suggestions: Option<PathBuf>,

        /// Diagram XML the suggestions refer to
        #[arg(short, long, requires = "suggestions")]
        diagram: Option<PathBuf>,

        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Layout configuration sources shared by the layout-producing commands
///
/// Values from `--config` are applied first, then individual overrides.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct LayoutArgs {
    /// JSON file with layout settings (camelCase keys, all optional)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// X of the first shape
    #[arg(long, allow_negative_numbers = true)]
    pub start_x: Option<f64>,

    /// Y of every shape's top edge
    #[arg(long, allow_negative_numbers = true)]
    pub baseline_y: Option<f64>,

    /// Distance between consecutive shapes
    #[arg(long)]
    pub horizontal_spacing: Option<f64>,

    #[arg(long)]
    pub shape_width: Option<f64>,

    #[arg(long)]
    pub shape_height: Option<f64>,

    /// Gap below the shapes used by loop-back connectors
    #[arg(long)]
    pub loop_clearance: Option<f64>,
}

impl LayoutArgs {
    /// Build the effective layout configuration
    pub fn resolve(&self) -> Result<LayoutConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    anyhow!("Failed to read layout config '{}': {}", path.display(), e)
                })?;
                LayoutConfig::from_json(&content)?
            }
            None => LayoutConfig::default(),
        };

        let overrides = [
            (self.start_x, &mut config.start_x),
            (self.baseline_y, &mut config.baseline_y),
            (self.horizontal_spacing, &mut config.horizontal_spacing),
            (self.shape_width, &mut config.shape_width),
            (self.shape_height, &mut config.shape_height),
            (self.loop_clearance, &mut config.loop_clearance),
        ];
        for (value, field) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }
        debug!(?config, "Layout config resolved");
        Ok(config)
    }
}

/// Main CLI application
pub struct BpmnSynthApp {
    orchestrator: Orchestrator,
}

impl BpmnSynthApp {
    /// Create a new application instance with default settings
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    /// Create a new application instance with a layout config
    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            orchestrator: Orchestrator::with_config(config),
        }
    }

    fn configure(&mut self, layout: &LayoutArgs, pretty: bool) -> Result<()> {
        let renderer = if pretty {
            XmlRenderer::pretty()
        } else {
            XmlRenderer::new()
        };
        self.orchestrator = Orchestrator::with_config(layout.resolve()?).with_renderer(renderer);
        Ok(())
    }

    /// Run the application with the given CLI arguments
    pub fn run(&mut self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over flags
        let log_level = std::env::var(LEVEL_ENV)
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| cli.log_level.as_str().to_string());
        let log_format = std::env::var(FORMAT_ENV)
            .ok()
            .unwrap_or_else(|| cli.log_format.as_str().to_string());

        if let Err(e) = init_logging(Some(&log_level), Some(&log_format)) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("bpmn-synth v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Convert {
                input,
                output,
                layout,
                pretty,
            } => self.convert_command(input, output, &layout, pretty, cli.verbose),
            Commands::Normalize { input, output } => {
                self.normalize_command(input, output, cli.verbose)
            }
            Commands::Layout {
                input,
                output,
                layout,
                pretty,
                lenient,
            } => self.layout_command(input, output, &layout, pretty, lenient, cli.verbose),
            Commands::Validate { input, graph } => {
                self.validate_command(input, graph, cli.verbose)
            }
            Commands::Ontology {
                template,
                suggestions,
                diagram,
                json,
            } => self.ontology_command(template, suggestions, diagram, json, cli.verbose),
        }
    }

    /// Handle the convert command
    fn convert_command(
        &mut self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        layout: &LayoutArgs,
        pretty: bool,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        self.configure(layout, pretty)?;
        let synthesis = self.orchestrator.process_json(&content)?;
        report(&synthesis, verbose);
        self.write_output(output, &synthesis.xml)
    }

    /// Handle the normalize command
    fn normalize_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        let raw = RawProcess::from_json(&content)?;
        let graph = self.orchestrator.normalize(&raw)?;
        if verbose {
            eprintln!(
                "Normalized into {} elements and {} flows",
                graph.elements().len(),
                graph.flows().len()
            );
        }
        self.write_output(output, &graph.to_json()?)
    }

    /// Handle the layout command
    fn layout_command(
        &mut self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        layout: &LayoutArgs,
        pretty: bool,
        lenient: bool,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        let graph = CanonicalGraph::from_json(&content)?;

        self.configure(layout, pretty)?;
        let synthesis = if lenient {
            self.orchestrator.process_graph_lenient(graph)?
        } else {
            self.orchestrator.process_graph(graph)?
        };
        report(&synthesis, verbose);
        self.write_output(output, &synthesis.xml)
    }

    /// Handle the validate command
    fn validate_command(&self, input: Option<PathBuf>, graph: bool, verbose: bool) -> Result<()> {
        let content = self.read_input(input)?;
        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let (what, result) = if graph {
            let checked = CanonicalGraph::from_json(&content)
                .and_then(|graph| graph.validate().map(|_| graph))
                .map_err(anyhow::Error::from);
            ("canonical graph", checked)
        } else {
            let checked = RawProcess::from_json(&content)
                .map_err(anyhow::Error::from)
                .and_then(|raw| self.orchestrator.normalize(&raw));
            ("process", checked)
        };

        match result {
            Ok(graph) => {
                println!(
                    "✓ Valid {} ({} elements, {} flows)",
                    what,
                    graph.elements().len(),
                    graph.flows().len()
                );
                Ok(())
            }
            Err(e) => {
                println!("✗ Invalid {}: {}", what, e);
                Err(e)
            }
        }
    }

    /// Handle the ontology command
    fn ontology_command(
        &self,
        template: PathBuf,
        suggestions: Option<PathBuf>,
        diagram: Option<PathBuf>,
        json: bool,
        verbose: bool,
    ) -> Result<()> {
        let catalog = OntologyCatalog::from_xml(&self.read_input(Some(template))?)?;
        if verbose {
            eprintln!("Loaded {} ontology paths", catalog.len());
        }

        let (Some(suggestions), Some(diagram)) = (suggestions, diagram) else {
            if json {
                println!("{}", serde_json::to_string_pretty(catalog.paths())?);
            } else {
                for path in catalog.paths() {
                    println!("{}", path);
                }
            }
            return Ok(());
        };

        let set = SuggestionSet::from_json(&self.read_input(Some(suggestions))?)?;
        let document = read_document(&self.read_input(Some(diagram))?)?;
        let issues = catalog.review(&document, &set.security_ontologies);

        if json {
            let report = serde_json::json!({
                "suggestions": set.security_ontologies.len(),
                "issues": issues,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else if issues.is_empty() {
            println!(
                "✓ All {} suggestions apply",
                set.security_ontologies.len()
            );
        } else {
            for issue in &issues {
                println!("✗ {}", issue);
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("{} suggestion issue(s) found", issues.len()))
        }
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        match output {
            Some(path) if path.to_string_lossy() != "-" => {
                fs::write(&path, content).map_err(|e| {
                    anyhow!("Failed to write output file '{}': {}", path.display(), e)
                })?;
            }
            _ => {
                if content.is_empty() || content.ends_with('\n') {
                    print!("{}", content);
                } else {
                    println!("{}", content);
                }
                io::stdout().flush()?;
            }
        }
        Ok(())
    }

    /// Get a reference to the orchestrator (for testing)
    #[cfg(test)]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}

impl Default for BpmnSynthApp {
    fn default() -> Self {
        Self::new()
    }
}

fn report(synthesis: &Synthesis, verbose: bool) {
    if !verbose {
        return;
    }
    for diagnostic in synthesis.diagnostics() {
        eprintln!("Warning: {}", diagnostic);
    }
    eprintln!(
        "Laid out {} shapes and {} connectors",
        synthesis.document.shapes.len(),
        synthesis.document.connectors.len()
    );
}
