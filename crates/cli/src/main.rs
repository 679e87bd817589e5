use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pdf_facade::{config_fields, RenderConfiguration, RenderFacade, Section};

/// Renders HTML markup to PDF through the pdf_facade crate.
///
/// Fonts must be present under `assets/fonts` next to the binary or the crate manifest, or be
/// provided via the `PDF_FACADE_FONTS_DIR` environment variable.
#[derive(Parser)]
#[command(author, version, about = "Render HTML markup to PDF")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a document and write it to `--output`.
    Render {
        /// TOML configuration file with camelCase option names.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Body markup, or the path of a template file.
        #[arg(long = "main")]
        markup_main: Option<String>,

        /// Header markup, or the path of a template file.
        #[arg(long = "header")]
        markup_header: Option<String>,

        /// Footer markup, or the path of a template file.
        #[arg(long = "footer")]
        markup_footer: Option<String>,

        /// Stylesheet file.
        #[arg(long)]
        css_file: Option<PathBuf>,

        /// Additional `key=value` options, applied after the configuration file.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,

        /// Output file.
        #[arg(short, long, default_value = "document.pdf")]
        output: PathBuf,
    },

    /// Print the configuration options with their current values.
    Schema {
        /// TOML configuration file with camelCase option names.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_configuration(path: Option<&PathBuf>) -> Result<RenderConfiguration, Box<dyn Error>> {
    match path {
        Some(path) => Ok(RenderConfiguration::load(path)?),
        None => Ok(RenderConfiguration::default()),
    }
}

fn render(
    config: Option<PathBuf>,
    sections: [(Section, Option<String>); 3],
    css_file: Option<PathBuf>,
    overrides: Vec<String>,
    output: PathBuf,
) -> Result<(), Box<dyn Error>> {
    let configuration = load_configuration(config.as_ref())?;
    let mut facade: RenderFacade = RenderFacade::with_configuration(configuration);

    for (section, markup) in sections {
        if let Some(markup) = markup {
            facade.set_markup(section, markup);
        }
    }
    if let Some(css_file) = css_file {
        facade.set("cssFile", css_file.display().to_string())?;
    }
    for entry in overrides {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", entry))?;
        facade.set(key.trim(), value)?;
    }

    facade.save(&output)?;
    let pages = facade.call("page_count", &[])?;
    println!("Wrote {} ({} pages)", output.display(), pages);
    Ok(())
}

fn schema(config: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let config = load_configuration(config.as_ref())?;
    for field in config_fields(&config) {
        println!("{}", field);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            config,
            markup_main,
            markup_header,
            markup_footer,
            css_file,
            overrides,
            output,
        } => render(
            config,
            [
                (Section::Main, markup_main),
                (Section::Header, markup_header),
                (Section::Footer, markup_footer),
            ],
            css_file,
            overrides,
            output,
        ),
        Commands::Schema { config } => schema(config),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
