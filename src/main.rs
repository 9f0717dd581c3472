//! resume-forge – validate, store and export resumes from the command line.
//!
//! Usage:
//!   resume-forge validate <resume.json>
//!   resume-forge export pdf [resume.json] [--page-size letter] [--file-name cv.pdf]
//!   resume-forge export docx [resume.json] [--font Georgia] [--font-size 12]
//!
//! Commands that take an optional input fall back to the saved resume.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, process};

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};

use resume_forge::dom::DomTree;
use resume_forge::download::DirectorySink;
use resume_forge::export::{ExportOptions, Exporter, PageSize, DEFAULT_FONT, DEFAULT_FONT_SIZE_PT};
use resume_forge::fonts::FontManager;
use resume_forge::model::{ResumeDocument, TemplateRole};
use resume_forge::notify::LogNotifier;
use resume_forge::storage::{LocalStorage, ResumeStore};
use resume_forge::templates::{render_html, templates_for_role, Layout, RenderOptions, PREVIEW_CONTAINER_ID};
use resume_forge::validation::validate_json;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "resume-forge")]
#[command(about = "Resume builder: validate, render and export resumes", long_about = None)]
struct Cli {
    /// Directory holding the saved resume and session user
    #[arg(long, env = "RESUME_FORGE_DATA_DIR", default_value = ".resume-forge", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a resume file and list every violation
    Validate {
        input: PathBuf,
    },
    /// Print the template markup of a resume
    Render {
        input: Option<PathBuf>,

        #[command(flatten)]
        look: LookArgs,

        /// Write the markup to FILE instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export a resume as PDF or DOCX
    Export {
        format: Format,

        input: Option<PathBuf>,

        #[command(flatten)]
        look: LookArgs,

        #[arg(long, value_enum, default_value_t = PageSize::A4)]
        page_size: PageSize,

        /// Device pixel ratio multiplied into the capture scale
        #[arg(long, default_value_t = 1.0)]
        dpr: f32,

        /// Output file name (default: resume.pdf / resume.docx)
        #[arg(long)]
        file_name: Option<String>,

        /// Directory the file is written to
        #[arg(long, env = "RESUME_FORGE_OUT_DIR", default_value = ".")]
        out_dir: PathBuf,

        /// TTF/OTF file used to measure and paint text
        #[arg(long, env = "RESUME_FORGE_FONT_FILE")]
        font_file: Option<PathBuf>,
    },
    /// Validate a resume file and store it as the saved resume
    Save {
        input: PathBuf,
    },
    /// Print the saved resume
    Show,
    /// Delete the saved resume
    Clear,
    /// List the available templates
    Templates {
        /// Only templates suited to this role (e.g. software-engineer)
        #[arg(long)]
        role: Option<String>,
    },
}

#[derive(Args)]
struct LookArgs {
    /// Template style name; overrides the resume's own (unknown names use minimal)
    #[arg(long)]
    style: Option<String>,

    #[arg(long, default_value = DEFAULT_FONT)]
    font: String,

    #[arg(long, default_value_t = DEFAULT_FONT_SIZE_PT)]
    font_size: f32,
}

impl LookArgs {
    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            font_family: self.font.clone(),
            font_size_pt: self.font_size,
            layout: self.style.as_deref().map(Layout::resolve),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pdf,
    Docx,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let store = ResumeStore::new(LocalStorage::new(&cli.data_dir));

    match cli.command {
        Commands::Validate { input } => {
            let text = read_input(&input)?;
            match validate_json(&text) {
                Ok(_) => println!("{}: valid", input.display()),
                Err(e) => {
                    for v in &e.violations {
                        println!("{v}");
                    }
                    return Err(e.into());
                }
            }
        }
        Commands::Render { input, look, output } => {
            let doc = load_document(input.as_deref(), &store)?;
            let html = render_html(&doc, &look.render_options());
            match output {
                Some(path) => fs::write(&path, html)?,
                None => println!("{html}"),
            }
        }
        Commands::Export {
            format,
            input,
            look,
            page_size,
            dpr,
            file_name,
            out_dir,
            font_file,
        } => {
            let doc = load_document(input.as_deref(), &store)?;
            let options = ExportOptions {
                file_name,
                page_size,
                font: look.font.clone(),
                font_size_pt: look.font_size,
                device_pixel_ratio: dpr,
                exclude: Vec::new(),
            };
            let html = render_html(&doc, &look.render_options());
            let mut tree = DomTree::parse(&html);

            let fonts = load_fonts(&look.font, font_file.as_deref())?;
            let exporter = Exporter::new(Arc::new(LogNotifier), Arc::new(DirectorySink::new(out_dir)))
                .with_fonts(fonts);
            let delivered = match format {
                Format::Pdf => exporter.export_pdf(&mut tree, PREVIEW_CONTAINER_ID, &options),
                Format::Docx => exporter.export_docx(&mut tree, PREVIEW_CONTAINER_ID, &options),
            };
            if !delivered {
                return Err("export failed".into());
            }
        }
        Commands::Save { input } => {
            let doc = validate_json(&read_input(&input)?)?;
            store.save(&doc)?;
            eprintln!("Saved resume to '{}'", store.storage().dir().display());
        }
        Commands::Show => match store.load()? {
            Some(doc) => println!("{}", serde_json::to_string_pretty(&doc)?),
            None => eprintln!("No saved resume."),
        },
        Commands::Clear => {
            store.clear()?;
            eprintln!("Cleared saved resume.");
        }
        Commands::Templates { role } => {
            let role = match role {
                Some(r) => Some(serde_json::from_value::<TemplateRole>(serde_json::Value::String(r))?),
                None => None,
            };
            for t in templates_for_role(role) {
                println!("{:<14} {}", t.layout.name(), t.description);
            }
        }
    }
    Ok(())
}

fn read_input(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|e| format!("reading '{}': {e}", path.display()).into())
}

/// The resume in `input`, or the saved one.
fn load_document(input: Option<&Path>, store: &ResumeStore) -> CliResult<ResumeDocument> {
    match input {
        Some(path) => Ok(validate_json(&read_input(path)?)?),
        None => store
            .load()?
            .ok_or_else(|| "no input given and no saved resume".into()),
    }
}

/// An explicit font file wins; otherwise look for system faces.
fn load_fonts(family: &str, font_file: Option<&Path>) -> CliResult<FontManager> {
    let mut fonts = FontManager::new();
    match font_file {
        Some(path) => {
            fonts.load_font_file(family, false, false, path)?;
            info!("using font file {}", path.display());
        }
        None => {
            if fonts.discover_system_fonts() == 0 {
                warn!("no system fonts found; text goes to the PDF text layer");
            }
        }
    }
    Ok(fonts)
}
