use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use epic_editor::services::markdown::convert;
use epic_editor::services::text_ops::file_name_from_path;
use epic_editor::{
    EditorError, Element, EpicEditor, ExportFormat, FileImport, FileStorage, MarkdownRenderer,
    Result, Settings, Tag,
};

#[derive(Parser, Debug)]
#[command(name = "epiceditor")]
#[command(about = "Manage and render a store of markdown files")]
#[command(version)]
struct Cli {
    /// Directory holding the file store (defaults to the user data directory)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a markdown file (or stdin with "-") without touching the store
    Render {
        path: String,
        #[arg(long, short, default_value = "html")]
        format: ExportFormat,
    },
    /// Import a markdown file into the store
    Import {
        path: PathBuf,
        /// Store name (defaults to the file stem)
        #[arg(long, short)]
        name: Option<String>,
    },
    /// Print a stored file
    Export {
        name: String,
        #[arg(long, short, default_value = "raw")]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List stored files with their modification time and size
    List,
    /// Rename a stored file
    Rename { from: String, to: String },
    /// Delete a stored file
    Remove { name: String },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("epiceditor: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        data_dir,
        config,
        command,
    } = cli;
    let open = || open_editor(data_dir.clone(), config.clone());

    match command {
        Command::Render { path, format } => {
            let markdown = read_input(&path)?;
            print!("{}", convert(&markdown, format, &MarkdownRenderer)?);
        }
        Command::Import { path, name } => {
            let editor = open()?;
            let content = fs::read_to_string(&path)?;
            let name = name.unwrap_or_else(|| file_name_from_path(&path.to_string_lossy()));
            editor.import(FileImport::named(&name).content(content))?;
            editor.save()?;
            println!("Imported '{}'", name);
        }
        Command::Export {
            name,
            format,
            output,
        } => {
            let text = open()?
                .export_file(Some(&name), format)?
                .ok_or_else(|| EditorError::NotFound(name.clone()))?;
            match output {
                Some(path) => fs::write(path, text)?,
                None => print!("{}", text),
            }
        }
        Command::List => {
            for (name, record) in open()?.get_files() {
                println!(
                    "{}\t{}\t{} bytes",
                    name,
                    record.modified.format("%Y-%m-%d %H:%M"),
                    record.content.len()
                );
            }
        }
        Command::Rename { from, to } => {
            let editor = open()?;
            editor.rename(&from, &to)?;
            editor.save()?;
        }
        Command::Remove { name } => {
            let editor = open()?;
            editor.remove(&name)?;
            editor.save()?;
        }
    }
    Ok(())
}

/// A headless editor over the file-backed store.
fn open_editor(data_dir: Option<PathBuf>, config: Option<PathBuf>) -> Result<EpicEditor> {
    let settings = match config {
        Some(path) => Settings::load_from(&path),
        None => Settings::load(),
    };
    let storage = match data_dir {
        Some(dir) => FileStorage::new(dir),
        None => FileStorage::default_location(),
    };
    log::debug!("Using store at {}", storage.dir().display());

    EpicEditor::builder(Element::new(Tag::Div).into_rc())
        .settings(settings)
        .storage(storage)
        .build()
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}
