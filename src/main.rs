use clap::{Parser, Subcommand};
use fluxgallery::{
    logger::{self, LoggerConfig},
    ui::{DeleteOutcome, GenerationOutcome, LoadOutcome},
    ApiClient, Config, GalleryError, Session,
};
use log::LevelFilter;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fluxgallery", version, about = "Generate and manage images on a Flux image service")]
struct Cli {
    /// Image service origin.
    #[arg(long, global = true, env = "FLUX_API_URL")]
    api_url: Option<String>,

    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit log lines as JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Also append log lines, as JSON, to this file.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List stored images, newest first.
    List {
        /// Skip the inline payloads.
        #[arg(long)]
        no_data: bool,
    },
    /// Generate an image from a prompt.
    Generate {
        prompt: String,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        #[arg(long)]
        steps: Option<u32>,
        /// Fixed seed; implies --no-randomize.
        #[arg(long)]
        seed: Option<i64>,
        #[arg(long)]
        no_randomize: bool,
        /// Save the result into this directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete a stored image.
    Delete {
        filename: String,
        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },
    /// Show metadata for one image.
    Info {
        filename: String,
        #[arg(long)]
        data: bool,
    },
    /// Save a stored image to disk.
    Download {
        filename: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn confirm_on_stdin(question: &str) -> bool {
    eprint!("{} [y/N] ", question);
    io::stderr().flush().ok();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn report_failure(message: &str) -> ExitCode {
    eprintln!("Error: {}", message);
    ExitCode::FAILURE
}

fn print_gallery(session: &Session) {
    let page = session.page();
    println!("{}", page.count_label());
    for card in session.gallery().cards(page.images()) {
        println!(
            "  {:<32} {:>11}  {:>9}  {}{}",
            card.filename,
            card.dimensions,
            card.size,
            card.created,
            if card.has_preview { "" } else { "  (no preview)" }
        );
    }
}

async fn run(cli: Cli, config: Config) -> Result<ExitCode, GalleryError> {
    let api = ApiClient::http(&config.service)?;
    let mut session = Session::new(api, config.limits.clone());

    match cli.command {
        Command::List { no_data } => {
            if no_data {
                let images = session.api().list_images(false).await?;
                for image in images {
                    println!("{}  {}x{}  {}", image.filename, image.width, image.height, image.created_at);
                }
                return Ok(ExitCode::SUCCESS);
            }
            if let LoadOutcome::Failed(message) = session.load().await {
                return Ok(report_failure(&message));
            }
            print_gallery(&session);
        }
        Command::Generate {
            prompt,
            width,
            height,
            steps,
            seed,
            no_randomize,
            out,
        } => {
            let panel = session.generator_mut();
            panel.set_prompt(prompt);
            if let Some(width) = width {
                panel.set_width(width);
            }
            if let Some(height) = height {
                panel.set_height(height);
            }
            if let Some(steps) = steps {
                panel.set_steps(steps);
            }
            if no_randomize || seed.is_some() {
                panel.set_randomize_seed(false);
            }
            if let Some(seed) = seed {
                panel.set_seed(seed);
            }

            log::info!("🎨 Generating {}x{} with {} steps", panel.width(), panel.height(), panel.steps());
            match session.submit().await? {
                GenerationOutcome::Generated(image) => {
                    println!("{}", image.filename);
                    if let Some(dir) = out {
                        session.open(&image.filename);
                        if let Some(download) = session.download_viewed()? {
                            println!("Saved to {}", download.save_to(&dir)?.display());
                        }
                    }
                }
                GenerationOutcome::Failed(message) => return Ok(report_failure(&message)),
                GenerationOutcome::Discarded => {}
            }
        }
        Command::Delete { filename, yes } => {
            let confirm = |question: &str| yes || confirm_on_stdin(question);
            match session.delete(&filename, confirm).await {
                Some(DeleteOutcome::Removed(_)) => println!("Deleted {}", filename),
                Some(DeleteOutcome::Failed { message, .. }) => return Ok(report_failure(&message)),
                Some(DeleteOutcome::Discarded) | None => println!("Cancelled"),
            }
        }
        Command::Info { filename, data } => {
            let image = session.api().get_image_info(&filename, data).await?;
            let json = serde_json::to_string_pretty(&image)
                .map_err(|e| GalleryError::Decode(e.to_string()))?;
            println!("{}", json);
            if let Some(url) = session.api().image_url(&filename) {
                println!("{}", url);
            }
        }
        Command::Download { filename, out } => {
            let image = session.api().get_image_info(&filename, true).await?;
            session.gallery_mut().open(&image);
            match session.download_viewed()? {
                Some(download) => println!("Saved to {}", download.save_to(&out)?.display()),
                None => return Ok(report_failure(&format!("No image data for {}", filename))),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let mut logger_config = if cli.json_logs {
        LoggerConfig::production()
    } else if cli.verbose {
        LoggerConfig::development()
    } else {
        LoggerConfig::new().level_from_env(LevelFilter::Warn)
    };
    logger_config = logger_config.with_json_output(cli.json_logs);
    if let Some(path) = &cli.log_file {
        logger_config = logger_config.with_file_output(path);
    }
    if let Err(e) = logger::init_with_config(logger_config) {
        eprintln!("{}", e);
    }

    if dotenv_loaded {
        log::debug!("✅ .env file loaded");
    }
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env();
    if let Some(url) = &cli.api_url {
        config.service = config.service.with_base_url(url.clone());
    }
    logger::log_config_info(&config);

    match run(cli, config).await {
        Ok(code) => code,
        Err(err) => {
            log::debug!("{}", err);
            report_failure(&err.user_message())
        }
    }
}
