//! CLI entry point for toolbox.
//! Provides clap-based command routing for the net, image and video groups
//! and exit code mapping based on error type.

mod output;
mod progress;

use std::io;
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use toolbox_core::config::{CliOverrides, ToolboxConfig};
use toolbox_core::error::ToolboxError;
use toolbox_core::util::{read_byte_content, write_byte_content};
use toolbox_core::{FormatStrategy, OutputFormat, ScrambleMode, Toolbox};

use crate::progress::TerminalProgress;

/// Top-level CLI definition with global flags and subcommand dispatch.
#[derive(Parser)]
#[command(
    name = "toolbox",
    about = "A bunch of commands and stuff",
    version,
    disable_version_flag = true,
    disable_help_subcommand = true
)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,

    /// Config file path
    #[arg(short, long, value_name = "PATH", env = "TOOLBOX_CONFIG", global = true)]
    config: Option<String>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable verbose/debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Network utilities
    Net {
        #[command(subcommand)]
        command: Option<NetCommands>,
    },

    /// Image utilities
    Image {
        #[command(subcommand)]
        command: Option<ImageCommands>,
    },

    /// Video utilities
    Video {
        #[command(subcommand)]
        command: Option<VideoCommands>,
    },
}

#[derive(Subcommand)]
enum NetCommands {
    /// Describe an IPv4 network in CIDR notation
    Ipv4 {
        /// Address with prefix, e.g. 192.168.0.1/24
        ip_address: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = NetOutput::Print)]
        output: NetOutput,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum NetOutput {
    Print,
    Json,
}

#[derive(Subcommand)]
enum ImageCommands {
    /// Split and assemble animated GIFs
    Gif {
        #[command(subcommand)]
        command: Option<GifCommands>,
    },

    /// Hide data in the low bits of an image
    Stego(StegoArgs),

    /// Scramble or unscramble image pixels with a password
    Scramble {
        /// Image files or directories
        #[arg(required = true, value_name = "FILE_PATHS")]
        file_paths: Vec<PathBuf>,

        /// Scramble password (defaults to SCRAMBLE_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,

        /// Reverse a previous scramble
        #[arg(short, long)]
        unscramble: bool,

        /// Directory for results (defaults to beside each input)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Output format: PNG or JPEG
        #[arg(short = 'f', long, value_name = "FORMAT")]
        out_format: Option<String>,
    },

    /// Preview an image in the terminal
    Show {
        file_path: PathBuf,

        /// Maximum width in columns
        #[arg(long, value_name = "N")]
        width: Option<u32>,
    },
}

#[derive(Subcommand)]
enum GifCommands {
    /// Write every frame of a GIF as a PNG
    Extract {
        gif_file: PathBuf,

        /// Folder for the extracted frames
        #[arg(long, value_name = "DIR")]
        out_folder: Option<PathBuf>,
    },

    /// Assemble a folder of PNG frames into a GIF
    Build {
        image_folder: PathBuf,

        /// GIF file to write
        #[arg(long, value_name = "FILE", default_value = "./build.gif")]
        out_file: PathBuf,

        /// Milliseconds per frame
        #[arg(long, value_name = "MS")]
        duration: Option<u32>,
    },
}

#[derive(Args)]
struct StegoArgs {
    /// Low bits per color channel used for data (1-8)
    #[arg(long, global = true, value_name = "N")]
    lsb: Option<u8>,

    #[command(subcommand)]
    command: Option<StegoCommands>,
}

#[derive(Subcommand)]
enum StegoCommands {
    /// Write an empty container header into an image
    Initialize {
        file_path: PathBuf,

        /// Overwrite an existing container
        #[arg(short, long)]
        force: bool,
    },

    /// Check a container's header and checksum
    Validate {
        file_path: PathBuf,

        /// Only check the header magic
        #[arg(long)]
        header_only: bool,
    },

    /// Dump the hidden payload
    Cat {
        file_path: PathBuf,

        /// Destination file, or - for stdout
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        out_file: String,
    },

    /// Replace the hidden payload
    Write {
        file_path: PathBuf,

        /// A file path, - for stdin, or literal text
        #[arg(long, value_name = "DATA", default_value = "-")]
        data: String,
    },

    /// Overwrite the payload area and reset the payload length
    Format {
        file_path: PathBuf,

        /// Fill with random bits (default)
        #[arg(long, group = "strategy")]
        random: bool,

        /// Fill with zero bits
        #[arg(long, group = "strategy")]
        zeros: bool,

        /// Fill with one bits
        #[arg(long, group = "strategy")]
        ones: bool,
    },

    /// Show container details
    Info { file_path: PathBuf },
}

#[derive(Subcommand)]
enum VideoCommands {
    /// Concatenate videos with ffmpeg
    Merge {
        #[arg(required = true, value_name = "VIDEO_FILENAMES")]
        video_filenames: Vec<PathBuf>,

        /// Merged output file
        #[arg(long, value_name = "FILE")]
        output_filename: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging (suppress when JSON output is requested)
    let filter = if cli.json {
        "error"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    env_logger::Builder::new()
        .parse_env(env_logger::Env::default().default_filter_or(filter))
        .format_target(false)
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli) {
        print_error(&e);
        process::exit(exit_code(&e));
    }
}

/// Map error types to differentiated exit codes.
fn exit_code(error: &ToolboxError) -> i32 {
    match error {
        ToolboxError::ConfigError(_) => 2,
        ToolboxError::InvalidInput(_) => 3,
        ToolboxError::NotFound(_) => 4,
        ToolboxError::IoError(_) => 4,
        ToolboxError::ImageError(_) => 5,
        ToolboxError::InvalidContainer { .. } => 6,
        ToolboxError::ChecksumMismatch { .. } => 6,
        ToolboxError::CapacityExceeded { .. } => 6,
        ToolboxError::AlreadyInitialized { .. } => 6,
        ToolboxError::ValidationFailed(_) => 6,
        ToolboxError::ToolNotFound(_) => 7,
        ToolboxError::ToolFailed { .. } => 7,
        _ => 1,
    }
}

/// Print the help of the group named by `path`, e.g. `["image", "stego"]`.
fn print_group_help(path: &[&str]) -> Result<(), ToolboxError> {
    let mut cmd = Cli::command();
    // Propagates globals and bin names so usage reads "toolbox image stego ..."
    cmd.build();
    let mut current = &mut cmd;
    for name in path {
        current = match current.find_subcommand_mut(name) {
            Some(sub) => sub,
            None => {
                return Err(ToolboxError::InvalidInput(format!(
                    "Unknown command group '{}'",
                    name
                )))
            }
        };
    }
    current.print_help()?;
    Ok(())
}

/// Build configuration and dispatch the chosen subcommand.
fn run(cli: Cli) -> Result<(), ToolboxError> {
    let json_output = cli.json;
    let show_progress = !cli.json && !cli.quiet;

    let Some(command) = cli.command else {
        let mut cmd = Cli::command();
        cmd.print_help()?;
        return Ok(());
    };

    // Collect per-command overrides before loading config
    let mut overrides = CliOverrides::default();
    match &command {
        Commands::Image {
            command: Some(image),
        } => match image {
            ImageCommands::Gif {
                command: Some(GifCommands::Extract { out_folder, .. }),
            } => overrides.out_folder = out_folder.clone(),
            ImageCommands::Gif {
                command: Some(GifCommands::Build { duration, .. }),
            } => overrides.duration_ms = *duration,
            ImageCommands::Stego(args) => overrides.lsb = args.lsb,
            ImageCommands::Scramble {
                password,
                out_format,
                ..
            } => {
                overrides.password = password.clone();
                overrides.out_format = match out_format {
                    Some(f) => Some(f.parse::<OutputFormat>()?),
                    None => None,
                };
            }
            ImageCommands::Show { width, .. } => overrides.width = *width,
            _ => {}
        },
        Commands::Video {
            command: Some(VideoCommands::Merge {
                output_filename, ..
            }),
        } => overrides.output_filename = output_filename.clone(),
        _ => {}
    }

    let config = ToolboxConfig::load(cli.config.as_deref(), &overrides)?;
    log::debug!("Resolved configuration; config={:?}", config);
    let tb = Toolbox::new(config);
    let progress = TerminalProgress::new(show_progress);

    match command {
        Commands::Net { command: None } => print_group_help(&["net"])?,
        Commands::Net {
            command: Some(NetCommands::Ipv4 { ip_address, output }),
        } => {
            let summary = tb.ipv4(&ip_address)?;
            if json_output || output == NetOutput::Json {
                output::print_json_indent4(&summary)?;
            } else {
                output::print_ipv4_table(&summary);
            }
        }

        Commands::Image { command: None } => print_group_help(&["image"])?,
        Commands::Image {
            command: Some(image),
        } => run_image(image, &tb, &progress, json_output)?,

        Commands::Video { command: None } => print_group_help(&["video"])?,
        Commands::Video {
            command: Some(VideoCommands::Merge {
                video_filenames, ..
            }),
        } => {
            let report = tb.video_merge(&video_filenames, &progress)?;
            if json_output {
                output::print_json(&report)?;
            } else {
                output::print_merge_report(&report);
            }
        }
    }

    Ok(())
}

/// Execute an `image` subcommand.
fn run_image(
    command: ImageCommands,
    tb: &Toolbox,
    progress: &TerminalProgress,
    json_output: bool,
) -> Result<(), ToolboxError> {
    match command {
        ImageCommands::Gif { command: None } => print_group_help(&["image", "gif"])?,
        ImageCommands::Gif {
            command: Some(GifCommands::Extract { gif_file, .. }),
        } => {
            let report = tb.gif_extract(&gif_file, None, progress)?;
            if json_output {
                output::print_json(&report)?;
            } else {
                output::print_extract_report(&report);
            }
        }
        ImageCommands::Gif {
            command:
                Some(GifCommands::Build {
                    image_folder,
                    out_file,
                    ..
                }),
        } => {
            let report = tb.gif_build(&image_folder, &out_file, progress)?;
            if json_output {
                output::print_json(&report)?;
            } else {
                output::print_build_report(&report);
            }
        }

        ImageCommands::Stego(StegoArgs { command: None, .. }) => {
            print_group_help(&["image", "stego"])?
        }
        ImageCommands::Stego(StegoArgs {
            command: Some(stego),
            ..
        }) => run_stego(stego, tb, progress, json_output)?,

        ImageCommands::Scramble {
            file_paths,
            unscramble,
            out_dir,
            ..
        } => {
            let mode = if unscramble {
                ScrambleMode::Unscramble
            } else {
                ScrambleMode::Scramble
            };
            let report = tb.scramble(&file_paths, mode, out_dir)?;
            if json_output {
                output::print_json(&report)?;
            } else {
                output::print_scramble_report(&report);
            }
        }

        ImageCommands::Show { file_path, .. } => {
            let grid = tb.show(&file_path)?;
            output::print_half_blocks(&grid);
        }
    }
    Ok(())
}

/// Execute an `image stego` subcommand.
fn run_stego(
    command: StegoCommands,
    tb: &Toolbox,
    progress: &TerminalProgress,
    json_output: bool,
) -> Result<(), ToolboxError> {
    match command {
        StegoCommands::Initialize { file_path, force } => {
            let report = tb.stego_initialize(&file_path, force)?;
            if json_output {
                output::print_json(&report)?;
            } else {
                output::print_save_result("Initialized", &report);
            }
        }
        StegoCommands::Validate {
            file_path,
            header_only,
        } => {
            let report = tb.stego_validate(&file_path, header_only)?;
            if json_output {
                output::print_json(&report)?;
            } else if report.valid {
                output::print_validate_result(&report);
            }
            if let Some(reason) = report.reason {
                return Err(ToolboxError::ValidationFailed(reason));
            }
        }
        StegoCommands::Cat {
            file_path,
            out_file,
        } => {
            let data = tb.stego_cat(&file_path)?;
            write_byte_content(&out_file, &data, io::stdout().lock())?;
        }
        StegoCommands::Write { file_path, data } => {
            let bytes = read_byte_content(&data, io::stdin().lock())?;
            let report = tb.stego_write(&file_path, &bytes)?;
            if json_output {
                output::print_json(&report)?;
            } else {
                output::print_save_result("Wrote", &report);
            }
        }
        StegoCommands::Format {
            file_path,
            zeros,
            ones,
            ..
        } => {
            let strategy = if zeros {
                FormatStrategy::Zeros
            } else if ones {
                FormatStrategy::Ones
            } else {
                FormatStrategy::Random
            };
            let report = tb.stego_format(&file_path, strategy, progress)?;
            if json_output {
                output::print_json(&report)?;
            } else {
                output::print_save_result(&format!("Formatted ({})", strategy), &report);
            }
        }
        StegoCommands::Info { file_path } => {
            let info = tb.stego_info(&file_path)?;
            if json_output {
                output::print_json(&info)?;
            } else {
                output::print_stego_info(&info);
            }
        }
    }
    Ok(())
}

/// Print a formatted error message with actionable hints to stderr.
fn print_error(error: &ToolboxError) {
    eprintln!("{} {}", "ERROR:".red().bold(), error);

    // Provide actionable guidance
    match error {
        ToolboxError::ConfigError(_) => {
            eprintln!(
                "{}",
                "Hint: Check your toolbox.toml or the TOOLBOX_* environment variables.".dimmed()
            );
        }
        ToolboxError::InvalidContainer { .. } | ToolboxError::ValidationFailed(_) => {
            eprintln!(
                "{}",
                "Hint: Run 'toolbox image stego initialize <file>' to create a container, and check --lsb matches the one used to write it."
                    .dimmed()
            );
        }
        ToolboxError::ChecksumMismatch { .. } => {
            eprintln!(
                "{}",
                "Hint: The payload was modified outside toolbox or the image was re-encoded lossily."
                    .dimmed()
            );
        }
        ToolboxError::CapacityExceeded { .. } => {
            eprintln!(
                "{}",
                "Hint: Use a larger image or raise --lsb to store more bits per channel.".dimmed()
            );
        }
        ToolboxError::AlreadyInitialized { .. } => {
            eprintln!(
                "{}",
                "Hint: Pass --force to overwrite the existing container.".dimmed()
            );
        }
        ToolboxError::ToolNotFound(_) => {
            eprintln!(
                "{}",
                "Hint: Install ffmpeg or point TOOLBOX_FFMPEG / [video] ffmpeg at the binary."
                    .dimmed()
            );
        }
        _ => {}
    }
}
