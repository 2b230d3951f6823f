//! Host driver for the ISPIF controller.
//!
//! Usage:
//!   ispctl scenario              - Run init/configure/start/frames/stop/release
//!   ispctl scenario -r r.toml    - Same, with routes from a file
//!   ispctl compose --lane rdi0 --channels 5
//!                                - Print the command words for one lane
//!   ispctl dump                  - Initialize a device and print its registers
//!
//! Every command runs against the simulated platform. `-c` loads controller
//! tunables from TOML; `-v`/`-vv` raise the log level.

mod logger;
mod routes;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ispif::sim::SimPlatform;
use ispif::{AppliedCommand, FrameCommand, Ispif, IspifConfig};
use ispif_core::VfeInstance;

use crate::routes::Routes;

#[derive(Parser)]
#[command(name = "ispctl")]
#[command(about = "Drive the ISPIF controller against simulated hardware")]
struct Cli {
    /// Controller configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full routing scenario
    Scenario {
        /// Routing file (default: RDI0 from CSID1, channel 2, version 2)
        #[arg(short, long)]
        routes: Option<PathBuf>,

        /// Start-of-frame interrupts to deliver per lane
        #[arg(short, long, default_value_t = 1)]
        frames: u32,
    },

    /// Print the command words composed for one lane
    Compose {
        /// VFE index
        #[arg(long, default_value_t = 0)]
        vfe: u8,

        /// Lane short name (pix0, rdi0, pix1, rdi1, rdi2)
        #[arg(long)]
        lane: String,

        /// Comma-separated channel ids
        #[arg(long, value_delimiter = ',', required = true)]
        channels: Vec<u8>,

        /// Frame-boundary command
        #[arg(long, value_enum, default_value_t = CommandArg::Enable)]
        command: CommandArg,
    },

    /// Initialize a simulated device and print its register window
    Dump {
        /// Raw version code passed to INIT
        #[arg(long = "csid-version", default_value_t = 2)]
        csid_version: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CommandArg {
    /// Enable at the next frame boundary
    Enable,
    /// Disable at the next frame boundary
    Disable,
    /// Disable immediately
    DisableNow,
}

impl From<CommandArg> for FrameCommand {
    fn from(arg: CommandArg) -> Self {
        match arg {
            CommandArg::Enable => Self::EnableAtBoundary,
            CommandArg::Disable => Self::DisableAtBoundary,
            CommandArg::DisableNow => Self::DisableImmediately,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Scenario { routes, frames } => {
            let routes = match routes {
                Some(path) => Routes::load(&path)?,
                None => Routes::builtin(),
            };
            run_scenario(config, &routes, frames)?;
        }

        Commands::Compose {
            vfe,
            lane,
            channels,
            command,
        } => {
            let vfe = VfeInstance::from_index(vfe).with_context(|| format!("No VFE {vfe}"))?;
            let lane = routes::parse_lane(&lane)?;
            let channels = routes::parse_channels(&channels)?;
            let mut applied = AppliedCommand::RESET;
            for channel in channels.iter() {
                applied.set(lane, channel, vfe, command.into());
            }
            print_word("intf_cmd", applied.primary);
            print_word("intf_cmd_1", applied.secondary);
        }

        Commands::Dump { csid_version } => {
            let ispif = Ispif::new(SimPlatform::new(), config);
            ispif.init(csid_version).context("INIT failed")?;
            let dump = ispif.register_dump()?;
            for row in dump.chunks(4) {
                let words: Vec<String> = row.iter().map(|(_, v)| format!("{v:08x}")).collect();
                println!("{:#05x}: {}", row[0].0, words.join(" "));
            }
            ispif.release()?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<IspifConfig> {
    let Some(path) = path else {
        return Ok(IspifConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    IspifConfig::from_toml_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_word(name: &str, word: u32) {
    if word == AppliedCommand::SENTINEL {
        println!("{name:<10} {word:#010x} (untouched, not written)");
    } else {
        println!("{name:<10} {word:#010x}");
    }
}

fn run_scenario(config: IspifConfig, routes: &Routes, frames: u32) -> Result<()> {
    let request = routes.request()?;
    let ispif = Ispif::new(SimPlatform::new(), config);

    ispif.open();
    ispif.init(routes.version).context("INIT failed")?;
    ispif.configure(&request).context("CONFIGURE failed")?;
    ispif
        .start_frame_boundary(&request)
        .context("START_FRAME_BOUNDARY failed")?;

    let regs = ispif.platform().registers();
    for _ in 0..frames {
        for lane in request.lanes() {
            regs.raise_sof(request.vfe, lane);
        }
    }
    for lane in request.lanes() {
        println!(
            "{} {lane}: {} sof, {} overflow",
            request.vfe,
            ispif.sof_count(request.vfe, lane),
            ispif.overflow_count(request.vfe, lane)
        );
    }
    let applied = ispif.applied_command(request.vfe);
    print_word("intf_cmd", applied.primary);
    print_word("intf_cmd_1", applied.secondary);

    ispif
        .stop_frame_boundary(&request)
        .context("STOP_FRAME_BOUNDARY failed")?;
    ispif.close().context("close failed")?;
    println!("powered {}", if ispif.is_up() { "up" } else { "down" });
    Ok(())
}
