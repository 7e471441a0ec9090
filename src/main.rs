use std::path::PathBuf;
use std::process;

use ambakit::formats::romfs::RomfsDialect;
use ambakit::{repack, unpack, RepackOptions, UnpackOptions};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

/// Unpack and repack Ambarella H22 firmware images.
#[derive(Parser)]
#[command(name = "ambafw", version, about)]
struct Cli {
    /// ROMFS dialect of the target camera family.
    #[arg(long, value_enum, global = true, default_value_t = RomfsType::Sj8pro)]
    romfs: RomfsType,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify a firmware image and extract its sections and ROMFS files.
    Unpack {
        /// Firmware image (`.bin`).
        firmware: PathBuf,
        /// Checksum sidecar (`.ch`); a missing file is only warned about.
        checksum: PathBuf,
        /// Destination directory; must not pre-exist.
        dest: PathBuf,
    },
    /// Rebuild an image and its checksum file from an extracted directory.
    Pack {
        /// Source directory produced by `unpack`, possibly edited.
        source: PathBuf,
        /// Output firmware image (`.bin`); must not pre-exist.
        bin: PathBuf,
        /// Output checksum sidecar (`.ch`); must not pre-exist.
        ch: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RomfsType {
    Sj8pro,
    Sj10pro,
}

impl RomfsType {
    fn dialect(self) -> RomfsDialect {
        match self {
            RomfsType::Sj8pro => RomfsDialect::SJ8PRO,
            RomfsType::Sj10pro => RomfsDialect::SJ10PRO,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let dialect = cli.romfs.dialect();
    match cli.command {
        Command::Unpack {
            firmware,
            checksum,
            dest,
        } => {
            let options = UnpackOptions {
                dialect,
                ..UnpackOptions::default()
            };
            unpack(&firmware, Some(&checksum), &dest, &options)
                .with_context(|| format!("unpacking {}", firmware.display()))?;
        }
        Command::Pack { source, bin, ch } => {
            let options = RepackOptions { dialect };
            repack(&source, &bin, &ch, &options)
                .with_context(|| format!("repacking {}", source.display()))?;
        }
    }
    Ok(())
}
