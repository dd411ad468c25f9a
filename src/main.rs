use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use tracing_subscriber::EnvFilter;

use modget::api::{self, CurseClient, ModRepository};
use modget::core::{install_file, mods_dir};
use modget::error::ModgetError;
use modget::model::ModsManifest;

#[derive(Parser)]
#[command(name = "modget", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search for a mod and install it along with its dependencies
    Install {
        /// Mod name to search for
        mod_name: String,
        /// Minecraft version to install for
        mc_version: String,
    },
    /// List the mods recorded in this version's manifest
    List {
        /// Minecraft version to list for
        mc_version: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("MODGET_LOG"))
        .init();

    let cli = Cli::parse();
    let res = match cli.command {
        Command::Install {
            mod_name,
            mc_version,
        } => install(&mod_name, &mc_version),
        Command::List { mc_version } => list(&mc_version),
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn install(mod_name: &str, mc_version: &str) -> Result<(), ModgetError> {
    let results = api::search_mods(mod_name, mc_version)?;
    if results.is_empty() {
        return Err(ModgetError::NoSearchResults(mod_name.into()));
    }

    for m in &results {
        println!("{}/{} {} ID: {}", m.name, m.slug, m.primary_language, m.id);
        println!("\t{}", m.summary);
        println!();
    }

    let answer = prompt("Mod to install (id): ")?;
    let id: u32 = answer
        .trim()
        .parse()
        .map_err(|_| ModgetError::MiscError(format!("Invalid mod id {:?}", answer.trim())))?;

    let client = CurseClient;
    let files = client.mod_files(id)?;
    let target = files
        .into_iter()
        .filter(|f| f.supports(mc_version))
        .max_by_key(|f| f.uploaded);
    if target.is_none() {
        println!("No file of mod {id} supports Minecraft {mc_version}");
        return Ok(());
    }

    let mods_dir = mods_dir(mc_version)?;
    fs::create_dir_all(&mods_dir)?;
    println!("Installing to {}", mods_dir.display());

    let pb = ProgressBar::new_spinner().with_message("Installing...");
    pb.enable_steady_tick(Duration::from_millis(100));
    let res = install_file(&client, target.as_ref(), mc_version, &mods_dir);
    pb.finish_and_clear();

    for name in res? {
        println!("{name} successfully installed");
    }

    Ok(())
}

fn list(mc_version: &str) -> Result<(), ModgetError> {
    let manifest = ModsManifest::load(mods_dir(mc_version)?)?;
    for name in manifest.mods.keys() {
        println!("{name}");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String, ModgetError> {
    print!("{msg}");
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;

    Ok(buf)
}
