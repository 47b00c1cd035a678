//! `movetpl` — CLI des modules Move templates
//!
//! Ici on fait uniquement : parsing d'arguments, initialisation (logger,
//! couleur), et délégation à `movetpl_cli` (lib).

#![forbid(unsafe_code)]

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use movetpl_cli as cli;

// ──────────────────────────── CLI (clap) ────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "movetpl", version, about = "Inspecter, instancier et vérifier des modules Move templates (base64)", long_about = None)]
struct Opt {
    /// Augmente la verbosité (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux (casse la verbosité)
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue, global = true)]
    quiet: bool,

    /// Force la couleur (si la feature `color` est compilée)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,

    /// Sous-commandes
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Afficher tables, identifiants et constantes d'un module base64
    Inspect {
        /// Module base64 (ou - pour stdin)
        input: Option<PathBuf>,
        /// Sortie JSON
        #[arg(long, conflicts_with = "summary")]
        json: bool,
        /// Résumé une ligne
        #[arg(long)]
        summary: bool,
        /// Config dont les alias nomment les constantes
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Instancier un module template, écrire le base64 produit
    Edit {
        /// Module base64 (ou - pour stdin)
        input: Option<PathBuf>,
        /// Config du template (JSON)
        #[arg(short, long)]
        config: PathBuf,
        /// Fichier de sortie (stdout si omis)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Écraser le fichier de sortie
        #[arg(long)]
        overwrite: bool,
    },

    /// Instancier le module template d'un manifeste `--dump-bytecode-as-base64`
    Package {
        /// Manifeste JSON (ou - pour stdin)
        input: Option<PathBuf>,
        /// Config du template (JSON)
        #[arg(short, long)]
        config: PathBuf,
        /// Nom du module à éditer (si le package en contient plusieurs)
        #[arg(short, long)]
        module: Option<String>,
        /// Fichier de sortie (stdout si omis)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Écraser le fichier de sortie
        #[arg(long)]
        overwrite: bool,
    },

    /// Vérifier que décodage puis encodage redonnent les mêmes octets
    Verify {
        /// Module base64 (ou - pour stdin)
        input: Option<PathBuf>,
    },
}

// ──────────────────────────── Entrée / Sortie ────────────────────────────

fn input_from_opt(p: Option<PathBuf>) -> cli::Input {
    match p {
        Some(path) if path.as_os_str() == "-" => cli::Input::Stdin,
        Some(path) => cli::Input::Path(path),
        None => cli::Input::Stdin,
    }
}

fn output_from_opt(p: Option<PathBuf>) -> cli::Output { p.map_or(cli::Output::Stdout, cli::Output::Path) }

// ──────────────────────────── Logger / Verbosité ────────────────────────────

fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

fn init_color(choice: ColorChoice) {
    // `owo-colors` détecte le TTY ; on ne force que sur demande
    match choice {
        ColorChoice::Auto => {},
        ColorChoice::Always => {
            std::env::set_var("CLICOLOR_FORCE", "1");
            std::env::remove_var("NO_COLOR");
        },
        ColorChoice::Never => {
            std::env::set_var("NO_COLOR", "1");
            std::env::remove_var("CLICOLOR_FORCE");
        },
    }
}

// ──────────────────────────── main ────────────────────────────

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> Result<()> {
    use cli::{Command as C, EditTask, InspectFormat, InspectTask, PackageTask, VerifyTask};

    let opt = Opt::parse();

    init_color(opt.color);
    cli::init_logger(log_level(opt.verbose, opt.quiet));

    let command = match opt.cmd {
        Command::Inspect { input, json, summary, config } => {
            let format = match (json, summary) {
                (true, _) => InspectFormat::Json,
                (_, true) => InspectFormat::Summary,
                _ => InspectFormat::Listing,
            };
            C::Inspect(InspectTask { input: input_from_opt(input), format, config })
        },
        Command::Edit { input, config, output, overwrite } => C::Edit(EditTask {
            input: input_from_opt(input),
            config,
            output: output_from_opt(output),
            overwrite,
        }),
        Command::Package { input, config, module, output, overwrite } => C::Package(PackageTask {
            input: input_from_opt(input),
            config,
            module,
            output: output_from_opt(output),
            overwrite,
        }),
        Command::Verify { input } => C::Verify(VerifyTask { input: input_from_opt(input) }),
    };

    let code = cli::execute(command).context("échec d'exécution de la commande")?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
