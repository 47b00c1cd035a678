//! movetpl-cli — bibliothèque interne du binaire `movetpl`
//!
//! But : garder la logique des commandes testable, séparée du parsing
//! d'arguments (laissé à `main.rs`).
//!
//! Points clés :
//! - Entrée : module Move en base64 (fichier ou stdin), ou manifeste de package JSON
//! - `inspect` → listing texte, JSON (`ModuleView`) ou résumé une ligne
//! - `edit` / `package` → applique un [`config::TemplateConfig`] puis ré-encode (vérifié)
//! - `verify` → aller-retour décodage/encodage octet à octet
//! - Traces (`feature = "trace"`) et couleurs (`feature = "color"`) optionnelles

#![deny(unused_must_use)]
#![forbid(unsafe_code)]

use std::{
    fs,
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tempfile::NamedTempFile;

#[cfg(feature = "color")]
use owo_colors::OwoColorize;

use movetpl_module::{decode, encode, AliasTable, Module, ModuleView};

/// Fichier de configuration des templates.
pub mod config;
/// Manifeste de package (`--dump-bytecode-as-base64`).
pub mod manifest;

use config::TemplateConfig;
use manifest::{decode_base64, PackageManifest};

// ───────────────────────────── Types publics ─────────────────────────────

/// Commande haut-niveau (sans parsing CLI — réservé à main.rs).
#[derive(Clone, Debug)]
pub enum Command {
    /// Afficher le contenu d'un module.
    Inspect(InspectTask),
    /// Instancier un module template.
    Edit(EditTask),
    /// Instancier le module template d'un manifeste de package.
    Package(PackageTask),
    /// Vérifier l'aller-retour octet à octet.
    Verify(VerifyTask),
}

/// Rendu d'`inspect`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InspectFormat {
    /// Listing lisible.
    #[default]
    Listing,
    /// `ModuleView` en JSON.
    Json,
    /// Une ligne.
    Summary,
}

/// `inspect`
#[derive(Clone, Debug, Default)]
pub struct InspectTask {
    /// Module base64.
    pub input: Input,
    /// Format de sortie.
    pub format: InspectFormat,
    /// Config dont on lit les alias.
    pub config: Option<PathBuf>,
}

/// `edit`
#[derive(Clone, Debug, Default)]
pub struct EditTask {
    /// Module base64.
    pub input: Input,
    /// Config du template.
    pub config: PathBuf,
    /// Destination du base64 produit.
    pub output: Output,
    /// Autorise l'écrasement.
    pub overwrite: bool,
}

/// `package`
#[derive(Clone, Debug, Default)]
pub struct PackageTask {
    /// Manifeste JSON.
    pub input: Input,
    /// Config du template.
    pub config: PathBuf,
    /// Module visé (obligatoire si le package en contient plusieurs).
    pub module: Option<String>,
    /// Destination du manifeste produit.
    pub output: Output,
    /// Autorise l'écrasement.
    pub overwrite: bool,
}

/// `verify`
#[derive(Clone, Debug, Default)]
pub struct VerifyTask {
    /// Module base64.
    pub input: Input,
}

/// Entrée texte : fichier ou `-` (=stdin).
#[derive(Clone, Debug, Default)]
pub enum Input {
    /// Fichier.
    Path(PathBuf),
    /// Entrée standard.
    #[default]
    Stdin,
}

/// Sortie texte.
#[derive(Clone, Debug, Default)]
pub enum Output {
    /// Fichier (écriture atomique).
    Path(PathBuf),
    /// Sortie standard.
    #[default]
    Stdout,
}

// ───────────────────────────── Initialisation ─────────────────────────────

/// Initialise le logger (feature `trace`). `RUST_LOG` prime sur `level`.
pub fn init_logger(level: log::LevelFilter) {
    #[cfg(feature = "trace")]
    {
        let _ = env_logger::Builder::new()
            .filter_level(level)
            .parse_env("RUST_LOG")
            .format_timestamp_secs()
            .try_init();
    }
    #[cfg(not(feature = "trace"))]
    let _ = level;
}

// ───────────────────────────── Exécution ─────────────────────────────

/// Exécute une commande. Retourne un code de sortie.
pub fn execute(cmd: Command) -> Result<i32> {
    match cmd {
        Command::Inspect(t) => {
            let text = read_text(&t.input)?;
            let aliases = match &t.config {
                Some(p) => TemplateConfig::load(p)?.aliases,
                None => AliasTable::new(),
            };
            let out = inspect_module(&text, t.format, &aliases)?;
            write_text(&Output::Stdout, &out, true)?;
            Ok(0)
        },
        Command::Edit(t) => {
            let text = read_text(&t.input)?;
            let config = TemplateConfig::load(&t.config)?;
            let out = edit_module(&text, &config)?;
            write_text(&t.output, &(out + "\n"), t.overwrite)?;
            status_ok("EDIT", &describe(&t.output));
            Ok(0)
        },
        Command::Package(t) => {
            let text = read_text(&t.input)?;
            let config = TemplateConfig::load(&t.config)?;
            let out = edit_package(&text, &config, t.module.as_deref())?;
            write_text(&t.output, &(out + "\n"), t.overwrite)?;
            status_ok("PACKAGE", &describe(&t.output));
            Ok(0)
        },
        Command::Verify(t) => {
            let text = read_text(&t.input)?;
            let bytes = decode_base64(&text)?;
            verify_module(&bytes)?;
            status_ok("VERIFY", &summary_line(&bytes, &decode(&bytes)?)?);
            Ok(0)
        },
    }
}

/// Rendu d'`inspect` pour un module base64.
pub fn inspect_module(b64: &str, format: InspectFormat, aliases: &AliasTable) -> Result<String> {
    let bytes = decode_base64(b64)?;
    let module = decode(&bytes).context("décodage du module")?;
    log::debug!("{} octets, {} constantes", bytes.len(), module.constants().len());
    Ok(match format {
        InspectFormat::Summary => summary_line(&bytes, &module)? + "\n",
        InspectFormat::Json => serde_json::to_string_pretty(&ModuleView::new(&module, aliases)?)? + "\n",
        InspectFormat::Listing => ModuleView::new(&module, aliases)?.to_string(),
    })
}

/// Instancie un module base64, rend le base64 du résultat.
pub fn edit_module(b64: &str, config: &TemplateConfig) -> Result<String> {
    let bytes = decode_base64(b64)?;
    let out = movetpl_module::instantiate(&bytes, &config.edits(), &config.aliases).context("instanciation du template")?;
    log::info!("module: {} → {} octets", bytes.len(), out.len());
    Ok(STANDARD.encode(out))
}

/// Instancie les modules d'un manifeste et normalise les dépendances.
///
/// La config de premier niveau vise le module choisi (`module`, sinon
/// l'unique module) ; chaque entrée de `config.modules` vise le module de ce
/// nom. Les noms sont résolus avant toute édition.
pub fn edit_package(json: &str, config: &TemplateConfig, module: Option<&str>) -> Result<String> {
    let mut manifest = PackageManifest::from_json(json)?;

    let mut targets: Vec<(usize, &TemplateConfig)> = Vec::new();
    if config.modules.is_empty() || config.has_edits() || module.is_some() {
        targets.push((manifest.select(module)?, config));
    }
    for (name, sub) in &config.modules {
        if !sub.modules.is_empty() {
            bail!("config du module `{name}` : `modules` imbriqué");
        }
        let index = manifest.select(Some(name))?;
        if targets.iter().any(|&(i, _)| i == index) {
            bail!("module `{name}` visé deux fois par la config");
        }
        targets.push((index, sub));
    }

    for (index, c) in targets {
        manifest.apply(index, &c.edits(), c.aliases_or(config))?;
    }
    manifest.normalize_dependencies()?;
    manifest.to_json()
}

/// `encode(decode(b)) == b`, puis le contrôle de l'encodeur.
pub fn verify_module(bytes: &[u8]) -> Result<()> {
    let module = decode(bytes).context("décodage du module")?;
    let out = encode(&module)?;
    if out != bytes {
        let at = out.iter().zip(bytes).position(|(a, b)| a != b).unwrap_or(out.len().min(bytes.len()));
        bail!("ré-encodage différent à l'octet {at} ({} vs {} octets)", out.len(), bytes.len());
    }
    module.encode_checked()?;
    Ok(())
}

/// `v6 flavor=0 732 B crc32=... tables=10 identifiers=20 constants=6 name=template`
pub fn summary_line(bytes: &[u8], module: &Module) -> Result<String> {
    Ok(format!(
        "v{} flavor={} {} B crc32={:08x} tables={} identifiers={} constants={} name={}",
        module.version(),
        module.header().flavor,
        bytes.len(),
        crc32fast::hash(bytes),
        module.table_kinds().len(),
        module.identifiers().len(),
        module.constants().len(),
        module.self_module_name()?.unwrap_or("?"),
    ))
}

// ───────────────────────────── Utilitaires E/S ─────────────────────────────

fn read_text(input: &Input) -> Result<String> {
    match input {
        Input::Stdin => {
            let mut s = String::new();
            io::stdin().read_to_string(&mut s).context("lecture stdin")?;
            Ok(s)
        },
        Input::Path(p) => fs::read_to_string(p).with_context(|| format!("lecture: {}", display(p))),
    }
}

fn write_text(output: &Output, text: &str, overwrite: bool) -> Result<()> {
    match output {
        Output::Stdout => {
            let mut w = BufWriter::new(io::stdout().lock());
            w.write_all(text.as_bytes())?;
            w.flush()?;
        },
        Output::Path(p) => {
            if p.exists() && !overwrite {
                return Err(anyhow!("fichier de sortie existe déjà: {}", display(p)));
            }
            write_bytes_atomic(p, text.as_bytes()).with_context(|| format!("écriture de {}", display(p)))?;
        },
    }
    Ok(())
}

/// Fichier temporaire voisin puis `persist` : la cible n'est jamais à moitié écrite.
fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn describe(output: &Output) -> String {
    match output {
        Output::Path(p) => display(p),
        Output::Stdout => "stdout".into(),
    }
}

fn display(p: &Path) -> String { p.to_string_lossy().to_string() }

// ───────────────────────────── Sorties jolies ─────────────────────────────

fn status_ok(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.green().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{tag} {msg}");
    }
}

// ───────────────────────────── Tests ─────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TEMPLATE_B64: &str = include_str!("../../movetpl-module/tests/data/template_coin.b64");

    fn config(json: &str) -> TemplateConfig { TemplateConfig::from_json(json).unwrap() }

    #[test]
    fn summary_names_the_module() {
        let out = inspect_module(TEMPLATE_B64, InspectFormat::Summary, &AliasTable::new()).unwrap();
        assert!(out.starts_with("v6 flavor=0 732 B crc32="), "{out}");
        assert!(out.ends_with("tables=10 identifiers=20 constants=6 name=template\n"), "{out}");
    }

    #[test]
    fn json_view_uses_aliases() {
        let aliases = config(r#"{"aliases": {"constant_1": "DECIMALS"}}"#).aliases;
        let out = inspect_module(TEMPLATE_B64, InspectFormat::Json, &aliases).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["constants"][1]["label"], "DECIMALS");
        assert_eq!(v["constants"][1]["display_value"], "6");
        assert_eq!(v["module_name"], "template");
    }

    #[test]
    fn listing_shows_constants() {
        let out = inspect_module(TEMPLATE_B64, InspectFormat::Listing, &AliasTable::new()).unwrap();
        assert!(out.contains("constant_2: vector<u8> = Wrapper Tokenized Symbol"), "{out}");
    }

    #[test]
    fn edit_then_verify() {
        let c = config(
            r#"{
                "module_name": "gold",
                "aliases": {"constant_0": "TOTAL_SUPPLY"},
                "constants": {"TOTAL_SUPPLY": "2500000", "constant_2": "GLD"}
            }"#,
        );
        let out = edit_module(TEMPLATE_B64, &c).unwrap();
        let bytes = decode_base64(&out).unwrap();
        verify_module(&bytes).unwrap();
        let m = decode(&bytes).unwrap();
        assert_eq!(m.constant(0).unwrap().display_value(), "2500000");
        assert_eq!(m.self_module_name().unwrap(), Some("gold"));
    }

    #[test]
    fn bad_value_is_reported_with_context() {
        let c = config(r#"{"constants": {"constant_1": "256"}}"#);
        let err = edit_module(TEMPLATE_B64, &c).unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("instanciation du template"), "{text}");
        assert!(text.contains("constant 1"), "{text}");
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(verify_module(b"\xA1\x1C\xEB\x0B\x06\x00\x00\x00").is_err());
        assert!(decode_base64("not base64!").is_err());
    }

    #[test]
    fn package_roundtrip() {
        let manifest = format!(r#"{{"modules": ["{}"], "dependencies": ["0x1", "0x2"], "digest": [1]}}"#, TEMPLATE_B64.trim());
        let out = edit_package(&manifest, &config(r#"{"module_name": "gold"}"#), None).unwrap();
        let m = PackageManifest::from_json(&out).unwrap();
        assert_eq!(m.module_names().unwrap(), [Some("gold".to_string())]);
        assert_eq!(m.dependencies[1], format!("0x{}2", "0".repeat(63)));
        assert_eq!(m.digest, [1]);
    }

    fn silver_b64() -> String {
        let c = config(r#"{"module_name": "silver"}"#);
        edit_module(TEMPLATE_B64, &c).unwrap()
    }

    #[test]
    fn package_edits_every_configured_module() {
        let manifest = format!(r#"{{"modules": ["{}", "{}"]}}"#, TEMPLATE_B64.trim(), silver_b64());
        let c = config(
            r#"{
                "aliases": {"constant_1": "DECIMALS"},
                "modules": {
                    "template": {"module_name": "gold"},
                    "silver": {"constants": {"DECIMALS": "9"}}
                }
            }"#,
        );
        let out = PackageManifest::from_json(&edit_package(&manifest, &c, None).unwrap()).unwrap();
        assert_eq!(out.module_names().unwrap(), [Some("gold".to_string()), Some("silver".to_string())]);
        let silver = decode(&decode_base64(&out.modules[1]).unwrap()).unwrap();
        assert_eq!(silver.constant(1).unwrap().display_value(), "9");
        let gold = decode(&decode_base64(&out.modules[0]).unwrap()).unwrap();
        assert_eq!(gold.constant(1).unwrap().display_value(), "6");
    }

    #[test]
    fn package_rejects_a_module_targeted_twice() {
        let manifest = format!(r#"{{"modules": ["{}", "{}"]}}"#, TEMPLATE_B64.trim(), silver_b64());
        let c = config(r#"{"module_name": "gold", "modules": {"template": {"module_name": "lead"}}}"#);
        let err = edit_package(&manifest, &c, Some("template")).unwrap_err();
        assert!(format!("{err:#}").contains("deux fois"), "{err:#}");
        assert!(edit_package(&manifest, &config(r#"{"modules": {"copper": {}}}"#), None).is_err());
    }

    #[test]
    fn write_refuses_to_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.b64");
        let out = Output::Path(path.clone());
        write_text(&out, "one", false).unwrap();
        assert!(write_text(&out, "two", false).is_err());
        write_text(&out, "two", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
        // aucun fichier temporaire ne reste à côté
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn execute_edit_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("template.b64");
        let cfg = dir.path().join("template.json");
        let output = dir.path().join("gold.b64");
        fs::write(&input, TEMPLATE_B64).unwrap();
        fs::write(&cfg, r#"{"module_name": "gold"}"#).unwrap();

        let code = execute(Command::Edit(EditTask {
            input: Input::Path(input),
            config: cfg,
            output: Output::Path(output.clone()),
            overwrite: false,
        }))
        .unwrap();
        assert_eq!(code, 0);
        let written = fs::read_to_string(&output).unwrap();
        let m = decode(&decode_base64(&written).unwrap()).unwrap();
        assert_eq!(m.self_module_name().unwrap(), Some("gold"));
    }
}
