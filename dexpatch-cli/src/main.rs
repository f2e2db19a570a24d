use clap::{Parser, Subcommand};
use std::fmt::Display;
use std::path::{Path, PathBuf};

use dexpatch_file::{Pool, Scope, document};
use dexpatch_isa::disassemble;
use dexpatch_patch::{DeclarativePatch, Patch, PatchOutcome, Patcher, Target, declarative};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[cfg(target_env = "msvc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "dexpatch",
    about = "Fingerprint matching and bytecode patching for Dalvik-style class pools"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the methods of a pool document as an instruction listing
    Disasm {
        /// Path to the pool document
        pool: PathBuf,
        /// Only classes with this descriptor
        #[arg(long)]
        class: Option<String>,
        /// Only methods with this name
        #[arg(long)]
        method: Option<String>,
    },
    /// Show the patches defined in patch documents
    List {
        /// Paths to patch documents
        #[arg(required = true)]
        patches: Vec<PathBuf>,
    },
    /// Resolve every fingerprint of the given patches against a pool
    Match {
        /// Path to the pool document
        pool: PathBuf,
        /// Paths to patch documents
        #[arg(required = true)]
        patches: Vec<PathBuf>,
        /// Only the patch with this name
        #[arg(long)]
        patch: Option<String>,
    },
    /// Apply patches to a pool and write the result
    Apply {
        /// Path to the pool document
        pool: PathBuf,
        /// Paths to patch documents
        #[arg(required = true)]
        patches: Vec<PathBuf>,
        /// Output pool document
        #[arg(short, long)]
        output: PathBuf,
        /// Package name of the target application
        #[arg(long)]
        package: Option<String>,
        /// Version of the target application
        #[arg(long, requires = "package")]
        version: Option<String>,
        /// Skip the named patch (repeatable)
        #[arg(long)]
        exclude: Vec<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Disasm {
            pool,
            class,
            method,
        } => cmd_disasm(&pool, class.as_deref(), method.as_deref()),
        Commands::List { patches } => cmd_list(&patches),
        Commands::Match {
            pool,
            patches,
            patch,
        } => cmd_match(&pool, &patches, patch.as_deref()),
        Commands::Apply {
            pool,
            patches,
            output,
            package,
            version,
            exclude,
        } => {
            let target = package.map(|p| Target::new(p, version));
            cmd_apply(&pool, &patches, &output, target, exclude)
        }
    }
}

fn or_exit<T, E: Display>(result: Result<T, E>, what: impl Display) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {what}: {e}");
            std::process::exit(1);
        }
    }
}

fn load_pool(path: &Path) -> Pool {
    or_exit(document::load(path), path.display())
}

fn load_patches(paths: &[PathBuf]) -> Vec<DeclarativePatch> {
    paths
        .iter()
        .flat_map(|p| or_exit(declarative::load(p), p.display()))
        .collect()
}

fn cmd_disasm(path: &Path, class: Option<&str>, method: Option<&str>) {
    let pool = load_pool(path);

    for c in pool.classes() {
        if class.is_some_and(|d| d != c.descriptor()) {
            continue;
        }
        match c.superclass() {
            Some(sup) => println!(".class {} {} extends {sup}", c.access_flags(), c.descriptor()),
            None => println!(".class {} {}", c.access_flags(), c.descriptor()),
        }
        for m in c.methods() {
            if method.is_some_and(|n| n != m.name()) {
                continue;
            }
            println!();
            println!(".method {} {}", m.access_flags(), m.signature());
            if let Some(body) = m.body() {
                println!("    .registers {}", body.register_count());
                for line in disassemble(body.instructions()).lines() {
                    println!("    {line}");
                }
            }
            println!(".end method");
        }
        println!();
    }
}

fn cmd_list(paths: &[PathBuf]) {
    for p in load_patches(paths) {
        println!("{}", p.name());
        if let Some(d) = p.description() {
            println!("  {d}");
        }
        for c in p.compatibility() {
            if c.versions.is_empty() {
                println!("  compatible: {} (any version)", c.package);
            } else {
                println!("  compatible: {} {}", c.package, c.versions.join(", "));
            }
        }
        if !p.dependencies().is_empty() {
            println!("  depends on: {}", p.dependencies().join(", "));
        }
        println!("  edits: {}", p.edit_count());
    }
}

fn cmd_match(pool_path: &Path, paths: &[PathBuf], only: Option<&str>) {
    let pool = load_pool(pool_path);
    let mut unresolved = 0usize;

    for p in load_patches(paths) {
        if only.is_some_and(|n| n != p.name()) {
            continue;
        }
        println!("{}", p.name());
        for (name, _, class_of) in p.fingerprints() {
            let scope = class_of.map_or_else(
                || Scope::Package.to_string(),
                |a| format!("class of `{a}`"),
            );
            match p.resolve(name, &pool) {
                Ok(m) => println!("  {name} [{scope}]: {}", m.method.signature()),
                Err(e) => {
                    unresolved += 1;
                    println!("  {name} [{scope}]: {e}");
                }
            }
        }
    }

    if unresolved > 0 {
        eprintln!("Error: {unresolved} fingerprint(s) did not resolve");
        std::process::exit(1);
    }
}

fn cmd_apply(
    pool_path: &Path,
    paths: &[PathBuf],
    output: &Path,
    target: Option<Target>,
    exclude: Vec<String>,
) {
    let mut pool = load_pool(pool_path);

    let mut patcher = Patcher::new();
    if let Some(t) = target {
        patcher = patcher.with_target(t);
    }
    for name in exclude {
        patcher = patcher.exclude(name);
    }
    let patches = load_patches(paths);
    log::debug!("loaded {} patch(es) from {} document(s)", patches.len(), paths.len());
    for p in patches {
        or_exit(patcher.add(p).map(|_| ()), "patches");
    }

    let reports = or_exit(patcher.apply(&mut pool), "patches");
    let mut failed = 0usize;
    for r in &reports {
        match &r.outcome {
            PatchOutcome::Applied { methods } => {
                println!("applied  {}", r.name);
                for m in methods {
                    println!("         {m}");
                }
            }
            PatchOutcome::Skipped(reason) => println!("skipped  {} ({reason})", r.name),
            PatchOutcome::Failed(e) => {
                failed += 1;
                println!("failed   {}: {e}", r.name);
            }
        }
    }

    or_exit(document::save(&pool, output), output.display());
    log::info!("wrote {}", output.display());

    if failed > 0 {
        eprintln!("Error: {failed} patch(es) failed");
        std::process::exit(1);
    }
}
