//! depot-dl binary: parse, validate, dispatch, exit
//!
//! Sequencing: no arguments prints usage and exits cleanly; otherwise the
//! argument table is resolved into a [`DownloadConfig`], the optional file
//! filter is compiled (best-effort), a session is brought up once, the
//! single or bulk run executes, and the process exits with the aggregate
//! code.

use depot_dl::{ArgList, DownloadConfig, FileFilter, HttpContentDownloader, batch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    std::process::exit(run(std::env::args().skip(1).collect()).await);
}

/// Drive one invocation, returning the process exit code
///
/// Usage errors print a message and exit 0; only the documented codes
/// (10 for a missing bulk list, engine codes otherwise) are meaningful.
async fn run(tokens: Vec<String>) -> i32 {
    let args = ArgList::new(tokens);
    if args.is_empty() || args.has("-help") || args.has("--help") {
        print_usage();
        return 0;
    }

    init_tracing(args.has("-v"));

    let file_filter = args.get_opt::<String>("-filelist").and_then(|path| {
        match FileFilter::compile(&path) {
            Ok(filter) => {
                info!("using filelist: '{}' ({} entries)", path, filter.len());
                Some(filter)
            }
            Err(e) => {
                // Filters are best-effort: fall back to downloading everything
                warn!("unable to load filelist '{}': {}", path, e);
                None
            }
        }
    });

    let config = match DownloadConfig::resolve(&args, file_filter) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return 0;
        }
    };

    let mut engine = HttpContentDownloader::new(config.clone());
    match batch::run(&config, &mut engine).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "depot_dl=debug"
    } else {
        "depot_dl=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // try_init: the subscriber is already installed on repeat calls in tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn print_usage() {
    println!("\nUsage: depot-dl <parameters> [optional parameters]\n");

    println!("Parameters:");
    println!("\t-app <#>\t\t- the AppID to download (0 reads pairs from depot_list.txt).");
    println!();

    println!("Optional Parameters:");
    println!("\t-depot <#>\t\t- the DepotID to download.");
    println!("\t-manifest <id>\t\t- manifest id of content to download (requires -depot).");
    println!("\t-cellid <#>\t\t- the overridden CellID of the content server to download from.");
    println!("\t-username <user>\t- the username of the account to login to for restricted content.");
    println!("\t-password <pass>\t- the password of the account to login to for restricted content.");
    println!("\t-dir <installdir>\t- the directory in which to place downloaded files.");
    println!("\t-filelist <file.txt>\t- a list of files to download (from the manifest). Can optionally use regex to download only certain files.");
    println!("\t-all-platforms\t\t- downloads all platform-specific depots when -app is used.");
    println!("\t-manifest-only\t\t- downloads a human readable manifest for any depots that would be downloaded.");
    println!("\t-beta <branchname>\t- download from specified branch if available (default: Public).");
    println!("\t-betapassword <pass>\t- branch password if applicable.");
    println!("\t-max-servers <#>\t- maximum number of content servers to use (default: 8).");
    println!("\t-max-downloads <#>\t- maximum number of chunks to download concurrently (default: 4).");
    println!("\t-verify-all\t\t- re-verify all previously downloaded files.");
    println!("\t-force-depot\t\t- download the depot even when it is not listed for the app.");
    println!("\t-v\t\t\t- be verbose, write more information.");
}
