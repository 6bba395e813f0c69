//! `securehash-helper`: hashes stdin with one in-process digest
//!
//! Usage: `securehash-helper --algorithm <ID> [SIZE]`. Nothing but protocol
//! lines and a final diagnostic ever reach stderr, so no logger is set up.

use clap::Parser;
use securehash_cli::helper;
use std::io;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "securehash-helper")]
#[command(version, about = "Hash standard input for securehash", long_about = None)]
struct Args {
    /// Digest id (e.g. sha256, md5, crc32)
    #[arg(short, long, required_unless_present = "list")]
    algorithm: Option<String>,

    /// Expected input length in bytes, enables progress lines
    size: Option<String>,

    /// Print the supported digest ids and exit
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.list {
        for id in securehash_core::supported_digests() {
            println!("{id}");
        }
        return ExitCode::SUCCESS;
    }

    let Some(algorithm) = args.algorithm else {
        return ExitCode::from(helper::EXIT_UNSUPPORTED);
    };
    let size_hint = helper::parse_size_hint(args.size.as_deref());

    let result = helper::run(
        &algorithm,
        size_hint,
        io::stdin().lock(),
        io::stdout().lock(),
        io::stderr().lock(),
    );

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("securehash-helper: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
