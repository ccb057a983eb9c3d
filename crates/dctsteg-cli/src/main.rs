use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{ArgGroup, Parser};
use zeroize::Zeroizing;

use dctsteg::DEFAULT_DCT_RADIUS;

mod secret;
use secret::SECRET_FD;

/// Hides short messages in the DCT coefficients of JPEG images.
///
/// The message comes from stdin on `--write` and goes to stdout on
/// `--read`; statistics always go to stderr. When SECRET is omitted it is
/// read from file descriptor 4, e.g. `dctsteg --read img.jpeg 4<keyfile`.
#[derive(Parser, Debug)]
#[command(version, about, group = ArgGroup::new("mode").args(["write", "read", "estimate"]))]
struct CliArgs {
    /// Embed stdin as a message into FILE
    #[arg(long, value_name = "FILE")]
    write: Option<PathBuf>,

    /// Recover the hidden message from FILE
    #[arg(long, value_name = "FILE")]
    read: Option<PathBuf>,

    /// Report the embedding capacity of FILE
    #[arg(long, value_name = "FILE")]
    estimate: Option<PathBuf>,

    /// Where --write puts the stego image
    #[arg(long, value_name = "FILE", default_value = "out.jpeg")]
    out: PathBuf,

    /// Key string; read from file descriptor 4 when omitted
    secret: Option<String>,
}

fn main() {
    env_logger::init();

    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            exit(1);
        }
    };
    exit(run(args));
}

fn run(args: CliArgs) -> i32 {
    if let Some(file) = args.write {
        cmd_write(&file, &args.out, args.secret)
    } else if let Some(file) = args.read {
        cmd_read(&file, args.secret)
    } else if let Some(file) = args.estimate {
        if args.secret.is_some() {
            eprintln!("--estimate takes no secret");
            return 302;
        }
        cmd_estimate(&file)
    } else {
        eprintln!("One of --write, --read or --estimate is required");
        2
    }
}

/// Resolves the secret from the argument or the inherited descriptor.
fn obtain_secret(inline: Option<String>) -> Option<Zeroizing<Vec<u8>>> {
    match inline {
        Some(text) => Some(Zeroizing::new(text.into_bytes())),
        None => match secret::read_from_fd(SECRET_FD) {
            Ok(secret) => Some(secret),
            Err(err) => {
                eprintln!("Failed to read secret from file descriptor {SECRET_FD}: {err}");
                None
            }
        },
    }
}

fn cmd_write(file: &Path, out: &Path, inline_secret: Option<String>) -> i32 {
    let Some(secret) = obtain_secret(inline_secret) else {
        return 101;
    };

    let mut data = Vec::new();
    if std::io::stdin().read_to_end(&mut data).is_err() {
        eprintln!("Can't read data from stdin");
        return 3;
    }

    match dctsteg::encode(file, &data, &secret, DEFAULT_DCT_RADIUS, out) {
        Ok(stats) => {
            eprintln!("Embedding OK");
            eprint!("{stats}");
            0
        }
        Err(err) => {
            eprintln!("Embedder failed: {err}");
            10
        }
    }
}

fn cmd_read(file: &Path, inline_secret: Option<String>) -> i32 {
    let Some(secret) = obtain_secret(inline_secret) else {
        return 201;
    };

    match dctsteg::decode(file, &secret, DEFAULT_DCT_RADIUS) {
        Ok((message, stats)) => {
            let mut stdout = std::io::stdout();
            if stdout.write_all(&message).and_then(|_| stdout.flush()).is_err() {
                eprintln!("Can't write the message to stdout");
                return 20;
            }
            eprint!("{stats}");
            eprintln!("Decoding OK, your message is on stdout");
            0
        }
        Err(err) => {
            eprintln!("Decoder failed: {err}");
            20
        }
    }
}

fn cmd_estimate(file: &Path) -> i32 {
    match dctsteg::estimate(file, DEFAULT_DCT_RADIUS) {
        Ok(stats) => {
            eprintln!("Estimating OK");
            eprint!("{stats}");
            0
        }
        Err(err) => {
            eprintln!("Estimator failed: {err}");
            30
        }
    }
}
