// bcrypt-rust: hash and verify passwords from the command line.
//
// Passwords are read from the terminal without echo, or from stdin with
// --stdin. Nothing sensitive is printed or logged.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use bcrypt_rust::{engine, BcryptHasher, Cost, PasswordHasher, SaltString, Version};
use clap::{Args, Parser, Subcommand};
use rand::rngs::OsRng;
use rpassword::read_password;
use tracing_subscriber::EnvFilter;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "bcrypt-rust", version, about = "Hash and verify passwords with bcrypt")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hash a password and print the bcrypt record
    Hash {
        #[command(flatten)]
        params: HashParams,
        #[command(flatten)]
        input: PasswordInput,
    },
    /// Check a password against a bcrypt record
    Verify {
        /// Stored bcrypt hash, e.g. $2b$12$...
        hash: String,
        #[command(flatten)]
        input: PasswordInput,
    },
    /// Print a fresh salt string ($2b$12$ followed by 22 characters)
    Salt {
        #[command(flatten)]
        params: HashParams,
    },
}

#[derive(Args)]
struct HashParams {
    /// log2 of the key expansion rounds (4-31)
    #[arg(short, long, env = "BCRYPT_COST", default_value_t = Cost::default(), value_parser = parse_cost)]
    cost: Cost,
    /// Revision tag written into the record (2a, 2b or 2y)
    #[arg(long = "revision", env = "BCRYPT_REVISION", default_value_t = Version::TwoB)]
    revision: Version,
}

#[derive(Args)]
struct PasswordInput {
    /// Read the password from the first line of stdin instead of prompting
    #[arg(long)]
    stdin: bool,
    /// Apply Unicode NFKC normalization before hashing
    #[arg(long)]
    normalize: bool,
}

fn parse_cost(s: &str) -> Result<Cost> {
    let cost: u32 = s.parse().context("cost must be a number")?;
    Ok(Cost::new(cost)?)
}

impl HashParams {
    fn hasher(&self) -> BcryptHasher {
        BcryptHasher::default()
            .with_cost(self.cost)
            .with_version(self.revision)
    }
}

impl PasswordInput {
    fn read(&self, prompt: &str) -> Result<Zeroizing<String>> {
        let raw = if self.stdin {
            let mut line = Zeroizing::new(String::new());
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read password from stdin")?;
            let trimmed = line.trim_end_matches(['\r', '\n']).len();
            line.truncate(trimmed);
            line
        } else {
            eprint!("{prompt}");
            io::stderr().flush()?;
            Zeroizing::new(read_password().context("failed to read password")?)
        };

        if self.normalize {
            Ok(Zeroizing::new(raw.nfkc().collect::<String>()))
        } else {
            Ok(raw)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Hash { params, input } => {
            let password = input.read("Enter password to hash: ")?;
            let record = params
                .hasher()
                .hash(password.as_bytes())
                .context("hashing failed")?;
            println!("{record}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { hash, input } => {
            let password = input.read("Enter password to verify: ")?;
            let matched = BcryptHasher::default()
                .verify(password.as_bytes(), hash.trim())
                .context("invalid bcrypt hash")?;
            println!(
                "Password verification: {}",
                if matched { "success" } else { "failed" }
            );
            Ok(if matched {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Salt { params } => {
            let salt = SaltString {
                version: params.revision,
                cost: params.cost,
                salt: engine::generate_salt(&mut OsRng)?,
            };
            println!("{salt}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    run(Cli::parse())
}
