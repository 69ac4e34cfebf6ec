use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of build_cli() in src/main.rs, reduced to what completions need.
// Build scripts can't access src/ modules.
fn input() -> Arg {
    Arg::new("input")
        .required(true)
        .index(1)
        .value_hint(ValueHint::FilePath)
}

fn output() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .value_hint(ValueHint::FilePath)
}

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut cmd = Command::new("formula")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert formulas in HTML documents between stored and editable forms")
        .arg(
            Arg::new("config")
                .long("config")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("service-table")
                .long("service-table")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(Command::new("init-parse").arg(input()).arg(output()))
        .subcommand(Command::new("end-parse").arg(input()).arg(output()))
        .subcommand(Command::new("encode").arg(input()))
        .subcommand(Command::new("decode").arg(input()))
        .subcommand(
            Command::new("scan")
                .arg(input())
                .arg(Arg::new("tag").long("tag").required(true))
                .arg(Arg::new("matching").long("matching").action(ArgAction::SetTrue))
                .arg(Arg::new("safe").long("safe").action(ArgAction::SetTrue)),
        )
        .subcommand(Command::new("metrics").arg(input()));

    generate_to(Bash, &mut cmd, "formula", &outdir)?;
    generate_to(Zsh, &mut cmd, "formula", &outdir)?;
    generate_to(Fish, &mut cmd, "formula", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
