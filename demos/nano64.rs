//! Simple command that prints one or '-n count' Nano64 strings

use std::{env, io, io::Write, process::ExitCode};

fn main() -> io::Result<ExitCode> {
    let (count, random) = {
        let mut args = env::args();
        let program = args.next();
        match parse_args(args) {
            Ok(opts) => opts,
            Err(message) => {
                eprintln!("Error: {}", message);
                eprintln!(
                    "Usage: {} [-r] [-n count]",
                    program.as_deref().unwrap_or("nano64")
                );
                return Ok(ExitCode::FAILURE);
            }
        }
    };

    let mut buf = io::BufWriter::new(io::stdout());
    for _ in 0..count {
        let id = if random {
            nano64::nano64_random()
        } else {
            nano64::nano64()
        };
        match id {
            Ok(id) => writeln!(buf, "{}", id)?,
            Err(err) => {
                buf.flush()?;
                eprintln!("Error: {}", err);
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Parses `[-r] [-n count]` into the count (default one) and whether `-r` was given.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<(usize, bool), String> {
    let mut count = None;
    let mut random = false;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-r" => random = true,
            "-n" => {
                if count.is_some() {
                    return Err("option 'n' given more than once".to_owned());
                }
                let Some(n_arg) = args.next() else {
                    return Err("argument to option 'n' missing".to_owned());
                };
                let Ok(c) = n_arg.parse() else {
                    return Err(format!("invalid argument to option 'n': '{}'", n_arg));
                };
                count.replace(c);
            }
            _ => return Err(format!("unrecognized argument '{}'", arg)),
        }
    }
    Ok((count.unwrap_or(1), random))
}
