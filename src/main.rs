use std::path::PathBuf;
use std::process::ExitCode;

use ibm_at::{catalog, compose, DisplayAdapter, GfxCard, SessionConfig};

const USAGE: &str = "usage: ibm_at <list | check <id> | run <id> [--gfx internal|none|mda|hercules|cga|ega|vga]> [--config FILE]";

struct Args {
    command: String,
    machine: Option<String>,
    config: Option<PathBuf>,
    gfx: Option<GfxCard>,
}

fn parse_gfx(val: &str) -> Option<GfxCard> {
    let card = match val {
        "internal" => GfxCard::Internal,
        "none" => GfxCard::None,
        "mda" => GfxCard::External(DisplayAdapter::Mda),
        "hercules" => GfxCard::External(DisplayAdapter::Hercules),
        "cga" => GfxCard::External(DisplayAdapter::Cga),
        "ega" => GfxCard::External(DisplayAdapter::Ega),
        "vga" => GfxCard::External(DisplayAdapter::Vga),
        _ => return None,
    };
    Some(card)
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let command = args.next().ok_or_else(|| USAGE.to_string())?;

    let mut parsed = Args {
        command,
        machine: None,
        config: None,
        gfx: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let file = args.next().ok_or("--config needs a file")?;
                parsed.config = Some(PathBuf::from(file));
            }
            "--gfx" => {
                let val = args.next().ok_or("--gfx needs a card")?;
                parsed.gfx = Some(parse_gfx(&val).ok_or(format!("unknown card: {val}"))?);
            }
            _ if parsed.machine.is_none() => parsed.machine = Some(arg),
            _ => return Err(format!("unexpected argument: {arg}")),
        }
    }

    Ok(parsed)
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut config = match &args.config {
        Some(path) => match SessionConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => SessionConfig::builder(),
    };
    if let Some(gfx) = args.gfx {
        config = config.set_gfx_card(gfx);
    }

    match (args.command.as_str(), args.machine.as_deref()) {
        ("list", _) => {
            for (machine, available) in catalog::probe_all(&config) {
                let mark = if available { "*" } else { " " };
                println!("{mark} {:<16} {:<6} {}", machine.id, machine.cpu, machine.name);
            }
            ExitCode::SUCCESS
        }
        ("check" | "run", Some(id)) => {
            let Some(machine) = catalog::find(id) else {
                eprintln!("unknown machine: {id}");
                return ExitCode::FAILURE;
            };

            let check_only = args.command == "check";
            match compose(machine, config.set_check_only(check_only)) {
                Ok(_) if check_only => {
                    println!("{}: BIOS present", machine.id);
                    ExitCode::SUCCESS
                }
                Ok(session) => {
                    println!("{} ({}, {})", machine.name, machine.id, machine.cpu);
                    for device in session.devices.instances() {
                        println!("  {:<24} {:?} #{}", device.name, device.slot, device.index);
                    }
                    for (start, count, label) in session.io().bindings() {
                        println!(
                            "  {:04X}-{:04X} {label}",
                            start,
                            start as u32 + count as u32 - 1
                        );
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
        _ => {
            eprintln!("{USAGE}");
            ExitCode::FAILURE
        }
    }
}
