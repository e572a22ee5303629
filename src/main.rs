//! rvfs - inspect and move files through the rvfs handle.

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use rvfs::{AccessHints, AccessMode, FileHandle, OpenOptions, VfsConfig};
use std::io::Write;

const COPY_CHUNK: usize = 64 * 1024;

fn hint_args() -> [Arg; 2] {
    [
        Arg::new("mmap")
            .long("mmap")
            .help("Prefer a read-only memory mapping")
            .action(ArgAction::SetTrue),
        Arg::new("unbuffered")
            .long("unbuffered")
            .help("Use a raw descriptor instead of a buffered stream")
            .action(ArgAction::SetTrue),
    ]
}

fn cli() -> Command {
    Command::new("rvfs")
        .version(rvfs::VERSION)
        .about("Read, copy and inspect files through buffered, unbuffered or mapped handles")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Path to a TOML configuration file (requires the `config` feature)"),
        )
        .subcommand(
            Command::new("cat")
                .about("Write a file to stdout")
                .arg(Arg::new("path").required(true))
                .args(hint_args()),
        )
        .subcommand(
            Command::new("copy")
                .about("Copy a file through two handles")
                .arg(Arg::new("src").required(true))
                .arg(Arg::new("dst").required(true))
                .args(hint_args()),
        )
        .subcommand(
            Command::new("stat")
                .about("Show the backend chosen for a file and its size")
                .arg(Arg::new("path").required(true))
                .args(hint_args()),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a file or empty directory")
                .arg(Arg::new("path").required(true)),
        )
}

fn load_config(matches: &ArgMatches) -> Result<VfsConfig> {
    let explicit = matches.get_one::<String>("config");

    #[cfg(feature = "config")]
    {
        let config = match explicit {
            Some(path) => VfsConfig::load(std::path::Path::new(path))?,
            None => VfsConfig::load_default()?,
        };
        Ok(config)
    }

    #[cfg(not(feature = "config"))]
    {
        if explicit.is_some() {
            bail!("--config requires rvfs to be built with the `config` feature");
        }
        Ok(VfsConfig::default())
    }
}

fn requested_hints(matches: &ArgMatches, config: &VfsConfig) -> AccessHints {
    let mut hints = config.default_hints();
    if matches.get_flag("mmap") {
        hints |= AccessHints::MEMORY_MAP;
    }
    if matches.get_flag("unbuffered") {
        hints |= AccessHints::UNBUFFERED;
    }
    hints
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_default()
}

/// Pump `src` into `sink` until a short read signals end of file.
fn pump(src: &mut FileHandle, mut sink: impl FnMut(&[u8]) -> Result<()>) -> Result<u64> {
    let mut buf = vec![0u8; COPY_CHUNK];
    let mut total = 0u64;
    loop {
        let n = src.read(&mut buf)?;
        if n == 0 {
            break;
        }
        sink(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}

fn cat(path: &str, hints: AccessHints, options: &OpenOptions) -> Result<()> {
    let mut handle = FileHandle::open_with(path, AccessMode::Read, hints, options)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    pump(&mut handle, |chunk| Ok(out.write_all(chunk)?))?;
    out.flush()?;
    handle.close()?;
    Ok(())
}

fn copy(src: &str, dst: &str, hints: AccessHints, options: &OpenOptions) -> Result<()> {
    let mut input = FileHandle::open_with(src, AccessMode::Read, hints, options)
        .with_context(|| format!("Cannot open source {src}"))?;
    let write_hints = hints & AccessHints::UNBUFFERED;
    let mut output = FileHandle::open_with(dst, AccessMode::Write, write_hints, options)
        .with_context(|| format!("Cannot open destination {dst}"))?;

    let copied = pump(&mut input, |chunk| {
        let mut rest = chunk;
        while !rest.is_empty() {
            let n = output.write(rest)?;
            if n == 0 {
                bail!("Destination {dst} accepted no bytes");
            }
            rest = &rest[n..];
        }
        Ok(())
    })?;

    input.close()?;
    output.close()?;
    log::info!("Copied {} bytes from {} to {}", copied, src, dst);
    Ok(())
}

fn stat(path: &str, hints: AccessHints, options: &OpenOptions) -> Result<()> {
    let handle = FileHandle::open_with(path, AccessMode::Read, hints, options)?;
    println!("path:    {}", handle.path());
    println!("backend: {:?}", handle.backend_kind());
    println!("hints:   {:?}", handle.hints());
    println!("size:    {}", handle.size());
    handle.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    config.validate()?;
    let options = config.open_options();

    match matches.subcommand() {
        Some(("cat", sub)) => cat(required(sub, "path"), requested_hints(sub, &config), &options),
        Some(("copy", sub)) => copy(
            required(sub, "src"),
            required(sub, "dst"),
            requested_hints(sub, &config),
            &options,
        ),
        Some(("stat", sub)) => stat(required(sub, "path"), requested_hints(sub, &config), &options),
        Some(("rm", sub)) => {
            let path = required(sub, "path");
            if !rvfs::file_handler::delete(path) {
                bail!("Failed to delete {path}");
            }
            Ok(())
        }
        _ => unreachable!("subcommand_required is set"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!rvfs::VERSION.is_empty());
    }

    #[test]
    fn test_cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn test_hint_flags() {
        let matches = cli()
            .try_get_matches_from(["rvfs", "cat", "file.bin", "--mmap"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let hints = requested_hints(sub, &VfsConfig::default());
        assert_eq!(hints, AccessHints::MEMORY_MAP);
    }

    #[test]
    fn test_copy_through_handles() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("dst.bin");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&src, &data).unwrap();

        copy(
            src.to_str().unwrap(),
            dst.to_str().unwrap(),
            AccessHints::MEMORY_MAP,
            &OpenOptions::default(),
        )
        .unwrap();

        assert_eq!(std::fs::read(&dst).unwrap(), data);
    }
}
