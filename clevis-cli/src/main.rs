//! clevis-decrypt - dispatcher for pin decryption plugins
//!
//! Reads a JWE from standard input, extracts the pin name recorded in its
//! merged header, and hands the document to the matching plugin executable:
//! `<cmd_dir>/pins/<pin> decrypt` with the canonical JWE on its stdin. On
//! success the plugin's exit status becomes this process's exit status; any
//! validation or setup failure aborts with one line on stderr.

use clap::Parser;
use clevis_jwe::{merge_header, plugin_path, to_canonical_json, ClevisError, PinName, Result};
use log::debug;
use serde_json::Value;
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// Plugin command directory baked in at build time. Setting `CLEVIS_CMD_DIR`
/// in the build environment overrides the fallback.
const DEFAULT_CMD_DIR: &str = match option_env!("CLEVIS_CMD_DIR") {
    Some(dir) => dir,
    None => "/usr/libexec/clevis",
};

#[derive(Parser)]
#[command(name = "clevis-decrypt")]
#[command(about = "Decrypt a JWE by dispatching to its pin plugin")]
#[command(version)]
#[command(override_usage = "clevis-decrypt < JWE")]
struct Cli {
    /// The JWE arrives on standard input; positional arguments are a usage
    /// error.
    #[arg(hide = true)]
    unexpected: Vec<OsString>,
}

fn main() {
    env_logger::builder().format_timestamp(None).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(status) => std::process::exit(status),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    if !cli.unexpected.is_empty() {
        return Err(ClevisError::Usage);
    }

    let jwe = read_jwe(std::io::stdin().lock())?;

    let cmd_dir = resolve_cmd_dir();
    debug!("command directory: {}", cmd_dir.display());

    let header = merge_header(&jwe)?;
    let pin = PinName::from_header(&header)?;
    debug!("pin: {pin}");

    let path = plugin_path(&cmd_dir, &pin)?;
    debug!("plugin: {}", path.display());

    dispatch(&path, &jwe)
}

/// Resolve the base plugin directory. The `CLEVIS_CMD_DIR` override follows
/// the `secure_getenv` contract: it is ignored whenever the process runs
/// with privileges the invoking user lacks.
fn resolve_cmd_dir() -> PathBuf {
    if privilege_elevated() {
        return PathBuf::from(DEFAULT_CMD_DIR);
    }
    std::env::var_os("CLEVIS_CMD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CMD_DIR))
}

fn privilege_elevated() -> bool {
    use nix::unistd::{getegid, geteuid, getgid, getuid};
    getuid() != geteuid() || getgid() != getegid()
}

fn read_jwe(mut input: impl Read) -> Result<Value> {
    let mut raw = Vec::new();
    input
        .read_to_end(&mut raw)
        .map_err(|e| ClevisError::Parse(serde_json::Error::io(e)))?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Spawn the plugin with the canonical JWE piped to its stdin and wait for
/// it, reporting its exit status as our own.
///
/// A separate writer thread feeds the pipe so a plugin that reads its input
/// interactively cannot deadlock against the dispatcher; the pipe's bounded
/// kernel buffering is the only backpressure.
fn dispatch(path: &Path, jwe: &Value) -> Result<i32> {
    let payload = to_canonical_json(jwe)?;

    let mut child = Command::new(path)
        .arg("decrypt")
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|source| ClevisError::Exec {
            path: path.display().to_string(),
            source,
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ClevisError::Spawn("plugin stdin was not captured".into()))?;
    let writer = thread::spawn(move || {
        // A plugin may legitimately exit without draining its input; the
        // resulting broken-pipe write error is the plugin's business.
        let _ = stdin.write_all(&payload);
    });

    let status = child
        .wait()
        .map_err(|e| ClevisError::Spawn(e.to_string()))?;
    let _ = writer.join();

    Ok(exit_code(status))
}

#[cfg(unix)]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn read_jwe_parses_valid_document() {
        let jwe = read_jwe(Cursor::new(b"{\"ciphertext\":\"x\"}".to_vec())).unwrap();
        assert_eq!(jwe, json!({"ciphertext": "x"}));
    }

    #[test]
    fn read_jwe_rejects_invalid_json() {
        for input in [&b"not json"[..], &b""[..], &b"{\"open\":"[..]] {
            match read_jwe(Cursor::new(input.to_vec())) {
                Err(ClevisError::Parse(_)) => {}
                other => panic!("expected Parse error, got {other:?}"),
            }
        }
    }

    #[test]
    fn dispatch_missing_executable_is_exec_error() {
        let jwe = json!({"ciphertext": "x"});
        match dispatch(Path::new("/nonexistent/pins/tang"), &jwe) {
            Err(ClevisError::Exec { path, .. }) => {
                assert_eq!(path, "/nonexistent/pins/tang");
            }
            other => panic!("expected Exec error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn dispatch_propagates_success_status() {
        // `true` ignores both the argument and its stdin.
        let jwe = json!({"ciphertext": "x"});
        let status = dispatch(Path::new("/bin/true"), &jwe).unwrap();
        assert_eq!(status, 0);
    }

    #[cfg(unix)]
    #[test]
    fn dispatch_propagates_failure_status() {
        let jwe = json!({"ciphertext": "x"});
        let status = dispatch(Path::new("/bin/false"), &jwe).unwrap();
        assert_ne!(status, 0);
    }
}
