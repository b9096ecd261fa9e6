//! `objfetch fetch <uri>` – stream an object to a file or stdout.

use anyhow::{Context, Result};
use objfetch_core::location::Location;
use objfetch_core::store::HttpStore;
use std::fs::File;
use std::io::{self, Write};

use crate::cli::filename::filename_from_uri;

pub fn run_fetch(store: &HttpStore, uri: &str, output: Option<&str>) -> Result<()> {
    let location = Location::from_uri("http", uri)?;
    let (mut stream, declared) = store.get(&location)?;

    let mut written: u64 = 0;
    match output {
        Some("-") => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            while let Some(chunk) = stream.next_chunk() {
                out.write_all(&chunk)?;
                written += chunk.len() as u64;
            }
            out.flush()?;
        }
        other => {
            let path = other
                .map(str::to_string)
                .unwrap_or_else(|| filename_from_uri(uri));
            let mut file = File::create(&path).with_context(|| format!("creating {path}"))?;
            while let Some(chunk) = stream.next_chunk() {
                file.write_all(&chunk)?;
                written += chunk.len() as u64;
            }
            println!("Fetched {written} bytes to {path}");
        }
    }

    if let Some(err) = stream.take_error() {
        return Err(err).with_context(|| format!("transfer ended after {written} bytes"));
    }
    if declared != 0 && written != declared {
        tracing::warn!("received {} bytes but the server declared {}", written, declared);
    }
    Ok(())
}
