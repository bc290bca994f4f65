//! Load command - stream the agent image to stdout or a file

use crate::cache::Downloader;
use crate::cli::args::LoadArgs;
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Execute the load command
pub fn execute(args: LoadArgs, config: &Config) -> CacheResult<()> {
    let downloader = Downloader::from_config(config);
    let source = downloader.resolve_source(args.source.into());
    debug!("Loading agent image from {} source", source);

    let mut image = downloader.load_agent(source)?;

    match args.output {
        Some(path) => {
            let written = write_output(&mut image, &path)?;
            debug!("Wrote {} bytes to {}", written, path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            io::copy(&mut image, &mut out)
                .and_then(|_| out.flush())
                .map_err(|e| CacheError::io("writing agent image to stdout", e))?;
        }
    }

    Ok(())
}

/// Copy `image` to `path` through a sibling temp file so a failed copy never
/// leaves a truncated file at `path`
fn write_output(image: &mut dyn Read, path: &Path) -> CacheResult<u64> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let context = || format!("writing {}", path.display());

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| CacheError::io(context(), e))?;
    let written = {
        let mut out = BufWriter::new(&mut temp);
        io::copy(image, &mut out)
            .and_then(|n| out.flush().map(|()| n))
            .map_err(|e| CacheError::io(context(), e))?
    };
    temp.persist(path)
        .map_err(|e| CacheError::io(context(), e.error))?;
    Ok(written)
}
