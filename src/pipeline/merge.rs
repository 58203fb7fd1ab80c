use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use noodles::sam;
use tracing::debug;

use crate::io::bam::{index_bam, merge_bams, write_bam};

/// Combine job outputs into the final coordinate-sorted, indexed BAM.
///
/// Each input is internally sorted, so a k-way merge by position keeps the
/// result sorted even when a molecule's records reach back across a bin
/// boundary into the previous bin's range. `outputs` should be in bin plan
/// order; that order only breaks position ties. The merge runs in two
/// stages to bound open file handles: outputs are first combined into
/// intermediates of at most `chunk_size` inputs, then the intermediates are
/// combined into `dst`. Single-input stages degenerate to a rename. Every
/// produced BAM, intermediate or final, is indexed.
///
/// # Errors
///
/// Returns an error when any read, write, rename, or indexing step fails.
pub fn merge_outputs(
    outputs: &[PathBuf],
    dst: &Path,
    header: &sam::Header,
    chunk_size: usize,
    work_dir: &Path,
) -> io::Result<()> {
    if outputs.is_empty() {
        // Still a valid run: emit a record-less but indexed output
        write_bam(dst, header, &[])?;
        index_bam(dst)?;
        return Ok(());
    }

    let chunk_size = chunk_size.max(1);
    let mut intermediates = Vec::new();

    for (i, chunk) in outputs.chunks(chunk_size).enumerate() {
        let intermediate = work_dir.join(format!("merge_{i:05}.bam"));
        combine(chunk, &intermediate, header)?;
        index_bam(&intermediate)?;
        debug!(inputs = chunk.len(), path = %intermediate.display(), "merged chunk");
        intermediates.push(intermediate);
    }

    combine(&intermediates, dst, header)?;
    index_bam(dst)?;

    Ok(())
}

/// Merge `inputs` into `dst`; a single input moves without re-encoding.
fn combine(inputs: &[PathBuf], dst: &Path, header: &sam::Header) -> io::Result<()> {
    if let [only] = inputs {
        move_file(only, dst)
    } else {
        merge_bams(dst, header, inputs)
    }
}

/// Rename, falling back to copy for cross-device moves.
fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    if fs::rename(src, dst).is_err() {
        fs::copy(src, dst)?;
        fs::remove_file(src)?;
    }
    Ok(())
}
