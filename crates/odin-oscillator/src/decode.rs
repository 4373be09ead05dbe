//! Batch decode: backward resolution, unpacking and verification.

use odin_error::Result;
use odin_types::Coordinate;
use tracing::{debug, warn};

use crate::config::VerifyPolicy;
use crate::resolver::{Resolution, resolve_symbols};
use crate::symbol_codec::unpack;
use crate::verify::verify_content;

/// Bytes recovered from a coordinate plus what the resolver saw on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeReport {
    pub bytes: Vec<u8>,
    pub resolution: Resolution,
    /// `false` only when the coordinate had no hash and the policy allowed it.
    pub verified: bool,
}

/// Recover the bytes a coordinate was encoded from.
///
/// Fails with `AnchorMismatch`, `BackwardDecodeStuck`,
/// `MalformedSymbolStream` or `IntegrityMismatch`; none is retried.
pub fn decode(coord: &Coordinate, policy: VerifyPolicy) -> Result<Vec<u8>> {
    decode_with_report(coord, policy).map(|report| report.bytes)
}

/// Like [`decode`], returning resolution diagnostics alongside the bytes.
pub fn decode_with_report(coord: &Coordinate, policy: VerifyPolicy) -> Result<DecodeReport> {
    let resolution = resolve_symbols(coord)?;
    let bytes = unpack(&resolution.symbols, coord.length_bytes)?;
    if let Err(err) = verify_content(coord, &bytes, policy) {
        if resolution.ambiguous_steps > 0 {
            warn!(
                ambiguous_steps = resolution.ambiguous_steps,
                length_bytes = coord.length_bytes,
                "verification failed after ambiguous backward steps"
            );
        }
        return Err(err);
    }
    debug!(
        length_bytes = coord.length_bytes,
        ambiguous_steps = resolution.ambiguous_steps,
        "decode verified"
    );
    Ok(DecodeReport {
        verified: coord.content_hash.is_some(),
        bytes,
        resolution,
    })
}
