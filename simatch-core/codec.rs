//! Binary-safe descriptor serialization.
//!
//! Descriptor matrices travel as a flat row-major byte dump at the native
//! element width (1 byte per u8, 4 bytes little-endian per f32). The shape
//! `(N, D)` is side metadata and is never embedded in the stream.

use crate::error::{CoreError, CoreResult};
use crate::{DescriptorMatrix, Descriptors, ElementType};

/// Flatten a descriptor matrix to raw bytes plus its `(rows, cols)` shape.
pub fn encode(descriptors: &Descriptors) -> (Vec<u8>, (usize, usize)) {
    let bytes = match descriptors {
        Descriptors::Binary(m) => m.data().to_vec(),
        Descriptors::Float(m) => {
            let mut out = Vec::with_capacity(m.data().len() * 4);
            for value in m.data() {
                out.extend_from_slice(&value.to_le_bytes());
            }
            out
        }
    };
    (bytes, descriptors.shape())
}

/// Rebuild a descriptor matrix from raw bytes and side-channel shape metadata.
///
/// The byte length must equal `rows * cols * element_width` exactly; anything
/// else fails with `CorruptDescriptorData`. The output owns its storage, so
/// the source buffer can be dropped or reused freely afterwards. A shape with
/// fewer than two rows decodes fine; sparse sets are the matcher's concern.
pub fn decode(
    bytes: &[u8],
    shape: (usize, usize),
    element_type: ElementType,
) -> CoreResult<Descriptors> {
    let (rows, cols) = shape;
    // Shapes arrive off the wire; saturate so an oversized product cannot wrap onto a valid length
    let expected = rows.saturating_mul(cols).saturating_mul(element_type.byte_width());
    if bytes.len() != expected {
        return Err(CoreError::CorruptDescriptorData { expected, actual: bytes.len() });
    }
    match element_type {
        ElementType::U8 => {
            Ok(Descriptors::Binary(DescriptorMatrix::new(bytes.to_vec(), rows, cols)?))
        }
        ElementType::F32 => {
            let mut data = Vec::with_capacity(rows * cols);
            for chunk in bytes.chunks_exact(4) {
                data.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
            }
            Ok(Descriptors::Float(DescriptorMatrix::new(data, rows, cols)?))
        }
    }
}
