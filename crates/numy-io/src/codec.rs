//! Binary encode/decode of the tensor file format.
//!
//! Integers and payload values are little-endian. There is no padding and
//! no version byte: the header tag doubles as the format identifier.

use std::io::{Read, Write};

use numy_core::{Shape, Tensor, ELEMENT_SIZE, MAX_RANK, TENSOR_TAG};

use crate::error::PersistError;

// ── Primitive writers ───────────────────────────────────────────

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), PersistError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), PersistError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f64.
pub fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), PersistError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

fn read_array<const N: usize>(r: &mut dyn Read, what: &str) -> Result<[u8; N], PersistError> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)
        .map_err(|e| PersistError::from_read(e, what))?;
    Ok(buf)
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read, what: &str) -> Result<u32, PersistError> {
    read_array(r, what).map(u32::from_le_bytes)
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read, what: &str) -> Result<u64, PersistError> {
    read_array(r, what).map(u64::from_le_bytes)
}

/// Read a little-endian f64.
pub fn read_f64_le(r: &mut dyn Read, what: &str) -> Result<f64, PersistError> {
    read_array(r, what).map(f64::from_le_bytes)
}

// ── Header ──────────────────────────────────────────────────────

/// The fixed-size header that precedes every payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorHeader {
    /// Format sentinel, equal to [`TENSOR_TAG`] in valid files.
    pub tag: u64,
    /// Number of meaningful entries in `shape`.
    pub rank: u32,
    /// Extents; slots at or past `rank` are zero.
    pub shape: [u32; MAX_RANK],
    /// Product of the extents.
    pub element_count: u32,
    /// `element_count * 8`.
    pub byte_size: u32,
}

impl TensorHeader {
    /// Header describing `tensor`.
    pub fn for_tensor(tensor: &Tensor) -> Self {
        let dims = tensor.shape().dims();
        let mut shape = [0u32; MAX_RANK];
        shape[..dims.len()].copy_from_slice(dims);
        // Shape construction already bounds both counts to u32.
        Self {
            tag: tensor.tag(),
            rank: dims.len() as u32,
            shape,
            element_count: tensor.element_count() as u32,
            byte_size: tensor.byte_size() as u32,
        }
    }

    /// Write the header.
    pub fn encode(&self, w: &mut dyn Write) -> Result<(), PersistError> {
        write_u64_le(w, self.tag)?;
        write_u32_le(w, self.rank)?;
        for &extent in &self.shape {
            write_u32_le(w, extent)?;
        }
        write_u32_le(w, self.element_count)?;
        write_u32_le(w, self.byte_size)?;
        Ok(())
    }

    /// Read a header without validating it.
    pub fn decode(r: &mut dyn Read) -> Result<Self, PersistError> {
        let tag = read_u64_le(r, "tag")?;
        let rank = read_u32_le(r, "rank")?;
        let mut shape = [0u32; MAX_RANK];
        for extent in &mut shape {
            *extent = read_u32_le(r, "shape")?;
        }
        let element_count = read_u32_le(r, "element count")?;
        let byte_size = read_u32_le(r, "byte size")?;
        Ok(Self {
            tag,
            rank,
            shape,
            element_count,
            byte_size,
        })
    }

    /// Check internal consistency and return the described shape.
    pub fn validate(&self) -> Result<Shape, PersistError> {
        if self.tag != TENSOR_TAG {
            return Err(PersistError::corrupt(format!(
                "bad tag {:#x}",
                self.tag
            )));
        }
        let rank = self.rank as usize;
        if rank == 0 || rank >= MAX_RANK {
            return Err(PersistError::corrupt(format!("rank {rank} out of range")));
        }
        if self.shape[rank..].iter().any(|&e| e != 0) {
            return Err(PersistError::corrupt("non-zero extent past rank"));
        }
        let shape = Shape::from_extents(&self.shape[..rank])
            .map_err(|e| PersistError::corrupt(format!("invalid shape: {e}")))?;
        if shape.element_count() != self.element_count as usize {
            return Err(PersistError::corrupt(format!(
                "element count {} does not match shape product {}",
                self.element_count,
                shape.element_count()
            )));
        }
        if self.byte_size as usize != shape.element_count() * ELEMENT_SIZE {
            return Err(PersistError::corrupt(format!(
                "byte size {} does not match {} elements",
                self.byte_size, self.element_count
            )));
        }
        Ok(shape)
    }
}

// ── Tensor ──────────────────────────────────────────────────────

/// Write header and payload of `tensor`.
pub fn write_tensor(w: &mut dyn Write, tensor: &Tensor) -> Result<(), PersistError> {
    tensor.check_tag()?;
    TensorHeader::for_tensor(tensor).encode(w)?;
    for &v in tensor.data() {
        write_f64_le(w, v)?;
    }
    Ok(())
}

/// Read and validate a header, then its payload. Bytes after the payload
/// are not consumed.
pub fn read_tensor(r: &mut dyn Read) -> Result<Tensor, PersistError> {
    let shape = TensorHeader::decode(r)?.validate()?;
    read_payload(r, shape)
}

/// Read the payload for an already validated `shape`.
pub fn read_payload(r: &mut dyn Read, shape: Shape) -> Result<Tensor, PersistError> {
    let mut tensor = Tensor::new(shape)?;
    for v in tensor.data_mut() {
        *v = read_f64_le(r, "payload")?;
    }
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HEADER_LEN;

    fn encoded(tensor: &Tensor) -> Vec<u8> {
        let mut buf = Vec::new();
        write_tensor(&mut buf, tensor).unwrap();
        buf
    }

    #[test]
    fn header_is_148_bytes() {
        assert_eq!(HEADER_LEN, 148);
        let t = Tensor::from_dims(&[2, 3]).unwrap();
        assert_eq!(encoded(&t).len(), HEADER_LEN + 6 * 8);
    }

    #[test]
    fn layout_is_little_endian() {
        let t = Tensor::from_slice(&[1.5]).unwrap();
        let buf = encoded(&t);
        assert_eq!(&buf[..8], &TENSOR_TAG.to_le_bytes());
        assert_eq!(&buf[8..12], &1u32.to_le_bytes());
        assert_eq!(&buf[12..16], &1u32.to_le_bytes());
        assert!(buf[16..140].iter().all(|&b| b == 0));
        assert_eq!(&buf[140..144], &1u32.to_le_bytes());
        assert_eq!(&buf[144..148], &8u32.to_le_bytes());
        assert_eq!(&buf[148..], &1.5f64.to_le_bytes());
    }

    #[test]
    fn decode_restores_shape_and_payload() {
        let mut t = Tensor::from_dims(&[3, 2]).unwrap();
        t.assign(&[1.0, -2.0, 3.5, 0.0, 1e300, -0.0]);
        let back = read_tensor(&mut encoded(&t).as_slice()).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.nr_cols(), 3);
        assert_eq!(back.nr_rows(), 2);
    }

    fn corrupt_reason(bytes: &[u8]) -> String {
        match read_tensor(&mut &bytes[..]) {
            Err(PersistError::CorruptFile { reason }) => reason,
            other => panic!("expected CorruptFile, got {other:?}"),
        }
    }

    #[test]
    fn truncation_is_corruption() {
        let buf = encoded(&Tensor::from_slice(&[1.0, 2.0]).unwrap());
        assert!(corrupt_reason(&buf[..20]).contains("shape"));
        assert!(corrupt_reason(&buf[..buf.len() - 1]).contains("payload"));
        assert!(corrupt_reason(&[]).contains("tag"));
    }

    #[test]
    fn inconsistent_headers_are_corruption() {
        let good = encoded(&Tensor::from_dims(&[2, 2]).unwrap());

        let mut bad_tag = good.clone();
        bad_tag[0] ^= 0xff;
        assert!(corrupt_reason(&bad_tag).contains("tag"));

        let mut zero_rank = good.clone();
        zero_rank[8..12].copy_from_slice(&0u32.to_le_bytes());
        assert!(corrupt_reason(&zero_rank).contains("rank"));

        let mut huge_rank = good.clone();
        huge_rank[8..12].copy_from_slice(&32u32.to_le_bytes());
        assert!(corrupt_reason(&huge_rank).contains("rank"));

        let mut bad_count = good.clone();
        bad_count[140..144].copy_from_slice(&5u32.to_le_bytes());
        assert!(corrupt_reason(&bad_count).contains("element count"));

        let mut bad_bytes = good.clone();
        bad_bytes[144..148].copy_from_slice(&31u32.to_le_bytes());
        assert!(corrupt_reason(&bad_bytes).contains("byte size"));

        let mut zero_extent = good;
        zero_extent[12..16].copy_from_slice(&0u32.to_le_bytes());
        assert!(corrupt_reason(&zero_extent).contains("shape"));
    }
}
