//! Tensor files on disk.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use numy_core::{Shape, Tensor};
use tracing::debug;

use crate::codec::{read_payload, write_tensor, TensorHeader};
use crate::error::PersistError;
use crate::HEADER_LEN;

/// Write `tensor` to `path`, creating or truncating the file.
///
/// Succeeds only once header and payload are written and flushed.
pub fn save(path: impl AsRef<Path>, tensor: &Tensor) -> Result<(), PersistError> {
    let path = path.as_ref();
    let mut w = BufWriter::new(File::create(path)?);
    write_tensor(&mut w, tensor)?;
    w.flush()?;
    w.into_inner()
        .map_err(|e| PersistError::Io(e.into_error()))?
        .sync_all()?;
    debug!(path = %path.display(), elements = tensor.element_count(), "tensor saved");
    Ok(())
}

/// A tensor file whose header has been read and validated but whose
/// payload has not been allocated yet.
///
/// Callers inspect [`shape`](Self::shape) against their own limits before
/// committing memory with [`read`](Self::read).
#[derive(Debug)]
pub struct PendingLoad {
    path: PathBuf,
    shape: Shape,
    reader: BufReader<File>,
}

impl PendingLoad {
    /// Shape declared by the header.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Allocate the tensor and read its payload.
    pub fn read(mut self) -> Result<Tensor, PersistError> {
        let tensor = read_payload(&mut self.reader, self.shape)?;
        debug!(path = %self.path.display(), elements = tensor.element_count(), "tensor loaded");
        Ok(tensor)
    }
}

/// Open `path` and validate its header.
///
/// The file must be long enough to hold the payload the header declares,
/// so a short file is rejected before any payload storage is allocated.
pub fn open(path: impl AsRef<Path>) -> Result<PendingLoad, PersistError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let shape = TensorHeader::decode(&mut reader)?.validate()?;
    let remaining = file_len.saturating_sub(HEADER_LEN as u64);
    if remaining < shape.byte_size() as u64 {
        return Err(PersistError::corrupt(format!(
            "payload needs {} bytes but the file has {remaining} after the header",
            shape.byte_size()
        )));
    }
    Ok(PendingLoad {
        path: path.to_path_buf(),
        shape,
        reader,
    })
}

/// Read a tensor previously written by [`save`].
pub fn load(path: impl AsRef<Path>) -> Result<Tensor, PersistError> {
    open(path)?.read()
}

#[cfg(test)]
mod tests {
    use super::*;
    use numy_core::{MAX_RANK, TENSOR_TAG};

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(dir.path().join("absent.bin")),
            Err(PersistError::Io(_))
        ));
    }

    #[test]
    fn unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let t = Tensor::from_slice(&[1.0]).unwrap();
        assert!(matches!(
            save(dir.path().join("no/such/dir/t.bin"), &t),
            Err(PersistError::Io(_))
        ));
    }

    #[test]
    fn oversized_header_on_short_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.bin");
        let mut shape = [0u32; MAX_RANK];
        shape[0] = 1 << 28;
        let header = TensorHeader {
            tag: TENSOR_TAG,
            rank: 1,
            shape,
            element_count: 1 << 28,
            byte_size: 1 << 31,
        };
        let mut bytes = Vec::new();
        header.encode(&mut bytes).unwrap();
        bytes.extend_from_slice(&1.0f64.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        match open(&path) {
            Err(PersistError::CorruptFile { reason }) => assert!(reason.contains("payload")),
            other => panic!("expected CorruptFile, got {other:?}"),
        }
        assert!(matches!(load(&path), Err(PersistError::CorruptFile { .. })));
    }

    #[test]
    fn open_exposes_shape_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.bin");
        let mut t = Tensor::from_dims(&[2, 3]).unwrap();
        t.fill(1.25);
        save(&path, &t).unwrap();

        let pending = open(&path).unwrap();
        assert_eq!(pending.shape().dims(), &[2, 3]);
        assert_eq!(pending.read().unwrap(), t);
    }

    #[test]
    fn save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.bin");
        save(&path, &Tensor::from_slice(&[1.0, 2.0, 3.0]).unwrap()).unwrap();
        save(&path, &Tensor::from_slice(&[4.0]).unwrap()).unwrap();
        assert_eq!(load(&path).unwrap().data(), &[4.0]);
    }
}
