//! The blob object: an opaque byte sequence with no internal structure.

use std::fmt::Display;

use super::{ObjectKind, ObjectTrait};
use crate::errors::GitError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Blob { data }
    }
}

impl Display for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "blob ({} bytes)", self.data.len())
    }
}

impl ObjectTrait for Blob {
    fn from_bytes(data: &[u8]) -> Result<Self, GitError> {
        Ok(Blob::new(data.to_vec()))
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Blob
    }

    fn to_data(&self) -> Result<Vec<u8>, GitError> {
        Ok(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_blob_is_valid() {
        let blob = Blob::from_bytes(b"").unwrap();
        assert_eq!(blob.to_data().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn round_trips_arbitrary_bytes() {
        let blob = Blob::from_bytes(b"hello\n").unwrap();
        assert_eq!(blob.to_data().unwrap(), b"hello\n");
    }

    quickcheck::quickcheck! {
        fn codec_round_trip(data: Vec<u8>) -> bool {
            let blob = Blob::from_bytes(&data).unwrap();
            blob.to_data().unwrap() == data
        }
    }
}
