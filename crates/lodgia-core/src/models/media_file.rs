use bytes::Bytes;

/// A raw file proposed for a gallery, as handed over by the capture surface.
///
/// Cloning is cheap: the payload is reference-counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn byte_size(&self) -> u64 {
        self.data.len() as u64
    }
}
