use std::fmt;

/// the two things we relay, they only differ in default content type and a couple of headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Key,
    Segment,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Segment => "segment",
        }
    }

    /// used when the origin doesn't send a Content-Type
    pub fn default_content_type(&self) -> &'static str {
        match self {
            Self::Key => "application/octet-stream",
            Self::Segment => "video/mp2t",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
