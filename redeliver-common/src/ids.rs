use std::{fmt, sync::Arc};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Wrap an existing identifier
            #[must_use]
            pub fn new(id: impl Into<Arc<str>>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether this identifier is safe to use as a single path component
            ///
            /// Rejects empty values, path separators, traversal patterns and
            /// hidden-file names.
            #[must_use]
            pub fn is_path_safe(&self) -> bool {
                let id = self.as_str();
                !id.is_empty()
                    && !id.contains('/')
                    && !id.contains('\\')
                    && !id.contains("..")
                    && !id.starts_with('.')
                    && !id.contains('\0')
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok(Self::new(s))
            }
        }
    };
}

opaque_id!(
    /// Identifier grouping the messages of one logical send
    ///
    /// Assigned when a batch is first sent and reused unchanged by every
    /// subsequent resend, so that status history for the batch stays
    /// correlated.
    BatchId
);

opaque_id!(
    /// Identifier of a single mail item, unique within its batch
    MessageId
);

impl BatchId {
    /// Mint a fresh batch identifier
    ///
    /// Batch ids are ULIDs, so freshly minted ids sort by creation time.
    #[must_use]
    pub fn generate() -> Self {
        Self::new(ulid::Ulid::new().to_string())
    }
}
