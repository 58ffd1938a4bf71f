//! Stable identifiers for report artifacts.

use std::borrow::Borrow;
use std::fmt;

use smol_str::SmolStr;

macro_rules! artifact_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(SmolStr);

        impl $name {
            /// Create an identifier from its raw string.
            #[inline]
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(SmolStr::new(id.as_ref()))
            }

            /// Get the raw string.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(id: String) -> Self {
                Self(SmolStr::from(id))
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            #[inline]
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

artifact_id!(
    /// Identifier of a bookmark: the reference string used in the bookmark index.
    ///
    /// The definition file for a bookmark lives at `<id>.bookmark.json`.
    BookmarkId,
    "BookmarkId"
);

artifact_id!(
    /// Identifier of a report page (the page folder name).
    PageId,
    "PageId"
);

artifact_id!(
    /// Identifier of a visual (the visual folder name).
    ///
    /// Visual groups use the same id space, since a group is a visual.
    VisualId,
    "VisualId"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_equality() {
        let a = PageId::new("ReportSection1");
        let b = PageId::from("ReportSection1");
        let c = PageId::new("ReportSection2");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_id_borrow_lookup() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(VisualId::new("v1"));
        set.insert(VisualId::new("v2"));
        set.insert(VisualId::new("v1")); // duplicate

        assert_eq!(set.len(), 2);
        assert!(set.contains("v2"));
    }

    #[test]
    fn test_id_display_and_debug() {
        let id = BookmarkId::new("Bookmark1a2b");
        assert_eq!(id.to_string(), "Bookmark1a2b");
        assert_eq!(format!("{:?}", id), "BookmarkId(Bookmark1a2b)");
    }
}
