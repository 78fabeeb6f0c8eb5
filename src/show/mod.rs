//! Shows: configuration bound to a data file, a profile variant, and an output tree.

/// Archive expansion into one show per profile variant.
pub mod archive;
/// The show entity.
pub mod model;
