pub mod owner;
pub mod pet;

pub use owner::Owner;
pub use pet::{Pet, PetStatus, PetSummary, Species};

/// Case-insensitive name comparison, folding non-ASCII letters too ("Émile" == "émile").
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
