/// Natural-key upserts, lookups, deletion, and listing.
pub mod instructions;



/// Architecture, register, and addressing-mode persistence.
pub mod metadata;
