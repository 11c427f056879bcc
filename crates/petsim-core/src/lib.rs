pub mod db;
pub mod error;
pub mod game;
pub mod models;

pub use db::{Database, Entity, Repository};
pub use error::{PetSimError, Result};
pub use game::{GameManager, GameSession, LoadedGame};
pub use models::{Owner, Pet, PetStatus, PetSummary, Species};
