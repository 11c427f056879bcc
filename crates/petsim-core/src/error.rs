use thiserror::Error;

#[derive(Error, Debug)]
pub enum PetSimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid pet type '{0}'. Choose Dog, Cat or Dragon.")]
    InvalidSpecies(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Pet '{0}' not found.")]
    PetNotFound(String),

    #[error("You need to adopt a pet first.")]
    NoActivePet,

    #[error("You have not adopted any pets yet.")]
    NoOwner,

    #[error("You have no pets.")]
    NoPets,

    #[error("No saved game found.")]
    NoSavedGame,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0} has not been saved yet")]
    NotPersisted(&'static str),

    #[error("{0} is already saved")]
    AlreadyPersisted(&'static str),
}

impl PetSimError {
    /// True for errors caused by what the player typed or did, as opposed to storage failures.
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            PetSimError::Io(_)
                | PetSimError::Database(_)
                | PetSimError::NotFound { .. }
                | PetSimError::NotPersisted(_)
                | PetSimError::AlreadyPersisted(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PetSimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_are_distinguished_from_storage_errors() {
        assert!(PetSimError::NoActivePet.is_user_error());
        assert!(PetSimError::PetNotFound("Rex".to_string()).is_user_error());
        assert!(PetSimError::InvalidSpecies("hamster".to_string()).is_user_error());
        assert!(!PetSimError::NotFound { entity: "pet", id: 1 }.is_user_error());
        assert!(!PetSimError::Database(rusqlite::Error::QueryReturnedNoRows).is_user_error());
    }

    #[test]
    fn test_messages() {
        assert_eq!(PetSimError::PetNotFound("Rex".to_string()).to_string(), "Pet 'Rex' not found.");
        assert_eq!(
            PetSimError::NotFound { entity: "owner", id: 3 }.to_string(),
            "owner 3 not found"
        );
    }
}
