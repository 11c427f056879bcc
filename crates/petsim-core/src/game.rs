//! Player-facing game operations.
//!
//! [`GameManager`] turns menu commands into entity mutations and persists them
//! through the generic [`Repository`](crate::db::Repository). The current owner
//! and active pet live in an explicit [`GameSession`] passed to every call.

use crate::db::Database;
use crate::error::{PetSimError, Result};
use crate::models::{Owner, Pet, PetStatus, PetSummary, Species};

/// The owner and pet the player is currently interacting with.
#[derive(Debug, Default, Clone)]
pub struct GameSession {
    pub owner: Option<Owner>,
    pub active_pet_id: Option<i64>,
}

impl GameSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_pet(&self) -> Option<&Pet> {
        let id = self.active_pet_id?;
        self.owner.as_ref()?.pet_by_id(id)
    }

    fn active_pet_mut(&mut self) -> Option<&mut Pet> {
        let id = self.active_pet_id?;
        self.owner.as_mut()?.pet_by_id_mut(id)
    }

    pub fn has_pets(&self) -> bool {
        self.owner.as_ref().is_some_and(|o| !o.pets.is_empty())
    }

    pub fn clear(&mut self) {
        self.owner = None;
        self.active_pet_id = None;
    }
}

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct LoadedGame {
    pub owner_name: String,
    /// The pet made active, if the owner has any.
    pub active_pet: Option<String>,
    pub pet_count: usize,
}

pub struct GameManager<'db> {
    db: &'db Database,
}

impl<'db> GameManager<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db }
    }

    /// Adopt a new pet of the species named by `species_keyword` (case-insensitive).
    ///
    /// If the session's owner has the same name the pet joins that owner;
    /// otherwise a new owner is created and saved together with the pet.
    pub fn adopt_pet(
        &self,
        session: &mut GameSession,
        owner_name: &str,
        species_keyword: &str,
        pet_name: &str,
    ) -> Result<Pet> {
        let owner_name = required(owner_name, "owner name")?;
        let pet_name = required(pet_name, "pet name")?;
        let species = Species::parse(species_keyword)
            .ok_or_else(|| PetSimError::InvalidSpecies(species_keyword.trim().to_string()))?;

        let pet = Pet::new(pet_name.to_string(), species);

        let adopted = match session.owner.as_mut() {
            Some(owner) if owner.id.is_some() && owner.matches_name(owner_name) => {
                let mut pet = pet;
                pet.owner_id = owner.id;
                self.db.repository::<Pet>().save(&mut pet)?;
                owner.add_pet(pet).clone()
            }
            _ => {
                let mut owner = Owner::new(owner_name.to_string());
                owner.add_pet(pet);
                self.db.repository::<Owner>().save(&mut owner)?;
                let adopted = owner.pets[0].clone();
                session.owner = Some(owner);
                adopted
            }
        };

        session.active_pet_id = adopted.id;
        log::info!(
            "{} adopted {} the {}",
            owner_name,
            adopted.name,
            adopted.species
        );
        Ok(adopted)
    }

    pub fn feed_pet(&self, session: &mut GameSession) -> Result<PetStatus> {
        self.mutate_active_pet(session, Pet::feed)
    }

    pub fn play_with_pet(&self, session: &mut GameSession) -> Result<PetStatus> {
        self.mutate_active_pet(session, Pet::play)
    }

    /// Apply `action` to a copy of the active pet, merge it, and only then
    /// replace the session copy, so a failed write leaves memory unchanged.
    fn mutate_active_pet(
        &self,
        session: &mut GameSession,
        action: fn(&mut Pet),
    ) -> Result<PetStatus> {
        let pet = session.active_pet_mut().ok_or(PetSimError::NoActivePet)?;
        let mut changed = pet.clone();
        action(&mut changed);
        let merged = self.db.repository::<Pet>().update(&changed)?;
        *pet = merged;
        Ok(pet.status())
    }

    /// In-memory only; never touches storage.
    pub fn check_pet_status(&self, session: &GameSession) -> Result<PetStatus> {
        session
            .active_pet()
            .map(Pet::status)
            .ok_or(PetSimError::NoActivePet)
    }

    /// Re-read the session owner from storage and list its pets.
    pub fn list_pets(&self, session: &mut GameSession) -> Result<Vec<PetSummary>> {
        let owner_id = session
            .owner
            .as_ref()
            .and_then(|o| o.id)
            .ok_or(PetSimError::NoOwner)?;

        let Some(owner) = self.db.repository::<Owner>().find_by_id(owner_id)? else {
            // Deleted behind our back.
            session.clear();
            return Err(PetSimError::NoOwner);
        };

        let pets: Vec<PetSummary> = owner.pets.iter().map(PetSummary::from).collect();
        if session
            .active_pet_id
            .is_some_and(|id| owner.pet_by_id(id).is_none())
        {
            session.active_pet_id = None;
        }
        session.owner = Some(owner);
        Ok(pets)
    }

    pub fn update_pet_name(
        &self,
        session: &mut GameSession,
        current_name: &str,
        new_name: &str,
    ) -> Result<Pet> {
        let owner = owner_with_pets(session)?;
        let new_name = required(new_name, "new pet name")?;
        let pet = owner
            .find_pet_mut(current_name)
            .ok_or_else(|| PetSimError::PetNotFound(current_name.trim().to_string()))?;

        let mut renamed = pet.clone();
        renamed.name = new_name.to_string();
        let merged = self.db.repository::<Pet>().update(&renamed)?;
        *pet = merged.clone();
        Ok(merged)
    }

    pub fn delete_pet(&self, session: &mut GameSession, name: &str) -> Result<Pet> {
        let owner = owner_with_pets(session)?;
        let pet = owner
            .find_pet(name)
            .cloned()
            .ok_or_else(|| PetSimError::PetNotFound(name.trim().to_string()))?;

        self.db.repository::<Pet>().delete(&pet)?;
        let removed = owner.remove_pet(&pet.name).unwrap_or(pet);

        if removed.id.is_some() && session.active_pet_id == removed.id {
            session.active_pet_id = None;
        }
        log::info!("Deleted pet {}", removed.name);
        Ok(removed)
    }

    /// Flush the session owner and its pets. Writes are already eager, so this is idempotent.
    pub fn save_game(&self, session: &mut GameSession) -> Result<Owner> {
        if session.active_pet().is_none() {
            return Err(PetSimError::NoActivePet);
        }
        let owner = session.owner.as_ref().ok_or(PetSimError::NoOwner)?;
        let merged = self.db.repository::<Owner>().update(owner)?;
        session.owner = Some(merged.clone());
        Ok(merged)
    }

    /// Load the first saved owner, or the first whose name matches `owner_name`.
    /// The owner's first pet becomes active.
    pub fn load_game(
        &self,
        session: &mut GameSession,
        owner_name: Option<&str>,
    ) -> Result<LoadedGame> {
        let owners = self.db.repository::<Owner>().find_all()?;
        let owner_name = owner_name.map(str::trim).filter(|n| !n.is_empty());

        let owner = match owner_name {
            Some(name) => owners.into_iter().find(|o| o.matches_name(name)),
            None => owners.into_iter().next(),
        }
        .ok_or(PetSimError::NoSavedGame)?;

        let first_pet = owner.pets.first();
        let loaded = LoadedGame {
            owner_name: owner.name.clone(),
            active_pet: first_pet.map(|p| p.name.clone()),
            pet_count: owner.pets.len(),
        };
        session.active_pet_id = first_pet.and_then(|p| p.id);
        session.owner = Some(owner);

        log::info!(
            "Loaded game for {} ({} pets)",
            loaded.owner_name,
            loaded.pet_count
        );
        Ok(loaded)
    }
}

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PetSimError::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(value)
}

fn owner_with_pets(session: &mut GameSession) -> Result<&mut Owner> {
    match session.owner.as_mut() {
        Some(owner) if !owner.pets.is_empty() => Ok(owner),
        _ => Err(PetSimError::NoPets),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn adopt(db: &Database, session: &mut GameSession, pet: &str, species: &str) -> Pet {
        GameManager::new(db)
            .adopt_pet(session, "Alice", species, pet)
            .unwrap()
    }

    #[test]
    fn test_adopt_each_species_case_insensitive() {
        let db = setup();
        let gm = GameManager::new(&db);
        for (keyword, expected) in [
            ("dog", Species::Dog),
            ("CAT", Species::Cat),
            ("DrAgOn", Species::Dragon),
        ] {
            let mut session = GameSession::new();
            let pet = gm.adopt_pet(&mut session, "Alice", keyword, "Buddy").unwrap();
            assert_eq!(pet.species, expected);
            assert_eq!(session.active_pet().map(|p| p.species), Some(expected));
        }
    }

    #[test]
    fn test_adopt_invalid_species_creates_nothing() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();

        let result = gm.adopt_pet(&mut session, "Alice", "hamster", "Fluffy");
        assert!(matches!(result, Err(PetSimError::InvalidSpecies(ref s)) if s == "hamster"));
        assert!(session.owner.is_none());
        assert!(session.active_pet_id.is_none());
        assert_eq!(db.owner_count().unwrap(), 0);
        assert_eq!(db.pet_count().unwrap(), 0);
    }

    #[test]
    fn test_adopt_rejects_blank_names() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        assert!(matches!(
            gm.adopt_pet(&mut session, "  ", "dog", "Rex"),
            Err(PetSimError::InvalidInput(_))
        ));
        assert!(matches!(
            gm.adopt_pet(&mut session, "Alice", "dog", ""),
            Err(PetSimError::InvalidInput(_))
        ));
        assert_eq!(db.owner_count().unwrap(), 0);
    }

    #[test]
    fn test_adopt_then_list() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        gm.adopt_pet(&mut session, "Alice", "Dog", "Rex").unwrap();

        let pets = gm.list_pets(&mut session).unwrap();
        assert_eq!(
            pets,
            vec![PetSummary {
                name: "Rex".to_string(),
                species: Species::Dog
            }]
        );
    }

    #[test]
    fn test_adopt_same_owner_adds_pet() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        gm.adopt_pet(&mut session, "Alice", "dog", "Rex").unwrap();
        let tom = gm.adopt_pet(&mut session, "alice", "cat", "Tom").unwrap();

        assert_eq!(db.owner_count().unwrap(), 1);
        assert_eq!(session.active_pet_id, tom.id);
        let names: Vec<String> = gm
            .list_pets(&mut session)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Rex", "Tom"]);
    }

    #[test]
    fn test_adopt_different_owner_starts_new_owner() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        gm.adopt_pet(&mut session, "Alice", "dog", "Rex").unwrap();
        gm.adopt_pet(&mut session, "Bob", "dragon", "Smaug").unwrap();

        assert_eq!(db.owner_count().unwrap(), 2);
        assert_eq!(session.owner.as_ref().unwrap().name, "Bob");
        assert_eq!(gm.list_pets(&mut session).unwrap().len(), 1);
    }

    #[test]
    fn test_feed_and_play_without_pet() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();

        assert!(matches!(gm.feed_pet(&mut session), Err(PetSimError::NoActivePet)));
        assert!(matches!(gm.play_with_pet(&mut session), Err(PetSimError::NoActivePet)));
        assert!(matches!(gm.check_pet_status(&session), Err(PetSimError::NoActivePet)));
        assert_eq!(
            PetSimError::NoActivePet.to_string(),
            "You need to adopt a pet first."
        );
        assert_eq!(db.owner_count().unwrap(), 0);
        assert_eq!(db.pet_count().unwrap(), 0);
    }

    #[test]
    fn test_feed_persists_stats() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        let pet = adopt(&db, &mut session, "Rex", "dog");

        let status = gm.feed_pet(&mut session).unwrap();
        assert_eq!(status.hunger, 30);
        assert_eq!(status.happiness, 55);

        let stored = db.repository::<Pet>().find_by_id(pet.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.hunger, 30);
        assert_eq!(stored.happiness, 55);
    }

    #[test]
    fn test_play_persists_stats() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        let pet = adopt(&db, &mut session, "Tom", "cat");

        gm.play_with_pet(&mut session).unwrap();
        let status = gm.play_with_pet(&mut session).unwrap();
        assert_eq!(status.happiness, 80);
        assert_eq!(status.hunger, 70);
        assert!(status.hungry);
        assert_eq!(status.mood, "Ecstatic");

        let stored = db.repository::<Pet>().find_by_id(pet.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.happiness, 80);
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        let pet = adopt(&db, &mut session, "Rex", "dog");

        db.conn()
            .execute("DELETE FROM pets WHERE id = ?1", [pet.id.unwrap()])
            .unwrap();
        assert!(matches!(gm.feed_pet(&mut session), Err(PetSimError::NotFound { .. })));
        assert_eq!(session.active_pet().unwrap().hunger, 50);
    }

    #[test]
    fn test_status_reads_memory_only() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        adopt(&db, &mut session, "Smaug", "dragon");

        let status = gm.check_pet_status(&session).unwrap();
        assert_eq!(status.name, "Smaug");
        assert_eq!(status.sound, "Smaug says: Rawr!");
        assert_eq!(status.mood, "Content");
    }

    #[test]
    fn test_list_without_owner() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        assert!(matches!(gm.list_pets(&mut session), Err(PetSimError::NoOwner)));
    }

    #[test]
    fn test_rename_then_list() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        adopt(&db, &mut session, "Rex", "dog");

        let renamed = gm.update_pet_name(&mut session, "rex", "Max").unwrap();
        assert_eq!(renamed.name, "Max");

        let names: Vec<String> = gm
            .list_pets(&mut session)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Max"]);
        assert_eq!(session.active_pet().unwrap().name, "Max");
    }

    #[test]
    fn test_rename_matches_accented_name_in_any_case() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        let pet = adopt(&db, &mut session, "Émile", "cat");

        gm.update_pet_name(&mut session, "émile", "Max").unwrap();

        let names: Vec<String> = gm
            .list_pets(&mut session)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Max"]);
        let stored = db.repository::<Pet>().find_by_id(pet.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.name, "Max");
    }

    #[test]
    fn test_rename_missing_pet_writes_nothing() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        let pet = adopt(&db, &mut session, "Rex", "dog");

        let result = gm.update_pet_name(&mut session, "Fido", "Max");
        assert!(matches!(result, Err(PetSimError::PetNotFound(ref n)) if n == "Fido"));
        let stored = db.repository::<Pet>().find_by_id(pet.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.name, "Rex");
    }

    #[test]
    fn test_rename_without_pets() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        assert!(matches!(
            gm.update_pet_name(&mut session, "Rex", "Max"),
            Err(PetSimError::NoPets)
        ));
    }

    #[test]
    fn test_delete_pet_removes_from_memory_and_storage() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        adopt(&db, &mut session, "Rex", "dog");
        adopt(&db, &mut session, "Tom", "cat");

        let removed = gm.delete_pet(&mut session, "REX").unwrap();
        assert_eq!(removed.name, "Rex");
        assert_eq!(removed.owner_id, None);
        assert_eq!(session.owner.as_ref().unwrap().pets.len(), 1);
        assert_eq!(db.pet_count().unwrap(), 1);

        let names: Vec<String> = gm
            .list_pets(&mut session)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Tom"]);
    }

    #[test]
    fn test_delete_active_pet_clears_it() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        adopt(&db, &mut session, "Rex", "dog");

        gm.delete_pet(&mut session, "Rex").unwrap();
        assert!(session.active_pet_id.is_none());
        assert!(matches!(gm.feed_pet(&mut session), Err(PetSimError::NoActivePet)));
        assert!(matches!(gm.delete_pet(&mut session, "Rex"), Err(PetSimError::NoPets)));
    }

    #[test]
    fn test_delete_missing_pet() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        adopt(&db, &mut session, "Rex", "dog");
        assert!(matches!(
            gm.delete_pet(&mut session, "Max"),
            Err(PetSimError::PetNotFound(_))
        ));
        assert_eq!(db.pet_count().unwrap(), 1);
    }

    #[test]
    fn test_save_requires_pet() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        assert!(matches!(gm.save_game(&mut session), Err(PetSimError::NoActivePet)));
    }

    #[test]
    fn test_save_is_idempotent() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        adopt(&db, &mut session, "Rex", "dog");
        gm.feed_pet(&mut session).unwrap();

        let first = gm.save_game(&mut session).unwrap();
        let second = gm.save_game(&mut session).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.pets[0].hunger, 30);
        assert_eq!(db.pet_count().unwrap(), 1);
    }

    #[test]
    fn test_load_without_saves() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();

        let result = gm.load_game(&mut session, None);
        assert!(matches!(result, Err(PetSimError::NoSavedGame)));
        assert_eq!(PetSimError::NoSavedGame.to_string(), "No saved game found.");
        assert!(session.owner.is_none());
        assert!(session.active_pet_id.is_none());
    }

    #[test]
    fn test_load_round_trip() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        adopt(&db, &mut session, "Rex", "Dog");
        gm.play_with_pet(&mut session).unwrap();
        drop(session);

        let mut fresh = GameSession::new();
        let loaded = gm.load_game(&mut fresh, None).unwrap();
        assert_eq!(loaded.owner_name, "Alice");
        assert_eq!(loaded.active_pet.as_deref(), Some("Rex"));
        assert_eq!(fresh.active_pet().unwrap().happiness, 65);

        let pets = gm.list_pets(&mut fresh).unwrap();
        assert_eq!(pets.len(), 1);
        assert_eq!(pets[0].name, "Rex");
        assert_eq!(pets[0].species, Species::Dog);
    }

    #[test]
    fn test_load_picks_first_owner_or_named_owner() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        gm.adopt_pet(&mut session, "Alice", "dog", "Rex").unwrap();
        gm.adopt_pet(&mut session, "Bob", "cat", "Tom").unwrap();

        let mut fresh = GameSession::new();
        assert_eq!(gm.load_game(&mut fresh, None).unwrap().owner_name, "Alice");
        assert_eq!(gm.load_game(&mut fresh, Some("  ")).unwrap().owner_name, "Alice");

        let loaded = gm.load_game(&mut fresh, Some("bob")).unwrap();
        assert_eq!(loaded.owner_name, "Bob");
        assert_eq!(fresh.active_pet().unwrap().name, "Tom");

        assert!(matches!(
            gm.load_game(&mut fresh, Some("Carol")),
            Err(PetSimError::NoSavedGame)
        ));
        assert_eq!(fresh.owner.as_ref().unwrap().name, "Bob");
    }

    #[test]
    fn test_load_owner_without_pets() {
        let db = setup();
        let gm = GameManager::new(&db);
        let mut session = GameSession::new();
        adopt(&db, &mut session, "Rex", "dog");
        gm.delete_pet(&mut session, "Rex").unwrap();

        let mut fresh = GameSession::new();
        let loaded = gm.load_game(&mut fresh, None).unwrap();
        assert_eq!(loaded.pet_count, 0);
        assert!(loaded.active_pet.is_none());
        assert!(fresh.owner.is_some());
        assert!(fresh.active_pet_id.is_none());
    }
}
