use super::{names_match, Pet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: Option<i64>,
    pub name: String,
    pub created_at: String,
    pub pets: Vec<Pet>,
}

impl Owner {
    pub fn new(name: String) -> Self {
        Self {
            id: None,
            name,
            created_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            pets: Vec::new(),
        }
    }

    /// Take ownership of a pet, pointing its back-reference at this owner.
    pub fn add_pet(&mut self, mut pet: Pet) -> &mut Pet {
        pet.owner_id = self.id;
        self.pets.push(pet);
        let last = self.pets.len() - 1;
        &mut self.pets[last]
    }

    /// Detach the first pet matching `name` (case-insensitive) and clear its back-reference.
    pub fn remove_pet(&mut self, name: &str) -> Option<Pet> {
        let idx = self.pets.iter().position(|p| p.matches_name(name))?;
        let mut pet = self.pets.remove(idx);
        pet.owner_id = None;
        Some(pet)
    }

    pub fn find_pet(&self, name: &str) -> Option<&Pet> {
        self.pets.iter().find(|p| p.matches_name(name))
    }

    pub fn find_pet_mut(&mut self, name: &str) -> Option<&mut Pet> {
        self.pets.iter_mut().find(|p| p.matches_name(name))
    }

    pub fn pet_by_id(&self, id: i64) -> Option<&Pet> {
        self.pets.iter().find(|p| p.id == Some(id))
    }

    pub fn pet_by_id_mut(&mut self, id: i64) -> Option<&mut Pet> {
        self.pets.iter_mut().find(|p| p.id == Some(id))
    }

    pub fn matches_name(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}
