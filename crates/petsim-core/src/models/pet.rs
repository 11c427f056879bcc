use super::names_match;

pub const STAT_MIN: i64 = 0;
pub const STAT_MAX: i64 = 100;
pub const STAT_START: i64 = 50;

const FEED_HUNGER: i64 = 20;
const FEED_HAPPINESS: i64 = 5;
const PLAY_HAPPINESS: i64 = 15;
const PLAY_HUNGER: i64 = 10;
const HUNGRY_AT: i64 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Species {
    Dog,
    Cat,
    Dragon,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Dog, Species::Cat, Species::Dragon];

    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Dog => "Dog",
            Species::Cat => "Cat",
            Species::Dragon => "Dragon",
        }
    }

    /// The onomatopoeia this species makes. The only behavioral difference between species.
    pub fn sound(&self) -> &'static str {
        match self {
            Species::Dog => "Woof!",
            Species::Cat => "Meow!",
            Species::Dragon => "Rawr!",
        }
    }

    /// Case-insensitive keyword lookup ("dog", "CAT", " Dragon ").
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Species::ALL
            .into_iter()
            .find(|species| species.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pet {
    pub id: Option<i64>,
    pub owner_id: Option<i64>,
    pub name: String,
    pub species: Species,
    pub hunger: i64,
    pub happiness: i64,
    pub adopted_at: String,
}

impl Pet {
    pub fn new(name: String, species: Species) -> Self {
        Self {
            id: None,
            owner_id: None,
            name,
            species,
            hunger: STAT_START,
            happiness: STAT_START,
            adopted_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn feed(&mut self) {
        self.hunger = clamp_stat(self.hunger - FEED_HUNGER);
        self.happiness = clamp_stat(self.happiness + FEED_HAPPINESS);
    }

    pub fn play(&mut self) {
        self.happiness = clamp_stat(self.happiness + PLAY_HAPPINESS);
        self.hunger = clamp_stat(self.hunger + PLAY_HUNGER);
    }

    pub fn make_sound(&self) -> String {
        format!("{} says: {}", self.name, self.species.sound())
    }

    pub fn is_hungry(&self) -> bool {
        self.hunger >= HUNGRY_AT
    }

    pub fn mood(&self) -> &'static str {
        match self.happiness {
            75.. => "Ecstatic",
            50..=74 => "Content",
            25..=49 => "Grumpy",
            _ => "Miserable",
        }
    }

    pub fn status(&self) -> PetStatus {
        PetStatus {
            name: self.name.clone(),
            species: self.species,
            hunger: self.hunger,
            happiness: self.happiness,
            mood: self.mood(),
            hungry: self.is_hungry(),
            sound: self.make_sound(),
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

fn clamp_stat(value: i64) -> i64 {
    value.clamp(STAT_MIN, STAT_MAX)
}

/// Snapshot of a pet's stats for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetStatus {
    pub name: String,
    pub species: Species,
    pub hunger: i64,
    pub happiness: i64,
    pub mood: &'static str,
    pub hungry: bool,
    pub sound: String,
}

/// One row of a pet listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetSummary {
    pub name: String,
    pub species: Species,
}

impl From<&Pet> for PetSummary {
    fn from(pet: &Pet) -> Self {
        Self {
            name: pet.name.clone(),
            species: pet.species,
        }
    }
}
