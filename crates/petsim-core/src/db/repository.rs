use std::marker::PhantomData;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::Database;
use crate::error::{PetSimError, Result};
use crate::models::{Owner, Pet, Species};

/// A record kind the generic [`Repository`] can persist.
///
/// Implementors supply the SQL for their own table; the repository supplies
/// the unit-of-work boundary around it.
pub trait Entity: Clone + Sized {
    /// Human-readable kind, used in errors and log lines.
    const KIND: &'static str;

    fn id(&self) -> Option<i64>;

    /// Insert as a new row, assigning ids to `self` (and to any cascaded children).
    fn insert(&mut self, conn: &Connection) -> Result<i64>;

    /// Overwrite the existing row. Returns the number of rows matched.
    fn write(&self, conn: &Connection) -> Result<usize>;

    /// Delete the row with this id. Returns the number of rows removed.
    fn remove(conn: &Connection, id: i64) -> Result<usize>;

    fn load(conn: &Connection, id: i64) -> Result<Option<Self>>;

    fn load_all(conn: &Connection) -> Result<Vec<Self>>;
}

/// Type-parameterized create/read/update/delete. Each write is one unit-of-work.
pub struct Repository<'db, T> {
    db: &'db Database,
    _entity: PhantomData<T>,
}

impl<'db, T: Entity> Repository<'db, T> {
    pub fn new(db: &'db Database) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    /// Insert a new record. Fails if the entity already has an id.
    pub fn save(&self, entity: &mut T) -> Result<i64> {
        if entity.id().is_some() {
            return Err(PetSimError::AlreadyPersisted(T::KIND));
        }
        let label = format!("save {}", T::KIND);
        // Work on a copy so a rolled-back insert leaves no stray ids on the caller's entity.
        let saved = self.db.unit_of_work(&label, |tx| {
            let mut staged = entity.clone();
            staged.insert(tx)?;
            Ok(staged)
        })?;
        *entity = saved;
        entity.id().ok_or(PetSimError::NotPersisted(T::KIND))
    }

    /// Merge a detached entity's state into the store and return the stored result.
    pub fn update(&self, entity: &T) -> Result<T> {
        let label = format!("update {}", T::KIND);
        self.db.unit_of_work(&label, |tx| {
            let id = match entity.id() {
                Some(id) => {
                    if entity.write(tx)? == 0 {
                        return Err(PetSimError::NotFound {
                            entity: T::KIND,
                            id,
                        });
                    }
                    id
                }
                None => entity.clone().insert(tx)?,
            };
            T::load(tx, id)?.ok_or(PetSimError::NotFound {
                entity: T::KIND,
                id,
            })
        })
    }

    pub fn delete(&self, entity: &T) -> Result<()> {
        let id = entity.id().ok_or(PetSimError::NotPersisted(T::KIND))?;
        let label = format!("delete {} {}", T::KIND, id);
        self.db.unit_of_work(&label, |tx| {
            if T::remove(tx, id)? == 0 {
                return Err(PetSimError::NotFound {
                    entity: T::KIND,
                    id,
                });
            }
            Ok(())
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<T>> {
        T::load(self.db.conn(), id).map_err(|e| {
            log::warn!("find {} {} failed: {}", T::KIND, id, e);
            e
        })
    }

    /// All records of this kind, oldest first.
    pub fn find_all(&self) -> Result<Vec<T>> {
        T::load_all(self.db.conn()).map_err(|e| {
            log::warn!("find all {} failed: {}", T::KIND, e);
            e
        })
    }
}

impl ToSql for Species {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Species {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        Species::parse(raw)
            .ok_or_else(|| FromSqlError::Other(Box::new(PetSimError::InvalidSpecies(raw.to_string()))))
    }
}

// === Pets ===

const PET_COLUMNS: &str = "id, owner_id, name, species, hunger, happiness, adopted_at";

fn pet_from_row(row: &Row<'_>) -> rusqlite::Result<Pet> {
    Ok(Pet {
        id: Some(row.get(0)?),
        owner_id: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        hunger: row.get(4)?,
        happiness: row.get(5)?,
        adopted_at: row.get(6)?,
    })
}

fn pets_for_owner(conn: &Connection, owner_id: i64) -> Result<Vec<Pet>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM pets WHERE owner_id = ?1 ORDER BY id",
        PET_COLUMNS
    ))?;
    let pets = stmt
        .query_map(params![owner_id], pet_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(pets)
}

impl Entity for Pet {
    const KIND: &'static str = "pet";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO pets (owner_id, name, species, hunger, happiness, adopted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.owner_id,
                self.name,
                self.species,
                self.hunger,
                self.happiness,
                self.adopted_at
            ],
        )?;
        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    fn write(&self, conn: &Connection) -> Result<usize> {
        let Some(id) = self.id else {
            return Err(PetSimError::NotPersisted(Self::KIND));
        };
        let rows = conn.execute(
            "UPDATE pets SET owner_id = ?1, name = ?2, species = ?3, hunger = ?4, happiness = ?5
             WHERE id = ?6",
            params![
                self.owner_id,
                self.name,
                self.species,
                self.hunger,
                self.happiness,
                id
            ],
        )?;
        Ok(rows)
    }

    fn remove(conn: &Connection, id: i64) -> Result<usize> {
        Ok(conn.execute("DELETE FROM pets WHERE id = ?1", params![id])?)
    }

    fn load(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let pet = conn
            .query_row(
                &format!("SELECT {} FROM pets WHERE id = ?1", PET_COLUMNS),
                params![id],
                pet_from_row,
            )
            .optional()?;
        Ok(pet)
    }

    fn load_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!("SELECT {} FROM pets ORDER BY id", PET_COLUMNS))?;
        let pets = stmt
            .query_map([], pet_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pets)
    }
}

// === Owners ===

impl Entity for Owner {
    const KIND: &'static str = "owner";

    fn id(&self) -> Option<i64> {
        self.id
    }

    /// Cascades: every pet in the collection is inserted with this owner's id.
    fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO owners (name, created_at) VALUES (?1, ?2)",
            params![self.name, self.created_at],
        )?;
        let id = conn.last_insert_rowid();
        self.id = Some(id);
        for pet in &mut self.pets {
            pet.owner_id = Some(id);
            pet.insert(conn)?;
        }
        Ok(id)
    }

    /// Cascades: new pets are inserted, existing ones overwritten.
    fn write(&self, conn: &Connection) -> Result<usize> {
        let Some(id) = self.id else {
            return Err(PetSimError::NotPersisted(Self::KIND));
        };
        let rows = conn.execute(
            "UPDATE owners SET name = ?1 WHERE id = ?2",
            params![self.name, id],
        )?;
        if rows == 0 {
            return Ok(0);
        }
        for pet in &self.pets {
            let mut pet = pet.clone();
            pet.owner_id = Some(id);
            match pet.id {
                None => {
                    pet.insert(conn)?;
                }
                Some(pet_id) => {
                    if pet.write(conn)? == 0 {
                        return Err(PetSimError::NotFound {
                            entity: Pet::KIND,
                            id: pet_id,
                        });
                    }
                }
            }
        }
        Ok(rows)
    }

    fn remove(conn: &Connection, id: i64) -> Result<usize> {
        conn.execute("DELETE FROM pets WHERE owner_id = ?1", params![id])?;
        Ok(conn.execute("DELETE FROM owners WHERE id = ?1", params![id])?)
    }

    fn load(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let owner = conn
            .query_row(
                "SELECT id, name, created_at FROM owners WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Owner {
                        id: Some(row.get(0)?),
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                        pets: Vec::new(),
                    })
                },
            )
            .optional()?;

        match owner {
            Some(mut owner) => {
                owner.pets = pets_for_owner(conn, id)?;
                Ok(Some(owner))
            }
            None => Ok(None),
        }
    }

    fn load_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT id, name, created_at FROM owners ORDER BY id")?;
        let mut owners = stmt
            .query_map([], |row| {
                Ok(Owner {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                    pets: Vec::new(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for owner in &mut owners {
            if let Some(id) = owner.id {
                owner.pets = pets_for_owner(conn, id)?;
            }
        }
        Ok(owners)
    }
}
