use std::io::{self, BufRead, Write};

use clap::Parser;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};

use petsim_core::{Database, GameManager, GameSession, PetSimError, PetStatus};

#[derive(Parser)]
#[command(name = "petsim", version, about = "Console virtual pet simulator")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, default_value = "petsim.db")]
    db: String,
}

const MENU: &[&str] = &[
    "1. Adopt a Pet",
    "2. Feed Pet",
    "3. Play with Pet",
    "4. Check Pet Status",
    "5. Save Game",
    "6. Load Game",
    "7. List Pets",
    "8. Update Pet Name",
    "9. Delete Pet",
    "10. Exit",
];

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let db = match Database::open(&cli.db) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    if let Err(e) = run(&db, stdin.lock(), io::stdout().lock()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Line-oriented console: prompts on `out`, reads answers from `input`.
struct Console<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Print `label` and read one line. `None` means stdin is exhausted.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

fn run<R: BufRead, W: Write>(db: &Database, input: R, out: W) -> petsim_core::Result<()> {
    let gm = GameManager::new(db);
    let mut session = GameSession::new();
    let mut console = Console { input, out };

    loop {
        writeln!(console.out)?;
        writeln!(console.out, "=== Virtual Pet Simulator ===")?;
        for line in MENU {
            writeln!(console.out, "{}", line)?;
        }
        let Some(choice) = console.prompt("Enter your choice: ")? else {
            writeln!(console.out)?;
            writeln!(console.out, "Goodbye!")?;
            return Ok(());
        };

        let result = match choice.trim() {
            "1" => cmd_adopt(&gm, &mut session, &mut console),
            "2" => cmd_feed(&gm, &mut session, &mut console),
            "3" => cmd_play(&gm, &mut session, &mut console),
            "4" => cmd_status(&gm, &session, &mut console),
            "5" => cmd_save(&gm, &mut session, &mut console),
            "6" => cmd_load(&gm, &mut session, &mut console),
            "7" => cmd_list(&gm, &mut session, &mut console),
            "8" => cmd_rename(&gm, &mut session, &mut console),
            "9" => cmd_delete(&gm, &mut session, &mut console),
            "10" => {
                writeln!(console.out, "Goodbye!")?;
                return Ok(());
            }
            _ => {
                writeln!(console.out, "Invalid choice. Please try again.")?;
                Ok(())
            }
        };

        match result {
            Ok(()) => {}
            // Console I/O failure: nowhere left to report to
            Err(PetSimError::Io(e)) => return Err(e.into()),
            Err(e) => report(&mut console.out, &e)?,
        }
    }
}

fn report<W: Write>(out: &mut W, err: &PetSimError) -> io::Result<()> {
    if err.is_user_error() {
        writeln!(out, "{}", err)
    } else {
        log::error!("{}", err);
        writeln!(out, "Error: {}. Nothing was changed.", err)
    }
}

fn cmd_adopt<R: BufRead, W: Write>(
    gm: &GameManager<'_>,
    session: &mut GameSession,
    console: &mut Console<R, W>,
) -> petsim_core::Result<()> {
    let Some(owner_name) = console.prompt("Enter your name: ")? else {
        return Ok(());
    };
    let Some(species) = console.prompt("Enter pet type (Dog/Cat/Dragon): ")? else {
        return Ok(());
    };
    let Some(pet_name) = console.prompt("Enter pet name: ")? else {
        return Ok(());
    };

    let pet = gm.adopt_pet(session, &owner_name, &species, &pet_name)?;
    writeln!(console.out, "Pet adopted successfully!")?;
    writeln!(console.out, "{}", pet.make_sound())?;
    Ok(())
}

fn cmd_feed<R: BufRead, W: Write>(
    gm: &GameManager<'_>,
    session: &mut GameSession,
    console: &mut Console<R, W>,
) -> petsim_core::Result<()> {
    let status = gm.feed_pet(session)?;
    writeln!(console.out, "Pet fed successfully!")?;
    writeln!(console.out, "{}'s hunger is now {}.", status.name, status.hunger)?;
    Ok(())
}

fn cmd_play<R: BufRead, W: Write>(
    gm: &GameManager<'_>,
    session: &mut GameSession,
    console: &mut Console<R, W>,
) -> petsim_core::Result<()> {
    let status = gm.play_with_pet(session)?;
    writeln!(console.out, "Played with pet successfully!")?;
    writeln!(console.out, "{}", status.sound)?;
    Ok(())
}

fn cmd_status<R: BufRead, W: Write>(
    gm: &GameManager<'_>,
    session: &GameSession,
    console: &mut Console<R, W>,
) -> petsim_core::Result<()> {
    let status = gm.check_pet_status(session)?;
    print_status(&mut console.out, &status)?;
    Ok(())
}

fn print_status<W: Write>(out: &mut W, status: &PetStatus) -> io::Result<()> {
    writeln!(out, "--- {} the {} ---", status.name, status.species)?;
    writeln!(out, "Hunger:    {}", status.hunger)?;
    writeln!(out, "Happiness: {} ({})", status.happiness, status.mood)?;
    if status.hungry {
        writeln!(out, "{} is hungry!", status.name)?;
    }
    writeln!(out, "{}", status.sound)
}

fn cmd_save<R: BufRead, W: Write>(
    gm: &GameManager<'_>,
    session: &mut GameSession,
    console: &mut Console<R, W>,
) -> petsim_core::Result<()> {
    gm.save_game(session)?;
    writeln!(console.out, "Game saved successfully to the database.")?;
    Ok(())
}

fn cmd_load<R: BufRead, W: Write>(
    gm: &GameManager<'_>,
    session: &mut GameSession,
    console: &mut Console<R, W>,
) -> petsim_core::Result<()> {
    let Some(owner_name) = console.prompt("Enter owner name (blank for the first saved game): ")?
    else {
        return Ok(());
    };

    let loaded = gm.load_game(session, Some(&owner_name))?;
    match loaded.active_pet {
        Some(pet) => writeln!(
            console.out,
            "Game loaded successfully. Welcome back, {}!",
            pet
        )?,
        None => writeln!(console.out, "No pets found for the owner.")?,
    }
    Ok(())
}

fn cmd_list<R: BufRead, W: Write>(
    gm: &GameManager<'_>,
    session: &mut GameSession,
    console: &mut Console<R, W>,
) -> petsim_core::Result<()> {
    let pets = gm.list_pets(session)?;
    if pets.is_empty() {
        writeln!(console.out, "You have no pets.")?;
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Name", "Type"]);

    for p in &pets {
        table.add_row(vec![p.name.as_str(), p.species.as_str()]);
    }

    writeln!(console.out, "--- Your Pets ---")?;
    writeln!(console.out, "{table}")?;
    Ok(())
}

fn cmd_rename<R: BufRead, W: Write>(
    gm: &GameManager<'_>,
    session: &mut GameSession,
    console: &mut Console<R, W>,
) -> petsim_core::Result<()> {
    if !session.has_pets() {
        return Err(PetSimError::NoPets);
    }
    let Some(current) = console.prompt("Enter current pet name: ")? else {
        return Ok(());
    };
    if session.owner.as_ref().and_then(|o| o.find_pet(&current)).is_none() {
        return Err(PetSimError::PetNotFound(current.trim().to_string()));
    }
    let Some(new_name) = console.prompt("Enter new pet name: ")? else {
        return Ok(());
    };

    gm.update_pet_name(session, &current, &new_name)?;
    writeln!(console.out, "Pet name updated successfully!")?;
    Ok(())
}

fn cmd_delete<R: BufRead, W: Write>(
    gm: &GameManager<'_>,
    session: &mut GameSession,
    console: &mut Console<R, W>,
) -> petsim_core::Result<()> {
    if !session.has_pets() {
        return Err(PetSimError::NoPets);
    }
    let Some(name) = console.prompt("Enter pet name to delete: ")? else {
        return Ok(());
    };

    gm.delete_pet(session, &name)?;
    writeln!(console.out, "Pet deleted successfully!")?;
    Ok(())
}
