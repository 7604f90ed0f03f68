// Example: a short tour of marknest-core
use std::fs;
use std::time::{Duration, Instant};

use marknest_core::{Config, MoveOutcome, Notebook};

fn main() -> anyhow::Result<()> {
    let db_path = "basic_usage_marknest.db";
    fs::remove_file(db_path).ok(); // Clean up previous run

    println!("--- Basic usage of marknest-core ---");

    let mut notebook = Notebook::open(db_path, Config::default())?;
    println!("   ✓ Opened notebook with {} note(s)", notebook.notes().len());

    // ========== Folders and notes ==========
    println!("\n1. Creating a folder and a note...");
    let work = notebook.create_folder("Work")?;
    let plan = notebook.create_note(Some(&work.id))?;
    let start = Instant::now();
    notebook.edit("# Plan\n\nDraft the roadmap, see [[Ideas]].", start);
    notebook.tick(start + Duration::from_millis(600))?;
    println!("   ✓ Autosaved '{}'", notebook.note(&plan.id).map(|n| n.title()).unwrap_or_default());

    // ========== Links ==========
    println!("\n2. Following a link...");
    let ideas = notebook.follow_link("Ideas")?;
    println!("   ✓ Opened '{}' ({})", ideas.title(), ideas.id);
    for note in notebook.backlinks(&ideas.id) {
        println!("   ← linked from '{}'", note.title());
    }

    // ========== Tree ==========
    println!("\n3. Moving and searching...");
    if let MoveOutcome::Moved(_) = notebook.move_note(&ideas.id, Some(&work.id))? {
        println!("   ✓ Moved 'Ideas' into Work");
    }
    let hits = notebook.filter("roadmap");
    println!("   ✓ {} note(s) match 'roadmap'", hits.all_notes().count());

    for folder in &notebook.derive_tree().folders {
        println!("   {}/", folder.name);
        for note in &folder.notes {
            println!("     {}", note.title);
        }
    }

    // ========== Cleanup ==========
    notebook.delete_folder(&work.id)?;
    println!("\n   ✓ Deleted Work; {} note(s) now at the root", notebook.derive_tree().root_notes.len());

    drop(notebook);
    fs::remove_file(db_path).ok();
    Ok(())
}
