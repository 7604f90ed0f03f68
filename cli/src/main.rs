use anyhow::{anyhow, bail, Context, Result};
use marknest_core::{
    default_data_dir, load_config, GitHubGateway, MoveOutcome, Notebook, SyncOutcome, TreeView,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

const USAGE: &str = "\
usage: marknest [--db PATH] <command>

config.toml is read from the database's directory when --db is given.

commands:
  tree                      show folders and notes
  new [FOLDER_ID]           create a note
  show NOTE_ID              print a note
  write NOTE_ID FILE        replace a note's content with FILE
  rm NOTE_ID                delete a note
  mv NOTE_ID [FOLDER_ID]    move a note (to the root without FOLDER_ID)
  mkdir NAME                create a folder
  rename FOLDER_ID NAME     rename a folder
  rmdir FOLDER_ID           delete a folder, keeping its notes
  search TERM               list matching notes
  open TITLE                follow a [[TITLE]] link
  backlinks NOTE_ID         list notes linking to a note
  export DIR                write every note as markdown under DIR
  theme [FIELD VALUE]       show or change the theme
  auth TOKEN OWNER/REPO     store GitHub credentials
  sync                      back up all notes to GitHub";

fn main() -> ExitCode {
    env_logger::init();

    match run(env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<marknest_core::Error>() {
                Some(core) => eprintln!("error: {}", core.user_message()),
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

/// Database and config file locations, consuming a leading `--db PATH`.
fn store_paths(args: &mut Vec<String>, data_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    if args.first().map(String::as_str) != Some("--db") {
        return Ok((data_dir.join("marknest.db"), data_dir.join("config.toml")));
    }
    if args.len() < 2 {
        bail!("--db needs a path");
    }
    let db_path = PathBuf::from(args.remove(1));
    args.remove(0);
    // config.toml lives next to an overridden database
    let config_path = db_path
        .parent()
        .map(|dir| dir.join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    Ok((db_path, config_path))
}

fn run(mut args: Vec<String>) -> Result<()> {
    let (db_path, config_path) = store_paths(&mut args, &default_data_dir())?;

    let Some(command) = args.first().cloned() else {
        println!("{}", USAGE);
        return Ok(());
    };
    let rest = &args[1..];

    let config = load_config(&config_path)?;
    let mut notebook = Notebook::open(&db_path, config)
        .with_context(|| format!("opening {}", db_path.display()))?;

    match (command.as_str(), rest) {
        ("tree", []) => print_tree(notebook.view()),
        ("new", [folder]) => print_created(notebook.create_note(Some(folder.as_str()))?.id),
        ("new", []) => print_created(notebook.create_note(None)?.id),
        ("show", [id]) => {
            let note = notebook.note(id).ok_or_else(|| anyhow!("no note with id {}", id))?;
            println!("{}", note.content);
        }
        ("write", [id, file]) => {
            let content = fs::read_to_string(file).with_context(|| format!("reading {}", file))?;
            notebook.open_note(id)?;
            notebook.edit(&content, Instant::now());
            notebook.flush()?;
            println!("saved {}", id);
        }
        ("rm", [id]) => notebook.delete_note(id)?,
        ("mv", [id]) => print_move(notebook.move_note(id, None)?),
        ("mv", [id, folder]) => print_move(notebook.move_note(id, Some(folder.as_str()))?),
        ("mkdir", [name]) => print_created(notebook.create_folder(name)?.id),
        ("rename", [id, name]) => {
            if notebook.rename_folder(id, name)?.is_none() {
                bail!("no folder with id {}", id);
            }
        }
        ("rmdir", [id]) => notebook.delete_folder(id)?,
        ("search", [term]) => print_tree(&notebook.filter(term)),
        ("open", [title]) => {
            let note = notebook.follow_link(title)?;
            println!("{}\n\n{}", note.id, note.content);
        }
        ("backlinks", [id]) => {
            for note in notebook.backlinks(id) {
                println!("{}  {}", note.id, note.title());
            }
        }
        ("export", [dir]) => {
            let written = notebook.export_markdown(&PathBuf::from(dir))?;
            println!("exported {} notes to {}", written, dir);
        }
        ("theme", []) => {
            let theme = notebook.theme()?;
            println!("font-family  {}", theme.font_family);
            println!("font-size    {}", theme.font_size);
            println!("background   {}", theme.background_color);
            println!("text         {}", theme.text_color);
            println!("accent       {}", theme.accent_color);
        }
        ("theme", [field, value]) => {
            let mut theme = notebook.theme()?;
            let slot = match field.as_str() {
                "font-family" => &mut theme.font_family,
                "font-size" => &mut theme.font_size,
                "background" => &mut theme.background_color,
                "text" => &mut theme.text_color,
                "accent" => &mut theme.accent_color,
                other => bail!("unknown theme field '{}'", other),
            };
            *slot = value.clone();
            notebook.set_theme(&theme)?;
        }
        ("auth", [token, repo]) => {
            let repo = notebook.set_github_auth(token, repo)?;
            println!("backing up to {}", repo);
        }
        ("sync", []) => {
            let gateway: GitHubGateway = notebook.github_gateway()?;
            let report = notebook.sync_backup(&gateway)?;
            let verb = match report.outcome {
                SyncOutcome::Created => "created",
                SyncOutcome::Updated => "updated",
            };
            println!(
                "{} backup with {} notes and {} folders at {}",
                verb,
                report.notes,
                report.folders,
                report.synced_at.to_rfc3339()
            );
        }
        _ => bail!("unrecognised command\n\n{}", USAGE),
    }

    Ok(())
}

fn print_created(id: String) {
    println!("{}", id);
}

fn print_move(outcome: MoveOutcome) {
    match outcome {
        MoveOutcome::Moved(note) => println!("moved {}", note.id),
        MoveOutcome::Unchanged => println!("already there"),
        MoveOutcome::NotFound => println!("no such note"),
    }
}

fn print_tree(view: &TreeView) {
    if view.is_empty() {
        println!("(no notes)");
        return;
    }
    for folder in &view.folders {
        println!("{}/  [{}]", folder.name, folder.id);
        for note in &folder.notes {
            print_note_line(&note.title, &note.id, note.is_active, "  ");
        }
    }
    for note in &view.root_notes {
        print_note_line(&note.title, &note.id, note.is_active, "");
    }
}

fn print_note_line(title: &str, id: &str, active: bool, indent: &str) {
    let marker = if active { "*" } else { " " };
    println!("{}{} {}  [{}]", indent, marker, title, id);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_paths_use_data_dir() {
        let mut argv = args(&["tree"]);
        let (db, config) = store_paths(&mut argv, Path::new("/data/marknest")).unwrap();
        assert_eq!(db, PathBuf::from("/data/marknest/marknest.db"));
        assert_eq!(config, PathBuf::from("/data/marknest/config.toml"));
        assert_eq!(argv, args(&["tree"]));
    }

    #[test]
    fn test_db_override_moves_config_alongside() {
        let mut argv = args(&["--db", "/tmp/scratch/notes.db", "tree"]);
        let (db, config) = store_paths(&mut argv, Path::new("/data/marknest")).unwrap();
        assert_eq!(db, PathBuf::from("/tmp/scratch/notes.db"));
        assert_eq!(config, PathBuf::from("/tmp/scratch/config.toml"));
        assert_eq!(argv, args(&["tree"]));
    }

    #[test]
    fn test_db_flag_without_path() {
        let mut argv = args(&["--db"]);
        assert!(store_paths(&mut argv, Path::new("/data")).is_err());
    }
}
