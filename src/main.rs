//! MVSTORE - Interactive Shell
//! A small REPL over a durable store: one map and one entity collection
//! owned by a fixed application id.

use std::io::{self, BufRead, Write};

use uuid::Uuid;

use mvstore::config::Config;
use mvstore::context::StoreContext;
use mvstore::model::{Entity, Field};
use mvstore::types::{CollectionScope, Id, MapScope};

/// Owner of the shell's map and collection, stable across runs.
const SHELL_OWNER: Uuid = Uuid::from_u128(0x0190_0000_0000_7000_8000_0000_0000_0001);

fn main() {
    env_logger::init();

    println!();
    println!("  ╔═══════════════════════════════════════════╗");
    println!("  ║             MVSTORE Shell                 ║");
    println!("  ║    Versioned Entities + Map Manager       ║");
    println!("  ╚═══════════════════════════════════════════╝");
    println!();
    println!("  Commands:");
    println!("    put <key> <value>              - Store a string");
    println!("    putl <key> <number>            - Store a long");
    println!("    get <key>                      - Read a string");
    println!("    getl <key>                     - Read a long");
    println!("    del <key>                      - Delete a map key");
    println!("    keys [cursor] [limit]          - Page through map keys");
    println!("    write <kind|id> <f=v>...       - Write an entity version");
    println!("    load <id>                      - Load the latest committed version");
    println!("    remove <id>                    - Delete an entity");
    println!("    stats                          - Show keyspace metrics");
    println!("    exit                           - Shutdown");
    println!();

    let data_dir = std::env::var("MVSTORE_DATA").unwrap_or_else(|_| "./data".to_string());
    let context = match StoreContext::open(Config::new(data_dir)) {
        Ok(context) => context,
        Err(err) => {
            eprintln!("[ERROR] Failed to open store: {}", err);
            std::process::exit(1);
        }
    };

    let owner = Id::from_parts(SHELL_OWNER, "application");
    let map = match context.map_manager(MapScope::new(owner.clone(), "shell")) {
        Ok(map) => map,
        Err(err) => {
            eprintln!("[ERROR] Failed to create map: {}", err);
            std::process::exit(1);
        }
    };
    let entities = context.collection_manager(CollectionScope::new(owner, "entities"));

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("mvstore> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break, // EOF
            Ok(_) => {}
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0].to_lowercase().as_str() {
            "put" | "set" => {
                if parts.len() < 3 {
                    println!("  Usage: put <key> <value>");
                    continue;
                }
                match map.put_string(parts[1], &parts[2..].join(" ")) {
                    Ok(()) => println!("  OK"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "putl" => {
                if parts.len() != 3 {
                    println!("  Usage: putl <key> <number>");
                    continue;
                }
                let Ok(value) = parts[2].parse::<i64>() else {
                    println!("  ERROR: '{}' is not a number", parts[2]);
                    continue;
                };
                match map.put_long(parts[1], value) {
                    Ok(()) => println!("  OK"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "get" => {
                if parts.len() < 2 {
                    println!("  Usage: get <key>");
                    continue;
                }
                match map.get_string(parts[1]) {
                    Ok(Some(value)) => println!("  \"{}\"", value),
                    Ok(None) => println!("  (nil)"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "getl" => {
                if parts.len() < 2 {
                    println!("  Usage: getl <key>");
                    continue;
                }
                match map.get_long(parts[1]) {
                    Ok(Some(value)) => println!("  {}", value),
                    Ok(None) => println!("  (nil)"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "del" | "delete" => {
                if parts.len() < 2 {
                    println!("  Usage: del <key>");
                    continue;
                }
                match map.delete(parts[1]) {
                    Ok(()) => println!("  OK (deleted)"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "keys" => {
                let cursor = parts.get(1).copied().filter(|c| *c != "-");
                let limit = match parts.get(2).map(|l| l.parse::<usize>()) {
                    Some(Ok(limit)) => limit,
                    Some(Err(_)) => {
                        println!("  Usage: keys [cursor|-] [limit]");
                        continue;
                    }
                    None => 20,
                };
                match map.get_keys(cursor, limit) {
                    Ok(results) if results.keys.is_empty() => println!("  (empty)"),
                    Ok(results) => {
                        for key in &results.keys {
                            println!("  {}", key);
                        }
                        println!("  ({} keys)", results.keys.len());
                        if let Some(cursor) = results.cursor() {
                            println!("  next: keys {} {}", cursor, limit);
                        }
                    }
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "write" => {
                if parts.len() < 2 {
                    println!("  Usage: write <kind|id> <field=value>...");
                    continue;
                }
                let id = if parts[1].contains(':') {
                    match parts[1].parse::<Id>() {
                        Ok(id) => id,
                        Err(e) => {
                            println!("  ERROR: {}", e);
                            continue;
                        }
                    }
                } else {
                    Id::new(parts[1])
                };

                let mut entity = Entity::new(id);
                for assignment in &parts[2..] {
                    match assignment.split_once('=') {
                        Some((name, value)) => {
                            entity.set_field(name, parse_field(value));
                        }
                        None => println!("  (skipping '{}', expected field=value)", assignment),
                    }
                }
                match entities.write(entity) {
                    Ok(written) => match written.version() {
                        Some(version) => println!("  OK {} @ {}", written.id(), version),
                        None => println!("  OK {}", written.id()),
                    },
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "load" => {
                let Some(id) = parse_id(&parts) else {
                    println!("  Usage: load <kind:uuid>");
                    continue;
                };
                match entities.load(&id) {
                    Ok(Some(entity)) => {
                        if let Some(version) = entity.version() {
                            println!("  version {}", version);
                        }
                        for (name, field) in entity.fields().fields() {
                            println!("  {} = {:?}", name, field);
                        }
                    }
                    Ok(None) => println!("  (nil)"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "remove" => {
                let Some(id) = parse_id(&parts) else {
                    println!("  Usage: remove <kind:uuid>");
                    continue;
                };
                match entities.delete(&id) {
                    Ok(()) => println!("  OK (deleted)"),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "info" | "stats" => {
                let keyspace = context.keyspace();
                match (keyspace.cell_count(), keyspace.memtable_size()) {
                    (Ok(cells), Ok(size)) => {
                        println!("  Cells:         {}", cells);
                        println!("  MemTable size: {} bytes", size);
                    }
                    (Err(e), _) | (_, Err(e)) => println!("  ERROR: {}", e),
                }
                println!("{}", keyspace.metrics().report());
            }
            "exit" | "quit" | "q" => {
                println!("  Shutting down MVSTORE...");
                break;
            }
            _ => {
                println!("  Unknown command: '{}'. Type 'exit' to quit.", parts[0]);
            }
        }
    }
}

fn parse_id(parts: &[&str]) -> Option<Id> {
    match parts.get(1).map(|raw| raw.parse::<Id>()) {
        Some(Ok(id)) => Some(id),
        Some(Err(e)) => {
            println!("  ERROR: {}", e);
            None
        }
        None => None,
    }
}

/// Best-effort typing of a shell value.
fn parse_field(value: &str) -> Field {
    if let Ok(long) = value.parse::<i64>() {
        Field::Long(long)
    } else if let Ok(double) = value.parse::<f64>() {
        Field::Double(double)
    } else if let Ok(boolean) = value.parse::<bool>() {
        Field::Boolean(boolean)
    } else if let Ok(uuid) = Uuid::parse_str(value) {
        Field::Uuid(uuid)
    } else {
        Field::String(value.to_string())
    }
}
