use crate::config::KNOWN_CONNECTIONS_KEY;
use crate::db::Database;
use crate::reconcile::store::KnownConnectionsStore;

pub fn show(db: &Database) -> anyhow::Result<()> {
    let Some(entry) = db.get_cache_entry(KNOWN_CONNECTIONS_KEY)? else {
        println!("No cached connections. Run `alunet directory` to fetch them.");
        return Ok(());
    };

    match db.load_known_connections()? {
        Some(known) if !known.is_empty() => {
            for id in known.iter() {
                println!("{id}");
            }
            println!("\n{} cached id(s), updated {}", known.len(), entry.updated_at);
        }
        Some(_) => println!("Cache is empty (updated {}).", entry.updated_at),
        None => println!("Cache entry is malformed and will be ignored."),
    }
    Ok(())
}

pub fn forget(db: &Database, id: &str) -> anyhow::Result<()> {
    let mut known = db.load_known_connections()?.unwrap_or_default();
    if !known.remove(id) {
        anyhow::bail!("'{}' is not in the cache", id);
    }
    db.save_known_connections(&known)?;
    println!("Removed {id}; {} id(s) left.", known.len());
    Ok(())
}

pub fn clear(db: &Database) -> anyhow::Result<()> {
    if db.clear_known_connections()? {
        println!("Cache cleared.");
    } else {
        println!("Cache was already empty.");
    }
    Ok(())
}
