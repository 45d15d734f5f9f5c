use anyhow::Result;
use peerly_storage::load_directory;
use std::path::Path;

pub async fn handle(feed: &Path) -> Result<()> {
    let directory = load_directory(feed).await?;

    let slots = directory.slots().count();
    let published = directory.slots().filter(|slot| slot.published).count();
    let accepting = directory
        .tutors()
        .iter()
        .filter(|tutor| tutor.accepting_students)
        .count();

    println!("✓ {} is valid", feed.display());
    println!("  Tutors: {} ({} accepting students)", directory.len(), accepting);
    println!("  Slots: {} ({} published)", slots, published);
    Ok(())
}
