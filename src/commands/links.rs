use crate::cli::{AddLinkArgs, SetLinksArgs};
use crate::concerts::ConcertStore;
use crate::utils::output::{OutputStyle, print_links, print_success, print_warning};
use anyhow::Result;

pub async fn handle_add_link_command(store: &ConcertStore, args: &AddLinkArgs) -> Result<()> {
    let key = store.add_new_concert_link(&args.link).await?;
    print_success(&format!("Added concert link {}", OutputStyle::muted(&key)));
    Ok(())
}

pub async fn handle_set_links_command(store: &ConcertStore, args: &SetLinksArgs) -> Result<()> {
    let keys = store.set_concerts_links(&args.links).await?;
    print_success(&format!("Added {} concert link(s)", keys.len()));
    Ok(())
}

pub async fn handle_links_command(store: &ConcertStore) -> Result<()> {
    let links = store.get_links().await?;
    print_links(&links);
    Ok(())
}

pub async fn handle_random_command(store: &ConcertStore) -> Result<()> {
    match store.get_rand_concert().await? {
        Some(link) => println!("🎲 {}", OutputStyle::link(&link)),
        None => print_warning("No concerts available to pick from"),
    }
    Ok(())
}
