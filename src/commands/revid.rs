use crate::cli::SetRevidArgs;
use crate::concerts::ConcertStore;
use crate::utils::output::{OutputStyle, print_success};
use anyhow::Result;

pub async fn handle_revid_command(store: &ConcertStore) -> Result<()> {
    match store.get_revid().await? {
        Some(id) => OutputStyle::print_field("Revision", &id.to_string()),
        None => println!("{}", OutputStyle::muted("No revision id stored.")),
    }
    Ok(())
}

pub async fn handle_set_revid_command(store: &ConcertStore, args: &SetRevidArgs) -> Result<()> {
    store.set_revid(args.id).await?;
    print_success(&format!("Revision id set to {}", args.id));
    Ok(())
}
