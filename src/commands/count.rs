use crate::cli::SetCountArgs;
use crate::concerts::ConcertStore;
use crate::utils::output::{OutputStyle, print_success};
use anyhow::Result;

pub async fn handle_count_command(store: &ConcertStore) -> Result<()> {
    match store.get_count().await? {
        Some(count) => OutputStyle::print_field("Concerts", &count.to_string()),
        None => println!("{}", OutputStyle::muted("No concert count stored.")),
    }
    Ok(())
}

pub async fn handle_set_count_command(store: &ConcertStore, args: &SetCountArgs) -> Result<()> {
    store.set_count(args.count).await?;
    print_success(&format!("Concert count set to {}", args.count));
    Ok(())
}

pub async fn handle_incr_command(store: &ConcertStore) -> Result<()> {
    let count = store.update_count().await?;
    print_success(&format!("Concert count is now {}", count));
    Ok(())
}
