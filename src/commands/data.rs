use crate::cli::GetArgs;
use crate::concerts::ConcertStore;
use crate::utils::output::print_json;
use anyhow::Result;

pub async fn handle_get_command(store: &ConcertStore, args: &GetArgs) -> Result<()> {
    let value = store.get_data(&args.path).await?;
    print_json(&args.path, value.as_ref());
    Ok(())
}
