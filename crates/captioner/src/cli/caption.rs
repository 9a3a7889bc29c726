//! The `captioner caption` command: caption image ids without the server.

use clap::Args;

use captioner_core::{CaptionRecord, Captioner, Config};

/// Arguments for the `caption` command.
#[derive(Args, Debug)]
pub struct CaptionArgs {
    /// Image ids to caption
    #[arg(required = true)]
    pub image_ids: Vec<String>,

    /// Print one JSON object per image instead of plain captions
    #[arg(long)]
    pub json: bool,
}

/// Execute the caption command.
///
/// Every id is attempted; the command fails at the end if any id failed.
pub async fn execute(args: CaptionArgs, config: Config) -> anyhow::Result<()> {
    let captioner = tokio::task::spawn_blocking(move || Captioner::load(&config)).await??;

    let mut failures = 0usize;
    for image_id in &args.image_ids {
        match captioner.caption(image_id) {
            Ok(caption) => {
                if args.json {
                    let record = CaptionRecord::new(image_id.as_str(), &caption);
                    println!("{}", serde_json::to_string(&record)?);
                } else {
                    println!("{}\t{}", image_id, caption.text());
                }
            }
            Err(e) => {
                failures += 1;
                tracing::error!("{}", e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} images failed", failures, args.image_ids.len());
    }
    Ok(())
}
