//! IMG.LY Background Recolor CLI Tool
//!
//! Replaces the background of ID and portrait photos with solid colors.

#[cfg(feature = "cli")]
use imgly_bgrecolor::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
