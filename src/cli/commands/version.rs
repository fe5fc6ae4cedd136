use clap::Args;

#[derive(Args)]
pub struct VersionArgs {
    /// Show detailed version information
    #[arg(long)]
    pub detailed: bool,
}

pub fn execute(args: VersionArgs) {
    println!("{} {}", crate::PKG_NAME, crate::VERSION);

    if args.detailed {
        println!("Description: {}", crate::PKG_DESCRIPTION);
        println!("Rust Edition: 2024");
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Target: {}-{}", std::env::consts::ARCH, std::env::consts::OS);
        println!(
            "Profile: {}",
            if cfg!(debug_assertions) { "debug" } else { "release" }
        );
    }
}
