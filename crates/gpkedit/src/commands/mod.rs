pub mod bulk;
pub mod package;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle GPK files
    Package {
        #[command(subcommand)]
        command: package::PackageCommands,
    },
    /// Run a bulk import manifest
    Bulk(bulk::BulkArgs),
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Package { command } => command.handle(),
            Commands::Bulk(bulk) => bulk.handle(),
        }
    }
}
