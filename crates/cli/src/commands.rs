use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a bulk-ingest job end to end against the local store bindings
    Run {
        #[arg(long, help = "Options file path (flat JSON string map)")]
        config: String,

        #[arg(long, help = "Input rows as JSON lines; empty dataset when omitted")]
        input: Option<String>,

        #[arg(long, help = "Job id; a random one is generated when omitted")]
        job_id: Option<String>,

        #[arg(
            long,
            default_value = "store",
            help = "Root directory of the source store binding"
        )]
        store_root: String,

        #[arg(
            long,
            help = "Root directory of the destination store binding; defaults to the source root"
        )]
        dest_store_root: Option<String>,
    },
    /// Validate an options file without running anything
    Validate {
        #[arg(long, help = "Options file path (flat JSON string map)")]
        config: String,

        #[arg(
            long,
            help = "If specified, writes the resolved job spec to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// List committed staging trees and their sizes
    Inspect {
        #[arg(long, help = "Staging base directory")]
        staging: String,
    },
}
