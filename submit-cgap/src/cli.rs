///
/// This module implements the CLI interface for submit-cgap: command parsing,
/// argument validation and wiring the real portal, console and copy tool into
/// a core [`Session`].
///
/// All pipeline logic (server resolution, submission, polling, uploads) lives in
/// the [`submit-cgap-core`] crate. This module is strictly CLI glue.
///
/// ## How To Use
/// - For command-line users: use the installed `submit-cgap` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`submit-cgap-core`]: ../../submit-cgap-core/
use crate::aws::AwsCli;
use crate::console::TerminalConsole;
use crate::load_config::load_config;
use crate::portal::PortalClient;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use submit_cgap_core::config::PortalConfig;
use submit_cgap_core::fastq::write_sample_fastq_file;
use submit_cgap_core::keys::KeyManager;
use submit_cgap_core::server::resolve_server;
use submit_cgap_core::submission::{submit_metadata_bundle, SubmissionRequest};
use submit_cgap_core::uploads::{resume_uploads, upload_folder, upload_item_data};
use submit_cgap_core::Session;

/// CLI for submit-cgap: submit metadata bundles and data files to a CGAP portal.
#[derive(Debug, Parser)]
#[clap(
    name = "submit-cgap",
    version,
    about = "Submit metadata bundles and their data files to a CGAP portal"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that talks to a portal.
#[derive(Debug, Default, Clone, PartialEq, Eq, Args)]
pub struct PortalOptions {
    /// Path to a YAML config file (defaults to $SUBMIT_CGAP_CONFIG)
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Answer yes to every question
    #[clap(long)]
    pub no_query: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Submit a metadata bundle, wait for it to be processed, then upload its files
    SubmitMetadataBundle {
        /// Local Excel file that is the metadata bundle
        bundle_filename: PathBuf,
        /// Institution to submit for (defaults from your user profile)
        #[clap(short, long)]
        institution: Option<String>,
        /// Project to submit for (defaults from your user profile)
        #[clap(short, long)]
        project: Option<String>,
        /// Portal server URL, e.g. http://localhost:8000
        #[clap(short, long)]
        server: Option<String>,
        /// Portal environment name, e.g. fourfront-cgapdev
        #[clap(short, long)]
        env: Option<String>,
        /// Only validate the bundle; do not post it or upload files
        #[clap(short, long)]
        validate_only: bool,
        #[clap(flatten)]
        options: PortalOptions,
    },
    /// Upload the files of an earlier submission
    ResumeUploads {
        /// Uuid of the ingestion submission
        uuid: String,
        #[clap(short, long)]
        server: Option<String>,
        #[clap(short, long)]
        env: Option<String>,
        /// The bundle that was submitted; files are read from its folder
        #[clap(short, long)]
        bundle_filename: Option<PathBuf>,
        /// Folder to read files from (overrides the bundle's folder)
        #[clap(short = 'u', long)]
        upload_folder: Option<PathBuf>,
        #[clap(flatten)]
        options: PortalOptions,
    },
    /// Upload one data file to an existing file item
    UploadItemData {
        /// Local file to upload
        part_filename: PathBuf,
        /// Uuid of the file item
        #[clap(short, long)]
        uuid: String,
        #[clap(short, long)]
        server: Option<String>,
        #[clap(short, long)]
        env: Option<String>,
        #[clap(flatten)]
        options: PortalOptions,
    },
    /// Write a FASTQ file of random sequences for trying out uploads
    MakeSampleFastqFile {
        filename: PathBuf,
        /// Number of sequences
        #[clap(short, long, default_value_t = 10)]
        number: usize,
        /// Length of each sequence
        #[clap(short, long, default_value_t = 10)]
        length: usize,
    },
}

type CliSession = Session<PortalClient, TerminalConsole, AwsCli>;

/// Resolve the server, look up its access key and wire up the real collaborators.
fn open_session(
    config: &PortalConfig,
    env: Option<&str>,
    server: Option<&str>,
    no_query: bool,
) -> Result<CliSession> {
    let server = resolve_server(config, env, server)?;
    let keydict = KeyManager::from_env().keydict_for_server(&server)?;
    let portal = PortalClient::new(server.clone(), keydict)?;
    Ok(Session::new(
        server,
        portal,
        TerminalConsole::new(),
        AwsCli::new(config.aws_program.clone()),
    )
    .with_poll(config.poll)
    .with_no_query(no_query))
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::SubmitMetadataBundle {
            bundle_filename,
            institution,
            project,
            server,
            env,
            validate_only,
            options,
        } => {
            let config = load_config(options.config.as_deref())?;
            let session = open_session(&config, env.as_deref(), server.as_deref(), options.no_query)?;
            tracing::info!(command = "submit-metadata-bundle", server = %session.server, "Starting submission");
            let request = SubmissionRequest {
                bundle: &bundle_filename,
                institution: institution.as_deref(),
                project: project.as_deref(),
                validate_only,
            };
            let report = submit_metadata_bundle(&session, &request).await?;
            tracing::info!(command = "submit-metadata-bundle", ?report, "Submission complete");
        }
        Commands::ResumeUploads {
            uuid,
            server,
            env,
            bundle_filename,
            upload_folder: folder,
            options,
        } => {
            let config = load_config(options.config.as_deref())?;
            let session = open_session(&config, env.as_deref(), server.as_deref(), options.no_query)?;
            let folder = upload_folder(bundle_filename.as_deref(), folder.as_deref());
            let summary = resume_uploads(&session, &uuid, folder.as_deref()).await?;
            tracing::info!(command = "resume-uploads", ?summary, "Uploads complete");
        }
        Commands::UploadItemData {
            part_filename,
            uuid,
            server,
            env,
            options,
        } => {
            let config = load_config(options.config.as_deref())?;
            let session = open_session(&config, env.as_deref(), server.as_deref(), options.no_query)?;
            upload_item_data(&session, &part_filename, &uuid).await?;
            tracing::info!(command = "upload-item-data", %uuid, "Upload complete");
        }
        Commands::MakeSampleFastqFile {
            filename,
            number,
            length,
        } => {
            write_sample_fastq_file(&filename, number, length)?;
        }
    }
    Ok(())
}
