use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "asr-gateway",
    about = "ASR Gateway - HTTP transcription service",
    long_about = "Accepts uploaded audio over HTTP, transcribes it with a local model or a remote transcription server, archives the transcript to object storage, and returns it as JSON.",
    after_help = "EXAMPLES:\n    # Serve the local-model profile on the default port\n    asr-gateway serve\n\n    # Bind elsewhere\n    asr-gateway serve --host 127.0.0.1 --port 9090\n\n    # The profile and its backend settings come from the environment,\n    # see ASR_PROFILE and the REMOTE_ASR_* / WHISPER_* variables."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(name = "serve")]
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value = "8080")]
        port: u16,
    },
}
