use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use provgate_core::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "provgate",
    version,
    about = "Supply-chain gate: resolve sign-offs and evaluate attestation policies"
)]
pub struct Cli {
    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the sign-off behind each attestation of an image
    SignOff(SignOffArgs),
    /// Evaluate an image's attestations against a named policy
    Eval(EvalArgs),
    Version,
}

/// Flags shared by commands that read image attestations.
#[derive(Args, Debug, Clone)]
pub struct ImageArgs {
    /// Image reference, e.g. registry.example.com/acme/widget@sha256:...
    #[arg(long, env = "PROVGATE_IMAGE_REF")]
    pub image_ref: String,

    /// Directory of DSSE attestation files
    #[arg(long, env = "PROVGATE_ATTESTATION_STORE", default_value = "attestations")]
    pub attestation_store: PathBuf,

    /// Only accept signatures with this key ID
    #[arg(long)]
    pub identity: Option<String>,

    /// Overall deadline in seconds
    #[arg(long, env = "PROVGATE_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,
}

#[derive(Args, Debug, Clone)]
pub struct SignOffArgs {
    #[command(flatten)]
    pub image: ImageArgs,

    /// PEM-encoded Ed25519 public key of the attestation signer
    #[arg(long)]
    pub public_key: PathBuf,

    /// Base URL of the GitHub-compatible commit API
    #[arg(
        long,
        env = "PROVGATE_FORGE_API_URL",
        default_value = "https://api.github.com"
    )]
    pub forge_api_url: String,

    #[arg(long, env = "PROVGATE_FORGE_TOKEN", hide_env_values = true)]
    pub forge_token: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EvalArgs {
    /// Policy name, `<namespace>/<name>` or `<name>`
    #[arg(long, env = "PROVGATE_POLICY")]
    pub policy: String,

    #[command(flatten)]
    pub image: ImageArgs,

    /// PEM public key path; defaults to the policy's publicKey
    #[arg(long)]
    pub public_key: Option<PathBuf>,

    /// Directory of policy specs
    #[arg(long, env = "PROVGATE_POLICY_STORE", default_value = "policies")]
    pub policy_store: PathBuf,

    /// Output format: json, junit or table
    #[arg(long, default_value = "json")]
    pub output: OutputFormat,

    /// Colorize table output
    #[arg(long)]
    pub color: bool,

    /// Drop exception outcomes from the output
    #[arg(long)]
    pub suppress_exceptions: bool,

    /// Include rule messages in junit element bodies
    #[arg(long)]
    pub show_assertion_messages: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_eval_defaults() {
        let cli = Cli::try_parse_from([
            "provgate",
            "eval",
            "--policy",
            "tenant/release",
            "--image-ref",
            "registry.example.com/acme/widget:v1",
        ])
        .unwrap();
        let Command::Eval(args) = cli.cmd else {
            panic!("expected eval");
        };
        assert_eq!(args.output, OutputFormat::Json);
        assert!(args.public_key.is_none());
        assert!(!args.color);
    }

    #[test]
    fn test_output_format_parsed() {
        let cli = Cli::try_parse_from([
            "provgate",
            "eval",
            "--policy",
            "release",
            "--image-ref",
            "img:v1",
            "--output",
            "junit",
        ])
        .unwrap();
        let Command::Eval(args) = cli.cmd else {
            panic!("expected eval");
        };
        assert_eq!(args.output, OutputFormat::Junit);

        assert!(Cli::try_parse_from([
            "provgate",
            "eval",
            "--policy",
            "release",
            "--image-ref",
            "img:v1",
            "--output",
            "sarif",
        ])
        .is_err());
    }

    #[test]
    fn test_sign_off_requires_public_key() {
        assert!(Cli::try_parse_from(["provgate", "sign-off", "--image-ref", "img:v1"]).is_err());
    }
}
