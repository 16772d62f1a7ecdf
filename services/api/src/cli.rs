use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{ArgGroup, Args, Parser, Subcommand};
use hireflow::config::AppConfig;
use hireflow::error::AppError;
use hireflow::workflows::hiring::{ClientId, Principal, TokenSigner, WorkerId};

#[derive(Parser, Debug)]
#[command(
    name = "hireflow",
    about = "Run the marketplace hiring service or exercise it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Mint a bearer credential signed with the configured secret
    Token(TokenArgs),
    /// Walk one hire through acceptance, payment and rating against in-memory stores
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("principal").required(true).args(["client", "worker"])))]
pub(crate) struct TokenArgs {
    /// Issue the credential for this client id
    #[arg(long)]
    pub(crate) client: Option<u64>,
    /// Issue the credential for this worker id
    #[arg(long)]
    pub(crate) worker: Option<u64>,
}

impl TokenArgs {
    fn principal(&self) -> Option<Principal> {
        match (self.client, self.worker) {
            (Some(id), None) => Some(Principal::Client(ClientId(id))),
            (None, Some(id)) => Some(Principal::Worker(WorkerId(id))),
            _ => None,
        }
    }
}

fn issue_token(args: TokenArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let signer = TokenSigner::new(&config.auth.token_secret, config.auth.token_ttl_hours);
    if let Some(principal) = args.principal() {
        println!("{}", signer.issue(principal));
    }
    Ok(())
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Token(args) => issue_token(args),
        Command::Demo(args) => run_demo(args),
    }
}
