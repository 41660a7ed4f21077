use std::path::PathBuf;

use anyhow::Context;
use guacinator_client::{ClientConfig, GuacClient};

mod action;
use action::Action;

mod config;
use config::{GuacSettings, Settings};

mod logging;

mod tests;

#[derive(structopt::StructOpt)]
#[structopt(
    name = "guacinator",
    about = "Command line utility to interact programmatically with Apache Guacamole."
)]
struct Opt {
    /// Config file (default is $HOME/.guacinator/guacinator-config.yaml)
    #[structopt(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug messages
    #[structopt(long, global = true)]
    debug: bool,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Interface with Apache Guacamole
    Guacamole(GuacamoleOpt),
}

#[derive(Debug, structopt::StructOpt)]
pub struct GuacamoleOpt {
    /// Guacamole URL
    #[structopt(short = "l", long)]
    url: String,

    /// Username used to authenticate with Guacamole
    #[structopt(short, long)]
    username: String,

    /// Password used to authenticate with Guacamole
    #[structopt(short, long)]
    password: String,

    /// New password for the guacadmin user (it should not be left as guacadmin)
    #[structopt(long)]
    guacadmin_pw: Option<String>,

    /// Create a connection in Guacamole
    #[structopt(long)]
    connection: Option<String>,

    /// VNC password for device. Required to create a new connection
    #[structopt(long)]
    vnc_pw: Option<String>,

    /// IP address of host running VNC. Required to create a new connection
    #[structopt(long)]
    vnc_ip: Option<String>,

    /// Delete an input Guacamole user
    #[structopt(long)]
    delete_user: Option<String>,

    /// Create a new Guacamole admin user
    #[structopt(long)]
    new_admin: Option<String>,
}

/// The gateway host is `guac.url` (from the file, overridden by `GUAC_URL`); `--url` is
/// only used when that setting is empty
fn client_config(settings: &GuacSettings, opt: &GuacamoleOpt) -> ClientConfig {
    let host = match settings.url.as_str() {
        "" => opt.url.as_str(),
        configured => {
            if configured != opt.url {
                tracing::warn!(
                    "Using guac.url {configured} from the configuration instead of --url {}",
                    opt.url
                );
            }
            configured
        }
    };
    ClientConfig::new(
        &settings.scheme,
        host,
        opt.username.clone(),
        opt.password.clone(),
    )
}

async fn guacamole(settings: &Settings, opt: GuacamoleOpt) -> anyhow::Result<()> {
    let action = Action::select(&opt, settings.guac.vnc_port)?;
    if action == Action::Nothing {
        tracing::info!("nothing to do, see --help for the available actions");
        return Ok(());
    }

    let cfg = client_config(&settings.guac, &opt);
    let client = GuacClient::connect(&cfg)
        .await
        .with_context(|| format!("failed to connect to Guacamole at {}", cfg.url))?;

    if let Some(msg) = action.run(&client).await? {
        println!("{msg}");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let opt = <Opt as structopt::StructOpt>::from_args();

    let loaded = config::load(opt.config.as_deref()).context("loading configuration")?;
    logging::init(&loaded.settings.log, opt.debug).context("setting up logging")?;
    if loaded.created {
        tracing::info!(
            "No config file found - created {} with default values",
            loaded.path.display()
        );
    }
    tracing::debug!("Using config file: {}", loaded.path.display());

    match opt.cmd {
        Command::Guacamole(g) => guacamole(&loaded.settings, g).await,
    }
}
