use std::path::PathBuf;
use std::process::exit;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tunnel_netcfg::{Error, NetConfig, Session, logging};

#[derive(Args, Debug)]
pub struct SessionArgs {
    /// JSON session file describing interface, address and route.
    pub session: PathBuf,
}

#[derive(Args, Debug)]
pub struct CreateInterfaceArgs {
    pub name: String,
    /// Outer local endpoint. Ignored for `tun` interfaces.
    #[clap(long, default_value = "")]
    pub local: String,
    /// Outer remote endpoint. Ignored for `tun` interfaces.
    #[clap(long, default_value = "")]
    pub remote: String,
}

#[derive(Args, Debug)]
pub struct CreateAddressArgs {
    pub name: String,
    pub address: String,
    pub prefix_len: u8,
}

#[derive(Args, Debug)]
pub struct RouteArgs {
    pub destination: String,
    pub prefix_len: u8,
    pub next_hop: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the interface, assign its address and install its route.
    Up(SessionArgs),
    /// Remove the route and destroy the interface.
    Down(SessionArgs),
    CreateInterface(CreateInterfaceArgs),
    CreateAddress(CreateAddressArgs),
    DeleteInterface { name: String },
    CreateRoute(RouteArgs),
    DeleteRoute(RouteArgs),
}

#[derive(Parser)]
pub struct Cli {
    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[clap(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    logging::init(if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO });

    if let Err(error) = run(cli.command) {
        eprintln!("{:#}", error);
        exit(1)
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    let net = NetConfig::system();
    match command {
        Command::Up(args) => {
            let session = Session::load(&args.session).with_context(|| format!("loading {}", args.session.display()))?;
            session.activate(&net).map_err(with_code)
        }
        Command::Down(args) => {
            let session = Session::load(&args.session).with_context(|| format!("loading {}", args.session.display()))?;
            session.deactivate(&net).map_err(with_code)
        }
        Command::CreateInterface(args) => net.create_interface(&args.name, &args.local, &args.remote).map_err(with_code),
        Command::CreateAddress(args) => net.create_address(&args.name, &args.address, args.prefix_len).map_err(with_code),
        Command::DeleteInterface { name } => net.delete_interface(&name).map_err(with_code),
        Command::CreateRoute(args) => net.create_route(&args.destination, args.prefix_len, &args.next_hop).map_err(with_code),
        Command::DeleteRoute(args) => net.delete_route(&args.destination, args.prefix_len, &args.next_hop).map_err(with_code),
    }
}

// Scripts branch on the code printed before the message.
fn with_code(error: Error) -> anyhow::Error {
    let code = error.code();
    anyhow::Error::new(error).context(code.as_static_str())
}
