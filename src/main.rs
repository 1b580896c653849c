use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use dosbox_serial_switch::config::{CliConfig, Command};
use dosbox_serial_switch::{ConfigSession, PortEnumerator, SwitchResult, SystemPorts};

fn main() -> ExitCode {
    let cli = CliConfig::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.validate().and_then(|()| run(&cli.command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(kind = ?err.kind(), "{}", err);
            eprintln!("error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(command: &Command) -> SwitchResult<()> {
    match command {
        Command::Read { path } => read(ConfigSession::open(path)?),
        Command::Apply {
            path,
            virtual_port,
            physical_device,
        } => {
            let mut session = ConfigSession::open(path)?;
            let report = session.apply_checked(virtual_port, physical_device, &SystemPorts)?;

            for key in &report.released {
                println!("{} released {}", key, report.physical_device);
            }
            if report.bound {
                println!(
                    "{} -> {} written to {}",
                    report.virtual_port,
                    report.physical_device,
                    session.path().display()
                );
            } else {
                println!(
                    "no {} line in {}, nothing bound",
                    report.virtual_port,
                    session.path().display()
                );
            }
            Ok(())
        }
        Command::ListPorts => {
            for port in SystemPorts.available_ports()? {
                println!("{}", port);
            }
            Ok(())
        }
    }
}

fn read(session: ConfigSession) -> SwitchResult<()> {
    let available = SystemPorts.available_ports().unwrap_or_else(|err| {
        debug!("{}", err);
        Vec::new()
    });

    for line in session.summary(&available) {
        println!("{}", line);
    }
    Ok(())
}
