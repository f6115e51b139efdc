use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser};
use service_installer::{Dispatcher, DispatcherConfig, ExecutableSource};
use tracing_subscriber::EnvFilter;

/// Manage this application as a Windows service.
#[derive(Parser, Debug)]
#[command(name = "service-installer", version, about)]
struct Args {
    /// install, uninstall, start, stop, status or is-installed
    #[arg(allow_hyphen_values = true)]
    command: Option<String>,

    /// Service name
    #[arg(long, env = "SERVICE_INSTALLER_NAME")]
    name: String,

    /// Friendly name shown in the services console. Defaults to the service name.
    #[arg(long, env = "SERVICE_INSTALLER_DISPLAY_NAME")]
    display_name: Option<String>,

    /// Register this executable instead of the running one
    #[arg(long, conflicts_with = "process_name")]
    executable: Option<PathBuf>,

    /// Register the executable of the running process with this name
    #[arg(long)]
    process_name: Option<String>,

    /// Extra line appended to the usage listing
    #[arg(long = "usage-line", value_name = "LINE", allow_hyphen_values = true)]
    usage_lines: Vec<String>,

    /// Milliseconds to wait before confirming a start or stop
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    settle_ms: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Arguments the service is launched with
    #[arg(last = true)]
    service_args: Vec<String>,
}

impl Args {
    fn executable_source(&self) -> ExecutableSource {
        match (&self.executable, &self.process_name) {
            (Some(path), _) => ExecutableSource::Path(path.clone()),
            (None, Some(name)) => ExecutableSource::NamedProcess(name.clone()),
            (None, None) => ExecutableSource::CurrentProcess,
        }
    }

    fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig::builder()
            .with_additional_usages(self.usage_lines.iter().cloned())
            .with_executable(self.executable_source())
            .with_settle_delay(Duration::from_millis(self.settle_ms))
            .build()
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let dispatcher = Dispatcher::system(args.dispatcher_config());
    let display_name = args.display_name.as_deref().unwrap_or(&args.name);
    let outcome = dispatcher.dispatch(
        args.command.as_deref(),
        &args.name,
        display_name,
        &args.service_args,
    );

    let rendered = outcome.to_string();
    println!("{}", rendered.trim_end());
    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_command_and_trailing_service_args() {
        let args = Args::try_parse_from([
            "service-installer",
            "install",
            "--name",
            "svc",
            "--",
            "-service",
            "--quiet",
        ])
        .unwrap();
        assert_eq!(Some("install"), args.command.as_deref());
        assert_eq!("svc", args.name);
        assert_eq!(vec!["-service", "--quiet"], args.service_args);
        assert_eq!(ExecutableSource::CurrentProcess, args.executable_source());
    }

    #[test]
    fn accepts_switch_style_commands() {
        let args =
            Args::try_parse_from(["service-installer", "-Install", "--name", "svc"]).unwrap();
        assert_eq!(Some("-Install"), args.command.as_deref());
    }

    #[test]
    fn executable_and_process_name_conflict() {
        let result = Args::try_parse_from([
            "service-installer",
            "install",
            "--name",
            "svc",
            "--executable",
            "svc.exe",
            "--process-name",
            "svc",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn config_from_args() {
        let args = Args::try_parse_from([
            "service-installer",
            "status",
            "--name",
            "svc",
            "--process-name",
            "svc",
            "--usage-line",
            "-Console",
            "--settle-ms",
            "0",
        ])
        .unwrap();
        let config = args.dispatcher_config();
        assert_eq!(["-Console"], config.additional_usage());
        assert_eq!(
            &ExecutableSource::NamedProcess("svc".to_owned()),
            config.executable()
        );
        assert_eq!(Duration::ZERO, config.settle_delay());
    }
}
